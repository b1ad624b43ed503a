//! CLI entry point for the restaurant insights tool.
//!
//! Provides subcommands for printing a report over a restaurant export,
//! exporting the aggregate tables to disk, and validating a config file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use restaurant_insights::config::AnalyticsConfig;
use restaurant_insights::output::{export_report, print_pretty, render_json, render_text};
use restaurant_insights::source::{CsvSource, JsonSource, RecordSource};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "restaurant_insights")]
#[command(about = "Descriptive analytics over restaurant listings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report for a CSV (optionally .gz) or JSON export
    Report {
        /// Path to the restaurant export
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// JSON config overriding band tables, ranking and thresholds
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write one CSV per dimension plus report.json
    Export {
        /// Path to the restaurant export
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// JSON config overriding band tables, ranking and thresholds
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory to write the tables to
        #[arg(short = 'd', long, default_value = "reports")]
        output_dir: PathBuf,
    },
    /// Validate a config file and print the effective configuration
    CheckConfig {
        #[arg(value_name = "CONFIG")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/restaurant_insights.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("restaurant_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            config,
            format,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let report = restaurant_insights::run(open_source(&input).as_ref(), &config)
                .with_context(|| format!("building report for {}", input.display()))?;
            print_pretty(&report);

            let rendered = match format {
                Format::Text => render_text(&report),
                Format::Json => render_json(&report)?,
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "Report written");
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Export {
            input,
            config,
            output_dir,
        } => {
            let config = load_config(config.as_deref())?;
            let report = restaurant_insights::run(open_source(&input).as_ref(), &config)
                .with_context(|| format!("building report for {}", input.display()))?;
            export_report(&output_dir, &report)?;
        }
        Commands::CheckConfig { path } => {
            let config = AnalyticsConfig::load(&path)?;
            info!(path = %path.display(), "Config is valid");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Uses the config at `path` when given, the built-in defaults otherwise.
fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    match path {
        Some(path) => Ok(AnalyticsConfig::load(path)?),
        None => Ok(AnalyticsConfig::default()),
    }
}

/// Picks the record source from the file extension.
fn open_source(input: &Path) -> Box<dyn RecordSource> {
    match input.extension().and_then(|e| e.to_str()) {
        Some("json") => Box::new(JsonSource::new(input)),
        _ => Box::new(CsvSource::new(input)),
    }
}
