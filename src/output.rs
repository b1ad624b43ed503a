//! Report presentation: text rendering, JSON, and per-dimension CSV export.
//!
//! All rounding happens here; the report itself carries unrounded values.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::insight::InsightFact;
use crate::analyzers::types::{AggregateGroup, Dimension, Report};
use crate::analyzers::utility::round_to;
use crate::model::Field;

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &Report) {
    debug!("{:#?}", report);
}

/// Serializes the report as pretty-printed JSON.
pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn fmt_opt(value: Option<f64>, places: usize) -> String {
    value
        .map(|v| format!("{v:.places$}"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn dimension_label(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Cuisine => "cuisine",
        Dimension::City => "city",
        Dimension::Locality => "locality",
        Dimension::RatingBand => "rating band",
        Dimension::PriceBand => "price band",
    }
}

/// One sentence for an insight fact.
pub fn describe(fact: &InsightFact) -> String {
    match fact {
        InsightFact::MostPopular {
            dimension: Dimension::City,
            key,
            member_count,
            market_share,
            ..
        } => format!(
            "Largest market: {key} ({member_count} restaurants, {market_share:.2}% of all restaurants)"
        ),
        InsightFact::MostPopular {
            dimension,
            key,
            member_count,
            market_share,
            mean_rating,
        } => format!(
            "Most popular {}: {key} ({member_count} restaurants, {market_share:.2}% market share, average rating {}/5.0)",
            dimension_label(*dimension),
            fmt_opt(*mean_rating, 2)
        ),
        InsightFact::BestRated {
            dimension,
            key,
            mean_rating,
        } => format!(
            "Best rated {}: {key} ({mean_rating:.2}/5.0)",
            dimension_label(*dimension)
        ),
        InsightFact::ThresholdCount {
            dimension,
            field,
            threshold,
            count,
        } => format!(
            "Groups by {} with mean {} >= {threshold}: {count}",
            dimension_label(*dimension),
            field.name()
        ),
        InsightFact::GroupsCovered { dimension, count } => {
            format!("Total {} groups covered: {count}", dimension_label(*dimension))
        }
        InsightFact::BandShare {
            from_label,
            percentage,
            ..
        } => format!("{from_label} or better: {percentage:.2}% of restaurants"),
        InsightFact::NoData { dimension } => {
            format!("No data for {}", dimension_label(*dimension))
        }
    }
}

fn describe_group(dimension: Dimension, rank: usize, g: &AggregateGroup) -> String {
    let rating = fmt_opt(g.mean(Field::DiningRating), 2);
    let cost = fmt_opt(g.mean(Field::PriceForTwo), 0);

    match dimension {
        Dimension::RatingBand => format!(
            "{}: {} restaurants ({:.1}%), average cost ₹{cost}, average reviews {}",
            g.key,
            g.member_count,
            g.percentage_of_total,
            fmt_opt(g.mean(Field::ReviewCount), 0)
        ),
        Dimension::PriceBand => format!(
            "{}: {} restaurants ({:.1}%), average rating {rating}, cost ₹{}-₹{}",
            g.key,
            g.member_count,
            g.percentage_of_total,
            fmt_opt(g.min(Field::PriceForTwo), 0),
            fmt_opt(g.max(Field::PriceForTwo), 0)
        ),
        _ => format!(
            "{rank}. {}: {} restaurants (average rating {rating}, average cost ₹{cost})",
            g.key, g.member_count
        ),
    }
}

/// Renders the whole report as plain text.
pub fn render_text(report: &Report) -> String {
    let s = &report.summary;
    let mut lines = vec![
        "=== DATASET ===".to_string(),
        format!("Total records: {}", s.total_records),
        format!("Unique restaurants: {}", s.unique_names),
        format!("Average dining rating: {}", fmt_opt(s.mean_rating, 2)),
        format!("Average price for two: ₹{}", fmt_opt(s.mean_price_for_two, 0)),
    ];
    if s.malformed_localities > 0 {
        lines.push(format!(
            "Records without a usable city: {}",
            s.malformed_localities
        ));
    }

    for (dimension, groups) in &report.dimensions {
        lines.push(String::new());
        lines.push(format!("=== {} ===", dimension_label(*dimension).to_uppercase()));
        if groups.is_empty() {
            lines.push("(no groups)".to_string());
        }
        for (i, g) in groups.iter().enumerate() {
            lines.push(describe_group(*dimension, i + 1, g));
        }
    }

    lines.push(String::new());
    lines.push("=== INSIGHTS ===".to_string());
    lines.extend(report.insights.iter().map(|f| format!("  • {}", describe(f))));

    lines.join("\n")
}

/// A flattened aggregate group, one CSV row.
#[derive(Debug, Serialize)]
struct GroupRow<'a> {
    key: &'a str,
    member_count: usize,
    distinct_records: usize,
    percentage_of_total: f64,
    market_share: f64,
    mean_rating: Option<f64>,
    mean_price_for_two: Option<f64>,
    min_price_for_two: Option<f64>,
    max_price_for_two: Option<f64>,
    mean_reviews: Option<f64>,
    total_reviews: Option<f64>,
    distinct_localities: Option<usize>,
}

impl<'a> From<&'a AggregateGroup> for GroupRow<'a> {
    fn from(g: &'a AggregateGroup) -> Self {
        let r2 = |v: Option<f64>| v.map(|v| round_to(v, 2));
        Self {
            key: &g.key,
            member_count: g.member_count,
            distinct_records: g.distinct_records,
            percentage_of_total: round_to(g.percentage_of_total, 2),
            market_share: round_to(g.market_share, 2),
            mean_rating: r2(g.mean(Field::DiningRating)),
            mean_price_for_two: r2(g.mean(Field::PriceForTwo)),
            min_price_for_two: g.min(Field::PriceForTwo),
            max_price_for_two: g.max(Field::PriceForTwo),
            mean_reviews: r2(g.mean(Field::ReviewCount)),
            total_reviews: g.sum(Field::ReviewCount),
            distinct_localities: g.distinct_localities,
        }
    }
}

/// Writes one dimension table to a CSV file, replacing any existing file.
pub fn write_dimension_csv(path: &Path, groups: &[AggregateGroup]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new().from_writer(file);

    for g in groups {
        writer.serialize(GroupRow::from(g))?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = groups.len(), "Dimension CSV written");
    Ok(())
}

/// Writes `<dimension>.csv` for every table plus `report.json` into `dir`.
pub fn export_report(dir: &Path, report: &Report) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::new();
    for (dimension, groups) in &report.dimensions {
        let path = dir.join(format!("{}.csv", dimension.name()));
        write_dimension_csv(&path, groups)?;
        written.push(path);
    }

    let json_path = dir.join("report.json");
    fs::write(&json_path, render_json(report)?)
        .with_context(|| format!("writing {}", json_path.display()))?;
    written.push(json_path);

    info!(dir = %dir.display(), files = written.len(), "Report exported");
    Ok(written)
}
