//! Structured error type shared by the analytics pipeline and its record sources.

use thiserror::Error;

/// Errors raised while loading, normalizing, or aggregating restaurant records.
///
/// Every variant carries enough context for a caller to decide between retry
/// and abort; the core never makes that call itself.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("locality '{locality}' has no usable city segment")]
    MalformedLocality { locality: String },

    #[error("record '{record}' has no value for field '{field}'")]
    MissingField { field: &'static str, record: String },

    #[error("record source '{source_name}' is unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("invalid band table: {reason}")]
    InvalidBandTable { reason: String },

    #[error("configuration error in '{path}': {reason}")]
    Config { path: String, reason: String },
}

impl AnalyticsError {
    /// Whether a retry of the same run could succeed without any change to
    /// the input data or configuration.
    pub fn is_transient(&self) -> bool {
        matches!(self, AnalyticsError::SourceUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
