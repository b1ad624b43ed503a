use std::path::PathBuf;
use tracing::info;

use super::RecordSource;
use crate::error::{AnalyticsError, Result};
use crate::model::RawRestaurant;

/// Reads a JSON array of records, such as an exported query result.
///
/// Both the CSV column names and snake_case keys (`name`, `cuisines`,
/// `locality`, `dining_rating`, `price_for_2`, `review_count`) are accepted.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    #[tracing::instrument(skip(self), fields(source = %self.path.display()))]
    fn load(&self) -> Result<Vec<RawRestaurant>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| AnalyticsError::SourceUnavailable {
                source_name: self.name(),
                reason: e.to_string(),
            })?;

        let rows: Vec<RawRestaurant> =
            serde_json::from_str(&content).map_err(|e| AnalyticsError::MalformedRecord {
                line: e.line() as u64,
                reason: e.to_string(),
            })?;

        // Array position stands in for the line number.
        for (i, row) in rows.iter().enumerate() {
            row.validate(i as u64 + 1)?;
        }

        info!(records = rows.len(), "Loaded JSON records");
        Ok(rows)
    }
}
