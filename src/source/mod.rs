//! Record sources: adapters that deliver a fully materialized batch of raw
//! restaurant records to the analytics core.

mod delimited;
mod json;

pub use delimited::CsvSource;
pub use json::JsonSource;

use crate::error::Result;
use crate::model::RawRestaurant;

/// Something that can produce the complete record set for one run.
///
/// Loading is all-or-nothing: either every record is returned or the call
/// fails with [`SourceUnavailable`](crate::error::AnalyticsError::SourceUnavailable)
/// or [`MalformedRecord`](crate::error::AnalyticsError::MalformedRecord).
pub trait RecordSource {
    /// Human-readable identifier used in logs and errors.
    fn name(&self) -> String;

    fn load(&self) -> Result<Vec<RawRestaurant>>;
}

/// Records that were already materialized elsewhere, e.g. from a query.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<RawRestaurant>,
}

impl MemorySource {
    pub fn new(records: Vec<RawRestaurant>) -> Self {
        Self { records }
    }
}

impl RecordSource for MemorySource {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<Vec<RawRestaurant>> {
        for (i, record) in self.records.iter().enumerate() {
            record.validate(i as u64 + 1)?;
        }
        Ok(self.records.clone())
    }
}
