//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::analyzers::insight::InsightFact;
use crate::model::Field;

/// An attribute records are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Cuisine,
    City,
    Locality,
    RatingBand,
    PriceBand,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Cuisine,
        Dimension::City,
        Dimension::Locality,
        Dimension::RatingBand,
        Dimension::PriceBand,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Cuisine => "cuisine",
            Dimension::City => "city",
            Dimension::Locality => "locality",
            Dimension::RatingBand => "rating_band",
            Dimension::PriceBand => "price_band",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Records at or above a threshold for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdCount {
    pub threshold: f64,
    pub count: usize,
}

/// Statistics for one numeric field within a group.
///
/// Only the statistics that were requested are populated. `contributors` is
/// the denominator of `mean`: records in the group that had a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldSummary {
    pub contributors: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub at_least: Vec<ThresholdCount>,
}

/// One group of an aggregate table.
///
/// For multi-valued dimensions `member_count` counts mentions, so it can
/// exceed `distinct_records` and the sum across groups can exceed the
/// number of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateGroup {
    pub key: String,
    pub member_count: usize,
    pub distinct_records: usize,
    /// Records that had at least one key for this dimension; the denominator
    /// of `percentage_of_total`.
    pub keyed_records: usize,
    /// `member_count / keyed_records * 100`, unrounded.
    pub percentage_of_total: f64,
    /// `distinct_records` as a percentage of every record in the dataset.
    pub market_share: f64,
    pub fields: BTreeMap<Field, FieldSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_localities: Option<usize>,
}

impl AggregateGroup {
    pub fn field(&self, field: Field) -> Option<&FieldSummary> {
        self.fields.get(&field)
    }

    pub fn mean(&self, field: Field) -> Option<f64> {
        self.field(field).and_then(|s| s.mean)
    }

    pub fn min(&self, field: Field) -> Option<f64> {
        self.field(field).and_then(|s| s.min)
    }

    pub fn max(&self, field: Field) -> Option<f64> {
        self.field(field).and_then(|s| s.max)
    }

    pub fn sum(&self, field: Field) -> Option<f64> {
        self.field(field).and_then(|s| s.sum)
    }

    /// Count of contributors at or above `threshold`, if that threshold was
    /// requested for `field`.
    pub fn at_least(&self, field: Field, threshold: f64) -> Option<usize> {
        self.field(field)?
            .at_least
            .iter()
            .find(|t| t.threshold == threshold)
            .map(|t| t.count)
    }
}

/// Aggregate tables keyed by dimension, each in its final ranked order.
pub type DimensionTables = BTreeMap<Dimension, Vec<AggregateGroup>>;

/// Whole-dataset figures reported alongside the dimension tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_records: usize,
    pub unique_names: usize,
    pub rated_records: usize,
    pub priced_records: usize,
    pub mean_rating: Option<f64>,
    pub mean_price_for_two: Option<f64>,
    /// Records left out of the city dimension.
    pub malformed_localities: usize,
}

/// Complete result of one analytics run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub summary: DatasetSummary,
    pub dimensions: DimensionTables,
    pub insights: Vec<InsightFact>,
}
