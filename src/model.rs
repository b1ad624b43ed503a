//! Restaurant record types: the raw ingestion shape and the normalized record
//! the analytics core reads.

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Highest dining rating a record may carry.
pub const MAX_RATING: f64 = 5.0;

/// A restaurant exactly as delivered by a record source.
///
/// Column names follow the Zomato Delhi NCR export; snake_case aliases let the
/// same type read JSON exports of query results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawRestaurant {
    #[serde(rename = "Restaurant_Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Category", alias = "cuisines", default)]
    pub category: Option<String>,
    #[serde(rename = "Locality", alias = "locality", default)]
    pub locality: Option<String>,
    #[serde(rename = "Dining_Rating", alias = "dining_rating", default)]
    pub dining_rating: Option<f64>,
    #[serde(rename = "Pricing_for_2", alias = "price_for_2", default)]
    pub pricing_for_2: Option<f64>,
    #[serde(rename = "Dining_Review_Count", alias = "review_count", default)]
    pub dining_review_count: Option<u64>,
}

impl RawRestaurant {
    /// Rejects values outside the legal domain of each numeric field.
    ///
    /// `line` is the 1-based position of the record in its source and is
    /// reported back in [`AnalyticsError::MalformedRecord`].
    pub fn validate(&self, line: u64) -> Result<()> {
        if let Some(rating) = self.dining_rating {
            if !(0.0..=MAX_RATING).contains(&rating) {
                return Err(AnalyticsError::MalformedRecord {
                    line,
                    reason: format!("dining rating {rating} outside [0, {MAX_RATING}]"),
                });
            }
        }

        if let Some(price) = self.pricing_for_2 {
            if !price.is_finite() || price < 0.0 {
                return Err(AnalyticsError::MalformedRecord {
                    line,
                    reason: format!("price for two {price} is negative or not finite"),
                });
            }
        }

        Ok(())
    }
}

/// A normalized restaurant record. Built once from a [`RawRestaurant`] and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restaurant {
    pub name: String,
    pub locality: String,
    /// `None` when the locality text had no usable city segment.
    pub city: Option<String>,
    pub cuisines: Vec<String>,
    pub dining_rating: Option<f64>,
    pub price_for_2: Option<f64>,
    pub review_count: Option<u64>,
}

/// Numeric fields that aggregate metrics can be computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    DiningRating,
    PriceForTwo,
    ReviewCount,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::DiningRating => "dining_rating",
            Field::PriceForTwo => "price_for_two",
            Field::ReviewCount => "review_count",
        }
    }

    /// The field's value on `record`, if it has one.
    pub fn value(&self, record: &Restaurant) -> Option<f64> {
        match self {
            Field::DiningRating => record.dining_rating,
            Field::PriceForTwo => record.price_for_2,
            Field::ReviewCount => record.review_count.map(|c| c as f64),
        }
    }

    /// Reads the field from a record, or [`AnalyticsError::MissingField`] when
    /// the record carries no value for it.
    pub fn extract(&self, record: &Restaurant) -> Result<f64> {
        self.value(record).ok_or_else(|| AnalyticsError::MissingField {
            field: self.name(),
            record: record.name.clone(),
        })
    }
}
