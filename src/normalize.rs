//! Field normalization: turns raw text fields into atomic values.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AnalyticsError, Result};
use crate::model::{RawRestaurant, Restaurant};

/// Separators used to split multi-valued text fields.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub cuisine_separator: String,
    pub locality_separator: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            cuisine_separator: ",".into(),
            locality_separator: ",".into(),
        }
    }
}

/// Splits `raw` on `separator`, trims each token and drops empty ones.
///
/// Order is preserved and duplicates are kept.
pub fn explode_multivalued(raw: &str, separator: &str) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Derives a city from locality text by taking its last non-empty segment.
///
/// `"Sector 29, Gurgaon"` yields `"Gurgaon"`. Empty text, or text made only of
/// separators and whitespace, fails with [`AnalyticsError::MalformedLocality`].
pub fn derive_city(locality: &str, separator: &str) -> Result<String> {
    locality
        .split(separator)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
        .ok_or_else(|| AnalyticsError::MalformedLocality {
            locality: locality.to_string(),
        })
}

/// Canonical form of locality text: segments trimmed, empty ones dropped,
/// rejoined with `", "`.
///
/// `"CP, New Delhi, "` and `"CP ,New Delhi"` both become `"CP, New Delhi"`.
/// Text with no segments yields `None`.
pub fn normalize_locality(locality: &str, separator: &str) -> Option<String> {
    let segments = explode_multivalued(locality, separator);
    (!segments.is_empty()).then(|| segments.join(", "))
}

/// Builds the normalized copy of a raw record.
///
/// A malformed locality leaves both `city` and `locality` empty so the record
/// drops out of city and locality aggregates while still counting everywhere
/// else.
pub fn normalize_record(raw: &RawRestaurant, config: &NormalizeConfig) -> Restaurant {
    let text = raw.locality.as_deref().unwrap_or("");
    let locality = normalize_locality(text, &config.locality_separator).unwrap_or_default();

    let city = match derive_city(text, &config.locality_separator) {
        Ok(city) => Some(city),
        Err(e) => {
            warn!(restaurant = %raw.name, error = %e, "Excluding record from city aggregates");
            None
        }
    };

    let cuisines = raw
        .category
        .as_deref()
        .map(|c| explode_multivalued(c, &config.cuisine_separator))
        .unwrap_or_default();

    Restaurant {
        name: raw.name.trim().to_string(),
        locality,
        city,
        cuisines,
        dining_rating: raw.dining_rating,
        price_for_2: raw.pricing_for_2,
        review_count: raw.dining_review_count,
    }
}

/// Normalizes every record of a batch.
pub fn normalize_all(raw: &[RawRestaurant], config: &NormalizeConfig) -> Vec<Restaurant> {
    raw.iter().map(|r| normalize_record(r, config)).collect()
}
