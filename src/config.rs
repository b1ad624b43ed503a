//! Explicit analytics configuration: separators, band tables, per-dimension
//! ranking and insight thresholds.
//!
//! Stored as a JSON object on disk; every key is optional:
//! ```json
//! {
//!   "cuisine": { "min_support": 10, "top_n": 5 },
//!   "price_bands": [
//!     { "lower": 0, "upper": 800, "label": "Everyday" },
//!     { "lower": 800, "upper": null, "label": "Occasion" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analyzers::bands::BandTable;
use crate::analyzers::insight::InsightConfig;
use crate::analyzers::rank::{RankSpec, SortField, SortKey};
use crate::analyzers::types::Dimension;
use crate::error::{AnalyticsError, Result};
use crate::model::Field;
use crate::normalize::NormalizeConfig;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub normalize: NormalizeConfig,
    pub rating_bands: BandTable,
    pub price_bands: BandTable,
    pub cuisine: RankSpec,
    pub city: RankSpec,
    pub locality: RankSpec,
    pub rating_band: RankSpec,
    pub price_band: RankSpec,
    pub insights: InsightConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        let by_rating = SortField::Mean(Field::DiningRating);

        Self {
            normalize: NormalizeConfig::default(),
            rating_bands: BandTable::rating_bands(),
            price_bands: BandTable::price_bands(),
            cuisine: RankSpec {
                min_support: 5,
                top_n: Some(15),
                sort: vec![
                    SortKey::descending(SortField::MemberCount),
                    SortKey::descending(by_rating),
                ],
            },
            city: RankSpec {
                min_support: 1,
                top_n: None,
                sort: vec![SortKey::descending(SortField::MemberCount)],
            },
            locality: RankSpec {
                min_support: 3,
                top_n: Some(10),
                sort: vec![
                    SortKey::descending(by_rating),
                    SortKey::descending(SortField::MemberCount),
                ],
            },
            // Band tables stay in table order.
            rating_band: RankSpec::default(),
            price_band: RankSpec::default(),
            insights: InsightConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Loads the config from a JSON file at `path`. Band tables are validated
    /// while parsing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_err = |reason: String| AnalyticsError::Config {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| config_err(e.to_string()))?;

        if config.normalize.cuisine_separator.is_empty()
            || config.normalize.locality_separator.is_empty()
        {
            return Err(config_err("separators must not be empty".into()));
        }

        Ok(config)
    }

    /// Ranking applied to `dimension`'s table.
    pub fn rank_spec(&self, dimension: Dimension) -> &RankSpec {
        match dimension {
            Dimension::Cuisine => &self.cuisine,
            Dimension::City => &self.city,
            Dimension::Locality => &self.locality,
            Dimension::RatingBand => &self.rating_band,
            Dimension::PriceBand => &self.price_band,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_match_report_conventions() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.cuisine.min_support, 5);
        assert_eq!(config.cuisine.top_n, Some(15));
        assert_eq!(config.locality.min_support, 3);
        assert_eq!(config.rank_spec(Dimension::RatingBand).top_n, None);
        assert_eq!(config.rating_bands.len(), 5);
    }

    #[test]
    fn test_load_partial_config_keeps_defaults() {
        let file = write_config(r#"{ "insights": { "high_rating_threshold": 4.0 } }"#);
        let config = AnalyticsConfig::load(file.path()).unwrap();

        assert_eq!(config.insights.high_rating_threshold, 4.0);
        assert_eq!(config.insights.good_band_label, "Good");
        assert_eq!(config.cuisine, AnalyticsConfig::default().cuisine);
    }

    #[test]
    fn test_load_custom_price_bands() {
        let file = write_config(
            r#"{ "price_bands": [
                {"lower": 0, "upper": 800, "label": "Everyday"},
                {"lower": 800, "upper": null, "label": "Occasion"}
            ] }"#,
        );
        let config = AnalyticsConfig::load(file.path()).unwrap();
        assert_eq!(config.price_bands.bucket(950.0).unwrap().label, "Occasion");
    }

    #[test]
    fn test_load_rejects_invalid_band_table() {
        let file = write_config(
            r#"{ "rating_bands": [
                {"lower": 0, "upper": 3, "label": "Low"},
                {"lower": 3.5, "upper": 5, "label": "High"}
            ] }"#,
        );
        let err = AnalyticsConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, AnalyticsError::Config { .. }));
        assert!(err.to_string().contains("not contiguous"));
    }

    #[test]
    fn test_load_rejects_empty_separator() {
        let file = write_config(r#"{ "normalize": { "cuisine_separator": "" } }"#);
        assert!(AnalyticsConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AnalyticsConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, AnalyticsError::Config { .. }));
    }
}
