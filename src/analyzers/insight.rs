//! Summary facts derived from ranked aggregate tables.
//!
//! Derivation only reads the tables; wording and rounding are left to the
//! presentation layer.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analyzers::bands::BandTable;
use crate::analyzers::types::{AggregateGroup, Dimension, DimensionTables};
use crate::model::Field;

/// Thresholds and band labels the insight facts are built around.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Mean rating a cuisine needs to count as high-rated.
    pub high_rating_threshold: f64,
    /// Rating at which a restaurant counts as excellent in city tables.
    pub excellent_rating: f64,
    /// Rating band that starts the "good or better" super-band.
    pub good_band_label: String,
    /// Rating band that starts the "excellent or better" super-band.
    pub excellent_band_label: String,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            high_rating_threshold: 4.3,
            excellent_rating: 4.5,
            good_band_label: "Good".into(),
            excellent_band_label: "Excellent".into(),
        }
    }
}

/// A single derived fact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsightFact {
    /// The first group of a table ranked by size.
    MostPopular {
        dimension: Dimension,
        key: String,
        member_count: usize,
        market_share: f64,
        mean_rating: Option<f64>,
    },
    /// The group with the highest mean rating; first one wins ties.
    BestRated {
        dimension: Dimension,
        key: String,
        mean_rating: f64,
    },
    /// Number of groups whose mean of `field` is at or above `threshold`.
    ThresholdCount {
        dimension: Dimension,
        field: Field,
        threshold: f64,
        count: usize,
    },
    /// Number of groups in a table.
    GroupsCovered { dimension: Dimension, count: usize },
    /// Summed percentage of the bands from `from_label` onwards.
    BandShare {
        dimension: Dimension,
        from_label: String,
        percentage: f64,
    },
    /// The table for `dimension` was empty.
    NoData { dimension: Dimension },
}

fn table(tables: &DimensionTables, dimension: Dimension) -> &[AggregateGroup] {
    tables.get(&dimension).map(Vec::as_slice).unwrap_or(&[])
}

fn most_popular(dimension: Dimension, groups: &[AggregateGroup]) -> Option<InsightFact> {
    groups.first().map(|g| InsightFact::MostPopular {
        dimension,
        key: g.key.clone(),
        member_count: g.member_count,
        market_share: g.market_share,
        mean_rating: g.mean(Field::DiningRating),
    })
}

fn best_rated(dimension: Dimension, groups: &[AggregateGroup]) -> Option<InsightFact> {
    let mut best: Option<(&AggregateGroup, f64)> = None;

    for group in groups {
        if let Some(rating) = group.mean(Field::DiningRating) {
            if best.is_none_or(|(_, top)| rating > top) {
                best = Some((group, rating));
            }
        }
    }

    best.map(|(g, mean_rating)| InsightFact::BestRated {
        dimension,
        key: g.key.clone(),
        mean_rating,
    })
}

fn band_share(
    dimension: Dimension,
    groups: &[AggregateGroup],
    bands: &BandTable,
    from_label: &str,
) -> Option<InsightFact> {
    let Some(labels) = bands.labels_from(from_label) else {
        warn!(%dimension, label = from_label, "Band label not in table, skipping share");
        return None;
    };

    let percentage = groups
        .iter()
        .filter(|g| labels.contains(&g.key.as_str()))
        .map(|g| g.percentage_of_total)
        .sum();

    Some(InsightFact::BandShare {
        dimension,
        from_label: from_label.to_string(),
        percentage,
    })
}

fn cuisine_facts(groups: &[AggregateGroup], config: &InsightConfig) -> Vec<InsightFact> {
    let high_rated = groups
        .iter()
        .filter(|g| {
            g.mean(Field::DiningRating)
                .is_some_and(|m| m >= config.high_rating_threshold)
        })
        .count();

    most_popular(Dimension::Cuisine, groups)
        .into_iter()
        .chain(Some(InsightFact::ThresholdCount {
            dimension: Dimension::Cuisine,
            field: Field::DiningRating,
            threshold: config.high_rating_threshold,
            count: high_rated,
        }))
        .collect()
}

fn city_facts(groups: &[AggregateGroup]) -> Vec<InsightFact> {
    most_popular(Dimension::City, groups)
        .into_iter()
        .chain(best_rated(Dimension::City, groups))
        .chain(Some(InsightFact::GroupsCovered {
            dimension: Dimension::City,
            count: groups.len(),
        }))
        .collect()
}

fn rating_facts(
    groups: &[AggregateGroup],
    bands: &BandTable,
    config: &InsightConfig,
) -> Vec<InsightFact> {
    [&config.excellent_band_label, &config.good_band_label]
        .into_iter()
        .filter_map(|label| band_share(Dimension::RatingBand, groups, bands, label))
        .collect()
}

/// Derives the insight facts from already ranked tables.
///
/// Every dimension with an empty (or absent) table contributes a single
/// [`InsightFact::NoData`] instead of its usual facts.
pub fn generate_insights(
    tables: &DimensionTables,
    rating_bands: &BandTable,
    config: &InsightConfig,
) -> Vec<InsightFact> {
    let mut facts = Vec::new();

    for dimension in [
        Dimension::Cuisine,
        Dimension::City,
        Dimension::RatingBand,
        Dimension::Locality,
        Dimension::PriceBand,
    ] {
        let groups = table(tables, dimension);
        if groups.is_empty() {
            facts.push(InsightFact::NoData { dimension });
            continue;
        }

        match dimension {
            Dimension::Cuisine => facts.extend(cuisine_facts(groups, config)),
            Dimension::City => facts.extend(city_facts(groups)),
            Dimension::RatingBand => facts.extend(rating_facts(groups, rating_bands, config)),
            Dimension::Locality | Dimension::PriceBand => {
                facts.extend(best_rated(dimension, groups))
            }
        }
    }

    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::FieldSummary;
    use std::collections::BTreeMap;

    fn group(key: &str, member_count: usize, mean_rating: Option<f64>, pct: f64) -> AggregateGroup {
        let mut fields = BTreeMap::new();
        fields.insert(
            Field::DiningRating,
            FieldSummary {
                contributors: member_count,
                mean: mean_rating,
                ..Default::default()
            },
        );
        AggregateGroup {
            key: key.into(),
            member_count,
            distinct_records: member_count,
            keyed_records: 100,
            percentage_of_total: pct,
            market_share: pct,
            fields,
            distinct_localities: None,
        }
    }

    fn tables() -> DimensionTables {
        let mut t = DimensionTables::new();
        t.insert(
            Dimension::Cuisine,
            vec![
                group("North Indian", 40, Some(4.1), 40.0),
                group("Chinese", 30, Some(4.35), 30.0),
                group("Cafe", 10, Some(4.3), 10.0),
            ],
        );
        t.insert(
            Dimension::City,
            vec![
                group("New Delhi", 50, Some(4.0), 50.0),
                group("Gurgaon", 30, Some(4.4), 30.0),
                group("Noida", 20, Some(4.4), 20.0),
            ],
        );
        t.insert(
            Dimension::RatingBand,
            vec![
                group("Average", 40, None, 40.0),
                group("Good", 35, None, 35.0),
                group("Excellent", 25, None, 25.0),
            ],
        );
        t.insert(Dimension::Locality, vec![group("Khan Market, New Delhi", 5, Some(4.7), 5.0)]);
        t
    }

    #[test]
    fn test_cuisine_facts() {
        let facts = generate_insights(&tables(), &BandTable::rating_bands(), &InsightConfig::default());

        assert!(facts.contains(&InsightFact::MostPopular {
            dimension: Dimension::Cuisine,
            key: "North Indian".into(),
            member_count: 40,
            market_share: 40.0,
            mean_rating: Some(4.1),
        }));
        assert!(facts.contains(&InsightFact::ThresholdCount {
            dimension: Dimension::Cuisine,
            field: Field::DiningRating,
            threshold: 4.3,
            count: 2,
        }));
    }

    #[test]
    fn test_best_rated_city_first_wins_ties() {
        let facts = generate_insights(&tables(), &BandTable::rating_bands(), &InsightConfig::default());

        assert!(facts.contains(&InsightFact::BestRated {
            dimension: Dimension::City,
            key: "Gurgaon".into(),
            mean_rating: 4.4,
        }));
        assert!(facts.contains(&InsightFact::GroupsCovered {
            dimension: Dimension::City,
            count: 3,
        }));
    }

    #[test]
    fn test_band_shares() {
        let facts = generate_insights(&tables(), &BandTable::rating_bands(), &InsightConfig::default());

        let shares: Vec<_> = facts
            .iter()
            .filter_map(|f| match f {
                InsightFact::BandShare { from_label, percentage, .. } => Some((from_label.as_str(), *percentage)),
                _ => None,
            })
            .collect();
        assert_eq!(shares, vec![("Excellent", 25.0), ("Good", 60.0)]);
    }

    #[test]
    fn test_unknown_band_label_is_skipped() {
        let config = InsightConfig {
            excellent_band_label: "Outstanding".into(),
            ..Default::default()
        };
        let facts = generate_insights(&tables(), &BandTable::rating_bands(), &config);
        let shares = facts
            .iter()
            .filter(|f| matches!(f, InsightFact::BandShare { .. }))
            .count();
        assert_eq!(shares, 1);
    }

    #[test]
    fn test_empty_tables_yield_no_data() {
        let mut t = tables();
        t.insert(Dimension::Cuisine, vec![]);

        let facts = generate_insights(&t, &BandTable::rating_bands(), &InsightConfig::default());

        assert!(facts.contains(&InsightFact::NoData { dimension: Dimension::Cuisine }));
        assert!(facts.contains(&InsightFact::NoData { dimension: Dimension::PriceBand }));
        assert!(!facts.iter().any(|f| matches!(
            f,
            InsightFact::ThresholdCount { dimension: Dimension::Cuisine, .. }
        )));
    }

    #[test]
    fn test_all_tables_empty() {
        let facts = generate_insights(&DimensionTables::new(), &BandTable::rating_bands(), &InsightConfig::default());
        assert_eq!(facts.len(), Dimension::ALL.len());
        assert!(facts.iter().all(|f| matches!(f, InsightFact::NoData { .. })));
    }

    #[test]
    fn test_fact_serializes_with_kind_tag() {
        let fact = InsightFact::NoData { dimension: Dimension::PriceBand };
        assert_eq!(
            serde_json::to_string(&fact).unwrap(),
            r#"{"kind":"no_data","dimension":"price_band"}"#
        );
    }
}
