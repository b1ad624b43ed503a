use crate::analyzers::aggregate::{Metric, aggregate};
use crate::analyzers::bands::bucket;
use crate::analyzers::insight::generate_insights;
use crate::analyzers::types::{AggregateGroup, DatasetSummary, Dimension, DimensionTables, Report};
use crate::analyzers::utility::mean;
use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::model::{Field, RawRestaurant, Restaurant};
use crate::normalize::normalize_all;
use crate::source::RecordSource;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info};

/// Loads every record from `source` and builds the report.
///
/// Any source failure aborts the run; no partial report is produced.
#[tracing::instrument(skip_all, fields(source = %source.name()))]
pub fn run(source: &dyn RecordSource, config: &AnalyticsConfig) -> Result<Report> {
    let raw = source.load()?;
    Ok(analyze(&raw, config))
}

/// Normalizes raw records and builds the report.
pub fn analyze(raw: &[RawRestaurant], config: &AnalyticsConfig) -> Report {
    let records = normalize_all(raw, &config.normalize);
    analyze_records(&records, config)
}

/// Builds every dimension table, ranks it, and derives the insights.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn analyze_records(records: &[Restaurant], config: &AnalyticsConfig) -> Report {
    let mut dimensions = DimensionTables::new();

    for dimension in Dimension::ALL {
        let groups = dimension_groups(dimension, records, config);
        let ranked = config.rank_spec(dimension).apply(&groups);
        debug!(
            %dimension,
            groups = groups.len(),
            ranked = ranked.len(),
            "Dimension aggregated"
        );
        dimensions.insert(dimension, ranked);
    }

    let insights = generate_insights(&dimensions, &config.rating_bands, &config.insights);
    let summary = summarize(records);

    info!(
        records = summary.total_records,
        insights = insights.len(),
        "Report built"
    );

    Report {
        schema_version: 1,
        generated_at: Utc::now(),
        summary,
        dimensions,
        insights,
    }
}

/// Aggregates `records` along one dimension, before ranking.
pub fn dimension_groups(
    dimension: Dimension,
    records: &[Restaurant],
    config: &AnalyticsConfig,
) -> Vec<AggregateGroup> {
    use Field::{DiningRating, PriceForTwo, ReviewCount};

    match dimension {
        Dimension::Cuisine => aggregate(
            records,
            |r| r.cuisines.clone(),
            &[
                Metric::Mean(DiningRating),
                Metric::Mean(PriceForTwo),
                Metric::Sum(ReviewCount),
            ],
        ),
        Dimension::City => aggregate(
            records,
            |r| r.city.clone(),
            &[
                Metric::Mean(DiningRating),
                Metric::Mean(PriceForTwo),
                Metric::Sum(ReviewCount),
                Metric::AtLeast(DiningRating, config.insights.excellent_rating),
                Metric::DistinctLocalities,
            ],
        ),
        Dimension::Locality => aggregate(
            records,
            |r| (!r.locality.is_empty()).then(|| r.locality.clone()),
            &[Metric::Mean(DiningRating), Metric::Mean(PriceForTwo)],
        ),
        Dimension::RatingBand => aggregate(
            records,
            |r| bucket(r.dining_rating, &config.rating_bands),
            &[Metric::Mean(ReviewCount), Metric::Mean(PriceForTwo)],
        ),
        Dimension::PriceBand => aggregate(
            records,
            |r| bucket(r.price_for_2, &config.price_bands),
            &[
                Metric::Mean(DiningRating),
                Metric::Min(PriceForTwo),
                Metric::Max(PriceForTwo),
                Metric::Mean(PriceForTwo),
            ],
        ),
    }
}

/// Whole-dataset counts and means. Means skip records without a value.
pub fn summarize(records: &[Restaurant]) -> DatasetSummary {
    let ratings: Vec<f64> = records.iter().filter_map(|r| r.dining_rating).collect();
    let prices: Vec<f64> = records.iter().filter_map(|r| r.price_for_2).collect();
    let unique_names: HashSet<&str> = records.iter().map(|r| r.name.as_str()).collect();

    DatasetSummary {
        total_records: records.len(),
        unique_names: unique_names.len(),
        rated_records: ratings.len(),
        priced_records: prices.len(),
        mean_rating: mean(&ratings),
        mean_price_for_two: mean(&prices),
        malformed_localities: records.iter().filter(|r| r.city.is_none()).count(),
    }
}
