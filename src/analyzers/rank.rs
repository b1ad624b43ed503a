//! Support filtering, multi-key ordering and top-N truncation of aggregate
//! groups.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::analyzers::types::AggregateGroup;
use crate::model::Field;

/// A group attribute that can be ranked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Key,
    MemberCount,
    DistinctRecords,
    Mean(Field),
    Min(Field),
    Max(Field),
    Sum(Field),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SortKey {
    pub field: SortField,
    pub direction: Direction,
}

impl SortKey {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Ascending,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Descending,
        }
    }

    fn compare(&self, a: &AggregateGroup, b: &AggregateGroup) -> Ordering {
        let ordering = match self.field {
            SortField::Key => a.key.cmp(&b.key),
            SortField::MemberCount => a.member_count.cmp(&b.member_count),
            SortField::DistinctRecords => a.distinct_records.cmp(&b.distinct_records),
            SortField::Mean(f) => return self.compare_optional(a.mean(f), b.mean(f)),
            SortField::Min(f) => return self.compare_optional(a.min(f), b.min(f)),
            SortField::Max(f) => return self.compare_optional(a.max(f), b.max(f)),
            SortField::Sum(f) => return self.compare_optional(a.sum(f), b.sum(f)),
        };
        self.directed(ordering)
    }

    /// Groups without a value go last in either direction.
    fn compare_optional(&self, a: Option<f64>, b: Option<f64>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => self.directed(a.total_cmp(&b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    fn directed(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// Filters, orders and truncates `groups`.
///
/// Groups with fewer than `min_support` members are dropped. The rest are
/// stably sorted by `sort_keys`, each key only breaking ties left by the keys
/// before it, and the first `top_n` are returned. An empty `sort_keys` keeps
/// the incoming order.
pub fn rank(
    groups: &[AggregateGroup],
    sort_keys: &[SortKey],
    min_support: usize,
    top_n: usize,
) -> Vec<AggregateGroup> {
    let mut ranked: Vec<AggregateGroup> = groups
        .iter()
        .filter(|g| g.member_count >= min_support)
        .cloned()
        .collect();

    ranked.sort_by(|a, b| {
        sort_keys
            .iter()
            .map(|key| key.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(top_n);

    ranked
}

/// How one dimension's table is ranked.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RankSpec {
    pub min_support: usize,
    /// `None` keeps every group that passes the support filter.
    pub top_n: Option<usize>,
    pub sort: Vec<SortKey>,
}

impl Default for RankSpec {
    fn default() -> Self {
        Self {
            min_support: 1,
            top_n: None,
            sort: Vec::new(),
        }
    }
}

impl RankSpec {
    pub fn apply(&self, groups: &[AggregateGroup]) -> Vec<AggregateGroup> {
        rank(
            groups,
            &self.sort,
            self.min_support,
            self.top_n.unwrap_or(usize::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::FieldSummary;
    use std::collections::BTreeMap;

    fn group(key: &str, member_count: usize, mean_rating: Option<f64>) -> AggregateGroup {
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
            keyed_records: 0,
            percentage_of_total: 0.0,
            market_share: 0.0,
            fields,
            distinct_localities: None,
        }
    }

    fn keys(groups: &[AggregateGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.key.as_str()).collect()
    }

    fn by_rating() -> Vec<SortKey> {
        vec![SortKey::descending(SortField::Mean(Field::DiningRating))]
    }

    #[test]
    fn test_city_scenario_min_support() {
        let groups = vec![group("Gurgaon", 2, Some(3.85)), group("New Delhi", 1, Some(4.8))];

        assert_eq!(keys(&rank(&groups, &by_rating(), 1, 10)), vec!["New Delhi", "Gurgaon"]);
        assert_eq!(keys(&rank(&groups, &by_rating(), 2, 10)), vec!["Gurgaon"]);
    }

    #[test]
    fn test_min_support_boundary() {
        let groups = vec![group("at", 3, Some(4.0)), group("below", 2, Some(4.9))];
        assert_eq!(keys(&rank(&groups, &[], 3, 10)), vec!["at"]);
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let groups = vec![
            group("a", 5, Some(4.0)),
            group("b", 9, Some(3.0)),
            group("c", 5, Some(4.5)),
        ];
        let sort = vec![
            SortKey::descending(SortField::MemberCount),
            SortKey::descending(SortField::Mean(Field::DiningRating)),
        ];
        assert_eq!(keys(&rank(&groups, &sort, 1, 10)), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let groups = vec![group("x", 2, Some(4.0)), group("y", 2, Some(4.0)), group("z", 2, Some(4.0))];
        assert_eq!(keys(&rank(&groups, &by_rating(), 1, 10)), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_missing_values_sort_last_both_directions() {
        let groups = vec![group("none", 1, None), group("low", 1, Some(1.0)), group("high", 1, Some(5.0))];

        assert_eq!(keys(&rank(&groups, &by_rating(), 1, 10)), vec!["high", "low", "none"]);

        let ascending = vec![SortKey::ascending(SortField::Mean(Field::DiningRating))];
        assert_eq!(keys(&rank(&groups, &ascending, 1, 10)), vec!["low", "high", "none"]);
    }

    #[test]
    fn test_top_n_truncates_without_padding() {
        let groups = vec![group("a", 3, None), group("b", 2, None), group("c", 1, None)];
        let sort = vec![SortKey::descending(SortField::MemberCount)];

        assert_eq!(keys(&rank(&groups, &sort, 1, 2)), vec!["a", "b"]);
        assert_eq!(keys(&rank(&groups, &sort, 1, 10)).len(), 3);
        assert!(rank(&groups, &sort, 1, 0).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(&[], &by_rating(), 1, 5).is_empty());
    }

    #[test]
    fn test_rank_is_idempotent() {
        let groups = vec![
            group("a", 4, Some(4.1)),
            group("b", 4, Some(4.1)),
            group("c", 7, Some(3.9)),
            group("d", 1, None),
        ];
        let sort = vec![
            SortKey::descending(SortField::Mean(Field::DiningRating)),
            SortKey::ascending(SortField::Key),
        ];
        let once = rank(&groups, &sort, 1, 10);
        let twice = rank(&once, &sort, 1, 10);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rank_spec_from_json() {
        let json = r#"{
            "min_support": 5,
            "top_n": 15,
            "sort": [
                {"field": "member_count", "direction": "descending"},
                {"field": {"mean": "dining_rating"}, "direction": "descending"}
            ]
        }"#;
        let spec: RankSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.min_support, 5);
        assert_eq!(spec.top_n, Some(15));
        assert_eq!(
            spec.sort[1],
            SortKey::descending(SortField::Mean(Field::DiningRating))
        );
    }
}
