use crate::analyzers::types::{AggregateGroup, FieldSummary, ThresholdCount};
use crate::analyzers::utility::pct;
use crate::model::{Field, Restaurant};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use tracing::trace;

/// A statistic to compute per group, on top of the member count every group
/// carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Metric {
    Mean(Field),
    Min(Field),
    Max(Field),
    Sum(Field),
    /// Number of contributors whose value is at or above the threshold.
    AtLeast(Field, f64),
    /// Number of distinct locality strings among the group's records.
    DistinctLocalities,
}

/// Which statistics were requested for one field.
#[derive(Debug, Default)]
struct FieldPlan {
    mean: bool,
    min: bool,
    max: bool,
    sum: bool,
    thresholds: Vec<f64>,
}

fn plan(metrics: &[Metric]) -> BTreeMap<Field, FieldPlan> {
    let mut plans: BTreeMap<Field, FieldPlan> = BTreeMap::new();

    for metric in metrics {
        match metric {
            Metric::Mean(f) => plans.entry(*f).or_default().mean = true,
            Metric::Min(f) => plans.entry(*f).or_default().min = true,
            Metric::Max(f) => plans.entry(*f).or_default().max = true,
            Metric::Sum(f) => plans.entry(*f).or_default().sum = true,
            Metric::AtLeast(f, threshold) => {
                let thresholds = &mut plans.entry(*f).or_default().thresholds;
                if !thresholds.contains(threshold) {
                    thresholds.push(*threshold);
                }
            }
            Metric::DistinctLocalities => {}
        }
    }

    plans
}

#[derive(Debug, Default)]
struct FieldAccumulator {
    contributors: usize,
    missing: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
    at_least: Vec<usize>,
}

impl FieldAccumulator {
    fn push(&mut self, value: f64, plan: &FieldPlan) {
        self.contributors += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));

        if self.at_least.len() != plan.thresholds.len() {
            self.at_least.resize(plan.thresholds.len(), 0);
        }
        for (count, threshold) in self.at_least.iter_mut().zip(&plan.thresholds) {
            if value >= *threshold {
                *count += 1;
            }
        }
    }

    fn finish(&self, plan: &FieldPlan) -> FieldSummary {
        let has_values = self.contributors > 0;

        FieldSummary {
            contributors: self.contributors,
            missing: self.missing,
            mean: (plan.mean && has_values).then(|| self.sum / self.contributors as f64),
            min: if plan.min { self.min } else { None },
            max: if plan.max { self.max } else { None },
            sum: (plan.sum && has_values).then_some(self.sum),
            at_least: plan
                .thresholds
                .iter()
                .enumerate()
                .map(|(i, threshold)| ThresholdCount {
                    threshold: *threshold,
                    count: self.at_least.get(i).copied().unwrap_or(0),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
struct GroupAccumulator {
    member_count: usize,
    distinct_records: usize,
    last_record: Option<usize>,
    fields: BTreeMap<Field, FieldAccumulator>,
    localities: BTreeSet<String>,
}

impl GroupAccumulator {
    /// Counts one mention of the group by `record`. Field statistics and
    /// localities only take each record once, even if it names the key twice.
    fn add(
        &mut self,
        index: usize,
        record: &Restaurant,
        plans: &BTreeMap<Field, FieldPlan>,
        track_localities: bool,
    ) {
        self.member_count += 1;

        if self.last_record == Some(index) {
            return;
        }
        self.last_record = Some(index);
        self.distinct_records += 1;

        for (field, plan) in plans {
            let acc = self.fields.entry(*field).or_default();
            match field.value(record) {
                Some(value) => acc.push(value, plan),
                None => {
                    trace!(
                        field = field.name(),
                        restaurant = %record.name,
                        "Excluding record from field metrics"
                    );
                    acc.missing += 1;
                }
            }
        }

        if track_localities && !record.locality.is_empty() {
            self.localities.insert(record.locality.clone());
        }
    }
}

/// Groups `records` by the keys `key_fn` yields and computes `metrics` per
/// group.
///
/// `key_fn` returns any iterable of keys: an `Option` for single-valued
/// dimensions, a `Vec` for multi-valued ones such as cuisines. Records that
/// yield no key are left out of every group. Groups come back sorted by key.
pub fn aggregate<K, I, F>(records: &[Restaurant], key_fn: F, metrics: &[Metric]) -> Vec<AggregateGroup>
where
    K: Ord + Display,
    I: IntoIterator<Item = K>,
    F: Fn(&Restaurant) -> I,
{
    let plans = plan(metrics);
    let track_localities = metrics.contains(&Metric::DistinctLocalities);

    let mut groups: BTreeMap<K, GroupAccumulator> = BTreeMap::new();
    let mut keyed_records = 0usize;

    for (index, record) in records.iter().enumerate() {
        let mut keyed = false;

        for key in key_fn(record) {
            keyed = true;
            groups
                .entry(key)
                .or_default()
                .add(index, record, &plans, track_localities);
        }

        if keyed {
            keyed_records += 1;
        }
    }

    groups
        .into_iter()
        .map(|(key, acc)| {
            let fields = plans
                .iter()
                .map(|(field, plan)| {
                    let summary = acc
                        .fields
                        .get(field)
                        .map(|f| f.finish(plan))
                        .unwrap_or_default();
                    (*field, summary)
                })
                .collect();

            AggregateGroup {
                key: key.to_string(),
                member_count: acc.member_count,
                distinct_records: acc.distinct_records,
                keyed_records,
                percentage_of_total: pct(acc.member_count, keyed_records),
                market_share: pct(acc.distinct_records, records.len()),
                fields,
                distinct_localities: track_localities.then_some(acc.localities.len()),
            }
        })
        .collect()
}
