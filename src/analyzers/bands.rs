//! Ordered band tables and the bucketizer that maps values onto them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AnalyticsError;

/// One labelled interval of a [`BandTable`].
///
/// `upper` is `None` only for an unbounded final band.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Band {
    pub lower: f64,
    pub upper: Option<f64>,
    pub label: String,
}

impl Band {
    fn new(lower: f64, upper: Option<f64>, label: &str) -> Self {
        Self {
            lower,
            upper,
            label: label.to_string(),
        }
    }

    /// Lower-inclusive, upper-exclusive; `closed` also admits the upper bound.
    pub fn contains(&self, value: f64, closed: bool) -> bool {
        if value < self.lower {
            return false;
        }
        match self.upper {
            None => true,
            Some(upper) if closed => value <= upper,
            Some(upper) => value < upper,
        }
    }
}

/// The band a value fell into. Orders by position in the table so band
/// dimensions sort the way the table reads, not alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BandKey {
    pub ordinal: usize,
    pub label: String,
}

impl fmt::Display for BandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A validated, gap-free sequence of bands.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Vec<Band>", into = "Vec<Band>")]
pub struct BandTable {
    bands: Vec<Band>,
}

impl TryFrom<Vec<Band>> for BandTable {
    type Error = AnalyticsError;

    fn try_from(bands: Vec<Band>) -> Result<Self, Self::Error> {
        let invalid = |reason: String| AnalyticsError::InvalidBandTable { reason };

        if bands.is_empty() {
            return Err(invalid("table has no bands".into()));
        }

        let last = bands.len() - 1;
        for (i, band) in bands.iter().enumerate() {
            if !band.lower.is_finite() {
                return Err(invalid(format!("band '{}' has a non-finite lower bound", band.label)));
            }
            match band.upper {
                Some(upper) if !upper.is_finite() || upper <= band.lower => {
                    return Err(invalid(format!(
                        "band '{}' has upper bound {upper} not above lower bound {}",
                        band.label, band.lower
                    )));
                }
                None if i != last => {
                    return Err(invalid(format!(
                        "band '{}' is unbounded but is not the final band",
                        band.label
                    )));
                }
                _ => {}
            }
            if bands[..i].iter().any(|b| b.label == band.label) {
                return Err(invalid(format!("label '{}' appears more than once", band.label)));
            }
        }

        for pair in bands.windows(2) {
            if pair[0].upper != Some(pair[1].lower) {
                return Err(invalid(format!(
                    "bands '{}' and '{}' are not contiguous",
                    pair[0].label, pair[1].label
                )));
            }
        }

        Ok(Self { bands })
    }
}

impl From<BandTable> for Vec<Band> {
    fn from(table: BandTable) -> Self {
        table.bands
    }
}

impl BandTable {
    /// Dining rating bands.
    ///
    /// | Range      | Label         |
    /// |------------|---------------|
    /// | [0, 2)     | Poor          |
    /// | [2, 3)     | Below Average |
    /// | [3, 4)     | Average       |
    /// | [4, 4.5)   | Good          |
    /// | [4.5, 5]   | Excellent     |
    pub fn rating_bands() -> Self {
        Self {
            bands: vec![
                Band::new(0.0, Some(2.0), "Poor"),
                Band::new(2.0, Some(3.0), "Below Average"),
                Band::new(3.0, Some(4.0), "Average"),
                Band::new(4.0, Some(4.5), "Good"),
                Band::new(4.5, Some(5.0), "Excellent"),
            ],
        }
    }

    /// Price-for-two bands, in rupees.
    ///
    /// | Range         | Label        |
    /// |---------------|--------------|
    /// | [0, 500)      | Budget       |
    /// | [500, 1000)   | Mid-Range    |
    /// | [1000, 2000)  | Premium      |
    /// | [2000, 3000)  | Luxury       |
    /// | >= 3000       | Ultra-Luxury |
    pub fn price_bands() -> Self {
        Self {
            bands: vec![
                Band::new(0.0, Some(500.0), "Budget"),
                Band::new(500.0, Some(1000.0), "Mid-Range"),
                Band::new(1000.0, Some(2000.0), "Premium"),
                Band::new(2000.0, Some(3000.0), "Luxury"),
                Band::new(3000.0, None, "Ultra-Luxury"),
            ],
        }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Finds the band containing `value` by binary search over lower bounds.
    ///
    /// Values below the first lower bound, above a bounded final band, or NaN
    /// have no band.
    pub fn bucket(&self, value: f64) -> Option<BandKey> {
        if value.is_nan() || value < self.bands[0].lower {
            return None;
        }

        let ordinal = self.bands.partition_point(|b| b.lower <= value) - 1;
        let band = &self.bands[ordinal];
        let closed = ordinal == self.bands.len() - 1;

        band.contains(value, closed).then(|| BandKey {
            ordinal,
            label: band.label.clone(),
        })
    }

    /// Labels of `label` and every band after it, i.e. "`label` or better"
    /// for ascending quality tables. `None` if the label is not in the table.
    pub fn labels_from(&self, label: &str) -> Option<Vec<&str>> {
        let start = self.bands.iter().position(|b| b.label == label)?;
        Some(self.bands[start..].iter().map(|b| b.label.as_str()).collect())
    }
}

/// Buckets an optional value; a missing value has no band rather than a
/// default one.
pub fn bucket(value: Option<f64>, table: &BandTable) -> Option<BandKey> {
    value.and_then(|v| table.bucket(v))
}
