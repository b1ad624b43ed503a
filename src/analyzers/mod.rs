//! Restaurant aggregation and insight derivation.
//!
//! This module buckets continuous values into configured bands, groups
//! normalized records along each dimension, ranks the resulting tables and
//! derives summary facts from them.

pub mod aggregate;
pub mod analyzer;
pub mod bands;
pub mod insight;
pub mod rank;
pub mod types;
pub mod utility;
