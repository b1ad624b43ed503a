pub mod analyzers;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod output;
pub mod source;

pub use analyzers::analyzer::{analyze, analyze_records, run};
pub use analyzers::types::{AggregateGroup, Dimension, Report};
pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, Result};
