pub mod bucket;
pub mod config;
pub mod summary;

pub use bucket::{aggregate, bucket_ranges, AggregatedSample, TimestampPolicy};
pub use config::AggregationConfig;
pub use summary::{build_overview, build_trend, summarize, Summary};
