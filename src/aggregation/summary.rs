use crate::aggregation::{
    bucket::{aggregate, AggregatedSample, TimestampPolicy},
    config::AggregationConfig,
};
use crate::models::SampleSeries;

/// Both derived series a report is drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// `None` when the series is empty.
    pub overview: Option<AggregatedSample>,
    pub trend: Vec<AggregatedSample>,
}

/// Whole-series averages: a single bucket with the mean timestamp.
pub fn build_overview(series: &SampleSeries) -> Option<AggregatedSample> {
    aggregate(series, 1, TimestampPolicy::Mean).into_iter().next()
}

/// At most `config.trend_max_points` buckets for the trend line.
pub fn build_trend(series: &SampleSeries, config: &AggregationConfig) -> Vec<AggregatedSample> {
    aggregate(series, config.trend_max_points, config.trend_timestamp)
}

pub fn summarize(series: &SampleSeries, config: &AggregationConfig) -> Summary {
    Summary {
        overview: build_overview(series),
        trend: build_trend(series, config),
    }
}
