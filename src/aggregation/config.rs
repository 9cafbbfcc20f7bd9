use super::bucket::TimestampPolicy;

/// Tunables for the overview and trend summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationConfig {
    /// Upper bound on trend buckets (points on the line chart)
    pub trend_max_points: usize,

    /// How trend buckets combine their timestamps
    pub trend_timestamp: TimestampPolicy,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            trend_max_points: 20,
            trend_timestamp: TimestampPolicy::Sum,
        }
    }
}
