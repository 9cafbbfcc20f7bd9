use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::models::{ChannelValues, Sample, SampleSeries};

/// A bucket collapsed into a single row. Same shape as a raw sample; each
/// channel holds the bucket mean and the timestamp follows the
/// [`TimestampPolicy`] the bucket was aggregated with.
pub type AggregatedSample = Sample;

/// How the timestamps inside a bucket are combined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
    /// Arithmetic mean, truncated toward zero.
    Mean,
    /// Plain sum. Only meaningful as a timestamp for single-sample buckets.
    Sum,
}

impl TimestampPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampPolicy::Mean => "mean",
            TimestampPolicy::Sum => "sum",
        }
    }
}

/// Nominal bucket size: `ceil(len / target)`, with `target` clamped to 1.
pub fn bucket_size(len: usize, target_bucket_count: usize) -> usize {
    len.div_ceil(target_bucket_count.max(1))
}

/// Contiguous `[start, end)` ranges covering `0..len`.
///
/// Every range holds `bucket_size` indices except possibly the last, which
/// holds the remainder and is never empty.
pub fn bucket_ranges(len: usize, target_bucket_count: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }

    let size = bucket_size(len, target_bucket_count);
    let mut ranges = Vec::with_capacity(len.div_ceil(size));
    let mut start = 0;
    while start < len {
        let end = (start + size).min(len);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Split `series` into at most `target_bucket_count` buckets and average each.
///
/// Empty input yields no buckets. Output order follows input order.
pub fn aggregate(
    series: &SampleSeries,
    target_bucket_count: usize,
    timestamp_policy: TimestampPolicy,
) -> Vec<AggregatedSample> {
    let samples = series.samples();
    bucket_ranges(samples.len(), target_bucket_count)
        .into_iter()
        .map(|range| average_bucket(&samples[range], timestamp_policy))
        .collect()
}

/// Average a non-empty bucket. Divides by the actual sample count.
fn average_bucket(bucket: &[Sample], timestamp_policy: TimestampPolicy) -> AggregatedSample {
    let count = bucket.len();

    let mut sums = [0.0f64; 7];
    let mut mins = [f64::INFINITY; 7];
    let mut maxs = [f64::NEG_INFINITY; 7];
    let mut timestamp_sum: i128 = 0;

    for sample in bucket {
        timestamp_sum += i128::from(sample.timestamp);
        for (i, &value) in sample.channels.as_array().iter().enumerate() {
            sums[i] += value;
            mins[i] = mins[i].min(value);
            maxs[i] = maxs[i].max(value);
        }
    }

    let mut means = [0.0f64; 7];
    for i in 0..means.len() {
        let mean = sums[i] / count as f64;
        // Rounding in the running sum can push the quotient one ulp past the
        // observed extremes; a mean never leaves [min, max]. A channel that
        // was NaN throughout has no extremes.
        means[i] = if mins[i] <= maxs[i] {
            mean.clamp(mins[i], maxs[i])
        } else {
            mean
        };
    }

    let timestamp = match timestamp_policy {
        TimestampPolicy::Mean => timestamp_sum / count as i128,
        TimestampPolicy::Sum => timestamp_sum,
    };

    AggregatedSample {
        timestamp: saturate_i64(timestamp),
        channels: ChannelValues::new(means),
    }
}

fn saturate_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Channel;
    use proptest::prelude::*;

    fn happy_series(values: &[f64]) -> SampleSeries {
        values
            .iter()
            .enumerate()
            .map(|(i, &happy)| {
                let mut channels = [0.0; 7];
                channels[Channel::Happy.index()] = happy;
                Sample::new(1_700_000_000_000 + i as i64 * 1_000, channels)
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn happy(rows: &[AggregatedSample]) -> Vec<f64> {
        rows.iter().map(|row| row.channels.get(Channel::Happy)).collect()
    }

    const TENS: [f64; 10] = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0];

    #[test]
    fn single_bucket_is_whole_series_mean() {
        let rows = aggregate(&happy_series(&TENS), 1, TimestampPolicy::Mean);
        assert_eq!(rows.len(), 1);
        assert_eq!(happy(&rows), vec![45.0]);
    }

    #[test]
    fn uneven_split_leaves_short_last_bucket() {
        let ranges = bucket_ranges(10, 3);
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);

        let rows = aggregate(&happy_series(&TENS), 3, TimestampPolicy::Mean);
        assert_eq!(happy(&rows), vec![15.0, 55.0, 85.0]);
    }

    #[test]
    fn more_buckets_than_samples_keeps_every_sample() {
        let series = happy_series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let rows = aggregate(&series, 20, TimestampPolicy::Sum);
        assert_eq!(rows.as_slice(), series.samples());
    }

    #[test]
    fn empty_series_has_no_buckets() {
        let empty = SampleSeries::default();
        for target in [0, 1, 3, 20] {
            assert!(aggregate(&empty, target, TimestampPolicy::Mean).is_empty());
            assert!(aggregate(&empty, target, TimestampPolicy::Sum).is_empty());
        }
    }

    #[test]
    fn zero_target_is_treated_as_one() {
        let rows = aggregate(&happy_series(&TENS), 0, TimestampPolicy::Mean);
        assert_eq!(happy(&rows), vec![45.0]);
    }

    #[test]
    fn timestamp_policy_mean_and_sum() {
        let series: SampleSeries = vec![
            Sample::new(1_000, [0.0; 7]),
            Sample::new(2_000, [0.0; 7]),
            Sample::new(4_000, [0.0; 7]),
        ]
        .into();

        let mean = aggregate(&series, 1, TimestampPolicy::Mean);
        assert_eq!(mean[0].timestamp, 2_333);

        let sum = aggregate(&series, 1, TimestampPolicy::Sum);
        assert_eq!(sum[0].timestamp, 7_000);
    }

    #[test]
    fn summed_timestamps_saturate() {
        let series: SampleSeries =
            vec![Sample::new(i64::MAX, [0.0; 7]), Sample::new(i64::MAX, [0.0; 7])].into();
        let rows = aggregate(&series, 1, TimestampPolicy::Sum);
        assert_eq!(rows[0].timestamp, i64::MAX);

        let rows = aggregate(&series, 1, TimestampPolicy::Mean);
        assert_eq!(rows[0].timestamp, i64::MAX);
    }

    #[test]
    fn single_bucket_summary_is_idempotent() {
        let series = happy_series(&[0.1, 0.2, 0.7, 0.3]);
        let overview = aggregate(&series, 1, TimestampPolicy::Mean);
        let again = aggregate(&SampleSeries::new(overview.clone()), 1, TimestampPolicy::Mean);
        assert_eq!(again, overview);
    }

    #[test]
    fn all_nan_channel_does_not_panic() {
        let series: SampleSeries = vec![
            Sample::new(0, [f64::NAN; 7]),
            Sample::new(1, [f64::NAN; 7]),
        ]
        .into();
        let rows = aggregate(&series, 1, TimestampPolicy::Mean);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].channels.iter().all(|(_, value)| value.is_nan()));
    }

    fn arb_series(max_len: usize) -> impl Strategy<Value = SampleSeries> {
        prop::collection::vec(
            (0i64..10_000, prop::array::uniform7(0.0f64..1_000.0)),
            0..max_len,
        )
        .prop_map(|rows| {
            let mut timestamp = 1_600_000_000_000i64;
            rows.into_iter()
                .map(|(step, channels)| {
                    timestamp += step;
                    Sample::new(timestamp, channels)
                })
                .collect::<Vec<_>>()
                .into()
        })
    }

    proptest! {
        #[test]
        fn ranges_partition_the_series(len in 0usize..500, target in 1usize..60) {
            let ranges = bucket_ranges(len, target);
            prop_assert!(ranges.len() <= target);

            if len == 0 {
                prop_assert!(ranges.is_empty());
            } else {
                let size = len.div_ceil(target);
                prop_assert_eq!(ranges.len(), len.div_ceil(size));
            }

            let mut expected_start = 0;
            for range in &ranges {
                prop_assert_eq!(range.start, expected_start);
                prop_assert!(range.end > range.start);
                expected_start = range.end;
            }
            prop_assert_eq!(expected_start, len);
        }

        #[test]
        fn bucket_means_stay_within_bucket_extremes(
            series in arb_series(120),
            target in 1usize..30,
        ) {
            let rows = aggregate(&series, target, TimestampPolicy::Mean);
            let ranges = bucket_ranges(series.len(), target);
            prop_assert_eq!(rows.len(), ranges.len());

            for (row, range) in rows.iter().zip(ranges) {
                let bucket = &series.samples()[range];
                for channel in Channel::ALL {
                    let values = bucket.iter().map(|s| s.channels.get(channel));
                    let min = values.clone().fold(f64::INFINITY, f64::min);
                    let max = values.fold(f64::NEG_INFINITY, f64::max);
                    let mean = row.channels.get(channel);
                    prop_assert!(mean >= min && mean <= max);
                }

                let first = bucket[0].timestamp;
                let last = bucket[bucket.len() - 1].timestamp;
                prop_assert!(row.timestamp >= first && row.timestamp <= last);
            }
        }

        #[test]
        fn single_bucket_matches_direct_mean(series in arb_series(150)) {
            prop_assume!(!series.is_empty());
            let rows = aggregate(&series, 1, TimestampPolicy::Mean);
            prop_assert_eq!(rows.len(), 1);

            let count = series.len() as f64;
            for channel in Channel::ALL {
                let expected =
                    series.samples().iter().map(|s| s.channels.get(channel)).sum::<f64>() / count;
                let actual = rows[0].channels.get(channel);
                prop_assert!(
                    (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
                    "{:?}: {} != {}", channel, actual, expected
                );
            }
        }

        #[test]
        fn mean_timestamps_keep_input_order(series in arb_series(200), target in 1usize..25) {
            let rows = aggregate(&series, target, TimestampPolicy::Mean);
            for pair in rows.windows(2) {
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
            }
        }
    }
}
