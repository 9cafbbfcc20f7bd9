//! Turns the raw series and its summaries into sheet rows and chart specs.
//!
//! Nothing here touches the filesystem. The output is handed to the chart
//! renderer and the spreadsheet writer by the report generator.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::aggregation::AggregatedSample;
use crate::models::{Channel, SampleSeries};
use crate::report::chart::{ChartSpec, ChartType, Dataset};

/// Category label of the single overview bar group.
pub const OVERVIEW_CATEGORY: &str = "Whole session (compressed)";

/// Smoothing applied to the trend line.
pub const TREND_TENSION: f64 = 0.4;

/// Shown for trend timestamps chrono cannot represent.
const UNREPRESENTABLE_LABEL: &str = "?";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Number(f64),
}

pub type Row = Vec<Cell>;

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledReport {
    /// Header row followed by one row per raw sample.
    pub rows: Vec<Row>,
    pub overview_chart: ChartSpec,
    pub trend_chart: ChartSpec,
}

#[derive(Debug, Clone)]
pub struct ReportAssembler {
    label_offset: FixedOffset,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self {
            label_offset: Utc.fix(),
        }
    }
}

impl ReportAssembler {
    /// Trend labels are rendered at `utc_offset_minutes` east of UTC.
    /// Offsets outside ±24h fall back to UTC.
    pub fn new(utc_offset_minutes: i32) -> Self {
        let label_offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                log::warn!("Ignoring invalid UTC offset of {utc_offset_minutes} minutes");
                Utc.fix()
            });
        Self { label_offset }
    }

    pub fn assemble(
        &self,
        series: &SampleSeries,
        overview: Option<&AggregatedSample>,
        trend: &[AggregatedSample],
    ) -> AssembledReport {
        AssembledReport {
            rows: data_rows(series),
            overview_chart: overview_chart(overview),
            trend_chart: self.trend_chart(trend),
        }
    }

    fn trend_chart(&self, trend: &[AggregatedSample]) -> ChartSpec {
        ChartSpec {
            chart_type: ChartType::Line,
            labels: trend
                .iter()
                .map(|row| self.clock_label(row.timestamp))
                .collect(),
            datasets: channel_datasets(trend),
            tension: Some(TREND_TENSION),
        }
    }

    /// `hour:minute` without zero padding, e.g. `9:5`.
    pub fn clock_label(&self, timestamp_ms: i64) -> String {
        match DateTime::from_timestamp_millis(timestamp_ms) {
            Some(instant) => instant
                .with_timezone(&self.label_offset)
                .format("%-H:%-M")
                .to_string(),
            None => UNREPRESENTABLE_LABEL.to_string(),
        }
    }
}

pub fn header_row() -> Row {
    std::iter::once(Cell::Text("Time".into()))
        .chain(Channel::ALL.iter().map(|c| Cell::Text(c.label().into())))
        .collect()
}

fn data_rows(series: &SampleSeries) -> Vec<Row> {
    let mut rows = Vec::with_capacity(series.len() + 1);
    rows.push(header_row());
    for sample in series.samples() {
        let mut row = Vec::with_capacity(Channel::ALL.len() + 1);
        row.push(Cell::Integer(sample.timestamp));
        row.extend(sample.channels.as_array().iter().map(|&v| Cell::Number(v)));
        rows.push(row);
    }
    rows
}

fn overview_chart(overview: Option<&AggregatedSample>) -> ChartSpec {
    ChartSpec {
        chart_type: ChartType::Bar,
        labels: vec![OVERVIEW_CATEGORY.to_string()],
        datasets: channel_datasets(overview.map(std::slice::from_ref).unwrap_or_default()),
        tension: None,
    }
}

/// One dataset per channel, in canonical channel order.
fn channel_datasets(rows: &[AggregatedSample]) -> Vec<Dataset> {
    Channel::ALL
        .iter()
        .map(|&channel| Dataset {
            label: channel.label().to_string(),
            data: rows.iter().map(|row| row.channels.get(channel)).collect(),
        })
        .collect()
}
