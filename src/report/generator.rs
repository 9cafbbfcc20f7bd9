use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;
use log::info;
use thiserror::Error;

use crate::aggregation::{summarize, AggregationConfig};
use crate::models::SampleSeries;
use crate::report::{
    assembler::ReportAssembler,
    render::ChartRenderer,
    writer::{ImagePlacement, PlacedImage, SpreadsheetWriter, Workbook},
};
use crate::log_info;

const ENABLE_LOGS: bool = true;

pub const OVERVIEW_CHART_NAME: &str = "overview";
pub const TREND_CHART_NAME: &str = "trend";
pub const OVERVIEW_RANGE: &str = "A1:J20";
pub const TREND_RANGE: &str = "A22:J40";

/// Supplies the raw samples for a report, in timestamp order.
pub trait SampleSource {
    fn load_samples(&self) -> impl Future<Output = Result<SampleSeries>> + Send;
}

impl SampleSource for SampleSeries {
    async fn load_samples(&self) -> Result<SampleSeries> {
        Ok(self.clone())
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to load samples")]
    Source(#[source] anyhow::Error),

    #[error("failed to render {chart} chart")]
    Render {
        chart: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write report")]
    Write(#[source] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub aggregation: AggregationConfig,
    pub utc_offset_minutes: i32,
    pub data_sheet: String,
    pub charts_sheet: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationConfig::default(),
            utc_offset_minutes: 0,
            data_sheet: "Data".into(),
            charts_sheet: "Charts".into(),
        }
    }
}

/// Load, summarise, render and write one report.
///
/// Stages run one after another. The first failure aborts the run, so the
/// writer is only reached once both charts rendered.
pub async fn generate_report<S, R, W>(
    source: &S,
    renderer: &R,
    writer: &W,
    config: &ReportConfig,
) -> Result<PathBuf, ReportError>
where
    S: SampleSource,
    R: ChartRenderer,
    W: SpreadsheetWriter,
{
    let series = source
        .load_samples()
        .await
        .map_err(ReportError::Source)?;

    if series.is_empty() {
        info!("No samples recorded; report will contain empty charts");
    }

    let summary = summarize(&series, &config.aggregation);
    log_info!(
        "Summarised {} samples into {} trend points (trend timestamps: {})",
        series.len(),
        summary.trend.len(),
        config.aggregation.trend_timestamp.as_str()
    );

    let assembled = ReportAssembler::new(config.utc_offset_minutes).assemble(
        &series,
        summary.overview.as_ref(),
        &summary.trend,
    );

    let overview_image = renderer
        .render(&assembled.overview_chart)
        .await
        .map_err(|source| ReportError::Render {
            chart: OVERVIEW_CHART_NAME,
            source,
        })?;

    let trend_image = renderer
        .render(&assembled.trend_chart)
        .await
        .map_err(|source| ReportError::Render {
            chart: TREND_CHART_NAME,
            source,
        })?;

    let workbook = Workbook {
        data_sheet: config.data_sheet.clone(),
        rows: assembled.rows,
        images: vec![
            PlacedImage {
                name: OVERVIEW_CHART_NAME.into(),
                image: overview_image,
                placement: ImagePlacement {
                    sheet: config.charts_sheet.clone(),
                    range: OVERVIEW_RANGE.into(),
                },
            },
            PlacedImage {
                name: TREND_CHART_NAME.into(),
                image: trend_image,
                placement: ImagePlacement {
                    sheet: config.charts_sheet.clone(),
                    range: TREND_RANGE.into(),
                },
            },
        ],
    };

    let path = writer
        .write(&workbook)
        .await
        .map_err(ReportError::Write)?;

    info!("Report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn error_chain_names_each_cause_once() {
        let err = anyhow::Error::from(ReportError::Render {
            chart: TREND_CHART_NAME,
            source: anyhow!("boom"),
        });
        assert_eq!(format!("{err:#}"), "failed to render trend chart: boom");

        let err = anyhow::Error::from(ReportError::Write(
            anyhow!("disk full").context("failed to save workbook"),
        ));
        assert_eq!(
            format!("{err:#}"),
            "failed to write report: failed to save workbook: disk full"
        );
    }
}
