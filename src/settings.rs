use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::aggregation::{AggregationConfig, TimestampPolicy};
use crate::report::ReportConfig;

pub const DATABASE_ENV: &str = "EMOTION_REPORT_DB";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportSettings {
    pub database_path: PathBuf,
    pub output_path: PathBuf,
    pub data_sheet: String,
    pub charts_sheet: String,
    pub trend_max_points: usize,
    pub trend_timestamp: TimestampPolicy,
    pub utc_offset_minutes: i32,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        let aggregation = AggregationConfig::default();
        Self {
            database_path: PathBuf::from("emotions.sqlite3"),
            output_path: PathBuf::from("emotion_report.xlsx"),
            data_sheet: "Data".into(),
            charts_sheet: "Charts".into(),
            trend_max_points: aggregation.trend_max_points,
            trend_timestamp: aggregation.trend_timestamp,
            utc_offset_minutes: 0,
            chart_width: 800,
            chart_height: 400,
        }
    }
}

impl ReportSettings {
    /// Read settings from `path`. A missing file gives the defaults, and so
    /// does a malformed one, with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            log::warn!(
                "Ignoring malformed settings in {}: {err}; using defaults",
                path.display()
            );
            Self::default()
        }))
    }

    pub fn report_config(&self) -> ReportConfig {
        ReportConfig {
            aggregation: AggregationConfig {
                trend_max_points: self.trend_max_points.max(1),
                trend_timestamp: self.trend_timestamp,
            },
            utc_offset_minutes: self.utc_offset_minutes,
            data_sheet: self.data_sheet.clone(),
            charts_sheet: self.charts_sheet.clone(),
        }
    }

    /// Apply the database path override from `EMOTION_REPORT_DB`, if set.
    pub fn with_database_override(mut self, database_path: Option<String>) -> Self {
        if let Some(path) = database_path.filter(|p| !p.trim().is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        self
    }
}
