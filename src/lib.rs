pub mod aggregation;
pub mod db;
pub mod models;
pub mod report;
pub mod settings;
mod utils;

use std::path::PathBuf;

use anyhow::Context;
use log::info;

use db::Database;
use report::{generate_report, PngChartRenderer, XlsxWriter};
use settings::{ReportSettings, DATABASE_ENV};

pub const SETTINGS_ENV: &str = "EMOTION_REPORT_SETTINGS";
pub const DEBUG_ENV: &str = "EMOTION_REPORT_DEBUG";

/// Generate one report from the configured database and exit.
pub fn run() -> anyhow::Result<()> {
    let debug_mode = std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    utils::logging::init(debug_mode);

    info!("Emotion report starting up...");

    let settings_path = std::env::var_os(SETTINGS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("emotion_report.json"));
    let settings = ReportSettings::load(&settings_path)?
        .with_database_override(std::env::var(DATABASE_ENV).ok());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let database = Database::new(settings.database_path.clone())?;
        info!(
            "Loaded {} samples from {}",
            database.count_samples().await?,
            database.path().display()
        );

        let renderer = PngChartRenderer::new(settings.chart_width, settings.chart_height);
        let writer = XlsxWriter::new(settings.output_path.clone());

        generate_report(&database, &renderer, &writer, &settings.report_config()).await?;
        Ok::<(), anyhow::Error>(())
    })
}
