use anyhow::{Context, Result};
use rusqlite::params;

use crate::db::{connection::Database, helpers::check_intensity};
use crate::models::{Channel, ChannelValues, Sample, SampleSeries};
use crate::report::SampleSource;

impl Database {
    /// Batch insert samples in a single transaction.
    pub async fn insert_samples(&self, samples: &[Sample]) -> Result<()> {
        let samples = samples.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO expressions (
                        timestamp,
                        neutral,
                        happy,
                        sad,
                        angry,
                        fearful,
                        disgusted,
                        surprised
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )?;

                for sample in &samples {
                    let c = sample.channels.as_array();
                    stmt.execute(params![
                        sample.timestamp,
                        c[0],
                        c[1],
                        c[2],
                        c[3],
                        c[4],
                        c[5],
                        c[6],
                    ])
                    .with_context(|| {
                        format!("failed to insert sample at {}", sample.timestamp)
                    })?;
                }
            }

            tx.commit().context("failed to commit sample batch")?;
            Ok(())
        })
        .await
    }

    /// All samples, oldest first. Rows sharing a timestamp keep insertion order.
    pub async fn get_samples(&self) -> Result<SampleSeries> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT
                    timestamp,
                    neutral,
                    happy,
                    sad,
                    angry,
                    fearful,
                    disgusted,
                    surprised
                FROM expressions
                ORDER BY timestamp ASC, id ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut samples = Vec::new();
            while let Some(row) = rows.next()? {
                let mut channels = ChannelValues::default();
                for (offset, channel) in Channel::ALL.into_iter().enumerate() {
                    let value: f64 = row.get(offset + 1)?;
                    channels.set(channel, check_intensity(value, channel)?);
                }
                samples.push(Sample {
                    timestamp: row.get(0)?,
                    channels,
                });
            }

            Ok(SampleSeries::new(samples))
        })
        .await
    }

    pub async fn count_samples(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM expressions", [], |row| row.get(0))
                .context("failed to count samples")?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
    }
}

impl SampleSource for Database {
    async fn load_samples(&self) -> Result<SampleSeries> {
        self.get_samples().await
    }
}
