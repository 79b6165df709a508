use crate::core::{Pipeline, Storage};
use crate::domain::model::{ProcessingStats, RunSummary};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;
use std::path::Path;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Runs extract, transform and load once, in that order.
    pub async fn run(mut self) -> Result<RunSummary> {
        let started_at = Utc::now();
        tracing::info!("Converting FAA data to ETC data format");
        tracing::info!("Source: {}", self.pipeline.source());

        let sources = self.pipeline.extract().await?;
        tracing::info!(
            "Loaded {} bytes of registrations and {} bytes of reference data",
            sources.registration.len(),
            sources.reference.len()
        );
        self.monitor.log_stats("Extract");

        let result = self.pipeline.transform(sources).await?;
        tracing::info!("Transformed {} registrations", result.rows.len());
        self.monitor.log_stats("Transform");

        let output_path = self.pipeline.load(&result).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");

        log_stats_summary(&result.stats);
        self.monitor.log_final_stats();

        Ok(RunSummary {
            source: self.pipeline.source(),
            output_path,
            unresolved_policy: self.pipeline.unresolved_policy(),
            stats: result.stats,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

fn log_stats_summary(stats: &ProcessingStats) {
    tracing::info!(
        "Wrote {} of {} registrations ({} malformed, {} unresolved, {} dropped, {} unknown registrant types)",
        stats.rows_emitted,
        stats.registration_rows,
        stats.malformed_registration_rows,
        stats.unresolved_references,
        stats.dropped_rows,
        stats.unmapped_registrant_types
    );

    if stats.malformed_reference_rows > 0 {
        tracing::warn!(
            "Skipped {} malformed aircraft reference rows",
            stats.malformed_reference_rows
        );
    }
}

pub async fn save_summary<S: Storage>(storage: &S, summary: &RunSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(summary)?;
    storage.write_file(path, &json).await?;
    tracing::info!("Run summary saved to: {}", path.display());
    Ok(())
}
