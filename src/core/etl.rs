use crate::core::Pipeline;
use crate::domain::model::{OutcomeStatus, TransferReport};
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct TransferEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> TransferEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<TransferReport> {
        tracing::info!("Starting bulk transfer...");

        // Extract
        let records = self.pipeline.extract().await?;
        tracing::info!("📥 Read {} records", records.len());
        self.monitor.log_phase("extract");

        // Transform
        let transformed = self.pipeline.transform(records).await?;
        tracing::info!(
            "🏷️ {} records to reconcile, {} with unmapped classifications, {} distinct labels",
            transformed.pending.len(),
            transformed.skipped,
            transformed.distinct_labels.len()
        );
        self.monitor.log_phase("transform");

        // Load
        let report = self.pipeline.load(transformed).await?;
        self.monitor.log_phase("load");

        tracing::info!(
            "✅ Considered {}: {} updated, {} unchanged, {} planned, {} failed",
            report.considered(),
            report.count(OutcomeStatus::Updated),
            report.count(OutcomeStatus::Unchanged),
            report.count(OutcomeStatus::Planned),
            report.count(OutcomeStatus::Failed)
        );

        Ok(report)
    }
}
