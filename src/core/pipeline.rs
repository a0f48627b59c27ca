use crate::core::reconcile::{apply_actions, plan_actions};
use crate::core::report::render_csv;
use crate::core::{ConfigProvider, Pipeline, Record, Storage, TransformResult};
use crate::domain::model::{OutcomeStatus, PendingTransfer, RecordOutcome, TransferReport};
use crate::domain::ports::TransientService;
use crate::domain::taxonomy::{distinct_labels, normalize_label};
use crate::utils::error::Result;
use chrono::Utc;

/// 讀取輸入 JSON 陣列
pub async fn read_records<S: Storage>(storage: &S, path: &str) -> Result<Vec<Record>> {
    tracing::debug!("Reading records from {}", path);
    let bytes = storage.read_file(path).await?;
    let records: Vec<Record> = serde_json::from_slice(&bytes)?;
    Ok(records)
}

/// 讀取 JSON dump → 正規化標籤 → 與遠端服務比對並更新
pub struct TransferPipeline<S: Storage, C: ConfigProvider, T: TransientService> {
    storage: S,
    config: C,
    service: T,
}

impl<S: Storage, C: ConfigProvider, T: TransientService> TransferPipeline<S, C, T> {
    pub fn new(storage: S, config: C, service: T) -> Self {
        Self {
            storage,
            config,
            service,
        }
    }

    async fn reconcile(&self, pending: &PendingTransfer) -> Result<RecordOutcome> {
        let name = pending.record.name.as_str();
        let remote = self.service.get_source(name).await?;
        let (state, actions) = plan_actions(
            remote.as_ref(),
            &pending.target,
            pending.record.redshift,
            self.config.group_routing(),
        );

        let status = if actions.is_empty() {
            tracing::info!("{}: classification is correct", name);
            OutcomeStatus::Unchanged
        } else if self.config.dry_run() {
            for action in &actions {
                tracing::info!("[dry-run] {} would {}", name, action);
            }
            OutcomeStatus::Planned
        } else {
            apply_actions(&self.service, name, &actions).await?;
            OutcomeStatus::Updated
        };

        Ok(RecordOutcome {
            index: pending.index,
            name: name.to_string(),
            raw_classification: pending.record.classification.clone(),
            target: pending.target,
            remote_state: Some(state),
            actions,
            status,
            error: None,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, T: TransientService> Pipeline for TransferPipeline<S, C, T> {
    async fn extract(&self) -> Result<Vec<Record>> {
        read_records(&self.storage, self.config.input_path()).await
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let total_records = data.len();
        let start_index = self.config.start_index();

        if start_index > total_records {
            tracing::warn!(
                "Start index {} is past the end of the input ({} records)",
                start_index,
                total_records
            );
        }

        let distinct = distinct_labels(data.iter().map(|r| r.classification.as_str()));
        tracing::debug!("Distinct classifications in input: {:?}", distinct);

        let mut pending = Vec::new();
        let mut skipped = 0;

        for (index, record) in data.into_iter().enumerate().skip(start_index) {
            match normalize_label(&record.classification) {
                Some(target) => pending.push(PendingTransfer {
                    index,
                    record,
                    target,
                }),
                None => {
                    tracing::debug!(
                        "Skipping {} with unmapped classification {:?}",
                        record.name,
                        record.classification
                    );
                    skipped += 1;
                }
            }
        }

        Ok(TransformResult {
            total_records,
            pending,
            skipped,
            distinct_labels: distinct,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<TransferReport> {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(result.pending.len());

        for pending in &result.pending {
            tracing::info!("{}/{}", pending.index, result.total_records);

            match self.reconcile(pending).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if self.config.continue_on_error() && e.is_record_scoped() => {
                    tracing::warn!("⚠️ {} failed, continuing: {}", pending.record.name, e);
                    outcomes.push(RecordOutcome {
                        index: pending.index,
                        name: pending.record.name.clone(),
                        raw_classification: pending.record.classification.clone(),
                        target: pending.target,
                        remote_state: None,
                        actions: Vec::new(),
                        status: OutcomeStatus::Failed,
                        error: Some(e.to_string()),
                    });
                }
                Err(e) => {
                    tracing::error!("❌ {} (record {}) failed: {}", pending.record.name, pending.index, e);
                    return Err(e);
                }
            }
        }

        let report_path = match self.config.report_path() {
            Some(path) => {
                let csv = render_csv(&outcomes)?;
                self.storage.write_file(path, &csv).await?;
                tracing::debug!("Report written to {}", path);
                Some(path.to_string())
            }
            None => None,
        };

        Ok(TransferReport {
            started_at,
            finished_at: Utc::now(),
            total_records: result.total_records,
            skipped: result.skipped,
            outcomes,
            report_path,
        })
    }
}
