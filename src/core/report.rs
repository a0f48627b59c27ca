use crate::domain::model::RecordOutcome;
use crate::utils::error::{Result, TransferError};

/// 每筆處理過的記錄輸出一列 CSV
pub fn render_csv(outcomes: &[RecordOutcome]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "index",
        "name",
        "raw_classification",
        "classification",
        "probability",
        "remote_state",
        "actions",
        "status",
        "error",
    ])?;

    for outcome in outcomes {
        let actions = outcome
            .actions
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(";");
        let remote_state = outcome
            .remote_state
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_default();

        writer.write_record([
            outcome.index.to_string(),
            outcome.name.clone(),
            outcome.raw_classification.clone(),
            outcome.target.label.to_string(),
            outcome.target.probability().to_string(),
            remote_state,
            actions,
            outcome.status.to_string(),
            outcome.error.clone().unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| TransferError::ProcessingError {
            message: format!("failed to flush CSV report: {}", e),
        })
}
