use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 輸入 JSON 中的一筆記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub classification: String,
    #[serde(default)]
    pub redshift: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalLabel {
    #[serde(rename = "Tidal Disruption Event")]
    TidalDisruptionEvent,
    #[serde(rename = "AGN")]
    Agn,
    Seyfert,
    Blazar,
    #[serde(rename = "QSO")]
    Qso,
    #[serde(rename = "Galactic Nuclei")]
    GalacticNuclei,
}

impl CanonicalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalLabel::TidalDisruptionEvent => "Tidal Disruption Event",
            CanonicalLabel::Agn => "AGN",
            CanonicalLabel::Seyfert => "Seyfert",
            CanonicalLabel::Blazar => "Blazar",
            CanonicalLabel::Qso => "QSO",
            CanonicalLabel::GalacticNuclei => "Galactic Nuclei",
        }
    }

    pub fn is_tde(&self) -> bool {
        matches!(self, CanonicalLabel::TidalDisruptionEvent)
    }
}

impl fmt::Display for CanonicalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Certain,
    Tentative,
}

impl Confidence {
    pub fn probability(&self) -> f64 {
        match self {
            Confidence::Certain => 1.0,
            Confidence::Tentative => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalClassification {
    pub label: CanonicalLabel,
    pub confidence: Confidence,
}

impl CanonicalClassification {
    pub fn probability(&self) -> f64 {
        self.confidence.probability()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteClassification {
    pub classification: String,
    #[serde(default)]
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteGroup {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// 遠端服務上的 source（只取用到的欄位）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSource {
    pub id: String,
    #[serde(default)]
    pub classifications: Vec<RemoteClassification>,
    #[serde(default)]
    pub groups: Vec<RemoteGroup>,
    #[serde(default)]
    pub redshift: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RemoteState {
    Unregistered,
    Unclassified,
    Classified(String),
}

impl RemoteState {
    /// 只比較第一個分類，與服務端列出的順序一致
    pub fn of(source: Option<&RemoteSource>) -> Self {
        match source {
            None => RemoteState::Unregistered,
            Some(source) => match source.classifications.first() {
                None => RemoteState::Unclassified,
                Some(existing) => RemoteState::Classified(existing.classification.clone()),
            },
        }
    }
}

impl fmt::Display for RemoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteState::Unregistered => f.write_str("unregistered"),
            RemoteState::Unclassified => f.write_str("unclassified"),
            RemoteState::Classified(label) => write!(f, "classified:{}", label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransferAction {
    SaveToGroup { group: String },
    PostClassification { label: CanonicalLabel, probability: f64 },
    PatchRedshift { redshift: f64 },
}

impl fmt::Display for TransferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferAction::SaveToGroup { group } => write!(f, "save:{}", group),
            TransferAction::PostClassification { label, probability } => {
                write!(f, "classify:{}@{}", label, probability)
            }
            TransferAction::PatchRedshift { redshift } => write!(f, "redshift:{}", redshift),
        }
    }
}

/// 經過正規化、等待與遠端比對的記錄
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransfer {
    pub index: usize,
    pub record: Record,
    pub target: CanonicalClassification,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub total_records: usize,
    pub pending: Vec<PendingTransfer>,
    pub skipped: usize,
    pub distinct_labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Unchanged,
    Updated,
    Planned,
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeStatus::Unchanged => "unchanged",
            OutcomeStatus::Updated => "updated",
            OutcomeStatus::Planned => "planned",
            OutcomeStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    pub index: usize,
    pub name: String,
    pub raw_classification: String,
    pub target: CanonicalClassification,
    pub remote_state: Option<RemoteState>,
    pub actions: Vec<TransferAction>,
    pub status: OutcomeStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_records: usize,
    pub skipped: usize,
    pub outcomes: Vec<RecordOutcome>,
    pub report_path: Option<String>,
}

impl TransferReport {
    pub fn considered(&self) -> usize {
        self.outcomes.len()
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}
