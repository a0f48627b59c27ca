//! 舊分類標籤 → 服務端 taxonomy 的對照
//!
//! 只做完全比對；表中沒有列出的寫法一律略過。

use crate::domain::model::{CanonicalClassification, CanonicalLabel, Confidence, Record};

use CanonicalLabel::*;
use Confidence::*;

/// (原始標籤, 正規分類, 信心)
const LABEL_TABLE: &[(&str, CanonicalLabel, Confidence)] = &[
    ("TDE", TidalDisruptionEvent, Certain),
    ("TDE?", TidalDisruptionEvent, Tentative),
    ("AGN", Agn, Certain),
    ("CLAGN", Agn, Certain),
    ("Off-nuclear AGN", Agn, Certain),
    ("AGN ", Agn, Certain),
    ("AGN?", Agn, Tentative),
    ("AGN? ", Agn, Tentative),
    ("CLAGN?", Agn, Tentative),
    ("NLS1", Seyfert, Certain),
    ("NLS1?", Seyfert, Tentative),
    ("blazar", Blazar, Certain),
    ("Blazar", Blazar, Certain),
    ("blazar?", Blazar, Tentative),
    ("QSO", Qso, Certain),
    ("quasar", Qso, Certain),
    ("QSO?", Qso, Tentative),
    // Low-ionization nuclear emission-line region
    ("LINER", GalacticNuclei, Certain),
];

/// 將原始標籤轉為正規分類；`None` 代表略過
pub fn normalize_label(raw: &str) -> Option<CanonicalClassification> {
    LABEL_TABLE
        .iter()
        .find(|(known, _, _)| *known == raw)
        .map(|&(_, label, confidence)| CanonicalClassification { label, confidence })
}

/// 依出現順序列出不重複的原始標籤
pub fn distinct_labels<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = Vec::new();
    for label in labels {
        if !seen.iter().any(|s: &String| s == label) {
            seen.push(label.to_string());
        }
    }
    seen
}

/// 輸入中每個不重複標籤的出現次數與對照結果
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSurvey {
    pub raw: String,
    pub count: usize,
    pub mapped: Option<CanonicalClassification>,
}

pub fn survey_labels(records: &[Record]) -> Vec<LabelSurvey> {
    distinct_labels(records.iter().map(|r| r.classification.as_str()))
        .into_iter()
        .map(|raw| LabelSurvey {
            count: records.iter().filter(|r| r.classification == raw).count(),
            mapped: normalize_label(&raw),
            raw,
        })
        .collect()
}
