use crate::domain::model::{CanonicalClassification, RemoteSource, RemoteState, TransferAction};
use crate::domain::ports::{GroupRouting, TransientService};
use crate::utils::error::Result;

/// 比對遠端狀態後決定要送出的動作
///
/// - 未註冊：先存入群組，再分類
/// - 已註冊但無分類、或第一個分類不同：送出分類
/// - 分類已相同：不送分類
/// - TDE 且有 redshift：一律更新 redshift
pub fn plan_actions(
    remote: Option<&RemoteSource>,
    target: &CanonicalClassification,
    redshift: Option<f64>,
    routing: &GroupRouting,
) -> (RemoteState, Vec<TransferAction>) {
    let state = RemoteState::of(remote);
    let mut actions = Vec::new();
    let classify = TransferAction::PostClassification {
        label: target.label,
        probability: target.probability(),
    };

    match &state {
        RemoteState::Unregistered => {
            actions.push(TransferAction::SaveToGroup {
                group: routing.group_for(target.label).to_string(),
            });
            actions.push(classify);
        }
        RemoteState::Unclassified => actions.push(classify),
        RemoteState::Classified(existing) if existing == target.label.as_str() => {}
        RemoteState::Classified(_) => actions.push(classify),
    }

    if target.label.is_tde() {
        if let Some(redshift) = redshift {
            actions.push(TransferAction::PatchRedshift { redshift });
        }
    }

    (state, actions)
}

/// 依序執行動作；遇到第一個錯誤即停止
pub async fn apply_actions<T: TransientService + ?Sized>(
    service: &T,
    name: &str,
    actions: &[TransferAction],
) -> Result<()> {
    for action in actions {
        match action {
            TransferAction::SaveToGroup { group } => {
                tracing::info!("Saving {} to {}", name, group);
                service.save_to_group(name, group).await?;
            }
            TransferAction::PostClassification { label, probability } => {
                tracing::info!("Classify {} as {} (p={})", name, label, probability);
                service.post_classification(name, *label, *probability).await?;
            }
            TransferAction::PatchRedshift { redshift } => {
                tracing::info!("Set redshift of {} to {}", name, redshift);
                service.patch_redshift(name, *redshift).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CanonicalLabel, RemoteClassification};
    use crate::domain::taxonomy::normalize_label;

    fn source(classifications: &[&str]) -> RemoteSource {
        RemoteSource {
            id: "ZTF20abcdefg".to_string(),
            classifications: classifications
                .iter()
                .map(|c| RemoteClassification {
                    classification: c.to_string(),
                    probability: Some(1.0),
                })
                .collect(),
            groups: vec![],
            redshift: None,
        }
    }

    fn target(raw: &str) -> CanonicalClassification {
        normalize_label(raw).unwrap()
    }

    #[test]
    fn test_unregistered_qso_saves_then_classifies() {
        let (state, actions) =
            plan_actions(None, &target("QSO"), None, &GroupRouting::default());

        assert_eq!(state, RemoteState::Unregistered);
        assert_eq!(
            actions,
            vec![
                TransferAction::SaveToGroup {
                    group: "Nuclear Transients".to_string()
                },
                TransferAction::PostClassification {
                    label: CanonicalLabel::Qso,
                    probability: 1.0
                },
            ]
        );
    }

    #[test]
    fn test_unregistered_tde_goes_to_tde_group_and_patches_redshift() {
        let (_, actions) =
            plan_actions(None, &target("TDE?"), Some(0.07), &GroupRouting::default());

        assert_eq!(
            actions,
            vec![
                TransferAction::SaveToGroup {
                    group: "Tidal Disruption Events".to_string()
                },
                TransferAction::PostClassification {
                    label: CanonicalLabel::TidalDisruptionEvent,
                    probability: 0.5
                },
                TransferAction::PatchRedshift { redshift: 0.07 },
            ]
        );
    }

    #[test]
    fn test_unclassified_source_gets_classification_only() {
        let remote = source(&[]);
        let (state, actions) =
            plan_actions(Some(&remote), &target("NLS1"), Some(0.2), &GroupRouting::default());

        assert_eq!(state, RemoteState::Unclassified);
        assert_eq!(
            actions,
            vec![TransferAction::PostClassification {
                label: CanonicalLabel::Seyfert,
                probability: 1.0
            }]
        );
    }

    #[test]
    fn test_matching_classification_is_noop() {
        let remote = source(&["AGN"]);
        let (state, actions) =
            plan_actions(Some(&remote), &target("CLAGN?"), None, &GroupRouting::default());

        assert_eq!(state, RemoteState::Classified("AGN".to_string()));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_matching_tde_still_patches_redshift() {
        let remote = source(&["Tidal Disruption Event"]);
        let (_, actions) =
            plan_actions(Some(&remote), &target("TDE"), Some(0.015), &GroupRouting::default());

        assert_eq!(actions, vec![TransferAction::PatchRedshift { redshift: 0.015 }]);
    }

    #[test]
    fn test_only_first_remote_classification_is_compared() {
        let remote = source(&["Blazar", "QSO"]);
        let (_, actions) =
            plan_actions(Some(&remote), &target("quasar"), None, &GroupRouting::default());

        assert_eq!(
            actions,
            vec![TransferAction::PostClassification {
                label: CanonicalLabel::Qso,
                probability: 1.0
            }]
        );
    }
}
