use anyhow::Result;
use fritz_transfer::core::{Pipeline, TransientService};
use fritz_transfer::domain::model::OutcomeStatus;
use fritz_transfer::{
    Credentials, FritzClient, LocalStorage, Settings, TransferConfig, TransferEngine,
    TransferError, TransferPipeline,
};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;
use tempfile::TempDir;

fn settings_for(server: &MockServer, input_path: &str) -> Settings {
    let mut transfer = TransferConfig::default();
    transfer.service.base_url = server.url("/");
    Settings::new(input_path, transfer)
}

fn client_for(settings: &Settings) -> FritzClient {
    FritzClient::new(
        settings.service(),
        Credentials::new("classify-tok", "upload-tok"),
    )
    .unwrap()
}

fn write_input(dir: &TempDir, records: serde_json::Value) -> String {
    let path = dir.path().join("dump.json");
    std::fs::write(&path, records.to_string()).unwrap();
    path.to_str().unwrap().to_string()
}

fn mock_groups(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/groups")
            .query_param("name", "Nuclear Transients")
            .header("Authorization", "token classify-tok");
        then.status(200).json_body(json!({
            "status": "success",
            "data": [{"id": 41, "name": "Nuclear Transients"}]
        }));
    })
}

fn mock_unregistered<'a>(server: &'a MockServer, name: &str) -> httpmock::Mock<'a> {
    let path = format!("/api/sources/{}", name);
    server.mock(|when, then| {
        when.method(GET).path(path);
        then.status(400).json_body(json!({
            "status": "error",
            "message": "Source not found",
            "data": {}
        }));
    })
}

fn mock_registered<'a>(
    server: &'a MockServer,
    name: &str,
    classifications: serde_json::Value,
) -> httpmock::Mock<'a> {
    let path = format!("/api/sources/{}", name);
    let body = json!({
        "status": "success",
        "data": {"id": name, "classifications": classifications, "groups": []}
    });
    server.mock(|when, then| {
        when.method(GET).path(path);
        then.status(200).json_body(body);
    })
}

/// 未註冊的 QSO：先存入 Nuclear Transients，再以 1.0 分類
#[tokio::test]
async fn test_unregistered_qso_is_saved_then_classified() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let input = write_input(
        &temp_dir,
        json!([{"name": "ZTF19abcdefg", "classification": "QSO", "redshift": 1.1}]),
    );

    let source_mock = mock_unregistered(&server, "ZTF19abcdefg");
    let groups_mock = mock_groups(&server);
    let save_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/alerts/ztf/ZTF19abcdefg")
            .header("Authorization", "token classify-tok")
            .json_body(json!({"group_ids": [41]}));
        then.status(200).json_body(json!({"status": "success"}));
    });
    let classify_mock = server.mock(|when, then| {
        when.method(POST).path("/api/classification").json_body(json!({
            "obj_id": "ZTF19abcdefg",
            "classification": "QSO",
            "taxonomy_id": 1,
            "probability": 1.0
        }));
        then.status(200).json_body(json!({"status": "success"}));
    });
    let patch_mock = server.mock(|when, then| {
        when.method(PATCH).path("/api/sources/ZTF19abcdefg");
        then.status(200).json_body(json!({"status": "success"}));
    });

    let settings = settings_for(&server, &input);
    let client = client_for(&settings);
    let pipeline = TransferPipeline::new(LocalStorage::default(), settings, client);
    let report = TransferEngine::new(pipeline).run().await?;

    source_mock.assert();
    groups_mock.assert();
    save_mock.assert();
    classify_mock.assert();
    patch_mock.assert_hits(0);
    assert_eq!(report.count(OutcomeStatus::Updated), 1);
    Ok(())
}

/// 遠端已是相同分類時不送出任何 POST
#[tokio::test]
async fn test_matching_remote_state_issues_no_post() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let input = write_input(
        &temp_dir,
        json!([{"name": "ZTF20aaaaaaa", "classification": "NLS1?", "redshift": null}]),
    );

    let source_mock = mock_registered(
        &server,
        "ZTF20aaaaaaa",
        json!([{"classification": "Seyfert", "probability": 0.5}]),
    );
    let post_mock = server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(json!({"status": "success"}));
    });

    let settings = settings_for(&server, &input);
    let client = client_for(&settings);
    let pipeline = TransferPipeline::new(LocalStorage::default(), settings, client);
    let engine = TransferEngine::new(pipeline);

    // 連續跑兩次結果一致
    for _ in 0..2 {
        let report = engine.run().await?;
        assert_eq!(report.count(OutcomeStatus::Unchanged), 1);
    }

    source_mock.assert_hits(2);
    post_mock.assert_hits(0);
    Ok(())
}

/// TDE 即使分類正確也會以 Upload token 更新 redshift
#[tokio::test]
async fn test_tde_redshift_is_patched_with_upload_token() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let input = write_input(
        &temp_dir,
        json!([
            {"name": "ZTF19tdetdet", "classification": "TDE", "redshift": 0.0512},
            {"name": "ZTF19tdenoz", "classification": "TDE", "redshift": null}
        ]),
    );

    mock_registered(
        &server,
        "ZTF19tdetdet",
        json!([{"classification": "Tidal Disruption Event"}]),
    );
    mock_registered(
        &server,
        "ZTF19tdenoz",
        json!([{"classification": "Tidal Disruption Event"}]),
    );
    let patch_mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/sources/ZTF19tdetdet")
            .header("Authorization", "token upload-tok")
            .json_body(json!({"redshift": 0.0512}));
        then.status(200).json_body(json!({"status": "success"}));
    });
    let other_patch = server.mock(|when, then| {
        when.method(PATCH).path("/api/sources/ZTF19tdenoz");
        then.status(200).json_body(json!({"status": "success"}));
    });

    let settings = settings_for(&server, &input);
    let client = client_for(&settings);
    let pipeline = TransferPipeline::new(LocalStorage::default(), settings, client);
    let report = TransferEngine::new(pipeline).run().await?;

    patch_mock.assert();
    other_patch.assert_hits(0);
    assert_eq!(report.count(OutcomeStatus::Updated), 1);
    assert_eq!(report.count(OutcomeStatus::Unchanged), 1);
    Ok(())
}

/// 起始索引之前的記錄不會被查詢；報表寫入 CSV
#[tokio::test]
async fn test_start_index_and_report() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let input = write_input(
        &temp_dir,
        json!([
            {"name": "ZTF18early00", "classification": "AGN", "redshift": 0.3},
            {"name": "ZTF18early01", "classification": "blazar", "redshift": 0.9},
            {"name": "ZTF20late000", "classification": "LINER", "redshift": 0.01},
            {"name": "ZTF20late001", "classification": "SLSN-I", "redshift": 0.2}
        ]),
    );

    let early_mock = server.mock(|when, then| {
        when.method(GET).path_contains("early");
        then.status(200).json_body(json!({"status": "success", "data": {}}));
    });
    mock_registered(&server, "ZTF20late000", json!([]));
    let classify_mock = server.mock(|when, then| {
        when.method(POST).path("/api/classification").json_body(json!({
            "obj_id": "ZTF20late000",
            "classification": "Galactic Nuclei",
            "taxonomy_id": 1,
            "probability": 1.0
        }));
        then.status(200).json_body(json!({"status": "success"}));
    });

    let report_path = temp_dir.path().join("reports").join("run.csv");
    let mut settings = settings_for(&server, &input);
    settings.start_index = 2;
    settings.report_path = Some(report_path.to_str().unwrap().to_string());
    let client = client_for(&settings);
    let pipeline = TransferPipeline::new(LocalStorage::default(), settings, client);
    let report = TransferEngine::new(pipeline).run().await?;

    early_mock.assert_hits(0);
    classify_mock.assert();
    assert_eq!(report.total_records, 4);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.considered(), 1);

    let csv = std::fs::read_to_string(&report_path)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("2,ZTF20late000,LINER,Galactic Nuclei,1,unclassified,"));
    assert!(lines[1].ends_with(",updated,"));
    Ok(())
}

/// 寫入被拒：預設中止；continue 模式下記為 failed 並繼續
#[tokio::test]
async fn test_rejected_write_abort_and_continue() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let input = write_input(
        &temp_dir,
        json!([
            {"name": "ZTF21reject0", "classification": "Blazar", "redshift": null},
            {"name": "ZTF21accept0", "classification": "QSO?", "redshift": null}
        ]),
    );

    mock_registered(&server, "ZTF21reject0", json!([]));
    mock_registered(&server, "ZTF21accept0", json!([{"classification": "AGN"}]));
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/classification")
            .json_body_partial(r#"{"obj_id": "ZTF21reject0"}"#);
        then.status(401)
            .json_body(json!({"status": "error", "message": "Unauthorized"}));
    });
    let accept_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/classification")
            .json_body_partial(r#"{"obj_id": "ZTF21accept0", "probability": 0.5}"#);
        then.status(200).json_body(json!({"status": "success"}));
    });

    // 預設：第一筆失敗即中止
    let settings = settings_for(&server, &input);
    let client = client_for(&settings);
    let pipeline = TransferPipeline::new(LocalStorage::default(), settings, client);
    assert!(TransferEngine::new(pipeline).run().await.is_err());
    accept_mock.assert_hits(0);

    // continue 模式
    let mut settings = settings_for(&server, &input);
    settings.continue_on_error = true;
    let client = client_for(&settings);
    let pipeline = TransferPipeline::new(LocalStorage::default(), settings, client);
    let report = TransferEngine::new(pipeline).run().await?;

    accept_mock.assert_hits(1);
    assert_eq!(report.count(OutcomeStatus::Failed), 1);
    assert_eq!(report.count(OutcomeStatus::Updated), 1);
    let failed = &report.outcomes[0];
    assert_eq!(failed.name, "ZTF21reject0");
    assert!(failed.error.as_deref().unwrap_or_default().contains("Unauthorized"));
    Ok(())
}

/// 遠端 source 格式不符：continue 模式下只讓該筆失敗
#[tokio::test]
async fn test_malformed_remote_source_does_not_stop_continue_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let input = write_input(
        &temp_dir,
        json!([
            {"name": "ZTF21badshape", "classification": "Blazar", "redshift": null},
            {"name": "ZTF21goodqso0", "classification": "QSO", "redshift": null}
        ]),
    );

    mock_registered(&server, "ZTF21badshape", json!([{"probability": 1.0}]));
    mock_registered(&server, "ZTF21goodqso0", json!([]));
    let classify_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/classification")
            .json_body_partial(r#"{"obj_id": "ZTF21goodqso0", "classification": "QSO"}"#);
        then.status(200).json_body(json!({"status": "success"}));
    });

    let mut settings = settings_for(&server, &input);
    settings.continue_on_error = true;
    let client = client_for(&settings);
    let pipeline = TransferPipeline::new(LocalStorage::default(), settings, client);
    let report = TransferEngine::new(pipeline).run().await?;

    classify_mock.assert_hits(1);
    assert_eq!(report.count(OutcomeStatus::Failed), 1);
    assert_eq!(report.count(OutcomeStatus::Updated), 1);
    assert_eq!(report.outcomes[0].name, "ZTF21badshape");
    Ok(())
}

/// token 無效（401）時回報拒絕，而不是「群組不存在」或「未註冊」
#[tokio::test]
async fn test_unauthorized_token_is_reported_as_rejection() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let input = write_input(
        &temp_dir,
        json!([{"name": "ZTF21noauth00", "classification": "QSO", "redshift": null}]),
    );

    server.mock(|when, then| {
        when.path_contains("/api/");
        then.status(401).json_body(json!({
            "status": "error",
            "message": "Unauthorized",
            "data": {}
        }));
    });

    let settings = settings_for(&server, &input);
    let client = client_for(&settings);
    let groups_err = client.get_group_ids(&["Nuclear Transients"]).await.unwrap_err();
    assert!(matches!(groups_err, TransferError::RemoteRejectedError { .. }));

    let pipeline = TransferPipeline::new(LocalStorage::default(), settings, client);
    let err = TransferEngine::new(pipeline).run().await.unwrap_err();
    match err {
        TransferError::RemoteRejectedError { endpoint, message } => {
            assert_eq!(endpoint, "api/sources");
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

/// dry run 只查詢 source，不送出寫入
#[tokio::test]
async fn test_dry_run_only_reads() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let input = write_input(
        &temp_dir,
        json!([{"name": "ZTF22dryrun0", "classification": "TDE?", "redshift": 0.08}]),
    );

    let source_mock = mock_unregistered(&server, "ZTF22dryrun0");
    let write_mock = server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(json!({"status": "success"}));
    });
    let patch_mock = server.mock(|when, then| {
        when.method(PATCH);
        then.status(200).json_body(json!({"status": "success"}));
    });

    let mut settings = settings_for(&server, &input);
    settings.dry_run = true;
    let client = client_for(&settings);
    let pipeline = TransferPipeline::new(LocalStorage::default(), settings, client);

    let records = pipeline.extract().await?;
    let transformed = pipeline.transform(records).await?;
    let report = pipeline.load(transformed).await?;

    source_mock.assert();
    write_mock.assert_hits(0);
    patch_mock.assert_hits(0);
    assert_eq!(report.count(OutcomeStatus::Planned), 1);
    assert_eq!(report.outcomes[0].actions.len(), 3);
    Ok(())
}

/// 直接使用 client：查不到的 source 回傳 None
#[tokio::test]
async fn test_client_treats_missing_data_as_unregistered() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/sources/ZTF23nodata0");
        then.status(200).json_body(json!({"status": "success"}));
    });

    let settings = settings_for(&server, "unused.json");
    let client = client_for(&settings);
    assert!(client.get_source("ZTF23nodata0").await?.is_none());
    Ok(())
}
