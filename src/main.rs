use clap::Parser;
use fritz_transfer::core::pipeline::read_records;
use fritz_transfer::domain::taxonomy::survey_labels;
use fritz_transfer::utils::error::ErrorSeverity;
use fritz_transfer::utils::{logger, validation::Validate};
use fritz_transfer::{
    CliConfig, Credentials, FritzClient, LocalStorage, TransferEngine, TransferError,
    TransferPipeline,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting fritz-transfer");
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ Transfer failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 依錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: &CliConfig) -> Result<(), TransferError> {
    let settings = cli.resolve()?;
    settings.validate()?;

    let storage = LocalStorage::default();

    if cli.list_labels {
        return list_labels(&storage, &settings.input_path).await;
    }

    let service = settings.service();
    let credentials = Credentials::load(
        &storage,
        &service.classify_token_file,
        &service.upload_token_file,
    )
    .await?;
    let client = FritzClient::new(service, credentials)?;

    if settings.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no classifications or redshifts will be sent");
    }
    if cli.monitor {
        tracing::info!("🔍 Run monitoring enabled");
    }

    let pipeline = TransferPipeline::new(storage, settings, client);
    let engine = TransferEngine::new_with_monitoring(pipeline, cli.monitor);
    let report = engine.run().await?;

    println!(
        "✅ {} of {} records considered ({} skipped)",
        report.considered(),
        report.total_records,
        report.skipped
    );
    if let Some(path) = &report.report_path {
        println!("📁 Report saved to: {}", path);
    }

    Ok(())
}

/// 只讀輸入檔，列出所有不重複的分類標籤與對照結果
async fn list_labels(storage: &LocalStorage, input_path: &str) -> Result<(), TransferError> {
    let records = read_records(storage, input_path).await?;

    for entry in survey_labels(&records) {
        match entry.mapped {
            Some(mapped) => println!(
                "{:>6}  {:<20} -> {} ({})",
                entry.count,
                format!("{:?}", entry.raw),
                mapped.label,
                mapped.probability()
            ),
            None => println!(
                "{:>6}  {:<20} -> skip",
                entry.count,
                format!("{:?}", entry.raw)
            ),
        }
    }
    Ok(())
}
