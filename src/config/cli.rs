use crate::config::{Settings, TransferConfig};
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "fritz-transfer")]
#[command(about = "Bulk-transfer transient classifications from a JSON dump to Fritz")]
pub struct CliConfig {
    /// JSON array of {name, classification, redshift}
    #[arg(long)]
    pub input: String,

    /// TOML file with [service], [groups] and [error_handling] sections
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, help = "Override service.base_url")]
    pub base_url: Option<String>,

    #[arg(long, help = "Override service.classify_token_file")]
    pub classify_token_file: Option<String>,

    #[arg(long, help = "Override service.upload_token_file")]
    pub upload_token_file: Option<String>,

    /// Zero-based record index to resume from
    #[arg(long, default_value = "0")]
    pub start_index: usize,

    #[arg(long, help = "Look up sources but send no updates")]
    pub dry_run: bool,

    #[arg(long, help = "Record per-source API failures and keep going")]
    pub continue_on_error: bool,

    #[arg(long, help = "Write a CSV report of every reconciled record")]
    pub report: Option<String>,

    #[arg(long, help = "Print distinct input classifications and exit")]
    pub list_labels: bool,

    #[arg(long, help = "Log phase timings and memory usage")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 載入 TOML（若有）並套用命令列覆蓋
    pub fn resolve(&self) -> Result<Settings> {
        let mut transfer = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                TransferConfig::from_file(path)?
            }
            None => TransferConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            transfer.service.base_url = base_url.clone();
        }
        if let Some(path) = &self.classify_token_file {
            transfer.service.classify_token_file = path.clone();
        }
        if let Some(path) = &self.upload_token_file {
            transfer.service.upload_token_file = path.clone();
        }

        let mut settings = Settings::new(self.input.clone(), transfer);
        settings.start_index = self.start_index;
        settings.dry_run = self.dry_run;
        settings.continue_on_error |= self.continue_on_error;
        settings.report_path = self.report.clone();
        Ok(settings)
    }
}
