#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::{FailurePolicy, ServiceConfig, TransferConfig};

use crate::domain::ports::{ConfigProvider, GroupRouting};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};

/// 單次執行的完整設定（命令列 + TOML 合併後）
#[derive(Debug, Clone)]
pub struct Settings {
    pub input_path: String,
    pub start_index: usize,
    pub dry_run: bool,
    pub continue_on_error: bool,
    pub report_path: Option<String>,
    pub transfer: TransferConfig,
    routing: GroupRouting,
}

impl Settings {
    pub fn new(input_path: impl Into<String>, transfer: TransferConfig) -> Self {
        let routing = transfer.group_routing();
        let continue_on_error = transfer.error_handling.on_api_failure == FailurePolicy::Continue;
        Self {
            input_path: input_path.into(),
            start_index: 0,
            dry_run: false,
            continue_on_error,
            report_path: None,
            transfer,
            routing,
        }
    }

    pub fn service(&self) -> &ServiceConfig {
        &self.transfer.service
    }
}

impl ConfigProvider for Settings {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn start_index(&self) -> usize {
        self.start_index
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    fn report_path(&self) -> Option<&str> {
        self.report_path.as_deref()
    }

    fn group_routing(&self) -> &GroupRouting {
        &self.routing
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input_path)?;
        validation::validate_extension("input", &self.input_path, &["json"])?;
        if let Some(report) = &self.report_path {
            validation::validate_path("report", report)?;
            validation::validate_extension("report", report, &["csv"])?;
        }
        self.transfer.validate()
    }
}
