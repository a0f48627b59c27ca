use crate::domain::ports::GroupRouting;
use crate::utils::error::{Result, TransferError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://fritz.science/";
pub const DEFAULT_CLASSIFY_TOKEN_FILE: &str = "files/fritz_token_classify";
pub const DEFAULT_UPLOAD_TOKEN_FILE: &str = "files/fritz_token_upload";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub groups: GroupsConfig,
    #[serde(default)]
    pub error_handling: ErrorHandlingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    /// token 需要 Classify 權限
    pub classify_token_file: String,
    /// token 需要 Upload 權限
    pub upload_token_file: String,
    /// 1 = sitewide taxonomy
    pub taxonomy_id: i64,
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            classify_token_file: DEFAULT_CLASSIFY_TOKEN_FILE.to_string(),
            upload_token_file: DEFAULT_UPLOAD_TOKEN_FILE.to_string(),
            taxonomy_id: 1,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupsConfig {
    pub tidal_disruption: String,
    pub nuclear: String,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        let routing = GroupRouting::default();
        Self {
            tidal_disruption: routing.tidal_disruption,
            nuclear: routing.nuclear,
        }
    }
}

impl From<GroupsConfig> for GroupRouting {
    fn from(groups: GroupsConfig) -> Self {
        GroupRouting {
            tidal_disruption: groups.tidal_disruption,
            nuclear: groups.nuclear,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Abort,
    Continue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorHandlingConfig {
    pub on_api_failure: FailurePolicy,
}

impl TransferConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TransferError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FRITZ_BASE_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| TransferError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn group_routing(&self) -> GroupRouting {
        self.groups.clone().into()
    }
}

impl Validate for TransferConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("service.base_url", &self.service.base_url)?;
        validation::validate_path(
            "service.classify_token_file",
            &self.service.classify_token_file,
        )?;
        validation::validate_path("service.upload_token_file", &self.service.upload_token_file)?;
        validation::validate_range("service.timeout_seconds", self.service.timeout_seconds, 1, 600)?;
        validation::validate_range("service.taxonomy_id", self.service.taxonomy_id, 1, i64::MAX)?;
        validation::validate_non_empty_string("groups.tidal_disruption", &self.groups.tidal_disruption)?;
        validation::validate_non_empty_string("groups.nuclear", &self.groups.nuclear)?;
        Ok(())
    }
}
