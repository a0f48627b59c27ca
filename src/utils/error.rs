use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV report error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Token file '{path}' is empty")]
    MissingCredentialError { path: String },

    #[error("Remote rejected {endpoint}: {message}")]
    RemoteRejectedError { endpoint: String, message: String },

    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponseError { endpoint: String, message: String },

    #[error("Group not found: {name}")]
    GroupNotFoundError { name: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Remote,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TransferError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TransferError::ConfigError { .. }
            | TransferError::ConfigValidationError { .. }
            | TransferError::InvalidConfigValueError { .. }
            | TransferError::MissingCredentialError { .. }
            | TransferError::UrlError(_) => ErrorCategory::Configuration,
            TransferError::ApiError(_) => ErrorCategory::Network,
            TransferError::RemoteRejectedError { .. }
            | TransferError::UnexpectedResponseError { .. }
            | TransferError::GroupNotFoundError { .. } => ErrorCategory::Remote,
            TransferError::SerializationError(_)
            | TransferError::CsvError(_)
            | TransferError::ProcessingError { .. } => ErrorCategory::Data,
            TransferError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Remote | ErrorCategory::Data | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 是否僅影響單筆記錄（可在 continue 模式下跳過）
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Remote
        )
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            TransferError::ApiError(_) => {
                "Check network connectivity and the service base URL, then resume with --start-index"
                    .to_string()
            }
            TransferError::MissingCredentialError { path } => {
                format!("Write a valid API token on the first line of '{}'", path)
            }
            TransferError::RemoteRejectedError { .. } => {
                "Verify the token ACLs (Classify for classifications, Upload for redshift)"
                    .to_string()
            }
            TransferError::GroupNotFoundError { name } => {
                format!("Create group '{}' on the service or fix [groups] in the config", name)
            }
            TransferError::UnexpectedResponseError { .. } => {
                "Check that the base URL points at a SkyPortal-compatible API".to_string()
            }
            TransferError::SerializationError(_) => {
                "Make sure the input file is a JSON array of {name, classification, redshift}"
                    .to_string()
            }
            TransferError::IoError(_) => "Check file paths and permissions".to_string(),
            TransferError::CsvError(_) => "Check that the report path is writable".to_string(),
            TransferError::UrlError(_)
            | TransferError::ConfigError { .. }
            | TransferError::ConfigValidationError { .. }
            | TransferError::InvalidConfigValueError { .. } => {
                "Review the command line flags and the TOML configuration".to_string()
            }
            TransferError::ProcessingError { .. } => {
                "Inspect the offending record in the input file".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not reach the service: {}", self),
            ErrorCategory::Remote => format!("The service refused a request: {}", self),
            ErrorCategory::Data => format!("Input data problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_by_category() {
        let missing = TransferError::MissingCredentialError {
            path: "files/token".to_string(),
        };
        assert_eq!(missing.category(), ErrorCategory::Configuration);
        assert_eq!(missing.severity(), ErrorSeverity::High);
        assert!(!missing.is_record_scoped());

        let rejected = TransferError::RemoteRejectedError {
            endpoint: "api/classification".to_string(),
            message: "Unauthorized".to_string(),
        };
        assert_eq!(rejected.category(), ErrorCategory::Remote);
        assert!(rejected.is_record_scoped());

        let io = TransferError::IoError(std::io::Error::other("disk"));
        assert_eq!(io.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_recovery_suggestion_mentions_group() {
        let err = TransferError::GroupNotFoundError {
            name: "Nuclear Transients".to_string(),
        };
        assert!(err.recovery_suggestion().contains("Nuclear Transients"));
        assert!(err.user_friendly_message().starts_with("The service refused"));
    }
}
