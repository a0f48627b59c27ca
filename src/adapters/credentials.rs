use crate::domain::ports::Storage;
use crate::utils::error::{Result, TransferError};
use std::fmt;

/// 兩把 API token：Classify 權限用於讀取與分類，Upload 權限用於修改 redshift
#[derive(Clone)]
pub struct Credentials {
    classify_token: String,
    upload_token: String,
}

impl Credentials {
    pub fn new(classify_token: impl Into<String>, upload_token: impl Into<String>) -> Self {
        Self {
            classify_token: classify_token.into(),
            upload_token: upload_token.into(),
        }
    }

    /// 從 token 檔案載入，只取第一行
    pub async fn load<S: Storage>(
        storage: &S,
        classify_path: &str,
        upload_path: &str,
    ) -> Result<Self> {
        let classify_token = read_token(storage, classify_path).await?;
        let upload_token = read_token(storage, upload_path).await?;
        tracing::debug!(
            "Loaded API tokens from {} and {}",
            classify_path,
            upload_path
        );
        Ok(Self {
            classify_token,
            upload_token,
        })
    }

    pub fn classify_token(&self) -> &str {
        &self.classify_token
    }

    pub fn upload_token(&self) -> &str {
        &self.upload_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("classify_token", &"***")
            .field("upload_token", &"***")
            .finish()
    }
}

async fn read_token<S: Storage>(storage: &S, path: &str) -> Result<String> {
    let bytes = storage.read_file(path).await?;
    let content = String::from_utf8_lossy(&bytes);
    let token = content.lines().next().map(str::trim).unwrap_or_default();

    if token.is_empty() {
        return Err(TransferError::MissingCredentialError {
            path: path.to_string(),
        });
    }

    Ok(token.to_string())
}
