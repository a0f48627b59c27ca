use crate::adapters::credentials::Credentials;
use crate::config::toml_config::ServiceConfig;
use crate::domain::model::{CanonicalLabel, RemoteSource};
use crate::domain::ports::TransientService;
use crate::utils::error::{Result, TransferError};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// SkyPortal 回應外層：`{"status": ..., "message": ..., "data": ...}`
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(skip)]
    http_status: u16,
}

impl ApiEnvelope {
    fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error") || !(200..300).contains(&self.http_status)
    }

    /// token 無效或權限不足
    fn is_auth_failure(&self) -> bool {
        matches!(self.http_status, 401 | 403)
    }

    fn rejection(self, endpoint: &str) -> TransferError {
        TransferError::RemoteRejectedError {
            endpoint: endpoint.to_string(),
            message: self
                .message
                .unwrap_or_else(|| format!("HTTP {}", self.http_status)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClassificationPayload<'a> {
    obj_id: &'a str,
    classification: &'a str,
    taxonomy_id: i64,
    probability: f64,
}

#[derive(Debug, Serialize)]
struct GroupSavePayload {
    group_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct RedshiftPayload {
    redshift: f64,
}

#[derive(Debug, Clone, Copy)]
enum TokenScope {
    Classify,
    Upload,
}

pub struct FritzClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    taxonomy_id: i64,
    group_ids: Mutex<HashMap<String, i64>>,
}

impl FritzClient {
    pub fn new(service: &ServiceConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(service.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&service.base_url)?,
            credentials,
            taxonomy_id: service.taxonomy_id,
            group_ids: Mutex::new(HashMap::new()),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransferError::ConfigError {
                message: format!("base URL '{}' cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, scope: TokenScope) -> RequestBuilder {
        let token = match scope {
            TokenScope::Classify => self.credentials.classify_token(),
            TokenScope::Upload => self.credentials.upload_token(),
        };
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("token {}", token))
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<ApiEnvelope> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("{} -> {}", endpoint, status);

        let body = response.text().await?;
        match serde_json::from_str::<ApiEnvelope>(&body) {
            Ok(mut envelope) => {
                envelope.http_status = status.as_u16();
                Ok(envelope)
            }
            Err(_) if !status.is_success() => Err(TransferError::RemoteRejectedError {
                endpoint: endpoint.to_string(),
                message: format!("HTTP {}", status),
            }),
            Err(e) => Err(TransferError::UnexpectedResponseError {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// 寫入類請求：status 為 error 或非 2xx 時視為失敗
    async fn send_write(&self, request: RequestBuilder, endpoint: &str) -> Result<ApiEnvelope> {
        let envelope = self.send(request, endpoint).await?;
        if envelope.is_error() {
            return Err(envelope.rejection(endpoint));
        }
        Ok(envelope)
    }

    /// 依群組名稱查詢 id；同一次執行內會快取
    pub async fn get_group_ids(&self, group_names: &[&str]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(group_names.len());

        for &name in group_names {
            if let Some(id) = self.group_ids.lock().await.get(name).copied() {
                ids.push(id);
                continue;
            }

            let url = self.endpoint(&["api", "groups"])?;
            let request = self
                .request(Method::GET, url, TokenScope::Classify)
                .query(&[("name", name)]);
            let envelope = self.send(request, "api/groups").await?;
            if envelope.is_error() {
                return Err(envelope.rejection("api/groups"));
            }

            let id = envelope
                .data
                .as_ref()
                .and_then(|data| data.as_array())
                .and_then(|groups| groups.first())
                .and_then(|group| group.get("id"))
                .and_then(|id| id.as_i64())
                .ok_or_else(|| TransferError::GroupNotFoundError {
                    name: name.to_string(),
                })?;

            tracing::debug!("Resolved group '{}' to id {}", name, id);
            self.group_ids.lock().await.insert(name.to_string(), id);
            ids.push(id);
        }

        Ok(ids)
    }
}

fn is_empty_data(data: &serde_json::Value) -> bool {
    match data {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[async_trait]
impl TransientService for FritzClient {
    async fn get_source(&self, name: &str) -> Result<Option<RemoteSource>> {
        let url = self.endpoint(&["api", "sources", name])?;
        let request = self.request(Method::GET, url, TokenScope::Classify);
        let envelope = self.send(request, "api/sources").await?;
        if envelope.is_auth_failure() {
            return Err(envelope.rejection("api/sources"));
        }

        match envelope.data {
            Some(data) if !is_empty_data(&data) => {
                // 單一 source 格式不符只影響該筆記錄
                let source = serde_json::from_value(data).map_err(|e| {
                    TransferError::UnexpectedResponseError {
                        endpoint: "api/sources".to_string(),
                        message: format!("{}: {}", name, e),
                    }
                })?;
                Ok(Some(source))
            }
            _ => {
                if let Some(message) = envelope.message.filter(|m| !m.is_empty()) {
                    tracing::debug!("Source {} not found: {}", name, message);
                }
                Ok(None)
            }
        }
    }

    async fn save_to_group(&self, name: &str, group: &str) -> Result<()> {
        let group_ids = self.get_group_ids(&[group]).await?;
        let url = self.endpoint(&["api", "alerts", "ztf", name])?;
        let payload = GroupSavePayload { group_ids };

        tracing::debug!("POST alerts/ztf/{} {:?}", name, payload);
        let request = self
            .request(Method::POST, url, TokenScope::Classify)
            .json(&payload);
        self.send_write(request, "api/alerts/ztf").await?;
        Ok(())
    }

    async fn post_classification(
        &self,
        name: &str,
        label: CanonicalLabel,
        probability: f64,
    ) -> Result<()> {
        let url = self.endpoint(&["api", "classification"])?;
        let payload = ClassificationPayload {
            obj_id: name,
            classification: label.as_str(),
            taxonomy_id: self.taxonomy_id,
            probability,
        };

        tracing::debug!("POST classification {:?}", payload);
        let request = self
            .request(Method::POST, url, TokenScope::Classify)
            .json(&payload);
        self.send_write(request, "api/classification").await?;
        Ok(())
    }

    async fn patch_redshift(&self, name: &str, redshift: f64) -> Result<()> {
        let url = self.endpoint(&["api", "sources", name])?;
        let payload = RedshiftPayload { redshift };

        tracing::debug!("PATCH sources/{} {:?}", name, payload);
        let request = self
            .request(Method::PATCH, url, TokenScope::Upload)
            .json(&payload);
        self.send_write(request, "api/sources").await?;
        Ok(())
    }
}
