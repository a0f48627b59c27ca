use crate::domain::model::{
    CanonicalLabel, Record, RemoteSource, TransferReport, TransformResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 新 source 要存入的群組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRouting {
    pub tidal_disruption: String,
    pub nuclear: String,
}

impl GroupRouting {
    pub fn group_for(&self, label: CanonicalLabel) -> &str {
        if label.is_tde() {
            &self.tidal_disruption
        } else {
            &self.nuclear
        }
    }
}

impl Default for GroupRouting {
    fn default() -> Self {
        Self {
            tidal_disruption: "Tidal Disruption Events".to_string(),
            nuclear: "Nuclear Transients".to_string(),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn start_index(&self) -> usize;
    fn dry_run(&self) -> bool;
    fn continue_on_error(&self) -> bool;
    fn report_path(&self) -> Option<&str>;
    fn group_routing(&self) -> &GroupRouting;
}

/// 遠端 transient 服務的最小介面
#[async_trait]
pub trait TransientService: Send + Sync {
    /// 查無此 source 時回傳 `Ok(None)`
    async fn get_source(&self, name: &str) -> Result<Option<RemoteSource>>;
    async fn save_to_group(&self, name: &str, group: &str) -> Result<()>;
    async fn post_classification(
        &self,
        name: &str,
        label: CanonicalLabel,
        probability: f64,
    ) -> Result<()>;
    async fn patch_redshift(&self, name: &str, redshift: f64) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<TransferReport>;
}
