pub mod etl;
pub mod pipeline;
pub mod reconcile;
pub mod report;

pub use crate::domain::model::{Record, TransferReport, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, TransientService};
pub use crate::utils::error::Result;
