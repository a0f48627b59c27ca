pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{Credentials, FritzClient, LocalStorage};
pub use config::{Settings, TransferConfig};
pub use core::{etl::TransferEngine, pipeline::TransferPipeline};
pub use domain::taxonomy::normalize_label;
pub use utils::error::{Result, TransferError};
