pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::storage::LocalStorage;
pub use config::Settings;
pub use crate::core::{
    api::HarbourApi,
    detector::{DetectionSettings, Detector},
    engine::{AlertEngine, RunSummary},
    pipeline::AlertPipeline,
};
pub use utils::error::{AlertError, Result};
