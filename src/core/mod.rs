pub mod api;
pub mod detector;
pub mod engine;
pub mod export;
pub mod pipeline;
pub mod stats;

pub use crate::domain::model::{AlertReport, DetectionInput};
pub use crate::domain::ports::{HarbourStore, Pipeline, Storage};
pub use crate::utils::error::Result;
