pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::RunnerConfig;

pub use adapters::process::ProcessExecutor;
pub use config::pipeline_config::PipelineConfig;
pub use core::runner::PipelineRunner;
pub use utils::error::{Result, SfleError};
