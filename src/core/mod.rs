pub mod format;
pub mod runner;
pub mod table;

pub use crate::domain::model::{CommandSpec, StepResult, StepStatus};
pub use crate::domain::ports::StepExecutor;
pub use crate::utils::error::Result;
