use crate::domain::model::CommandSpec;
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Runs the command once. `Ok(None)` means the child was killed by a signal.
    async fn execute(&self, command: &CommandSpec) -> Result<Option<i32>>;
}
