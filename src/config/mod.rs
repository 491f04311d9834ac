#[cfg(feature = "cli")]
pub mod cli;
pub mod pipeline_config;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "sfle")]
#[command(about = "Runs the steps of a pipeline file in order, retrying failed commands")]
pub struct RunnerConfig {
    /// Path to the pipeline TOML file
    #[arg(short, long, default_value = "sfle.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Show the execution plan without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Run every step even when its targets are up to date
    #[arg(long)]
    pub force: bool,

    /// Run only these steps, processors or children (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    pub summary: Option<String>,
}
