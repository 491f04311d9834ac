use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// A program spawned directly with an argument vector.
    Program(String),
    /// A command line handed to `sh -c`.
    Shell(String),
}

/// One fully resolved external command, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub step: String,
    pub kind: CommandKind,
    pub args: Vec<String>,
    pub stdin: Option<PathBuf>,
    pub stdout: Option<PathBuf>,
    /// Directories put in front of `PATH` for the child.
    pub path_prepend: Vec<String>,
    /// Working directory of the child, the directory of its pipeline file.
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Human readable form, e.g. `normalize --seed 1 < in.pcl > out.pcl`.
    pub fn display(&self) -> String {
        let mut line = match &self.kind {
            CommandKind::Program(program) => program.clone(),
            CommandKind::Shell(command) => command.clone(),
        };
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        if let Some(stdin) = &self.stdin {
            line.push_str(&format!(" < {}", stdin.display()));
        }
        if let Some(stdout) = &self.stdout {
            line.push_str(&format!(" > {}", stdout.display()));
        }
        line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ran,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: String,
    pub status: StepStatus,
    pub attempts: u32,
    pub duration_ms: u64,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PlannedStep {
    pub name: String,
    pub command: CommandSpec,
    pub up_to_date: bool,
}
