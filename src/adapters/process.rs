use crate::domain::model::{CommandKind, CommandSpec};
use crate::domain::ports::StepExecutor;
use crate::utils::error::{Result, SfleError};
use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Spawns steps as child processes. stderr is inherited so tool diagnostics
/// show up next to the runner's own log.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }

    fn build(&self, spec: &CommandSpec, stdout: Option<&Path>) -> Result<Command> {
        let mut command = match &spec.kind {
            CommandKind::Program(program) => {
                let mut command = Command::new(program);
                command.args(&spec.args);
                command
            }
            CommandKind::Shell(line) => {
                let mut full = line.clone();
                for arg in &spec.args {
                    full.push(' ');
                    full.push_str(&shell_quote(arg));
                }
                let mut command = Command::new("sh");
                command.arg("-c").arg(full);
                command
            }
        };

        if !spec.path_prepend.is_empty() {
            let mut paths: Vec<PathBuf> = spec.path_prepend.iter().map(PathBuf::from).collect();
            if let Some(current) = std::env::var_os("PATH") {
                paths.extend(std::env::split_paths(&current));
            }
            let joined = std::env::join_paths(paths)
                .map_err(|e| SfleError::config(format!("invalid PATH entry: {}", e)))?;
            command.env("PATH", joined);
        }

        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        match &spec.stdin {
            Some(path) => command.stdin(Stdio::from(File::open(path)?)),
            None => command.stdin(Stdio::null()),
        };
        if let Some(path) = stdout {
            command.stdout(Stdio::from(File::create(path)?));
        }
        Ok(command)
    }
}

#[async_trait]
impl StepExecutor for ProcessExecutor {
    /// Piped stdout is written next to the target and only renamed onto it
    /// after a zero exit, so a failed try never leaves a fresh target behind.
    async fn execute(&self, spec: &CommandSpec) -> Result<Option<i32>> {
        tracing::info!("▶️ {}", spec.display());
        let partial = spec.stdout.as_deref().map(partial_path);
        let status = match self.build(spec, partial.as_deref()) {
            Ok(mut command) => command.status().await,
            Err(e) => {
                discard(partial.as_deref()).await;
                return Err(e);
            }
        };
        let status = match status {
            Ok(status) => status,
            Err(e) => {
                discard(partial.as_deref()).await;
                return Err(e.into());
            }
        };
        tracing::debug!("step '{}' exited with {:?}", spec.step, status.code());

        if let (Some(partial), Some(target)) = (&partial, &spec.stdout) {
            if status.code() == Some(0) {
                tokio::fs::rename(partial, target).await?;
            } else {
                discard(Some(partial)).await;
            }
        }
        Ok(status.code())
    }
}

/// `out/x.pcl` is written as `out/x.pcl.part` while the step runs.
fn partial_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

async fn discard(partial: Option<&Path>) {
    let Some(path) = partial else { return };
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("could not remove {}: {}", path.display(), e);
        }
    }
}

/// Single-quotes `arg` for `sh` unless it is made of safe characters only.
fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec(kind: CommandKind) -> CommandSpec {
        CommandSpec {
            step: "test".to_string(),
            kind,
            args: Vec::new(),
            stdin: None,
            stdout: None,
            path_prepend: Vec::new(),
            cwd: None,
        }
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("data/x.pcl"), "data/x.pcl");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[tokio::test]
    async fn test_exit_code_is_reported() {
        let code = ProcessExecutor::new()
            .execute(&spec(CommandKind::Shell("exit 3".to_string())))
            .await
            .unwrap();
        assert_eq!(code, Some(3));
    }

    #[tokio::test]
    async fn test_stdin_and_stdout_are_wired_to_files() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        std::fs::write(&input, "a\tb\n").unwrap();

        let mut command = spec(CommandKind::Program("cat".to_string()));
        command.stdin = Some(input);
        command.stdout = Some(output.clone());
        let code = ProcessExecutor::new().execute(&command).await.unwrap();

        assert_eq!(code, Some(0));
        assert_eq!(std::fs::read_to_string(output).unwrap(), "a\tb\n");
    }

    #[tokio::test]
    async fn test_shell_arguments_are_quoted() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.txt");

        let mut command = spec(CommandKind::Shell("printf '%s|'".to_string()));
        command.args = vec!["a b".to_string(), "c".to_string()];
        command.stdout = Some(output.clone());
        ProcessExecutor::new().execute(&command).await.unwrap();

        assert_eq!(std::fs::read_to_string(output).unwrap(), "a b|c|");
    }

    #[tokio::test]
    async fn test_failed_command_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.txt");

        let mut command = spec(CommandKind::Shell("echo partial; exit 1".to_string()));
        command.stdout = Some(output.clone());
        let code = ProcessExecutor::new().execute(&command).await.unwrap();

        assert_eq!(code, Some(1));
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }

    #[tokio::test]
    async fn test_failed_command_keeps_previous_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.txt");
        std::fs::write(&output, "previous\n").unwrap();

        let mut command = spec(CommandKind::Shell("echo partial; exit 2".to_string()));
        command.stdout = Some(output.clone());
        ProcessExecutor::new().execute(&command).await.unwrap();

        assert_eq!(std::fs::read_to_string(output).unwrap(), "previous\n");
    }

    #[tokio::test]
    async fn test_commands_run_in_their_working_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("local.txt"), "here\n").unwrap();
        let output = dir.path().join("out.txt");

        let mut command = spec(CommandKind::Shell("cat local.txt".to_string()));
        command.cwd = Some(dir.path().to_path_buf());
        command.stdout = Some(output.clone());
        let code = ProcessExecutor::new().execute(&command).await.unwrap();

        assert_eq!(code, Some(0));
        assert_eq!(std::fs::read_to_string(output).unwrap(), "here\n");
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(partial_path(Path::new("out/x.pcl")), PathBuf::from("out/x.pcl.part"));
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let command = spec(CommandKind::Program("sfle-no-such-program".to_string()));
        assert!(ProcessExecutor::new().execute(&command).await.is_err());
    }
}
