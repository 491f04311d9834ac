use crate::config::pipeline_config::{PipelineConfig, Settings, StepDefinition};
use crate::domain::model::{PlannedStep, StepResult, StepStatus};
use crate::domain::ports::StepExecutor;
use crate::utils::error::{Result, SfleError};
use crate::utils::validation::Validate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Runs the steps of a pipeline in declared order, retrying failed commands
/// with exponential backoff. Child pipelines run after their parent's steps,
/// depth first.
pub struct PipelineRunner<E: StepExecutor> {
    executor: E,
    config: PipelineConfig,
    force: bool,
    only: Vec<String>,
}

/// One pipeline file being run, with the chain of files that led to it.
struct Scope {
    prefix: String,
    config: PipelineConfig,
    ancestors: Vec<PathBuf>,
}

impl<E: StepExecutor> PipelineRunner<E> {
    pub fn new(executor: E, config: PipelineConfig) -> Self {
        Self {
            executor,
            config,
            force: false,
            only: Vec::new(),
        }
    }

    /// Ignore the up-to-date check and run every step.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Restrict the run to the named steps, processors or children.
    pub fn with_only(mut self, only: Vec<String>) -> Self {
        self.only = only;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn root_scope(&self) -> Scope {
        let ancestors = self
            .config
            .file
            .as_ref()
            .and_then(|file| std::fs::canonicalize(file).ok())
            .into_iter()
            .collect();
        Scope {
            prefix: String::new(),
            config: self.config.clone(),
            ancestors,
        }
    }

    // `--only` filters the top level; a selected child runs whole
    fn selects(&self, scope: &Scope, name: &str, group: Option<&str>) -> bool {
        !scope.prefix.is_empty()
            || self.only.is_empty()
            || self
                .only
                .iter()
                .any(|o| o == name || Some(o.as_str()) == group)
    }

    fn selected_steps(&self, scope: &Scope) -> Result<Vec<StepDefinition>> {
        Ok(scope
            .config
            .expanded_steps()?
            .into_iter()
            .filter(|s| s.is_enabled() && self.selects(scope, &s.name, s.group.as_deref()))
            .collect())
    }

    /// Loads the selected children of `scope`. With `skip_missing`, children
    /// whose pipeline file does not exist yet are left out instead of failing.
    fn child_scopes(&self, scope: &Scope, skip_missing: bool) -> Result<Vec<Scope>> {
        let mut scopes = Vec::new();
        for (name, file) in scope.config.child_files()? {
            if !self.selects(scope, &name, None) {
                continue;
            }
            let prefix = qualified(&scope.prefix, &name);
            if !file.is_file() {
                if skip_missing {
                    tracing::info!("📂 Child '{}' not present yet: {}", prefix, file.display());
                    continue;
                }
                return Err(SfleError::MissingSource {
                    step: prefix,
                    path: file.display().to_string(),
                });
            }

            let canonical = std::fs::canonicalize(&file)?;
            if scope.ancestors.contains(&canonical) {
                return Err(SfleError::config(format!(
                    "child '{}' includes {} which is already being run",
                    prefix,
                    file.display()
                )));
            }
            let config = PipelineConfig::from_file(&canonical)?;
            config.validate()?;
            let mut ancestors = scope.ancestors.clone();
            ancestors.push(canonical);
            scopes.push(Scope {
                prefix,
                config,
                ancestors,
            });
        }
        Ok(scopes)
    }

    /// Resolves every selected step without running anything. Children that
    /// earlier steps would generate are not listed.
    pub fn plan(&self) -> Result<Vec<PlannedStep>> {
        let mut plan = Vec::new();
        let mut pending = vec![self.root_scope()];
        while let Some(scope) = pending.pop() {
            let settings = &scope.config.settings;
            for step in self.selected_steps(&scope)? {
                let name = qualified(&scope.prefix, &step.name);
                let mut command = step.to_command(settings)?;
                command.step = name.clone();
                plan.push(PlannedStep {
                    name,
                    command,
                    up_to_date: !self.force
                        && is_up_to_date(
                            &step.source_paths(settings),
                            &step.target_paths(settings),
                        ),
                });
            }
            let children = self.child_scopes(&scope, true)?;
            pending.extend(children.into_iter().rev());
        }
        Ok(plan)
    }

    pub async fn run(&self) -> Result<Vec<StepResult>> {
        let mut results = Vec::new();
        let mut pending = vec![self.root_scope()];
        while let Some(scope) = pending.pop() {
            tracing::info!("🚀 Running pipeline '{}'", scope.config.pipeline.name);
            for step in self.selected_steps(&scope)? {
                results.push(self.run_step(&scope, &step).await?);
            }
            // children load only now, earlier steps may have written them
            let children = self.child_scopes(&scope, false)?;
            pending.extend(children.into_iter().rev());
        }
        Ok(results)
    }

    async fn run_step(&self, scope: &Scope, step: &StepDefinition) -> Result<StepResult> {
        let settings = &scope.config.settings;
        let name = qualified(&scope.prefix, &step.name);
        let start_time = Instant::now();
        let sources = step.source_paths(settings);
        let targets = step.target_paths(settings);

        if !self.force && is_up_to_date(&sources, &targets) {
            tracing::info!("⏭️ Skipping step: {} (targets up to date)", name);
            return Ok(StepResult {
                step: name,
                status: StepStatus::Skipped,
                attempts: 0,
                duration_ms: 0,
                targets: display_paths(&targets),
            });
        }

        if let Some(missing) = sources.iter().find(|p| !p.exists()) {
            return Err(SfleError::MissingSource {
                step: name,
                path: missing.display().to_string(),
            });
        }
        for target in &targets {
            if let Some(parent) = target.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }

        let attempts = match self.execute_with_retry(&name, step, settings).await {
            Ok(attempts) => attempts,
            Err(e) => {
                remove_targets(&name, &targets).await;
                return Err(e);
            }
        };
        let result = StepResult {
            step: name,
            status: StepStatus::Ran,
            attempts,
            duration_ms: start_time.elapsed().as_millis() as u64,
            targets: display_paths(&targets),
        };
        tracing::info!(
            "✅ Step executed: {} (attempts: {}, duration: {}ms)",
            result.step,
            result.attempts,
            result.duration_ms
        );
        Ok(result)
    }

    /// Returns the number of tries it took to succeed.
    async fn execute_with_retry(
        &self,
        name: &str,
        step: &StepDefinition,
        settings: &Settings,
    ) -> Result<u32> {
        let mut command = step.to_command(settings)?;
        command.step = name.to_string();
        let max_attempts = step.attempts(settings).max(1);
        let backoff = Duration::from_millis(settings.backoff_ms);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let code = self.executor.execute(&command).await?;
            if code == Some(0) {
                return Ok(attempt);
            }
            if attempt >= max_attempts {
                tracing::error!(
                    "❌ Step '{}' failed with exit code {:?}, giving up after {} attempt(s)",
                    name,
                    code,
                    attempt
                );
                return Err(SfleError::StepFailed {
                    step: name.to_string(),
                    attempts: attempt,
                    code,
                });
            }
            let delay = backoff_delay(backoff, attempt);
            tracing::warn!(
                "🔁 Step '{}' failed with exit code {:?} (attempt {}/{}), retrying in {:?}",
                name,
                code,
                attempt,
                max_attempts,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    pub fn get_execution_summary(results: &[StepResult]) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let ran = results
            .iter()
            .filter(|r| r.status == StepStatus::Ran)
            .count();
        let skipped = results.len() - ran;
        let total_duration_ms: u64 = results.iter().map(|r| r.duration_ms).sum();

        summary.insert("total_steps".to_string(), serde_json::Value::Number(results.len().into()));
        summary.insert("ran".to_string(), serde_json::Value::Number(ran.into()));
        summary.insert("skipped".to_string(), serde_json::Value::Number(skipped.into()));
        summary.insert(
            "total_duration_ms".to_string(),
            serde_json::Value::Number(total_duration_ms.into()),
        );

        let executed: Vec<serde_json::Value> = results
            .iter()
            .filter(|r| r.status == StepStatus::Ran)
            .map(|r| serde_json::Value::String(r.step.clone()))
            .collect();
        summary.insert("executed_steps".to_string(), serde_json::Value::Array(executed));

        summary
    }
}

/// Delay after the `failures`-th failed try: `base * 2^failures`.
pub fn backoff_delay(base: Duration, failures: u32) -> Duration {
    base.saturating_mul(1u32 << failures.min(16))
}

/// True when every target exists and none is older than any source. A step
/// without targets is never up to date.
pub fn is_up_to_date(sources: &[PathBuf], targets: &[PathBuf]) -> bool {
    if targets.is_empty() {
        return false;
    }
    let Some(oldest_target) = targets
        .iter()
        .map(|t| modified(t))
        .collect::<Option<Vec<_>>>()
        .and_then(|times| times.into_iter().min())
    else {
        return false;
    };
    sources
        .iter()
        .all(|s| modified(s).is_some_and(|time| time <= oldest_target))
}

/// Deletes whatever a failed step left where its targets go.
async fn remove_targets(step: &str, targets: &[PathBuf]) {
    for target in targets {
        match tokio::fs::remove_file(target).await {
            Ok(()) => tracing::warn!("🧹 Removed target of failed step '{}': {}", step, target.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("could not remove {}: {}", target.display(), e),
        }
    }
}

fn qualified(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn display_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}
