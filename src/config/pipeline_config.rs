use crate::domain::model::{CommandKind, CommandSpec};
use crate::utils::error::{Result, SfleError};
use crate::utils::paths::{join, rebase, Processor};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_unique_names,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// File looked up when a child pipeline is given as a directory.
pub const PIPELINE_FILE: &str = "sfle.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub pipeline: PipelineInfo,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub processors: Vec<ProcessorDefinition>,
    #[serde(default)]
    pub children: Vec<ChildPipeline>,
    /// The file this pipeline was loaded from.
    #[serde(skip)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tries per step unless the step overrides it.
    pub attempts: u32,
    /// Base delay between tries; doubled after every failure.
    pub backoff_ms: u64,
    pub input_dir: String,
    pub output_dir: String,
    pub tmp_dir: String,
    pub src_dir: String,
    /// Directories prepended to `PATH` for every step.
    pub path: Vec<String>,
    /// Also run every subdirectory that holds a `sfle.toml`.
    pub discover_children: bool,
    pub exclude_children: Vec<String>,
    /// Relative paths resolve against this directory, the one holding the
    /// pipeline file.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff_ms: 1000,
            input_dir: "input".to_string(),
            output_dir: ".".to_string(),
            tmp_dir: ".".to_string(),
            src_dir: "src".to_string(),
            path: Vec::new(),
            discover_children: false,
            exclude_children: Vec::new(),
            base_dir: None,
        }
    }
}

impl Settings {
    /// Expands the `{input}`, `{output}`, `{tmp}` and `{src}` placeholders.
    pub fn expand(&self, value: &str) -> String {
        value
            .replace("{input}", &self.input_dir)
            .replace("{output}", &self.output_dir)
            .replace("{tmp}", &self.tmp_dir)
            .replace("{src}", &self.src_dir)
    }

    /// Expands `value` and anchors it at the pipeline directory when relative.
    pub fn resolve(&self, value: &str) -> PathBuf {
        let path = PathBuf::from(self.expand(value));
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,
    pub program: Option<String>,
    pub shell: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Feed the first source on stdin instead of passing sources as arguments.
    #[serde(default)]
    pub stdin_pipe: bool,
    /// Write stdout to the first target instead of passing targets as arguments.
    #[serde(default)]
    pub stdout_pipe: bool,
    pub attempts: Option<u32>,
    pub enabled: Option<bool>,
    /// Id of the processor that generated this step.
    #[serde(skip)]
    pub group: Option<String>,
}

impl StepDefinition {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn source_paths(&self, settings: &Settings) -> Vec<PathBuf> {
        self.sources.iter().map(|s| settings.resolve(s)).collect()
    }

    pub fn target_paths(&self, settings: &Settings) -> Vec<PathBuf> {
        self.targets.iter().map(|t| settings.resolve(t)).collect()
    }

    pub fn attempts(&self, settings: &Settings) -> u32 {
        self.attempts.unwrap_or(settings.attempts)
    }

    /// Builds the command line. Sources past the first piped one, and targets
    /// past the first piped one, are dependencies only and are not passed on.
    pub fn to_command(&self, settings: &Settings) -> Result<CommandSpec> {
        let kind = command_kind(&self.name, "steps", &self.program, &self.shell, settings)?;

        let sources = self.source_paths(settings);
        let targets = self.target_paths(settings);
        let mut args: Vec<String> = self.args.iter().map(|a| settings.expand(a)).collect();

        let stdin = if self.stdin_pipe {
            sources.first().cloned()
        } else {
            args.extend(sources.iter().map(|p| p.display().to_string()));
            None
        };
        let stdout = if self.stdout_pipe {
            targets.first().cloned()
        } else {
            args.extend(targets.iter().map(|p| p.display().to_string()));
            None
        };

        Ok(CommandSpec {
            step: self.name.clone(),
            kind,
            args,
            stdin,
            stdout,
            path_prepend: settings.path.clone(),
            cwd: settings.base_dir.clone(),
        })
    }
}

fn command_kind(
    name: &str,
    table: &str,
    program: &Option<String>,
    shell: &Option<String>,
    settings: &Settings,
) -> Result<CommandKind> {
    match (program, shell) {
        (Some(program), None) => Ok(CommandKind::Program(settings.expand(program))),
        (None, Some(shell)) => Ok(CommandKind::Shell(settings.expand(shell))),
        (None, None) => Err(SfleError::MissingConfigError {
            field: format!("{}.{}.program", table, name),
        }),
        (Some(_), Some(_)) => Err(SfleError::config(format!(
            "'{}' in [[{}]] needs exactly one of `program` or `shell`",
            name, table
        ))),
    }
}

/// A rule that turns every matching input file into a step of its own.
///
/// Without `dir`, a file named `x_<from>-a.pcl` becomes `x_<to>-a-<id>.pcl`
/// next to it. With `dir`, files are moved from `dir` to `output` and `from`
/// is matched as a trailing string, so `dir/x.pcl` with `from = ".pcl"`
/// becomes `output/x_<to>-<id>.pcl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorDefinition {
    pub id: String,
    pub from: String,
    pub to: String,
    pub program: Option<String>,
    pub shell: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory scanned for inputs.
    #[serde(default = "default_inputs")]
    pub inputs: String,
    pub dir: Option<String>,
    #[serde(default = "default_output")]
    pub output: String,
    /// Output extension; defaults to the input's.
    pub suffix: Option<String>,
    /// Pipe the input on stdin and stdout to the output. When off, both are
    /// passed as arguments.
    #[serde(default = "default_pipe")]
    pub pipe: bool,
    pub attempts: Option<u32>,
    pub enabled: Option<bool>,
}

fn default_inputs() -> String {
    "{input}".to_string()
}

fn default_output() -> String {
    "{output}".to_string()
}

fn default_pipe() -> bool {
    true
}

impl ProcessorDefinition {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// One step per input. Inputs are the files already in `inputs` plus the
    /// targets that `earlier` steps will write there, in sorted order.
    pub fn expand(&self, settings: &Settings, earlier: &[StepDefinition]) -> Result<Vec<StepDefinition>> {
        let inputs_dir = settings.resolve(&self.inputs);
        let mut candidates = BTreeSet::new();
        if inputs_dir.is_dir() {
            for entry in std::fs::read_dir(&inputs_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    candidates.insert(join([inputs_dir.display().to_string(), name]));
                }
            }
        }
        for step in earlier.iter().filter(|s| s.is_enabled()) {
            for target in step.target_paths(settings) {
                if target.parent() == Some(inputs_dir.as_path()) {
                    candidates.insert(target.display().to_string());
                }
            }
        }

        let mut processor = Processor::new(&self.from, &self.to, &self.id);
        if let Some(dir) = &self.dir {
            processor = processor.with_dir(&settings.resolve(dir).display().to_string());
        }
        let out_dir = settings.resolve(&self.output).display().to_string();

        let mut steps = Vec::new();
        for input in candidates {
            let Some(output) = processor.in2out(&input, &out_dir, self.suffix.as_deref())? else {
                continue;
            };
            if output == input {
                continue;
            }
            steps.push(StepDefinition {
                name: format!("{}:{}", self.id, rebase(&input, None, "")),
                program: self.program.clone(),
                shell: self.shell.clone(),
                sources: vec![input],
                targets: vec![output],
                args: self.args.clone(),
                stdin_pipe: self.pipe,
                stdout_pipe: self.pipe,
                attempts: self.attempts,
                enabled: None,
                group: Some(self.id.clone()),
            });
        }
        tracing::debug!("processor '{}' expanded to {} step(s)", self.id, steps.len());
        Ok(steps)
    }
}

/// A pipeline run after this one, from its own directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildPipeline {
    /// A directory holding a `sfle.toml`, or a pipeline file.
    pub path: String,
    pub name: Option<String>,
    pub enabled: Option<bool>,
}

impl ChildPipeline {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.path.trim_end_matches('/').to_string())
    }
}

impl PipelineConfig {
    /// Loads a pipeline file. Relative paths inside it resolve against its
    /// directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(SfleError::IoError)?;
        let mut config = Self::from_toml_str(&content)?;
        config.settings.base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Some(std::fs::canonicalize(parent)?),
            _ => None,
        };
        config.file = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parses pipeline TOML after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| SfleError::config(format!("TOML parsing error: {}", e)))
    }

    // unknown variables are left as written
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| SfleError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Declared steps followed by the steps of every enabled processor, in
    /// declared order. Processors see the targets of everything before them.
    pub fn expanded_steps(&self) -> Result<Vec<StepDefinition>> {
        let mut steps = self.steps.clone();
        for processor in self.processors.iter().filter(|p| p.is_enabled()) {
            let generated = processor.expand(&self.settings, &steps)?;
            steps.extend(generated);
        }
        Ok(steps)
    }

    /// Enabled children by name and pipeline file: declared ones first, then
    /// discovered subdirectories in name order.
    pub fn child_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut children = Vec::new();
        for child in self.children.iter().filter(|c| c.is_enabled()) {
            let path = self.settings.resolve(&child.path);
            let file = if path.is_dir() {
                path.join(PIPELINE_FILE)
            } else {
                path
            };
            children.push((child.name(), file));
        }

        if self.settings.discover_children {
            let root = self
                .settings
                .base_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("."));
            let mut found = Vec::new();
            for entry in std::fs::read_dir(&root)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let file = entry.path().join(PIPELINE_FILE);
                if file.is_file()
                    && !self.settings.exclude_children.contains(&name)
                    && !children.iter().any(|(known, _)| known == &name)
                {
                    found.push((name, file));
                }
            }
            found.sort();
            children.extend(found);
        }
        Ok(children)
    }

    /// Everything `--only` may name: steps, processor ids and children.
    pub fn selectable_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.steps.iter().map(|s| s.name.clone()).collect();
        names.extend(self.processors.iter().map(|p| p.id.clone()));
        names.extend(self.child_files()?.into_iter().map(|(name, _)| name));
        Ok(names)
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validate_positive_number("settings.attempts", self.settings.attempts, 1)?;
        validate_path("settings.input_dir", &self.settings.input_dir)?;
        validate_path("settings.output_dir", &self.settings.output_dir)?;
        validate_path("settings.tmp_dir", &self.settings.tmp_dir)?;
        validate_unique_names("steps.name", self.steps.iter().map(|s| s.name.as_str()))?;

        for step in &self.steps {
            validate_non_empty_string("steps.name", &step.name)?;
            if let Some(attempts) = step.attempts {
                validate_positive_number(&format!("steps.{}.attempts", step.name), attempts, 1)?;
            }
            if step.stdin_pipe && step.sources.is_empty() {
                return Err(SfleError::config(format!(
                    "step '{}' pipes stdin but has no sources",
                    step.name
                )));
            }
            if step.stdout_pipe && step.targets.is_empty() {
                return Err(SfleError::config(format!(
                    "step '{}' pipes stdout but has no targets",
                    step.name
                )));
            }
            for path in step.sources.iter().chain(&step.targets) {
                validate_path(&format!("steps.{}", step.name), path)?;
            }
            step.to_command(&self.settings)?;
        }

        validate_unique_names("processors.id", self.processors.iter().map(|p| p.id.as_str()))?;
        for processor in &self.processors {
            validate_non_empty_string("processors.id", &processor.id)?;
            validate_non_empty_string(&format!("processors.{}.from", processor.id), &processor.from)?;
            validate_non_empty_string(&format!("processors.{}.to", processor.id), &processor.to)?;
            validate_path(&format!("processors.{}.inputs", processor.id), &processor.inputs)?;
            validate_path(&format!("processors.{}.output", processor.id), &processor.output)?;
            if let Some(attempts) = processor.attempts {
                validate_positive_number(&format!("processors.{}.attempts", processor.id), attempts, 1)?;
            }
            command_kind(
                &processor.id,
                "processors",
                &processor.program,
                &processor.shell,
                &self.settings,
            )?;
        }

        for child in &self.children {
            validate_path("children.path", &child.path)?;
        }
        let child_names: Vec<String> = self.children.iter().map(|c| c.name()).collect();
        validate_unique_names("children.name", child_names.iter().map(String::as_str))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[pipeline]
name = "demo"

[settings]
attempts = 2
backoff_ms = 10
input_dir = "in"
output_dir = "out"

[[steps]]
name = "normalize"
program = "normalize"
sources = ["{input}/data.pcl"]
targets = ["{output}/data_norm.pcl"]
stdin_pipe = true
stdout_pipe = true

[[steps]]
name = "merge"
program = "merge_tables"
args = ["-l"]
sources = ["{output}/data_norm.pcl", "{input}/other.pcl"]
targets = ["{output}/merged.pcl"]
stdout_pipe = true
attempts = 3
"#;

    #[test]
    fn test_parse_and_validate() {
        let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.steps.len(), 2);
        assert_eq!(config.settings.tmp_dir, ".");
        assert_eq!(config.steps[0].attempts(&config.settings), 2);
        assert_eq!(config.steps[1].attempts(&config.settings), 3);
    }

    #[test]
    fn test_piped_command() {
        let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
        let command = config.steps[0].to_command(&config.settings).unwrap();
        assert_eq!(command.kind, CommandKind::Program("normalize".to_string()));
        assert!(command.args.is_empty());
        assert_eq!(command.stdin, Some(PathBuf::from("in/data.pcl")));
        assert_eq!(command.stdout, Some(PathBuf::from("out/data_norm.pcl")));
        assert_eq!(command.display(), "normalize < in/data.pcl > out/data_norm.pcl");
    }

    #[test]
    fn test_sources_become_arguments() {
        let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
        let command = config.steps[1].to_command(&config.settings).unwrap();
        assert_eq!(command.args, vec!["-l", "out/data_norm.pcl", "in/other.pcl"]);
        assert_eq!(command.stdin, None);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("SFLE_TEST_PROGRAM", "transpose");
        let config = PipelineConfig::from_toml_str(
            "[pipeline]\nname = \"env\"\n[[steps]]\nname = \"t\"\nprogram = \"${SFLE_TEST_PROGRAM}\"\n",
        )
        .unwrap();
        assert_eq!(config.steps[0].program.as_deref(), Some("transpose"));
    }

    #[test]
    fn test_duplicate_step_names_are_rejected() {
        let config = PipelineConfig::from_toml_str(
            "[pipeline]\nname = \"dup\"\n[[steps]]\nname = \"a\"\nprogram = \"x\"\n[[steps]]\nname = \"a\"\nprogram = \"y\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_program_and_shell_are_exclusive() {
        let config = PipelineConfig::from_toml_str(
            "[pipeline]\nname = \"bad\"\n[[steps]]\nname = \"a\"\nprogram = \"x\"\nshell = \"y\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_step_without_command_is_missing_config() {
        let config =
            PipelineConfig::from_toml_str("[pipeline]\nname = \"bad\"\n[[steps]]\nname = \"a\"\n")
                .unwrap();
        assert!(matches!(
            config.validate(),
            Err(SfleError::MissingConfigError { field }) if field == "steps.a.program"
        ));
    }

    #[test]
    fn test_stdout_pipe_needs_target() {
        let config = PipelineConfig::from_toml_str(
            "[pipeline]\nname = \"bad\"\n[[steps]]\nname = \"a\"\nprogram = \"x\"\nstdout_pipe = true\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    fn processor_config(dir: &Path) -> PipelineConfig {
        let text = format!(
            r#"
[pipeline]
name = "processors"

[settings]
input_dir = "{dir}/in"
output_dir = "{dir}/out"

[[steps]]
name = "seed"
program = "generate_random_table"
targets = ["{{input}}/z_raw-c.pcl"]
stdout_pipe = true

[[processors]]
id = "n"
from = "raw"
to = "norm"
program = "normalize"

[[processors]]
id = "t"
from = ".pcl"
to = "t"
dir = "{{input}}"
program = "transpose"
"#,
            dir = dir.display()
        );
        PipelineConfig::from_toml_str(&text).unwrap()
    }

    #[test]
    fn test_processors_expand_per_input_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("x_raw-a.pcl"), "").unwrap();
        std::fs::write(input.join("notes.txt"), "").unwrap();

        let config = processor_config(dir.path());
        assert!(config.validate().is_ok());
        let steps = config.expanded_steps().unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "seed",
                "n:x_raw-a.pcl",
                "n:z_raw-c.pcl",
                "t:x_norm-a-n.pcl",
                "t:x_raw-a.pcl",
                "t:z_norm-c-n.pcl",
                "t:z_raw-c.pcl",
            ]
        );

        let in_dir = input.display().to_string();
        let out_dir = dir.path().join("out").display().to_string();
        let normalize = &steps[1];
        assert_eq!(normalize.group.as_deref(), Some("n"));
        assert_eq!(normalize.sources, vec![format!("{}/x_raw-a.pcl", in_dir)]);
        assert_eq!(normalize.targets, vec![format!("{}/x_norm-a-n.pcl", in_dir)]);
        let command = normalize.to_command(&config.settings).unwrap();
        assert_eq!(command.stdin, Some(input.join("x_raw-a.pcl")));
        assert_eq!(command.stdout, Some(input.join("x_norm-a-n.pcl")));

        let transpose = &steps[4];
        assert_eq!(transpose.targets, vec![format!("{}/x_raw-a_t-t.pcl", out_dir)]);
    }

    #[test]
    fn test_processor_without_command_is_missing_config() {
        let config = PipelineConfig::from_toml_str(
            "[pipeline]\nname = \"bad\"\n[[processors]]\nid = \"n\"\nfrom = \"raw\"\nto = \"norm\"\n",
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(SfleError::MissingConfigError { field }) if field == "processors.n.program"
        ));
    }

    #[test]
    fn test_relative_paths_resolve_against_the_pipeline_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("sfle.toml");
        std::fs::write(&file, CONFIG).unwrap();

        let config = PipelineConfig::from_file(&file).unwrap();
        let base = std::fs::canonicalize(dir.path()).unwrap();
        let command = config.steps[0].to_command(&config.settings).unwrap();
        assert_eq!(command.stdin, Some(base.join("in/data.pcl")));
        assert_eq!(command.cwd, Some(base));
        assert_eq!(config.file, Some(file));
    }

    #[test]
    fn test_child_files_declared_then_discovered() {
        let dir = tempfile::TempDir::new().unwrap();
        for child in ["beta", "alpha", "skipped", "declared"] {
            std::fs::create_dir_all(dir.path().join(child)).unwrap();
            std::fs::write(dir.path().join(child).join(PIPELINE_FILE), "").unwrap();
        }
        std::fs::create_dir_all(dir.path().join("plain")).unwrap();
        let file = dir.path().join(PIPELINE_FILE);
        std::fs::write(
            &file,
            "[pipeline]\nname = \"parent\"\n[settings]\ndiscover_children = true\nexclude_children = [\"skipped\"]\n[[children]]\npath = \"declared/\"\n",
        )
        .unwrap();

        let config = PipelineConfig::from_file(&file).unwrap();
        let base = std::fs::canonicalize(dir.path()).unwrap();
        let children = config.child_files().unwrap();
        assert_eq!(
            children,
            vec![
                ("declared".to_string(), base.join("declared/").join(PIPELINE_FILE)),
                ("alpha".to_string(), base.join("alpha").join(PIPELINE_FILE)),
                ("beta".to_string(), base.join("beta").join(PIPELINE_FILE)),
            ]
        );
        assert_eq!(
            config.selectable_names().unwrap(),
            vec!["declared", "alpha", "beta"]
        );
    }

    #[test]
    fn test_duplicate_child_names_are_rejected() {
        let config = PipelineConfig::from_toml_str(
            "[pipeline]\nname = \"dup\"\n[[children]]\npath = \"a\"\n[[children]]\npath = \"b\"\nname = \"a\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
