use thiserror::Error;

#[derive(Error, Debug)]
pub enum SfleError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Parse error at row {row}, column {column}: '{token}' is not a number")]
    ParseError {
        row: usize,
        column: usize,
        token: String,
    },

    #[error("Input is empty: {context}")]
    EmptyInput { context: String },

    #[error("Source file for step '{step}' does not exist: {path}")]
    MissingSource { step: String, path: String },

    #[error("Step '{step}' failed after {attempts} attempt(s) with exit code {code:?}")]
    StepFailed {
        step: String,
        attempts: u32,
        code: Option<i32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Execution,
    System,
}

impl SfleError {
    pub fn config(message: impl Into<String>) -> Self {
        SfleError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SfleError::CsvError(_) | SfleError::ParseError { .. } | SfleError::EmptyInput { .. } => {
                ErrorCategory::Input
            }
            SfleError::ConfigError { .. }
            | SfleError::InvalidConfigValueError { .. }
            | SfleError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SfleError::MissingSource { .. } | SfleError::StepFailed { .. } => {
                ErrorCategory::Execution
            }
            SfleError::IoError(_) | SfleError::SerializationError(_) => ErrorCategory::System,
        }
    }

    /// Process exit code, one per error category.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Input => 1,
            ErrorCategory::Configuration => 2,
            ErrorCategory::Execution => 3,
            ErrorCategory::System => 4,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SfleError::CsvError(_) => "Check that the input is tab-delimited text",
            SfleError::ParseError { .. } => {
                "Only numbers or empty cells are allowed in the data columns"
            }
            SfleError::EmptyInput { .. } => "Provide at least a header row",
            SfleError::ConfigError { .. }
            | SfleError::InvalidConfigValueError { .. }
            | SfleError::MissingConfigError { .. } => "Review the command-line flags or pipeline file",
            SfleError::MissingSource { .. } => {
                "Make sure an earlier step produces the file, or create it by hand"
            }
            SfleError::StepFailed { .. } => "Run the failing command by hand to see its output",
            SfleError::IoError(_) => "Check file paths and permissions",
            SfleError::SerializationError(_) => "Check that the summary path is writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, SfleError>;
