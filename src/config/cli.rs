use crate::utils::error::Result;
use crate::utils::logger;
use clap::Args;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Input/output flags shared by the filter binaries.
#[derive(Debug, Clone, Args)]
pub struct IoArgs {
    /// Read from this file instead of stdin
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub out: OutputArgs,
}

/// Flags for binaries that only write.
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl IoArgs {
    pub fn init_logger(&self) {
        self.out.init_logger();
    }

    pub fn reader(&self) -> Result<Box<dyn BufRead>> {
        open_reader(self.input.as_deref())
    }

    pub fn writer(&self) -> Result<Box<dyn Write>> {
        self.out.writer()
    }
}

impl OutputArgs {
    pub fn init_logger(&self) {
        logger::init_cli_logger(self.verbose, tracing::Level::WARN);
    }

    pub fn writer(&self) -> Result<Box<dyn Write>> {
        open_writer(self.output.as_deref())
    }
}

pub fn open_reader(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            tracing::debug!("Reading {}", path.display());
            Ok(Box::new(BufReader::new(File::open(path)?)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

pub fn open_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            tracing::debug!("Writing {}", path.display());
            Ok(Box::new(BufWriter::new(File::create(path)?)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Reports a failed run the same way for every binary and exits with the
/// code matching the error category.
pub fn exit_on_error(result: Result<()>) {
    if let Err(e) = result {
        tracing::debug!("{:?} error, exit code {}", e.category(), e.exit_code());
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}
