//! File-name helpers used when wiring steps together.
//!
//! Step outputs are named after their inputs: `x_raw-a.pcl` processed by a
//! `raw -> norm` step with id `n` becomes `x_norm-a-n.pcl`, so a chain of
//! steps can be read back from the file name alone.

use regex::{Captures, NoExpand, Regex};
use std::fmt::Display;

use crate::utils::error::{Result, SfleError};

/// Joins two or more path components with `/`.
pub fn join<I, T>(parts: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    parts
        .into_iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the base name of `path`, replacing `from` with `to` when `from` is
/// given, or appending `to` otherwise.
pub fn rebase(path: impl Display, from: Option<&str>, to: &str) -> String {
    let path = path.to_string();
    let base = match path.rfind('/') {
        Some(i) => path[i + 1..].to_string(),
        None => path,
    };
    match from {
        Some(from) if !from.is_empty() => base.replace(from, to),
        _ => format!("{}{}", base, to),
    }
}

/// Extension of `path` including the dot, or an empty string.
pub fn extension(path: &str) -> &str {
    let base = path.rfind('/').map_or(path, |i| &path[i + 1..]);
    match base.rfind('.') {
        Some(i) if i + 1 < base.len() => &base[i..],
        _ => "",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processor {
    pub from: String,
    pub to: String,
    pub id: String,
    /// When set, inputs are relocated out of this directory and `from` is
    /// matched as a plain trailing string.
    pub dir: Option<String>,
}

impl Processor {
    pub fn new(from: &str, to: &str, id: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            id: id.to_string(),
            dir: None,
        }
    }

    pub fn with_dir(mut self, dir: &str) -> Self {
        self.dir = Some(dir.to_string());
        self
    }

    /// Output file name for `input`, or `None` when `input` does not carry
    /// this processor's `from` marker.
    pub fn in2out(&self, input: &str, out_dir: &str, suffix: Option<&str>) -> Result<Option<String>> {
        let suffix = suffix.unwrap_or_else(|| extension(input)).to_string();

        let (input, pattern) = match &self.dir {
            Some(dir) => {
                let relocate = compile(&format!(r"^.*{}/", regex::escape(dir)))?;
                let target = format!("{}/", out_dir);
                let relocated = relocate.replace(input, NoExpand(&target));
                (
                    relocated.into_owned(),
                    format!(r"{}()$", regex::escape(&self.from)),
                )
            }
            None => (
                input.to_string(),
                format!(
                    r"_{}(-.*){}$",
                    regex::escape(&self.from),
                    regex::escape(&suffix)
                ),
            ),
        };

        let re = compile(&pattern)?;
        if !re.is_match(&input) {
            return Ok(None);
        }
        let out = re.replace(&input, |caps: &Captures| {
            format!("_{}{}-{}{}", self.to, &caps[1], self.id, suffix)
        });
        Ok(Some(out.into_owned()))
    }

    /// Reverse of [`Processor::in2out`].
    pub fn out2in(&self, output: &str) -> Result<Option<String>> {
        match &self.dir {
            Some(dir) => {
                let re = compile(&format!(
                    r"^(?:.*/)?([^/]*)_{}-{}(?:\.[^./]+)?$",
                    regex::escape(&self.to),
                    regex::escape(&self.id)
                ))?;
                Ok(re
                    .captures(output)
                    .map(|caps| format!("{}/{}{}", dir, &caps[1], self.from)))
            }
            None => {
                let suffix = extension(output);
                let re = compile(&format!(
                    r"_{}(-.*)-{}{}$",
                    regex::escape(&self.to),
                    regex::escape(&self.id),
                    regex::escape(suffix)
                ))?;
                if !re.is_match(output) {
                    return Ok(None);
                }
                let from = if self.from.is_empty() {
                    String::new()
                } else {
                    format!("_{}", self.from)
                };
                let out = re.replace(output, |caps: &Captures| {
                    format!("{}{}{}", from, &caps[1], suffix)
                });
                Ok(Some(out.into_owned()))
            }
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| SfleError::config(format!("invalid name pattern: {}", e)))
}
