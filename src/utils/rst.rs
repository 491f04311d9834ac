//! Minimal reStructuredText writers used by the `report` filter.

use std::io::Write;

use crate::utils::error::Result;

pub fn text<W: Write>(out: &mut W, text: &str) -> Result<()> {
    write!(out, "{}\n\n", text)?;
    Ok(())
}

fn heading<W: Write>(out: &mut W, title: &str, underline: char) -> Result<()> {
    let rule: String = std::iter::repeat(underline)
        .take(title.chars().count())
        .collect();
    text(out, &format!("{}\n{}", title, rule))
}

pub fn section<W: Write>(out: &mut W, title: &str) -> Result<()> {
    heading(out, title, '=')
}

pub fn subsection<W: Write>(out: &mut W, title: &str) -> Result<()> {
    heading(out, title, '-')
}

pub fn subsubsection<W: Write>(out: &mut W, title: &str) -> Result<()> {
    heading(out, title, '~')
}

/// Writes `rows` as an RST simple table where every column is as wide as the
/// widest cell. Returns `false` without writing when there is nothing to show.
pub fn table<W: Write>(out: &mut W, rows: &[Vec<String>], header: bool) -> Result<bool> {
    let Some(first) = rows.first() else {
        return Ok(false);
    };
    if first.is_empty() {
        return Ok(false);
    }

    let width = rows
        .iter()
        .flat_map(|row| row.iter())
        .map(|cell| cell.chars().count())
        .max()
        .unwrap_or(0);
    let rule = vec!["=".repeat(width); first.len()];

    let mut lines: Vec<&[String]> = Vec::with_capacity(rows.len() + 3);
    lines.push(&rule);
    for (i, row) in rows.iter().enumerate() {
        lines.push(row);
        if header && i == 0 {
            lines.push(&rule);
        }
    }
    lines.push(&rule);

    for line in lines {
        let padded: Vec<String> = line
            .iter()
            .map(|cell| format!("{:<width$}", cell, width = width))
            .collect();
        writeln!(out, "{}", padded.join("  "))?;
    }
    writeln!(out)?;
    Ok(true)
}
