use std::collections::HashSet;
use std::io::Write;

use crate::core::format::format_general;
use crate::core::table::{is_missing, parse_number, Row, TsvWriter};
use crate::utils::error::Result;
use crate::utils::rst;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Numeric,
    Categorical,
}

impl RowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Numeric => "numeric",
            RowKind::Categorical => "categorical",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowSummary {
    pub id: String,
    pub kind: RowKind,
    pub missing: usize,
    /// `%g` sum for numeric rows, number of distinct values otherwise.
    pub info: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub has_header: bool,
    pub rows: Vec<RowSummary>,
    /// Largest value in any numeric row.
    pub maximum: Option<f64>,
}

pub fn summarize(rows: &[Row]) -> Report {
    let Some((_, data)) = rows.split_first() else {
        return Report::default();
    };

    let mut report = Report {
        has_header: true,
        ..Report::default()
    };
    for row in data {
        let (id, cells) = match row.split_first() {
            Some((id, cells)) => (id.clone(), cells),
            None => (String::new(), &row[..]),
        };
        let missing = cells.iter().filter(|c| is_missing(c)).count();
        // a row without any value has no maximum, so it is not numeric
        let numbers: Option<Vec<f64>> = cells
            .iter()
            .filter(|c| !is_missing(c))
            .map(|c| parse_number(c))
            .collect::<Option<Vec<f64>>>()
            .filter(|values| !values.is_empty());

        let summary = match numbers {
            Some(values) => {
                for v in &values {
                    if report.maximum.map_or(true, |m| *v > m) {
                        report.maximum = Some(*v);
                    }
                }
                RowSummary {
                    id,
                    kind: RowKind::Numeric,
                    missing,
                    // adding 0.0 folds a -0.0 sum into 0
                    info: format_general(values.iter().sum::<f64>() + 0.0),
                }
            }
            None => {
                let distinct: HashSet<&str> = cells.iter().map(String::as_str).collect();
                RowSummary {
                    id,
                    kind: RowKind::Categorical,
                    missing,
                    info: distinct.len().to_string(),
                }
            }
        };
        report.rows.push(summary);
    }
    tracing::debug!("report: summarized {} rows", report.rows.len());
    report
}

pub fn write_tsv<W: Write>(report: &Report, out: W) -> Result<()> {
    let mut writer = TsvWriter::new(out);
    if report.has_header {
        writer.write_row(["row", "type", "#missing", "sum or #values"])?;
    }
    for row in &report.rows {
        writer.write_row([
            row.id.as_str(),
            row.kind.as_str(),
            row.missing.to_string().as_str(),
            row.info.as_str(),
        ])?;
    }
    writer.flush()
}

pub fn write_rst<W: Write>(report: &Report, mut out: W) -> Result<()> {
    rst::section(&mut out, "Report")?;
    rst::text(&mut out, "The following is a table describing your data.")?;

    let mut table = vec![vec![
        "Row".to_string(),
        "Type".to_string(),
        "# Missing".to_string(),
        "Sum or # Values".to_string(),
    ]];
    table.extend(report.rows.iter().map(|row| {
        vec![
            row.id.clone(),
            row.kind.as_str().to_string(),
            row.missing.to_string(),
            row.info.clone(),
        ]
    }));
    rst::table(&mut out, &table, true)?;

    rst::subsection(&mut out, "Maximum")?;
    let maximum = report
        .maximum
        .map(format_general)
        .unwrap_or_else(|| "none".to_string());
    rst::text(&mut out, &format!("The maximum value was: {}", maximum))?;
    out.flush()?;
    Ok(())
}
