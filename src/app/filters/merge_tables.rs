//! Outer join of several tab-delimited tables.
//!
//! The default joins on row IDs: every table contributes a block of columns
//! and rows are matched by their key cell. With `transpose` the join is on
//! column IDs instead: the header is the union of all column names and the
//! rows of every table are stacked underneath it.

use std::collections::{BTreeMap, HashMap};

use crate::core::table::Row;
use crate::utils::error::{Result, SfleError};

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Join on column IDs instead of row IDs.
    pub transpose: bool,
    /// Prefix column headers (row join) or row IDs (column join) with the
    /// table's label.
    pub label: bool,
    /// Zero-indexed column holding the row ID.
    pub column: usize,
    /// Inputs have no header row.
    pub no_header: bool,
}

#[derive(Debug, Clone)]
pub struct SourceTable {
    pub label: String,
    pub rows: Vec<Row>,
}

impl SourceTable {
    pub fn new(label: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            label: label.into(),
            rows,
        }
    }
}

/// Splits a row into its key cell and the remaining data cells.
fn split_key(row: &Row, column: usize) -> (String, Vec<String>) {
    let key = row.get(column).cloned().unwrap_or_default();
    let data = row
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != column)
        .map(|(_, cell)| cell.clone())
        .collect();
    (key, data)
}

fn labelled(label: &str, value: &str, enabled: bool) -> String {
    if enabled {
        format!("{}:{}", label, value)
    } else {
        value.to_string()
    }
}

pub fn merge_tables(tables: &[SourceTable], options: &MergeOptions) -> Result<Vec<Row>> {
    if tables.is_empty() {
        return Err(SfleError::EmptyInput {
            context: "merge_tables needs at least one table".to_string(),
        });
    }
    if options.transpose && options.no_header {
        return Err(SfleError::config(
            "joining on column IDs requires header rows",
        ));
    }

    if options.transpose {
        Ok(join_columns(tables, options))
    } else {
        Ok(join_rows(tables, options))
    }
}

struct Block {
    key_header: Option<String>,
    headers: Vec<String>,
    width: usize,
    rows: Vec<(String, Vec<String>)>,
}

fn block(table: &SourceTable, options: &MergeOptions) -> Block {
    let mut rows = table.rows.iter().map(|row| split_key(row, options.column));
    let (key_header, headers) = if options.no_header {
        (None, Vec::new())
    } else {
        match rows.next() {
            Some((key, headers)) => (Some(key), headers),
            None => (None, Vec::new()),
        }
    };
    let rows: Vec<(String, Vec<String>)> = rows.collect();
    let width = if options.no_header {
        rows.iter().map(|(_, data)| data.len()).max().unwrap_or(0)
    } else {
        headers.len()
    };
    Block {
        key_header,
        headers,
        width,
        rows,
    }
}

fn join_rows(tables: &[SourceTable], options: &MergeOptions) -> Vec<Row> {
    let blocks: Vec<Block> = tables.iter().map(|t| block(t, options)).collect();

    // BTreeMap gives the sorted ID order of the output
    let mut joined: BTreeMap<String, Vec<Option<Vec<String>>>> = BTreeMap::new();
    for (t, block) in blocks.iter().enumerate() {
        for (key, data) in &block.rows {
            let slots = joined
                .entry(key.clone())
                .or_insert_with(|| vec![None; blocks.len()]);
            slots[t] = Some(data.clone());
        }
    }

    let mut out = Vec::with_capacity(joined.len() + 1);
    if !options.no_header {
        let mut header = vec![blocks[0].key_header.clone().unwrap_or_default()];
        for (table, block) in tables.iter().zip(&blocks) {
            header.extend(
                block
                    .headers
                    .iter()
                    .map(|h| labelled(&table.label, h, options.label)),
            );
        }
        out.push(header);
    }

    for (key, slots) in joined {
        let mut row = vec![key];
        for (block, slot) in blocks.iter().zip(slots) {
            let mut cells = slot.unwrap_or_default();
            cells.resize(block.width, String::new());
            row.extend(cells);
        }
        out.push(row);
    }
    tracing::debug!(
        "merge_tables: joined {} tables into {} rows",
        tables.len(),
        out.len()
    );
    out
}

fn join_columns(tables: &[SourceTable], options: &MergeOptions) -> Vec<Row> {
    let blocks: Vec<Block> = tables.iter().map(|t| block(t, options)).collect();

    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for block in &blocks {
        for h in &block.headers {
            if !index.contains_key(h) {
                index.insert(h.clone(), columns.len());
                columns.push(h.clone());
            }
        }
    }

    let mut out = Vec::new();
    let mut header = vec![blocks[0].key_header.clone().unwrap_or_default()];
    header.extend(columns.iter().cloned());
    out.push(header);

    for (table, block) in tables.iter().zip(&blocks) {
        for (key, data) in &block.rows {
            let mut row = vec![String::new(); columns.len() + 1];
            row[0] = labelled(&table.label, key, options.label);
            for (h, value) in block.headers.iter().zip(data) {
                row[index[h] + 1] = value.clone();
            }
            out.push(row);
        }
    }
    tracing::debug!(
        "merge_tables: stacked {} tables under {} columns",
        tables.len(),
        columns.len()
    );
    out
}
