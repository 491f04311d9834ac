use std::collections::HashSet;

use crate::core::table::Row;

#[derive(Debug, Clone, Copy, Default)]
pub struct GrepOptions {
    /// Keep the rows that do not match instead.
    pub invert: bool,
    /// Zero-indexed data column holding the ID.
    pub column: usize,
    /// Match when the cell starts with an ID rather than equals it.
    pub prefix: bool,
}

/// Collects the non-empty first cells of `rows`.
pub fn id_set(rows: &[Row]) -> HashSet<String> {
    rows.iter()
        .filter_map(|row| row.first())
        .filter(|id| !id.is_empty())
        .cloned()
        .collect()
}

/// Keeps the data rows whose ID column is (or is not) in `ids`, in input
/// order. A row too short to have the column never matches.
pub fn grep_rows(ids: &HashSet<String>, data: Vec<Row>, options: GrepOptions) -> Vec<Row> {
    data.into_iter()
        .filter(|row| {
            let matched = match row.get(options.column) {
                None => false,
                Some(cell) if options.prefix => ids.iter().any(|id| cell.starts_with(id.as_str())),
                Some(cell) => ids.contains(cell),
            };
            matched != options.invert
        })
        .collect()
}
