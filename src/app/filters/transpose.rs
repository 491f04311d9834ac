use crate::core::table::Row;

/// Matrix transpose. Ragged input is padded with missing cells, so the result
/// has as many rows as the longest input row.
pub fn transpose(rows: &[Row]) -> Vec<Row> {
    let height = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..height)
        .map(|i| {
            rows.iter()
                .map(|row| row.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}
