use crate::core::format::format_float;
use crate::core::table::{is_missing, parse_number, Row};
use crate::utils::error::{Result, SfleError};

/// Scales every data column so that its non-missing values sum to 1.
///
/// The first row is the header and the first cell of every row is its ID.
/// Columns summing to zero are copied through untouched, missing cells stay
/// empty and rows shorter than the header are padded with missing cells.
pub fn normalize(rows: &[Row]) -> Result<Vec<Row>> {
    let Some((header, data)) = rows.split_first() else {
        return Err(SfleError::EmptyInput {
            context: "normalize needs a header row".to_string(),
        });
    };
    let width = header.len().saturating_sub(1);

    let mut values: Vec<Vec<Option<f64>>> = Vec::with_capacity(data.len());
    for (r, row) in data.iter().enumerate() {
        let mut parsed = Vec::with_capacity(width);
        for c in 0..width {
            let cell = row.get(c + 1).map(String::as_str).unwrap_or("");
            if is_missing(cell) {
                parsed.push(None);
                continue;
            }
            match parse_number(cell) {
                Some(v) => parsed.push(Some(v)),
                None => {
                    return Err(SfleError::ParseError {
                        row: r + 2,
                        column: c + 2,
                        token: cell.to_string(),
                    })
                }
            }
        }
        values.push(parsed);
    }

    let sums: Vec<f64> = (0..width)
        .map(|c| values.iter().filter_map(|row| row[c]).sum())
        .collect();
    tracing::debug!("normalize: {} rows, column sums {:?}", data.len(), sums);

    let mut out = Vec::with_capacity(rows.len());
    out.push(header.clone());
    for (row, parsed) in data.iter().zip(&values) {
        let mut line = Vec::with_capacity(row.len().max(width + 1));
        line.push(row.first().cloned().unwrap_or_default());
        for (c, value) in parsed.iter().enumerate() {
            let cell = match value {
                None => String::new(),
                Some(_) if sums[c] == 0.0 => row[c + 1].clone(),
                Some(v) => format_float(v / sums[c]),
            };
            line.push(cell);
        }
        // cells past the header are not part of any column
        line.extend(row.iter().skip(width + 1).cloned());
        out.push(line);
    }
    Ok(out)
}
