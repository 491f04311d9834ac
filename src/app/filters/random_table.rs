use rand::Rng;

use crate::core::format::format_general;
use crate::core::table::Row;
use crate::utils::error::{Result, SfleError};

#[derive(Debug, Clone, Copy)]
pub struct RandomTableOptions {
    pub rows: usize,
    pub cols: usize,
    /// Probability that a cell is left empty.
    pub missing: f64,
    /// ID of the first row.
    pub first: usize,
    pub max: f64,
}

impl Default for RandomTableOptions {
    fn default() -> Self {
        Self {
            rows: 100,
            cols: 10,
            missing: 0.0,
            first: 0,
            max: 1.0,
        }
    }
}

/// Header `tid C000000 …`, rows `R%06d` with values drawn from `[0, max)`.
pub fn generate<G: Rng>(options: &RandomTableOptions, rng: &mut G) -> Result<Vec<Row>> {
    if options.first.checked_add(options.rows).is_none() {
        return Err(SfleError::InvalidConfigValueError {
            field: "first".to_string(),
            value: options.first.to_string(),
            reason: format!("Row IDs would overflow after {} rows", options.rows),
        });
    }

    let mut table = Vec::with_capacity(options.rows.saturating_add(1));

    let mut header = Vec::with_capacity(options.cols.saturating_add(1));
    header.push("tid".to_string());
    header.extend((0..options.cols).map(|c| format!("C{:06}", c)));
    table.push(header);

    for r in 0..options.rows {
        let mut row = Vec::with_capacity(options.cols.saturating_add(1));
        row.push(format!("R{:06}", r + options.first));
        for _ in 0..options.cols {
            let cell = if options.missing > 0.0 && rng.gen::<f64>() <= options.missing {
                String::new()
            } else {
                format_general(options.max * rng.gen::<f64>())
            };
            row.push(cell);
        }
        table.push(row);
    }
    Ok(table)
}
