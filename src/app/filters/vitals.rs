use crate::core::format::format_float;
use crate::core::table::{parse_number, Row};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    /// Sample standard deviation.
    pub stdev: f64,
}

impl Vitals {
    pub fn to_row(&self) -> Row {
        vec![
            format_float(self.sum),
            format_float(self.mean),
            format_float(self.stdev),
        ]
    }
}

/// Sum, mean and sample standard deviation of the numeric first cells of
/// `rows`. Rows whose first cell is not a number are ignored.
pub fn vitals(rows: &[Row]) -> Vitals {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut sum_squares = 0.0;
    for value in rows.iter().filter_map(|row| row.first().and_then(|c| parse_number(c))) {
        count += 1;
        sum += value;
        sum_squares += value * value;
    }

    if count == 0 {
        return Vitals {
            count,
            sum,
            mean: 0.0,
            stdev: 0.0,
        };
    }

    let n = count as f64;
    let mean = sum / n;
    let stdev = if count > 1 {
        // rounding can push a constant series slightly below zero
        let variance = n * (sum_squares / n - mean * mean) / (n - 1.0);
        variance.max(0.0).sqrt()
    } else {
        0.0
    };
    tracing::debug!("vitals: {} values", count);

    Vitals {
        count,
        sum,
        mean,
        stdev,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&str]) -> Vec<Row> {
        lines
            .iter()
            .map(|l| l.split(' ').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_vitals_of_one_to_five() {
        let v = vitals(&rows(&["1", "2", "3", "4", "5"]));
        assert_eq!(v.sum, 15.0);
        assert_eq!(v.mean, 3.0);
        assert!((v.stdev - 1.58114).abs() < 1e-5);
        assert_eq!(&v.to_row()[..2], &["15.0".to_string(), "3.0".to_string()]);
    }

    #[test]
    fn test_vitals_skips_non_numbers() {
        let v = vitals(&rows(&["1 A", "", "3 B", "text", "8 Q"]));
        assert_eq!(v.count, 3);
        assert_eq!(v.sum, 12.0);
        assert_eq!(v.mean, 4.0);
        assert!((v.stdev - 3.60555).abs() < 1e-5);
    }

    #[test]
    fn test_vitals_of_nothing() {
        let v = vitals(&[]);
        assert_eq!(v.to_row(), vec!["0.0", "0.0", "0.0"]);
    }

    #[test]
    fn test_vitals_of_single_value() {
        let v = vitals(&rows(&["7"]));
        assert_eq!((v.sum, v.mean, v.stdev), (7.0, 7.0, 0.0));
    }
}
