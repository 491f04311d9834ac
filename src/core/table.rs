use std::io::{Read, Write};

use csv::{QuoteStyle, ReaderBuilder, Terminator, Trim, WriterBuilder};

use crate::utils::error::Result;

pub type Row = Vec<String>;

fn builder(trim: bool) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(if trim { Trim::All } else { Trim::None });
    builder
}

/// Reads every tab-delimited row. Blank lines are dropped by the reader.
pub fn read_rows<R: Read>(input: R) -> Result<Vec<Row>> {
    read_with(builder(false), input)
}

/// Like [`read_rows`] but with surrounding whitespace removed from each cell.
pub fn read_rows_trimmed<R: Read>(input: R) -> Result<Vec<Row>> {
    read_with(builder(true), input)
}

fn read_with<R: Read>(builder: ReaderBuilder, input: R) -> Result<Vec<Row>> {
    let mut reader = builder.from_reader(input);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Tab-delimited writer: minimal quoting, `\n` line ends, ragged rows allowed.
pub struct TsvWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> TsvWriter<W> {
    pub fn new(output: W) -> Self {
        let inner = WriterBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(output);
        Self { inner }
    }

    pub fn write_row<I, T>(&mut self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.inner.write_record(cells)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

pub fn write_rows<W: Write>(output: W, rows: &[Row]) -> Result<()> {
    let mut writer = TsvWriter::new(output);
    for row in rows {
        writer.write_row(row)?;
    }
    writer.flush()
}

/// A cell is missing when it is empty or whitespace only.
pub fn is_missing(cell: &str) -> bool {
    cell.trim().is_empty()
}

pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rows_keeps_ragged_rows_and_skips_blank_lines() {
        let rows = read_rows("a\tb\tc\n\nd\n".as_bytes()).unwrap();
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["d"]]);
    }

    #[test]
    fn test_read_rows_understands_quotes() {
        let rows = read_rows("\"x\ty\"\tz\n".as_bytes()).unwrap();
        assert_eq!(rows, vec![vec!["x\ty", "z"]]);
    }

    #[test]
    fn test_read_rows_trimmed() {
        let rows = read_rows_trimmed(" a \tb  \n".as_bytes()).unwrap();
        assert_eq!(rows, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_writer_quotes_only_when_needed() {
        let mut buf = Vec::new();
        {
            let mut w = TsvWriter::new(&mut buf);
            w.write_row(["a", "", "b c"]).unwrap();
            w.write_row(["x\ty"]).unwrap();
            w.flush().unwrap();
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "a\t\tb c\n\"x\ty\"\n");
    }

    #[test]
    fn test_missing_and_numbers() {
        assert!(is_missing(""));
        assert!(is_missing("  "));
        assert!(!is_missing("0"));
        assert_eq!(parse_number(" 2.5 "), Some(2.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("abc"), None);
    }
}
