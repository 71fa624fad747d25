//! Parser and writer for the pipe-delimited overall usage report
//!
//! Only lines starting with `|` carry data. The first such line is the
//! column header and is discarded; every other one yields a record from
//! its name and percentage columns.

use crate::error::{Error, Result};
use crate::names::normalize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

const FIELD_DELIMITER: char = '|';
const NAME_FIELD: usize = 2;
const PERCENTAGE_FIELD: usize = 3;

/// One ranked row of a usage report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Species name as written in the report
    pub name: String,
    /// Usage percentage, kept verbatim (e.g. "45.245%")
    pub percentage: String,
}

impl UsageRecord {
    /// Create a new record
    pub fn new(name: impl Into<String>, percentage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            percentage: percentage.into(),
        }
    }
}

/// Parse a leaderboard report file
pub fn parse_leaderboard<P: AsRef<Path>>(path: P) -> Result<Vec<UsageRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_leaderboard_str(&content)
}

/// Parse leaderboard report text
pub fn parse_leaderboard_str(content: &str) -> Result<Vec<UsageRecord>> {
    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if !line.starts_with(FIELD_DELIMITER) {
            continue;
        }

        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        if fields.len() <= PERCENTAGE_FIELD {
            return Err(Error::MalformedRecord {
                line: idx + 1,
                content: line.to_string(),
            });
        }

        records.push(UsageRecord::new(
            fields[NAME_FIELD].trim(),
            fields[PERCENTAGE_FIELD].trim(),
        ));
    }

    // The first qualifying row is the column header
    if !records.is_empty() {
        records.remove(0);
    }

    Ok(records)
}

/// Write records as `name<TAB>percentage` rows with canonical names
pub fn write_leaderboard<W: Write>(records: &[UsageRecord], writer: W) -> Result<W> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    for record in records {
        csv_writer.write_record([normalize(&record.name), record.percentage.as_str()])?;
    }

    csv_writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Render records into an in-memory buffer
pub fn render_leaderboard(records: &[UsageRecord]) -> Result<Vec<u8>> {
    write_leaderboard(records, Vec::new())
}

/// Read a previously written tab-delimited leaderboard back into records
pub fn read_leaderboard_tsv(content: &str) -> Result<Vec<UsageRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let row = result?;
        let name = row.get(0).unwrap_or_default();
        let percentage = row.get(1).unwrap_or_default();
        records.push(UsageRecord::new(name, percentage));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = "\
 Total battles: 96
 + ---- + ------------------ + ------- +
 | Rank | Pokemon            | Percent |
 + ---- + ------------------ + ------- +
 | 1    | Tyranitar          | 45.245% |
 | 2    | Deoxys             | 30.100% |
 | 3    | Nidoran♀           |  2.000% |
 + ---- + ------------------ + ------- +
";

    #[test]
    fn test_parse_drops_header() {
        let records = parse_leaderboard_str(REPORT).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], UsageRecord::new("Tyranitar", "45.245%"));
        assert_eq!(records[1], UsageRecord::new("Deoxys", "30.100%"));
        assert_eq!(records[2], UsageRecord::new("Nidoran♀", "2.000%"));
    }

    #[test]
    fn test_parse_ignores_non_pipe_lines() {
        let records = parse_leaderboard_str("garbage\n\n+ --- +\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_header_only() {
        let records = parse_leaderboard_str("| Rank | Pokemon | Percent |\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_short_row_fails() {
        let content = "| Rank | Pokemon | Percent |\n| 1 | Tyranitar\n";
        match parse_leaderboard_str(content) {
            Err(Error::MalformedRecord { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "| 1 | Tyranitar");
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_write_normalizes_names() {
        let records = parse_leaderboard_str(REPORT).unwrap();
        let output = String::from_utf8(render_leaderboard(&records).unwrap()).unwrap();

        assert_eq!(
            output,
            "Tyranitar\t45.245%\nDeoxys-M\t30.100%\nNidoran-F\t2.000%\n"
        );
    }

    #[test]
    fn test_write_keeps_order_and_count() {
        let records = parse_leaderboard_str(REPORT).unwrap();
        let output = String::from_utf8(render_leaderboard(&records).unwrap()).unwrap();
        let reread = read_leaderboard_tsv(&output).unwrap();

        assert_eq!(reread.len(), records.len());
        for (original, written) in records.iter().zip(&reread) {
            assert_eq!(normalize(&original.name), written.name);
            assert_eq!(original.percentage, written.percentage);
        }
    }

    #[test]
    fn test_read_converted_leaderboard() {
        let records = read_leaderboard_tsv("Giratina-A\t20.0%\nNidoran-M\t1.5%\n").unwrap();

        assert_eq!(
            records,
            vec![
                UsageRecord::new("Giratina-A", "20.0%"),
                UsageRecord::new("Nidoran-M", "1.5%"),
            ]
        );
        assert!(read_leaderboard_tsv("").unwrap().is_empty());
    }

    #[test]
    fn test_write_empty() {
        assert!(render_leaderboard(&[]).unwrap().is_empty());
    }
}
