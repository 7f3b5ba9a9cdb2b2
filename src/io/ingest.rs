//! CSV ingest.
//!
//! Turns a census export with `year-code, age, population` columns into raw
//! `Observation`s. Loading never fails as a whole:
//!
//! - a missing/unreadable file yields no observations (flagged, logged)
//! - malformed rows are skipped and recorded as `RowError`s
//! - an optional header row is detected and skipped
//!
//! Both comma- and semicolon-separated exports are accepted.

use std::fs;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{Delimiter, Observation};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed observations plus what was skipped.
#[derive(Debug, Clone, Default)]
pub struct IngestedData {
    pub observations: Vec<Observation>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub header_skipped: bool,
    /// Separator actually used (after auto-detection).
    pub delimiter: u8,
    /// The input could not be opened; nothing was loaded.
    pub missing_input: bool,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.observations.len()
    }
}

/// Load observations from a census CSV.
///
/// When `round_to_thousand` is set, every population is rounded to the nearest
/// thousand here, before any rollup or interpolation sees it.
pub fn load_observations(path: &Path, delimiter: Delimiter, round_to_thousand: bool) -> IngestedData {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "census input could not be read; no data loaded");
            return IngestedData {
                delimiter: delimiter.byte().unwrap_or(b','),
                missing_input: true,
                ..IngestedData::default()
            };
        }
    };

    let data = parse_observations(&bytes, delimiter, round_to_thousand);
    info!(
        path = %path.display(),
        rows_read = data.rows_read,
        rows_used = data.rows_used(),
        skipped = data.row_errors.len(),
        delimiter = %(data.delimiter as char),
        "loaded census observations"
    );
    data
}

/// Parse observations from in-memory CSV bytes.
pub fn parse_observations(bytes: &[u8], delimiter: Delimiter, round_to_thousand: bool) -> IngestedData {
    let delimiter = delimiter.byte().unwrap_or_else(|| detect_delimiter(bytes));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut out = IngestedData {
        delimiter,
        ..IngestedData::default()
    };

    for (idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map_or(idx + 1, |p| p.line() as usize);
                out.rows_read += 1;
                push_row_error(&mut out.row_errors, line, format!("CSV parse error: {e}"));
                continue;
            }
        };
        let line = record.position().map_or(idx + 1, |p| p.line() as usize);

        if idx == 0 && looks_like_header(&record) {
            debug!(line, header = ?record, "skipping header row");
            out.header_skipped = true;
            continue;
        }
        out.rows_read += 1;

        match parse_row(&record) {
            Ok(mut obs) => {
                if round_to_thousand {
                    obs.population = round_to_thousand_value(obs.population);
                }
                out.observations.push(obs);
            }
            Err(message) => push_row_error(&mut out.row_errors, line, message),
        }
    }

    out
}

fn push_row_error(errors: &mut Vec<RowError>, line: usize, message: String) {
    warn!(line, %message, "skipping census row");
    errors.push(RowError { line, message });
}

/// Pick `;` or `,` from the first non-empty line, whichever occurs more often.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes
        .split(|&b| b == b'\n')
        .find(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .unwrap_or_default();

    let commas = first_line.iter().filter(|&&b| b == b',').count();
    let semicolons = first_line.iter().filter(|&&b| b == b';').count();
    if semicolons > commas { b';' } else { b',' }
}

/// A first row whose year-code field is a label (`Year Code`, `ID`, ...) is a header.
fn looks_like_header(record: &StringRecord) -> bool {
    let Some(first) = record.get(0).map(clean_field) else {
        return false;
    };
    first.parse::<u32>().is_err() && first.chars().any(char::is_alphabetic)
}

fn parse_row(record: &StringRecord) -> Result<Observation, String> {
    if record.len() != 3 {
        return Err(format!(
            "Expected 3 fields (year-code, age, population), found {}.",
            record.len()
        ));
    }

    let year_code = parse_field(record, 0, "year-code")?;
    let age = parse_field(record, 1, "age")?;
    let population = parse_field(record, 2, "population")?;

    Ok(Observation::new(year_code, age, population))
}

fn parse_field<T: std::str::FromStr>(record: &StringRecord, idx: usize, name: &str) -> Result<T, String> {
    let raw = clean_field(record.get(idx).unwrap_or_default());
    if raw.is_empty() {
        return Err(format!("Missing {name} value."));
    }
    raw.parse::<T>().map_err(|_| format!("Invalid {name} '{raw}'."))
}

fn clean_field(s: &str) -> &str {
    // Excel exports sometimes prefix the first field with a UTF-8 BOM.
    s.trim().trim_start_matches('\u{feff}').trim()
}

/// Nearest thousand, halves rounded to the even thousand (2500 -> 2000).
pub fn round_to_thousand_value(population: u64) -> u64 {
    let (q, r) = (population / 1000, population % 1000);
    let q = if r > 500 || (r == 500 && q % 2 == 1) { q + 1 } else { q };
    q.saturating_mul(1000)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_comma_file_with_header() {
        let csv = b"Year Code,Age,Population\n2,0,1000\n2,50,20\n7,50,22\n";
        let data = parse_observations(csv, Delimiter::Auto, false);

        assert!(data.header_skipped);
        assert_eq!(data.delimiter, b',');
        assert_eq!(data.rows_read, 3);
        assert_eq!(data.observations[1], Observation::new(2, 50, 20));
        assert!(data.row_errors.is_empty());
    }

    #[test]
    fn detects_semicolon_without_header() {
        let csv = b"2;0;1000\n2;1;10\n";
        let data = parse_observations(csv, Delimiter::Auto, false);

        assert!(!data.header_skipped);
        assert_eq!(data.delimiter, b';');
        assert_eq!(data.observations.len(), 2);
    }

    #[test]
    fn forced_delimiter_overrides_detection() {
        let csv = b"2;0;1000\n";
        let data = parse_observations(csv, Delimiter::Comma, false);
        assert_eq!(data.observations.len(), 0);
        assert_eq!(data.row_errors.len(), 1);
    }

    #[test]
    fn malformed_rows_are_skipped_individually() {
        let csv = b"ID,Age,Population\n2,1,10\n2,,5\n2,x,5\nabc,3,5\n2,4\n2,5,-3\n2,6,60\n";
        let data = parse_observations(csv, Delimiter::Auto, false);

        assert_eq!(data.observations.len(), 2);
        assert_eq!(data.row_errors.len(), 5);
        assert_eq!(data.rows_read, 7);
        assert!(data.row_errors[0].message.contains("Missing age"));
        assert!(data.row_errors[1].message.contains("Invalid age 'x'"));
        assert!(data.row_errors[2].message.contains("Invalid year-code"));
        assert!(data.row_errors[3].message.contains("Expected 3 fields"));
        assert!(data.row_errors[4].message.contains("Invalid population"));
        assert_eq!(data.row_errors[0].line, 3);
    }

    #[test]
    fn strips_bom_and_whitespace() {
        let csv = "\u{feff}2 , 3 , 40\n".as_bytes();
        let data = parse_observations(csv, Delimiter::Auto, false);
        assert_eq!(data.observations, vec![Observation::new(2, 3, 40)]);
    }

    #[test]
    fn rounding_applies_at_load_time() {
        let csv = b"2,1,1499\n2,2,1500\n2,3,499\n";
        let data = parse_observations(csv, Delimiter::Auto, true);
        let pops: Vec<u64> = data.observations.iter().map(|o| o.population).collect();
        assert_eq!(pops, vec![1000, 2000, 0]);
    }

    #[test]
    fn thousand_rounding_breaks_ties_to_even() {
        assert_eq!(round_to_thousand_value(1500), 2000);
        assert_eq!(round_to_thousand_value(2500), 2000);
        assert_eq!(round_to_thousand_value(3500), 4000);
        assert_eq!(round_to_thousand_value(2501), 3000);
        assert_eq!(round_to_thousand_value(500), 0);
        assert_eq!(round_to_thousand_value(u64::MAX), u64::MAX);
    }

    #[test]
    fn missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let data = load_observations(&dir.path().join("nope.csv"), Delimiter::Auto, false);
        assert!(data.missing_input);
        assert!(data.observations.is_empty());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Year Code;Age;Population").unwrap();
        writeln!(file, "12;30;4500").unwrap();
        let data = load_observations(file.path(), Delimiter::Auto, false);
        assert!(!data.missing_input);
        assert_eq!(data.observations, vec![Observation::new(12, 30, 4500)]);
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let data = parse_observations(b"", Delimiter::Auto, false);
        assert!(data.observations.is_empty());
        assert!(data.row_errors.is_empty());
    }
}
