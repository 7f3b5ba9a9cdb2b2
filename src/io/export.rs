//! File exports besides SQL.
//!
//! - the rolled-up census table as CSV (`ID,Age,Population`), for re-use by
//!   other preparation steps
//! - the checksum report as JSON, for CI gates and dataset review

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use serde::Serialize;

use crate::domain::CensusTable;
use crate::engine::ChecksumReport;
use crate::error::{AppError, EXIT_IO};

/// Write the rolled-up table to CSV, sorted by year-code then age.
pub fn write_rolled_csv(path: &Path, table: &CensusTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to create rolled CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "ID,Age,Population")
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to write rolled CSV header: {e}")))?;

    for obs in table.to_rows() {
        writeln!(out, "{},{},{}", obs.year_code, obs.age, obs.population)
            .map_err(|e| AppError::new(EXIT_IO, format!("Failed to write rolled CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to write rolled CSV '{}': {e}", path.display())))
}

/// JSON wrapper around a checksum report.
#[derive(Debug, Serialize)]
struct ChecksumFile<'a> {
    tool: &'static str,
    generated: String,
    input: String,
    all_match: bool,
    report: &'a ChecksumReport,
}

/// Write the checksum report to a JSON file.
pub fn write_checksum_json(path: &Path, report: &ChecksumReport, input: &Path) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to create checksum JSON '{}': {e}", path.display())))?;

    let doc = ChecksumFile {
        tool: "census",
        generated: Local::now().to_rfc3339(),
        input: input.display().to_string(),
        all_match: report.all_match(),
        report,
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to write checksum JSON: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Delimiter, EngineConfig, Observation};
    use crate::engine::{checksum_report, rollup};
    use crate::io::ingest::parse_observations;

    fn table() -> CensusTable {
        let obs = vec![
            Observation::new(7, 1, 12),
            Observation::new(2, 100, 3),
            Observation::new(2, 0, 15),
            Observation::new(2, 99, 5),
        ];
        rollup(&obs, 99).table
    }

    #[test]
    fn rolled_csv_is_sorted_and_reloadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolled.csv");
        write_rolled_csv(&path, &table()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "ID,Age,Population\n2,0,15\n2,99,8\n7,1,12\n");

        let reloaded = parse_observations(text.as_bytes(), Delimiter::Auto, false);
        assert!(reloaded.header_skipped);
        assert_eq!(rollup(&reloaded.observations, 99).table, table());
    }

    #[test]
    fn checksum_json_has_report_and_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checksum.json");
        let report = checksum_report(&table(), &EngineConfig::default());
        write_checksum_json(&path, &report, Path::new("population-age-id.csv")).unwrap();

        let value: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(value["tool"], "census");
        assert_eq!(value["input"], "population-age-id.csv");
        assert_eq!(value["all_match"], false);
        assert_eq!(value["report"]["entries"][0]["year"], 2002);
        assert_eq!(value["report"]["entries"][0]["status"], "match");
        assert_eq!(value["report"]["entries"][1]["status"], "missing_total");
    }
}
