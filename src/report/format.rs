//! Formatted terminal output.
//!
//! Formatting lives in one place so the engine stays free of presentation
//! concerns and output changes stay localized.

use std::path::Path;

use crate::domain::{CensusTable, EngineConfig, YearSeries};
use crate::engine::{ChecksumReport, KnownCensus, Rollup};
use crate::io::ingest::IngestedData;
use crate::io::sql::SqlRow;

/// Input + rollup summary shared by every subcommand.
pub fn format_load_summary(path: &Path, ingest: &IngestedData, rollup: &Rollup) -> String {
    let mut out = String::new();

    out.push_str("=== census - rollup ===\n");
    out.push_str(&format!("Input: {}\n", path.display()));
    if ingest.missing_input {
        out.push_str("  (input could not be read; no data loaded)\n");
        return out;
    }
    out.push_str(&format!(
        "Rows: read={} used={} skipped={} | delimiter='{}' | header={}\n",
        ingest.rows_read,
        ingest.rows_used(),
        ingest.row_errors.len(),
        ingest.delimiter as char,
        if ingest.header_skipped { "yes" } else { "no" },
    ));
    for err in ingest.row_errors.iter().take(5) {
        out.push_str(&format!("  line {}: {}\n", err.line, err.message));
    }
    if ingest.row_errors.len() > 5 {
        out.push_str(&format!("  ... and {} more\n", ingest.row_errors.len() - 5));
    }

    let stats = &rollup.stats;
    out.push_str(&format!(
        "Rollup: year-codes={} entries={} | tail(>={}) rows={} buckets={} zero-dropped={} | duplicates overwritten={}\n",
        rollup.table.year_codes().count(),
        rollup.table.entry_count(),
        rollup.tail_age,
        stats.tail_observations,
        stats.tail_buckets,
        stats.zero_tails_dropped,
        stats.duplicate_overwrites,
    ));

    out
}

/// The first `limit` rolled rows plus the max-age sanity line.
pub fn format_rolled_sample(table: &CensusTable, tail_age: u32, limit: usize) -> String {
    let mut out = String::new();
    let rows = table.to_rows();

    out.push_str("\nSample of rolled data:\n");
    out.push_str(&format!("{:>8} {:>5} {:>12}\n", "id", "age", "population"));
    out.push_str(&format!("{:-<8} {:-<5} {:-<12}\n", "", "", ""));
    for obs in rows.iter().take(limit) {
        out.push_str(&format!("{:>8} {:>5} {:>12}\n", obs.year_code, obs.age, obs.population));
    }
    if rows.len() > limit {
        out.push_str(&format!("... and {} more entries\n", rows.len() - limit));
    }

    match table.max_age() {
        Some(max) if max > tail_age => {
            out.push_str(&format!("\nWARNING: found age {max} above tail age {tail_age}\n"));
        }
        Some(_) => out.push_str(&format!("\nOK: no entries above age {tail_age}\n")),
        None => out.push_str("\n(no rolled entries)\n"),
    }

    out
}

/// Checksum table, one line per census year.
pub fn format_checksum_report(report: &ChecksumReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\nChecksum (age 0 vs sum of ages 1-{}, tolerance {}):\n",
        report.tail_age, report.tolerance
    ));
    out.push_str(&format!(
        "{:>6} {:>6} {:>14} {:>14} {:>6} {:>13} {:>9} {:<14}\n",
        "year", "code", "age0", "sum", "ages", "age0-sum", "diff%", "status"
    ));
    out.push_str(&format!(
        "{:->6} {:->6} {:->14} {:->14} {:->6} {:->13} {:->9} {:-<14}\n",
        "", "", "", "", "", "", "", ""
    ));

    for e in &report.entries {
        out.push_str(
            format!(
                "{:>6} {:>6} {:>14} {:>14} {:>6} {:>13} {:>9} {:<14}\n",
                e.year,
                e.year_code,
                fmt_opt_u64(e.observed_total),
                e.sum_of_ages,
                format!("{}/{}", e.ages_present, report.tail_age),
                e.signed_diff.map(|d| format!("{d:+}")).unwrap_or_else(|| "-".to_string()),
                e.pct_diff.map(|p| format!("{p:.3}")).unwrap_or_else(|| "-".to_string()),
                e.status.label(),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if report.entries.is_empty() {
        out.push_str("  (no census years with data)\n");
    }

    out
}

/// Interpolated values for one year; all ages, or just `age`.
pub fn format_year_series(series: &YearSeries, known: &[KnownCensus], age: Option<u32>) -> String {
    let mut out = String::new();

    let basis: Vec<String> = known.iter().map(|c| format!("{} (code {})", c.year, c.year_code)).collect();
    out.push_str(&format!("Year {} (yearStatsId {})\n", series.year, series.year_id));
    out.push_str(&format!(
        "Census basis: {}\n",
        if basis.is_empty() { "none".to_string() } else { basis.join(", ") }
    ));

    match age {
        Some(age) => match series.get(age) {
            Some(pop) => out.push_str(&format!("age {age}: {pop}\n")),
            None => out.push_str(&format!("age {age}: out of range (0-{})\n", series.populations.len().saturating_sub(1))),
        },
        None => {
            out.push_str(&format!("{:>5} {:>12}\n", "age", "population"));
            for (age, pop) in series.populations.iter().enumerate() {
                let note = if age == 0 { "  (sum of ages 1+)" } else { "" };
                out.push_str(&format!("{age:>5} {pop:>12}{note}\n"));
            }
        }
    }

    out
}

/// Summary line after writing SQL.
pub fn format_generate_summary(path: &Path, config: &EngineConfig, statements: usize) -> String {
    format!(
        "Wrote {statements} INSERT statements for {}-{} (ages 0-{}) to {}\n",
        config.first_year,
        config.last_year,
        config.tail_age,
        path.display()
    )
}

/// Result of comparing a SQL file against a fresh grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub expected: usize,
    pub found: usize,
    /// `(expected, found)` pairs that differ, in statement order.
    pub mismatches: Vec<(Option<SqlRow>, Option<SqlRow>)>,
}

impl VerifyOutcome {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

pub fn format_verify(path: &Path, outcome: &VerifyOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "SQL: {} | statements expected={} found={}\n",
        path.display(),
        outcome.expected,
        outcome.found
    ));
    if outcome.is_clean() {
        out.push_str("OK: every VALUES tuple matches the recomputed grid\n");
        return out;
    }
    out.push_str(&format!("{} differing statement(s):\n", outcome.mismatches.len()));
    for (expected, found) in outcome.mismatches.iter().take(10) {
        out.push_str(&format!("  expected {} | found {}\n", fmt_sql_row(*expected), fmt_sql_row(*found)));
    }
    out
}

fn fmt_sql_row(row: Option<SqlRow>) -> String {
    match row {
        Some(r) => format!("({}, {}, {})", r.year_id, r.age, r.population),
        None => "-".to_string(),
    }
}

fn fmt_opt_u64(v: Option<u64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use crate::engine::{checksum_report, rollup};

    #[test]
    fn checksum_table_lists_each_census() {
        let obs = vec![
            Observation::new(2, 0, 1000),
            Observation::new(2, 1, 990),
            Observation::new(7, 1, 5),
        ];
        let table = rollup(&obs, 99).table;
        let text = format_checksum_report(&checksum_report(&table, &EngineConfig::default()));

        assert!(text.contains("tolerance 1000"));
        let lines: Vec<&str> = text.lines().filter(|l| l.trim_start().starts_with("20")).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("match"));
        assert!(lines[1].ends_with("missing total"));
        assert!(lines[0].contains(" 1/99 "));
        assert!(lines[0].contains(" +10 "));
        assert!(lines[1].contains(" 1/99 "));
        assert!(text.contains("age0-sum"));
    }

    #[test]
    fn rolled_sample_flags_clean_table() {
        let obs = vec![Observation::new(2, 120, 4), Observation::new(2, 3, 1)];
        let table = rollup(&obs, 99).table;
        let text = format_rolled_sample(&table, 99, 1);
        assert!(text.contains("... and 1 more entries"));
        assert!(text.contains("OK: no entries above age 99"));
    }

    #[test]
    fn single_age_query_output() {
        let series = YearSeries { year: 2004, year_id: 4, populations: vec![21, 21] };
        let text = format_year_series(&series, &[], Some(1));
        assert!(text.contains("Year 2004 (yearStatsId 4)"));
        assert!(text.contains("Census basis: none"));
        assert!(text.contains("age 1: 21"));

        let text = format_year_series(&series, &[], Some(7));
        assert!(text.contains("out of range (0-1)"));
    }

    #[test]
    fn verify_output_lists_differences() {
        let row = SqlRow { year_id: 1, age: 2, population: 3 };
        let outcome = VerifyOutcome { expected: 1, found: 0, mismatches: vec![(Some(row), None)] };
        let text = format_verify(Path::new("out.sql"), &outcome);
        assert!(text.contains("expected (1, 2, 3) | found -"));
    }
}
