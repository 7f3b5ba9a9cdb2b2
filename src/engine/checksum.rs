//! Census checksum diagnostics.
//!
//! Each census row set carries its total population at age 0. The total should
//! equal the sum of ages `1..=tail` in the same census; large gaps usually mean
//! a truncated export or a mislabeled year-code.
//!
//! The report never blocks generation on its own. `census checksum --strict`
//! turns it into a gate.

use serde::Serialize;

use crate::domain::{CensusTable, EngineConfig};
use crate::engine::known_censuses;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumStatus {
    Match,
    Mismatch,
    /// The census has no age-0 row to compare against.
    MissingTotal,
}

impl ChecksumStatus {
    pub fn label(self) -> &'static str {
        match self {
            ChecksumStatus::Match => "match",
            ChecksumStatus::Mismatch => "MISMATCH",
            ChecksumStatus::MissingTotal => "missing total",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecksumEntry {
    pub year_code: u32,
    pub year: i32,
    pub observed_total: Option<u64>,
    pub sum_of_ages: u64,
    /// How many of ages `1..=tail` have a row; low counts point at a truncated export.
    pub ages_present: usize,
    /// `observed_total - sum_of_ages`: positive when the ages under-count the total.
    pub signed_diff: Option<i64>,
    pub abs_diff: Option<u64>,
    /// `abs_diff / observed_total * 100`; absent when the total is missing or zero.
    pub pct_diff: Option<f64>,
    pub status: ChecksumStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecksumReport {
    pub tolerance: u64,
    pub tail_age: u32,
    pub entries: Vec<ChecksumEntry>,
}

impl ChecksumReport {
    pub fn all_match(&self) -> bool {
        self.entries.iter().all(|e| e.status == ChecksumStatus::Match)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ChecksumEntry> {
        self.entries.iter().filter(|e| e.status != ChecksumStatus::Match)
    }
}

/// Compare observed age-0 totals with per-age sums for every known census.
pub fn checksum_report(table: &CensusTable, config: &EngineConfig) -> ChecksumReport {
    let entries = known_censuses(table, &config.census_years)
        .into_iter()
        .map(|census| {
            let observed_total = table.get(census.year_code, 0);
            let (sum_of_ages, ages_present) = table
                .ages(census.year_code)
                .map(|ages| {
                    ages.range(1..=config.tail_age)
                        .fold((0u64, 0usize), |(sum, n), (_, &pop)| (sum.saturating_add(pop), n + 1))
                })
                .unwrap_or((0, 0));

            let signed_diff = observed_total.map(|total| signed_difference(total, sum_of_ages));
            let abs_diff = observed_total.map(|total| total.abs_diff(sum_of_ages));
            let pct_diff = match (observed_total, abs_diff) {
                (Some(total), Some(diff)) if total > 0 => Some(diff as f64 / total as f64 * 100.0),
                _ => None,
            };
            let status = match abs_diff {
                None => ChecksumStatus::MissingTotal,
                Some(diff) if diff < config.checksum_tolerance => ChecksumStatus::Match,
                Some(_) => ChecksumStatus::Mismatch,
            };

            ChecksumEntry {
                year_code: census.year_code,
                year: census.year,
                observed_total,
                sum_of_ages,
                ages_present,
                signed_diff,
                abs_diff,
                pct_diff,
                status,
            }
        })
        .collect();

    ChecksumReport {
        tolerance: config.checksum_tolerance,
        tail_age: config.tail_age,
        entries,
    }
}

fn signed_difference(total: u64, sum: u64) -> i64 {
    let diff = i128::from(total) - i128::from(sum);
    diff.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use crate::engine::rollup;

    fn table(rows: &[(u32, u32, u64)]) -> CensusTable {
        let obs: Vec<Observation> = rows
            .iter()
            .map(|&(code, age, pop)| Observation::new(code, age, pop))
            .collect();
        rollup(&obs, 99).table
    }

    #[test]
    fn classifies_by_tolerance() {
        let t = table(&[
            (2, 0, 10_000),
            (2, 1, 5_000),
            (2, 2, 4_500),
            (7, 0, 10_000),
            (7, 1, 5_000),
            (7, 2, 3_000),
        ]);
        let report = checksum_report(&t, &EngineConfig::default());

        assert_eq!(report.entries.len(), 2);
        let first = &report.entries[0];
        assert_eq!(first.year, 2002);
        assert_eq!(first.sum_of_ages, 9_500);
        assert_eq!(first.abs_diff, Some(500));
        assert_eq!(first.status, ChecksumStatus::Match);
        assert!((first.pct_diff.unwrap() - 5.0).abs() < 1e-9);

        let second = &report.entries[1];
        assert_eq!(second.abs_diff, Some(2_000));
        assert_eq!(second.status, ChecksumStatus::Mismatch);
        assert!(!report.all_match());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn diff_equal_to_tolerance_is_a_mismatch() {
        let t = table(&[(2, 0, 2_000), (2, 1, 1_000)]);
        let report = checksum_report(&t, &EngineConfig::default());
        assert_eq!(report.entries[0].status, ChecksumStatus::Mismatch);
    }

    #[test]
    fn tail_bucket_counts_toward_sum() {
        let t = table(&[(2, 0, 100), (2, 50, 20), (2, 99, 5), (2, 100, 3)]);
        let report = checksum_report(&t, &EngineConfig::default());
        assert_eq!(report.entries[0].sum_of_ages, 28);
        assert_eq!(report.entries[0].abs_diff, Some(72));
    }

    #[test]
    fn signed_diff_separates_under_and_over_counts() {
        let t = table(&[
            (2, 0, 10_000),
            (2, 1, 4_000),
            (2, 2, 5_000),
            (7, 0, 1_000),
            (7, 1, 1_300),
            (7, 99, 200),
        ]);
        let report = checksum_report(&t, &EngineConfig::default());

        assert_eq!(report.entries[0].signed_diff, Some(1_000));
        assert_eq!(report.entries[0].ages_present, 2);
        assert_eq!(report.entries[1].signed_diff, Some(-500));
        assert_eq!(report.entries[1].abs_diff, Some(500));
        assert_eq!(report.entries[1].ages_present, 2);
    }

    #[test]
    fn age_zero_is_not_counted_as_present() {
        let t = table(&[(12, 0, 10), (12, 5, 10)]);
        let report = checksum_report(&t, &EngineConfig::default());
        assert_eq!(report.entries[0].ages_present, 1);
        assert_eq!(report.entries[0].signed_diff, Some(0));
    }

    #[test]
    fn huge_populations_saturate_instead_of_overflowing() {
        let t = table(&[(2, 0, 1), (2, 1, u64::MAX / 2), (2, 2, u64::MAX / 2), (2, 3, u64::MAX / 2)]);
        let report = checksum_report(&t, &EngineConfig::default());
        let entry = &report.entries[0];

        assert_eq!(entry.sum_of_ages, u64::MAX);
        assert_eq!(entry.ages_present, 3);
        assert_eq!(entry.signed_diff, Some(i64::MIN));
        assert_eq!(entry.status, ChecksumStatus::Mismatch);
    }

    #[test]
    fn missing_total_is_reported() {
        let t = table(&[(12, 5, 100)]);
        let report = checksum_report(&t, &EngineConfig::default());
        let entry = &report.entries[0];
        assert_eq!(entry.status, ChecksumStatus::MissingTotal);
        assert_eq!(entry.observed_total, None);
        assert_eq!(entry.signed_diff, None);
        assert_eq!(entry.ages_present, 1);
        assert_eq!(entry.pct_diff, None);
        assert!(!report.all_match());
    }

    #[test]
    fn only_known_censuses_are_checked() {
        let t = table(&[(3, 0, 1), (22, 0, 0)]);
        let report = checksum_report(&t, &EngineConfig::default());
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].year, 2022);
        assert_eq!(report.entries[0].pct_diff, None);
        assert_eq!(report.entries[0].status, ChecksumStatus::Match);
    }

    #[test]
    fn report_serializes_status_in_snake_case() {
        let t = table(&[(12, 5, 100)]);
        let json = serde_json::to_string(&checksum_report(&t, &EngineConfig::default())).unwrap();
        assert!(json.contains("\"status\":\"missing_total\""));
    }
}
