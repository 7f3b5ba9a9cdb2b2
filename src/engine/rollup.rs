//! Tail-age rollup.
//!
//! Ages at or above the tail threshold are not individually meaningful in the
//! census exports, so they are summed into a single bucket at the threshold
//! age. Ages below the threshold are kept as-is; when the same
//! `(year_code, age)` appears more than once, the last row in input order wins.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::{CensusTable, Observation};

/// Counters describing what the rollup did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollupStats {
    pub observations: usize,
    /// Observations at or above the tail threshold.
    pub tail_observations: usize,
    /// Year-codes that received a tail bucket.
    pub tail_buckets: usize,
    /// Year-codes whose tail summed to zero (no bucket written).
    pub zero_tails_dropped: usize,
    /// Below-threshold rows that replaced an earlier row for the same age.
    pub duplicate_overwrites: usize,
}

/// Rollup output: the table plus counters for reporting.
#[derive(Debug, Clone, Default)]
pub struct Rollup {
    pub table: CensusTable,
    pub stats: RollupStats,
    pub tail_age: u32,
}

#[derive(Default)]
struct YearAccumulator {
    ages: BTreeMap<u32, u64>,
    tail_sum: u64,
    saw_tail: bool,
}

/// Build a `CensusTable` from unordered observations.
pub fn rollup(observations: &[Observation], tail_age: u32) -> Rollup {
    let mut stats = RollupStats {
        observations: observations.len(),
        ..RollupStats::default()
    };
    let mut acc: BTreeMap<u32, YearAccumulator> = BTreeMap::new();

    for obs in observations {
        let year = acc.entry(obs.year_code).or_default();
        if obs.age >= tail_age {
            year.tail_sum = year.tail_sum.saturating_add(obs.population);
            year.saw_tail = true;
            stats.tail_observations += 1;
        } else if year.ages.insert(obs.age, obs.population).is_some() {
            stats.duplicate_overwrites += 1;
        }
    }

    let mut years = BTreeMap::new();
    for (code, mut year) in acc {
        if year.tail_sum > 0 {
            year.ages.insert(tail_age, year.tail_sum);
            stats.tail_buckets += 1;
        } else if year.saw_tail {
            stats.zero_tails_dropped += 1;
            debug!(year_code = code, "tail ages sum to zero; no tail bucket written");
        }

        if year.ages.is_empty() {
            debug!(year_code = code, "no populated ages; year-code dropped");
            continue;
        }
        years.insert(code, year.ages);
    }

    Rollup {
        table: CensusTable::from_years(years),
        stats,
        tail_age,
    }
}
