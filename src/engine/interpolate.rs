//! Linear interpolation/extrapolation between census years.
//!
//! Given the rolled-up census table, population for a `(year, age)` pair is:
//!
//! - the census value itself when `year` is a census year with data for `age`
//! - a straight line between the bracketing censuses inside the census span
//! - a straight line through the two nearest censuses outside the span,
//!   anchored at the nearest one
//!
//! Results are rounded to the nearest integer and never negative.
//!
//! Age 0 of the generated series is not looked up: it is the sum of the
//! interpolated ages `1..=tail`, so every year's total is consistent with its
//! per-age rows by construction.

use rayon::prelude::*;

use crate::domain::{CensusTable, EngineConfig, PopulationGrid, YearSeries};
use crate::engine::{KnownCensus, known_censuses};

/// Read-only view over a census table that answers `(year, age)` queries.
///
/// Holds only shared borrows, so it can be queried from several threads.
#[derive(Debug, Clone)]
pub struct Interpolator<'a> {
    table: &'a CensusTable,
    config: &'a EngineConfig,
    known: Vec<KnownCensus>,
}

impl<'a> Interpolator<'a> {
    pub fn new(table: &'a CensusTable, config: &'a EngineConfig) -> Self {
        Self {
            table,
            config,
            known: known_censuses(table, &config.census_years),
        }
    }

    /// Censuses the interpolator actually draws on, in year order.
    pub fn known_censuses(&self) -> &[KnownCensus] {
        &self.known
    }

    /// Population for one target year and age.
    pub fn interpolate(&self, year: i32, age: u32) -> u64 {
        let (Some(first), Some(last)) = (self.known.first(), self.known.last()) else {
            return 0;
        };

        if let Some(value) = self
            .known
            .iter()
            .filter(|c| c.year == year)
            .find_map(|c| self.value(c, age))
        {
            return value;
        }

        if year < first.year {
            let rate = self.known.get(1).map_or(0.0, |second| self.rate(first, second, age));
            return project(self.anchor(first, age), rate, year - first.year);
        }

        if year > last.year {
            let n = self.known.len();
            let rate = if n >= 2 {
                self.rate(&self.known[n - 2], last, age)
            } else {
                0.0
            };
            return project(self.anchor(last, age), rate, year - last.year);
        }

        // first.year <= year <= last.year, so a previous census always exists.
        let Some(prev) = self.known.iter().rev().find(|c| c.year <= year) else {
            return 0;
        };
        match self.known.iter().find(|c| c.year > year) {
            Some(next) => project(self.anchor(prev, age), self.rate(prev, next, age), year - prev.year),
            None => self.value(prev, age).unwrap_or(0),
        }
    }

    /// Sum of interpolated populations for ages `1..=tail`.
    pub fn checksum_total(&self, year: i32) -> u64 {
        (1..=self.config.tail_age)
            .map(|age| self.interpolate(year, age))
            .fold(0, u64::saturating_add)
    }

    /// Ages `0..=tail` for one year, with age 0 set to the checksum total.
    pub fn year_series(&self, year: i32) -> YearSeries {
        let mut populations = Vec::with_capacity(self.config.tail_age as usize + 1);
        populations.push(0);
        populations.extend((1..=self.config.tail_age).map(|age| self.interpolate(year, age)));
        populations[0] = populations[1..].iter().fold(0, |sum, &pop| sum.saturating_add(pop));

        YearSeries {
            year,
            year_id: self.config.year_id(year),
            populations,
        }
    }

    /// Dense grid over the configured target years.
    ///
    /// Years are computed independently in parallel; output is in year order.
    pub fn build_grid(&self) -> PopulationGrid {
        let series: Vec<YearSeries> = self
            .config
            .target_years()
            .into_par_iter()
            .map(|year| self.year_series(year))
            .collect();
        PopulationGrid { series }
    }

    fn value(&self, census: &KnownCensus, age: u32) -> Option<u64> {
        self.table.get(census.year_code, age)
    }

    fn anchor(&self, census: &KnownCensus, age: u32) -> f64 {
        self.value(census, age).unwrap_or(0) as f64
    }

    /// Yearly change between two censuses for one age.
    ///
    /// Zero when either side lacks the age or the two censuses share a year.
    fn rate(&self, earlier: &KnownCensus, later: &KnownCensus, age: u32) -> f64 {
        let (Some(a), Some(b)) = (self.value(earlier, age), self.value(later, age)) else {
            return 0.0;
        };
        let span = later.year - earlier.year;
        if span <= 0 {
            return 0.0;
        }
        (b as f64 - a as f64) / span as f64
    }
}

/// `max(0, round(anchor + rate * years))`.
fn project(anchor: f64, rate: f64, years: i32) -> u64 {
    let v = anchor + rate * years as f64;
    if v.is_finite() && v > 0.0 { v.round() as u64 } else { 0 }
}
