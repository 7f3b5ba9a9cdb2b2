//! Shared domain types.
//!
//! These types carry census data through the pipeline:
//!
//! - raw observations as read from the CSV (`Observation`)
//! - the rolled-up per-census table (`CensusTable`)
//! - engine policy knobs (`EngineConfig`, `CensusYearMap`)
//! - the dense interpolated output (`PopulationGrid`)

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, EXIT_IO};

/// Age at and above which individual ages are summed into one bucket.
pub const DEFAULT_TAIL_AGE: u32 = 99;
/// First calendar year of the generated series.
pub const DEFAULT_FIRST_YEAR: i32 = 2000;
/// Last calendar year of the generated series.
pub const DEFAULT_LAST_YEAR: i32 = 2022;
/// Calendar year that maps to `yearStatsId = 0`.
pub const DEFAULT_BASE_YEAR: i32 = 2000;
/// Absolute difference below which a census checksum counts as a match.
pub const DEFAULT_CHECKSUM_TOLERANCE: u64 = 1000;

/// Field separator of the input CSV.
///
/// Census exports have shown up both comma- and semicolon-separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// Pick from the first non-empty line (whichever separator occurs more often).
    Auto,
    Comma,
    Semicolon,
}

impl Delimiter {
    /// Concrete separator byte, or `None` for `Auto`.
    pub fn byte(self) -> Option<u8> {
        match self {
            Delimiter::Auto => None,
            Delimiter::Comma => Some(b','),
            Delimiter::Semicolon => Some(b';'),
        }
    }
}

/// One `(year-code, age, population)` row of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub year_code: u32,
    pub age: u32,
    pub population: u64,
}

impl Observation {
    pub fn new(year_code: u32, age: u32, population: u64) -> Self {
        Self {
            year_code,
            age,
            population,
        }
    }
}

/// Mapping from compact census year-code to calendar year.
///
/// Immutable once built; the engine receives it through `EngineConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusYearMap {
    years: BTreeMap<u32, i32>,
}

impl CensusYearMap {
    pub fn new(pairs: impl IntoIterator<Item = (u32, i32)>) -> Self {
        Self {
            years: pairs.into_iter().collect(),
        }
    }

    /// The five Canadian census points: 2002, 2007, 2012, 2017, 2022.
    pub fn canada() -> Self {
        Self::new([(2, 2002), (7, 2007), (12, 2012), (17, 2017), (22, 2022)])
    }

    pub fn year_of(&self, year_code: u32) -> Option<i32> {
        self.years.get(&year_code).copied()
    }

    /// `(year_code, year)` pairs in year-code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.years.iter().map(|(&code, &year)| (code, year))
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

impl Default for CensusYearMap {
    fn default() -> Self {
        Self::canada()
    }
}

/// Rolled-up census data: `year_code -> (age -> population)`.
///
/// Built by `engine::rollup`; no age key exceeds the tail threshold the table
/// was rolled up with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CensusTable {
    years: BTreeMap<u32, BTreeMap<u32, u64>>,
}

impl CensusTable {
    pub(crate) fn from_years(years: BTreeMap<u32, BTreeMap<u32, u64>>) -> Self {
        Self { years }
    }

    pub fn get(&self, year_code: u32, age: u32) -> Option<u64> {
        self.years.get(&year_code)?.get(&age).copied()
    }

    pub fn ages(&self, year_code: u32) -> Option<&BTreeMap<u32, u64>> {
        self.years.get(&year_code)
    }

    pub fn contains_year_code(&self, year_code: u32) -> bool {
        self.years.contains_key(&year_code)
    }

    pub fn year_codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.years.keys().copied()
    }

    /// Highest age key across all year-codes.
    pub fn max_age(&self) -> Option<u32> {
        self.years
            .values()
            .filter_map(|ages| ages.keys().next_back().copied())
            .max()
    }

    /// Number of `(year_code, age)` entries.
    pub fn entry_count(&self) -> usize {
        self.years.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Flatten to observations sorted by year-code, then age.
    pub fn to_rows(&self) -> Vec<Observation> {
        self.years
            .iter()
            .flat_map(|(&code, ages)| {
                ages.iter()
                    .map(move |(&age, &population)| Observation::new(code, age, population))
            })
            .collect()
    }
}

/// Engine policy knobs.
///
/// Everything that varied between the old preparation scripts lives here
/// rather than in module-level constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub tail_age: u32,
    pub census_years: CensusYearMap,
    pub first_year: i32,
    pub last_year: i32,
    pub base_year: i32,
    /// Round every population to the nearest thousand at load time.
    pub round_to_thousand: bool,
    pub checksum_tolerance: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tail_age: DEFAULT_TAIL_AGE,
            census_years: CensusYearMap::canada(),
            first_year: DEFAULT_FIRST_YEAR,
            last_year: DEFAULT_LAST_YEAR,
            base_year: DEFAULT_BASE_YEAR,
            round_to_thousand: false,
            checksum_tolerance: DEFAULT_CHECKSUM_TOLERANCE,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.first_year > self.last_year {
            return Err(AppError::new(
                EXIT_IO,
                format!(
                    "Invalid year range: first year {} is after last year {}.",
                    self.first_year, self.last_year
                ),
            ));
        }
        if self.tail_age == 0 {
            return Err(AppError::new(EXIT_IO, "Tail age must be >= 1 (age 0 holds the checksum total)."));
        }
        if self.base_year > self.first_year {
            return Err(AppError::new(
                EXIT_IO,
                format!(
                    "Base year {} is after first year {} (yearStatsId would be negative).",
                    self.base_year, self.first_year
                ),
            ));
        }
        if self.census_years.is_empty() {
            return Err(AppError::new(EXIT_IO, "At least one census year mapping is required."));
        }
        Ok(())
    }

    pub fn target_years(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }

    /// `yearStatsId` written to SQL for a calendar year.
    pub fn year_id(&self, year: i32) -> i32 {
        year - self.base_year
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags, `.env` and defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_path: PathBuf,
    pub delimiter: Delimiter,
    pub engine: EngineConfig,
}

/// One `(year, age) -> population` cell of the generated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRow {
    pub year: i32,
    pub year_id: i32,
    pub age: u32,
    pub population: u64,
}

/// Populations for ages `0..=tail` of one target year.
///
/// Index 0 holds the checksum total (sum of ages `1..=tail`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSeries {
    pub year: i32,
    pub year_id: i32,
    pub populations: Vec<u64>,
}

impl YearSeries {
    pub fn total(&self) -> u64 {
        self.populations.first().copied().unwrap_or(0)
    }

    pub fn get(&self, age: u32) -> Option<u64> {
        self.populations.get(age as usize).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = PopulationRow> + '_ {
        self.populations
            .iter()
            .enumerate()
            .map(|(age, &population)| PopulationRow {
                year: self.year,
                year_id: self.year_id,
                age: age as u32,
                population,
            })
    }
}

/// Dense interpolated output, ordered by year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationGrid {
    pub series: Vec<YearSeries>,
}

impl PopulationGrid {
    pub fn year(&self, year: i32) -> Option<&YearSeries> {
        self.series.iter().find(|s| s.year == year)
    }

    pub fn get(&self, year: i32, age: u32) -> Option<u64> {
        self.year(year)?.get(age)
    }

    /// All rows, year-major then age.
    pub fn rows(&self) -> impl Iterator<Item = PopulationRow> + '_ {
        self.series.iter().flat_map(YearSeries::rows)
    }

    pub fn row_count(&self) -> usize {
        self.series.iter().map(|s| s.populations.len()).sum()
    }
}
