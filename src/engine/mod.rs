//! Census rollup and interpolation engine.
//!
//! Responsibilities:
//!
//! - fold raw observations into a per-census table (`rollup`)
//! - compute population for any (year, age) from the census points (`interpolate`)
//! - cross-check census totals against per-age sums (`checksum`)

pub mod checksum;
pub mod interpolate;
pub mod rollup;

pub use checksum::*;
pub use interpolate::*;
pub use rollup::*;

use crate::domain::{CensusTable, CensusYearMap};

/// A census that is both mapped to a calendar year and present in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownCensus {
    pub year_code: u32,
    pub year: i32,
}

/// Censuses with data, ordered by calendar year (ties by year-code).
///
/// Year-codes without a mapping are ignored, as are mapped codes with no rows.
pub fn known_censuses(table: &CensusTable, years: &CensusYearMap) -> Vec<KnownCensus> {
    let mut known: Vec<KnownCensus> = years
        .iter()
        .filter(|(code, _)| table.contains_year_code(*code))
        .map(|(year_code, year)| KnownCensus { year_code, year })
        .collect();
    known.sort_by_key(|c| (c.year, c.year_code));
    known
}
