//! Command-line parsing for the census preparation tool.
//!
//! Argument parsing and command dispatch are kept separate from the engine.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_BASE_YEAR, DEFAULT_CHECKSUM_TOLERANCE, DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR, DEFAULT_TAIL_AGE, Delimiter,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "census",
    version,
    about = "Census age rollup, interpolation and SQL generation for UBI Compass"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and roll up the census CSV, print a summary, optionally export it.
    Rollup(RollupArgs),
    /// Compare each census's age-0 total with the sum of its per-age rows.
    Checksum(ChecksumArgs),
    /// Print interpolated populations for one year.
    Interpolate(InterpolateArgs),
    /// Run the full pipeline and write SQL insert statements (default).
    Generate(GenerateArgs),
    /// Re-parse a generated SQL file and compare it with a fresh run.
    Verify(VerifyArgs),
}

/// Input and engine options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Census CSV (`year-code, age, population`). Falls back to `CENSUS_INPUT`,
    /// then `population-age-id.csv`.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Field separator of the input.
    #[arg(long, value_enum, default_value_t = Delimiter::Auto)]
    pub delimiter: Delimiter,

    /// Round every population to the nearest thousand at load time
    /// (also enabled by `CENSUS_ROUND_THOUSANDS=1`).
    #[arg(long)]
    pub round_thousands: bool,

    /// Ages at and above this are summed into one bucket.
    #[arg(long, default_value_t = DEFAULT_TAIL_AGE)]
    pub tail_age: u32,

    /// Census year mapping `CODE:YEAR` (repeatable). Defaults to
    /// 2:2002, 7:2007, 12:2012, 17:2017, 22:2022.
    #[arg(long = "census-year", value_name = "CODE:YEAR", value_parser = parse_census_year)]
    pub census_years: Vec<CensusYearArg>,

    /// First year of the generated series.
    #[arg(long, default_value_t = DEFAULT_FIRST_YEAR)]
    pub first_year: i32,

    /// Last year of the generated series.
    #[arg(long, default_value_t = DEFAULT_LAST_YEAR)]
    pub last_year: i32,

    /// Year written as `yearStatsId = 0`.
    #[arg(long, default_value_t = DEFAULT_BASE_YEAR)]
    pub base_year: i32,

    /// Checksum tolerance (absolute difference below which a census matches).
    #[arg(long, default_value_t = DEFAULT_CHECKSUM_TOLERANCE)]
    pub tolerance: u64,
}

#[derive(Debug, Args, Clone)]
pub struct RollupArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Write the rolled table to CSV (`ID,Age,Population`).
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Number of rolled rows to print.
    #[arg(long, default_value_t = 10)]
    pub sample: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ChecksumArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Write the report to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Exit non-zero unless every census matches.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args, Clone)]
pub struct InterpolateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Target calendar year (may lie outside the census span).
    #[arg(long)]
    pub year: i32,

    /// Only print this age.
    #[arg(long)]
    pub age: Option<u32>,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// SQL output file. Falls back to `CENSUS_OUTPUT`, then `population-canada.sql`.
    #[arg(short = 'o', long, value_name = "SQL")]
    pub output: Option<PathBuf>,

    /// Skip the checksum report.
    #[arg(long)]
    pub no_checksum: bool,
}

#[derive(Debug, Args, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// SQL file produced by `census generate`.
    #[arg(long, value_name = "SQL")]
    pub sql: PathBuf,
}

/// One `--census-year CODE:YEAR` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CensusYearArg {
    pub code: u32,
    pub year: i32,
}

fn parse_census_year(s: &str) -> Result<CensusYearArg, String> {
    let (code, year) = s
        .split_once(':')
        .ok_or_else(|| format!("expected CODE:YEAR, got '{s}'"))?;
    let code = code
        .trim()
        .parse()
        .map_err(|_| format!("invalid year-code '{code}'"))?;
    let year = year
        .trim()
        .parse()
        .map_err(|_| format!("invalid year '{year}'"))?;
    Ok(CensusYearArg { code, year })
}
