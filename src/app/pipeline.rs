//! Shared pipeline logic used by every subcommand.
//!
//! load -> rollup -> checksum -> interpolate grid
//!
//! Subcommands only decide what to print and which files to write.

use tracing::{info, warn};

use crate::domain::{PopulationGrid, RunConfig};
use crate::engine::{ChecksumReport, Interpolator, Rollup, checksum_report, rollup};
use crate::error::{AppError, EXIT_NO_DATA};
use crate::io::ingest::{IngestedData, load_observations};

/// Loaded and rolled-up census data.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub ingest: IngestedData,
    pub rollup: Rollup,
    pub checksum: ChecksumReport,
}

impl Prepared {
    pub fn interpolator<'a>(&'a self, config: &'a RunConfig) -> Interpolator<'a> {
        Interpolator::new(&self.rollup.table, &config.engine)
    }

    /// Fail with exit code 3 when nothing usable was loaded.
    pub fn require_data(&self) -> Result<(), AppError> {
        if !self.rollup.table.is_empty() {
            return Ok(());
        }
        let reason = if self.ingest.missing_input {
            "input file could not be read"
        } else {
            "no valid rows"
        };
        Err(AppError::new(
            EXIT_NO_DATA,
            format!("No census observations loaded ({reason}); nothing to generate."),
        ))
    }
}

/// Load the CSV, roll up tail ages, and compute the checksum report.
///
/// Never fails on data problems: a missing file or bad rows just mean less data.
pub fn prepare(config: &RunConfig) -> Result<Prepared, AppError> {
    config.engine.validate()?;

    let ingest = load_observations(&config.input_path, config.delimiter, config.engine.round_to_thousand);
    let rollup = rollup(&ingest.observations, config.engine.tail_age);
    info!(
        year_codes = rollup.table.year_codes().count(),
        entries = rollup.table.entry_count(),
        tail_rows = rollup.stats.tail_observations,
        "rolled up census table"
    );

    let checksum = checksum_report(&rollup.table, &config.engine);
    for entry in checksum.failures() {
        warn!(
            year = entry.year,
            year_code = entry.year_code,
            observed = ?entry.observed_total,
            sum = entry.sum_of_ages,
            diff = ?entry.signed_diff,
            ages = entry.ages_present,
            status = entry.status.label(),
            "census checksum does not match"
        );
    }

    Ok(Prepared {
        ingest,
        rollup,
        checksum,
    })
}

/// Everything `census generate` needs to write its output.
#[derive(Debug, Clone)]
pub struct GenerateOutput {
    pub prepared: Prepared,
    pub grid: PopulationGrid,
}

/// Full pipeline: prepare, require data, build the interpolated grid.
pub fn run_generate(config: &RunConfig) -> Result<GenerateOutput, AppError> {
    let prepared = prepare(config)?;
    prepared.require_data()?;

    let grid = prepared.interpolator(config).build_grid();
    info!(
        years = grid.series.len(),
        rows = grid.row_count(),
        "interpolated population grid"
    );

    Ok(GenerateOutput { prepared, grid })
}
