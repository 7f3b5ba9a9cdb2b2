//! SQL `INSERT` output for the `populations` table.
//!
//! The statement shape is fixed by the existing importer:
//!
//! ```text
//! INSERT INTO populations ("yearStatsId", "age", "population") VALUES (4, 50, 21);
//! ```
//!
//! One statement per (year, age), age 0 first, each year closed by a comment
//! banner. `read_insert_values` parses the VALUES tuples back out so generated
//! files can be checked against a fresh run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{EngineConfig, PopulationGrid};
use crate::error::{AppError, EXIT_IO};

const INSERT_PREFIX: &str = r#"INSERT INTO populations ("yearStatsId", "age", "population") VALUES ("#;
const INSERT_SUFFIX: &str = ");";

/// A `(yearStatsId, age, population)` tuple as written to SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlRow {
    pub year_id: i32,
    pub age: u32,
    pub population: u64,
}

/// Write the grid as SQL statements.
pub fn write_sql<W: Write>(out: &mut W, grid: &PopulationGrid, config: &EngineConfig) -> std::io::Result<()> {
    writeln!(
        out,
        "-- Population data for Canada ({}-{})",
        config.first_year, config.last_year
    )?;
    writeln!(out, "-- Generated from census data with interpolation")?;
    writeln!(out)?;

    for series in &grid.series {
        for row in series.rows() {
            writeln!(out, "{INSERT_PREFIX}{}, {}, {}{INSERT_SUFFIX}", row.year_id, row.age, row.population)?;
        }
        writeln!(out)?;
        writeln!(out, "-- End of data for year {} (code {})", series.year, series.year_id)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Write the grid to a SQL file.
pub fn write_sql_file(path: &Path, grid: &PopulationGrid, config: &EngineConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to create SQL file '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    write_sql(&mut out, grid, config)
        .and_then(|()| out.flush())
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to write SQL file '{}': {e}", path.display())))
}

/// Parse every `INSERT INTO populations` statement in `text`.
///
/// Blank lines and `--` comments are ignored; anything else is an error with
/// its 1-based line number.
pub fn read_insert_values(text: &str) -> Result<Vec<SqlRow>, String> {
    let mut rows = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        let row = parse_insert(line).ok_or_else(|| format!("line {}: not a populations INSERT: {line}", idx + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read and parse a SQL file written by `write_sql_file`.
pub fn read_sql_file(path: &Path) -> Result<Vec<SqlRow>, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to read SQL file '{}': {e}", path.display())))?;
    read_insert_values(&text).map_err(|e| AppError::new(EXIT_IO, format!("Invalid SQL file '{}': {e}", path.display())))
}

fn parse_insert(line: &str) -> Option<SqlRow> {
    let values = line.strip_prefix(INSERT_PREFIX)?.strip_suffix(INSERT_SUFFIX)?;
    let mut parts = values.split(',').map(str::trim);
    let row = SqlRow {
        year_id: parts.next()?.parse().ok()?,
        age: parts.next()?.parse().ok()?,
        population: parts.next()?.parse().ok()?,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(row)
}
