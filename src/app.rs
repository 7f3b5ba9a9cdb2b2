//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging and loads `.env`
//! - parses CLI arguments into a `RunConfig`
//! - runs the pipeline for the chosen subcommand
//! - prints reports and writes output files

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::cli::{ChecksumArgs, Command, GenerateArgs, InputArgs, InterpolateArgs, RollupArgs, VerifyArgs};
use crate::domain::{CensusYearMap, EngineConfig, RunConfig};
use crate::error::{AppError, EXIT_CHECK_FAILED};

pub mod pipeline;

const DEFAULT_INPUT: &str = "population-age-id.csv";
const DEFAULT_OUTPUT: &str = "population-canada.sql";

const ENV_INPUT: &str = "CENSUS_INPUT";
const ENV_OUTPUT: &str = "CENSUS_OUTPUT";
const ENV_ROUND: &str = "CENSUS_ROUND_THOUSANDS";

/// Entry point for the `census` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    crate::logging::init();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Rollup(args) => handle_rollup(args),
        Command::Checksum(args) => handle_checksum(args),
        Command::Interpolate(args) => handle_interpolate(args),
        Command::Generate(args) => handle_generate(args),
        Command::Verify(args) => handle_verify(args),
    }
}

fn handle_rollup(args: RollupArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.input);
    let prepared = pipeline::prepare(&config)?;

    print!(
        "{}",
        crate::report::format_load_summary(&config.input_path, &prepared.ingest, &prepared.rollup)
    );
    print!(
        "{}",
        crate::report::format_rolled_sample(&prepared.rollup.table, config.engine.tail_age, args.sample)
    );

    if let Some(path) = &args.export {
        prepared.require_data()?;
        crate::io::export::write_rolled_csv(path, &prepared.rollup.table)?;
        info!(path = %path.display(), rows = prepared.rollup.table.entry_count(), "wrote rolled CSV");
    }

    Ok(())
}

fn handle_checksum(args: ChecksumArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.input);
    let prepared = pipeline::prepare(&config)?;

    print!(
        "{}",
        crate::report::format_load_summary(&config.input_path, &prepared.ingest, &prepared.rollup)
    );
    print!("{}", crate::report::format_checksum_report(&prepared.checksum));

    if let Some(path) = &args.export {
        crate::io::export::write_checksum_json(path, &prepared.checksum, &config.input_path)?;
        info!(path = %path.display(), "wrote checksum report");
    }

    if args.strict {
        prepared.require_data()?;
        let failed = prepared.checksum.failures().count();
        if failed > 0 {
            return Err(AppError::new(
                EXIT_CHECK_FAILED,
                format!("Checksum gate failed: {failed} census year(s) do not match."),
            ));
        }
    }

    Ok(())
}

fn handle_interpolate(args: InterpolateArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.input);
    let prepared = pipeline::prepare(&config)?;
    prepared.require_data()?;

    let interpolator = prepared.interpolator(&config);
    let series = interpolator.year_series(args.year);
    print!(
        "{}",
        crate::report::format_year_series(&series, interpolator.known_censuses(), args.age)
    );

    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.input);
    let output = args
        .output
        .clone()
        .or_else(|| env_path(ENV_OUTPUT))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let run = pipeline::run_generate(&config)?;

    print!(
        "{}",
        crate::report::format_load_summary(&config.input_path, &run.prepared.ingest, &run.prepared.rollup)
    );
    if !args.no_checksum {
        print!("{}", crate::report::format_checksum_report(&run.prepared.checksum));
    }

    crate::io::sql::write_sql_file(&output, &run.grid, &config.engine)?;
    info!(path = %output.display(), rows = run.grid.row_count(), "wrote SQL");
    print!(
        "{}",
        crate::report::format_generate_summary(&output, &config.engine, run.grid.row_count())
    );

    Ok(())
}

fn handle_verify(args: VerifyArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.input);
    let run = pipeline::run_generate(&config)?;
    let parsed = crate::io::sql::read_sql_file(&args.sql)?;

    let outcome = crate::report::compare_sql_rows(&run.grid, &parsed);
    print!("{}", crate::report::format_verify(&args.sql, &outcome));

    if !outcome.is_clean() {
        return Err(AppError::new(
            EXIT_CHECK_FAILED,
            format!(
                "SQL file '{}' differs from the recomputed grid ({} statement(s)).",
                args.sql.display(),
                outcome.mismatches.len()
            ),
        ));
    }
    Ok(())
}

/// Resolve CLI flags (plus `.env` fallbacks) into a pipeline config.
pub fn run_config_from_args(args: &InputArgs) -> RunConfig {
    let input_path = args
        .input
        .clone()
        .or_else(|| env_path(ENV_INPUT))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));

    let census_years = if args.census_years.is_empty() {
        CensusYearMap::canada()
    } else {
        CensusYearMap::new(args.census_years.iter().map(|c| (c.code, c.year)))
    };

    RunConfig {
        input_path,
        delimiter: args.delimiter,
        engine: EngineConfig {
            tail_age: args.tail_age,
            census_years,
            first_year: args.first_year,
            last_year: args.last_year,
            base_year: args.base_year,
            round_to_thousand: args.round_thousands || env_flag(ENV_ROUND),
            checksum_tolerance: args.tolerance,
        },
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Rewrite argv so `census` defaults to `census generate`.
///
/// Rules:
/// - `census`                      -> `census generate`
/// - `census -i data.csv ...`      -> `census generate -i data.csv ...`
/// - `census --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("generate".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    // If the first token is a flag, treat it as "generate flags".
    if arg1.starts_with('-') {
        argv.insert(1, "generate".to_string());
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs_generate() {
        assert_eq!(rewrite_args(argv(&["census"])), argv(&["census", "generate"]));
        assert_eq!(
            rewrite_args(argv(&["census", "-i", "x.csv"])),
            argv(&["census", "generate", "-i", "x.csv"])
        );
        assert_eq!(rewrite_args(argv(&["census", "--help"])), argv(&["census", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["census", "checksum", "--strict"])),
            argv(&["census", "checksum", "--strict"])
        );
    }

    #[test]
    fn flag_values_from_env() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn explicit_flags_build_engine_config() {
        let cli = crate::cli::Cli::parse_from([
            "census",
            "generate",
            "-i",
            "in.csv",
            "--tail-age",
            "90",
            "--census-year",
            "2:2002",
            "--first-year",
            "2001",
            "--tolerance",
            "50",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let config = run_config_from_args(&args.input);

        assert_eq!(config.input_path, PathBuf::from("in.csv"));
        assert_eq!(config.engine.tail_age, 90);
        assert_eq!(config.engine.census_years, CensusYearMap::new([(2, 2002)]));
        assert_eq!(config.engine.first_year, 2001);
        assert_eq!(config.engine.checksum_tolerance, 50);
        assert_eq!(config.engine.year_id(2001), 1);
    }
}
