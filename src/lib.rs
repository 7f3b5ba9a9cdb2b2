//! `census-rollup` library crate.
//!
//! Prepares census population-by-age data for the UBI Compass tool:
//! CSV ingest, tail-age rollup, linear interpolation between census years,
//! checksum diagnostics, and SQL `INSERT` generation.
//!
//! The binary (`census`) is a thin wrapper around this library so the engine
//! can be tested without spawning processes.

pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
