//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input conventions (`Delimiter`)
//! - raw and rolled-up census data (`Observation`, `CensusTable`)
//! - engine configuration (`EngineConfig`, `CensusYearMap`, `RunConfig`)
//! - interpolated outputs (`PopulationGrid`, `YearSeries`, `PopulationRow`)

pub mod types;

pub use types::*;
