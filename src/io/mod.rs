//! Input/output helpers.
//!
//! - census CSV ingest (`ingest`)
//! - SQL insert generation and re-parsing (`sql`)
//! - rolled CSV / checksum JSON exports (`export`)

pub mod export;
pub mod ingest;
pub mod sql;

pub use export::*;
pub use ingest::*;
pub use sql::*;
