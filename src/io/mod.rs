//! Input/output helpers.
//!
//! - local CSV ingest + validation (`ingest`)
//! - metric table exports (CSV) (`export`)
//! - forecast JSON write (`forecast_file`)

pub mod export;
pub mod forecast_file;
pub mod ingest;

pub use export::*;
pub use forecast_file::*;
pub use ingest::*;
