//! `covid-prognosis` library crate.
//!
//! The binary (`prognosis`) is a thin wrapper around this library so that:
//!
//! - the forecasting core is testable without spawning processes
//! - modules are reusable (e.g., embedding the core in a service)
//! - code stays easy to navigate as the project grows
//!
//! The core contract lives in [`app::pipeline`]: `forecast` turns a region's
//! cumulative death counts plus an optional lockdown date into daily and
//! cumulative metric tables; `debug_fit` exposes the log-space regression
//! behind it.

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod project;
pub mod report;
pub mod series;
