//! Piecewise log-linear fitting.
//!
//! Responsibilities:
//!
//! - fit each lockdown segment independently in log-death space
//! - downweight single-day reporting anomalies (Huber IRLS)
//! - surface `InsufficientData` when the pre segment cannot support a trend

pub mod fitter;

pub use fitter::*;
