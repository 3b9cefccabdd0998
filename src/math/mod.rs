//! Mathematical utilities: weighted least squares for the log-linear fit.

pub mod wls;

pub use wls::*;
