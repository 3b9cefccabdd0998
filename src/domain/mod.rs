//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input series types (`RegionSeries`, `DailySeries`, `PreparedSeries`)
//! - the lockdown boundary (`LockdownSplit`)
//! - fit outputs (`LogFit`, `PiecewiseFit`, `LogCurve`)
//! - projected metric tables (`Metric`, `MetricSeries`, `Forecast`)
//! - configuration (`ForecastConfig`, `ProjectionRates`)

pub mod types;

pub use types::*;
