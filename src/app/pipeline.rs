//! The forecast pipeline and its public entry points.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! prepare -> piecewise fit -> project -> diagnostics
//!
//! `forecast` and `debug_fit` are the library-level call contract; `run_full`
//! returns every intermediate so the CLI can print summaries, plots, and
//! exports without recomputing.

use chrono::NaiveDate;

use crate::debug::log_fit_curve;
use crate::domain::{Forecast, ForecastConfig, LogCurve, PiecewiseFit, PreparedSeries, RegionSeries};
use crate::error::AppError;
use crate::fit::fit_piecewise;
use crate::project::project;
use crate::series::prepare;

/// All computed outputs of a single forecast run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub prepared: PreparedSeries,
    pub fit: PiecewiseFit,
    pub forecast: Forecast,
    pub log_curve: LogCurve,
}

/// Execute the full pipeline and keep every intermediate.
pub fn run_full(
    series: &RegionSeries,
    lockdown_date: Option<NaiveDate>,
    config: &ForecastConfig,
) -> Result<RunOutput, AppError> {
    let prepared = prepare(series, lockdown_date, config)?;
    let fit = fit_piecewise(&prepared, config)?;
    let forecast = project(&prepared, &fit, config)?;
    let log_curve = log_fit_curve(&prepared, &fit);
    Ok(RunOutput {
        prepared,
        fit,
        forecast,
        log_curve,
    })
}

/// Forecast daily and cumulative metrics for one region.
///
/// This is the stateless core contract: same inputs, same outputs, no I/O.
/// Fails with `InsufficientData` when the pre-lockdown segment cannot
/// support a trend; nothing partial is returned.
pub fn forecast(
    series: &RegionSeries,
    lockdown_date: Option<NaiveDate>,
    config: &ForecastConfig,
) -> Result<Forecast, AppError> {
    run_full(series, lockdown_date, config).map(|run| run.forecast)
}

/// The diagnostic log-space actual-vs-fitted curve for one region.
pub fn debug_fit(
    series: &RegionSeries,
    lockdown_date: Option<NaiveDate>,
    config: &ForecastConfig,
) -> Result<LogCurve, AppError> {
    run_full(series, lockdown_date, config).map(|run| run.log_curve)
}
