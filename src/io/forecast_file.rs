//! Write forecast JSON files.
//!
//! Forecast JSON is the "portable" representation of a run:
//! - region + lockdown boundary
//! - fitted segment parameters (slope/intercept, growth factor)
//! - the daily and cumulative metric tables

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Forecast, LogFit, MetricSeries, PiecewiseFit, PreparedSeries};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentParams {
    pub slope: f64,
    pub intercept: f64,
    pub growth_factor: f64,
    pub n_points: usize,
}

impl From<&LogFit> for SegmentParams {
    fn from(fit: &LogFit) -> Self {
        Self {
            slope: fit.slope,
            intercept: fit.intercept,
            growth_factor: fit.growth_factor(),
            n_points: fit.n_points,
        }
    }
}

/// On-disk schema of a forecast run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastFile {
    pub tool: String,
    pub region: String,
    pub lockdown_date: Option<NaiveDate>,
    pub effective_split: Option<NaiveDate>,
    pub pre: SegmentParams,
    pub post: Option<SegmentParams>,
    pub daily: MetricSeries,
    pub cumulative: MetricSeries,
}

/// Write a forecast JSON file.
pub fn write_forecast_json(
    path: &Path,
    prepared: &PreparedSeries,
    fit: &PiecewiseFit,
    forecast: &Forecast,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!(
            "Failed to create forecast JSON '{}': {e}",
            path.display()
        ))
    })?;

    let payload = ForecastFile {
        tool: "prognosis".to_string(),
        region: forecast.region.clone(),
        lockdown_date: prepared.split.lockdown_date,
        effective_split: prepared.split.effective_date,
        pre: SegmentParams::from(&fit.pre),
        post: fit.post.as_ref().map(SegmentParams::from),
        daily: forecast.daily.clone(),
        cumulative: forecast.cumulative.clone(),
    };

    serde_json::to_writer_pretty(file, &payload)
        .map_err(|e| AppError::invalid_input(format!("Failed to write forecast JSON: {e}")))?;

    Ok(())
}
