//! Export metric tables to CSV.
//!
//! One file carries both variants: plain columns are daily values, `cum_`
//! prefixed columns are cumulative. Unobserved cells (NaN) are left empty so
//! spreadsheets read them as missing rather than zero.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{Forecast, Metric};
use crate::error::AppError;

/// Write the daily and cumulative metric tables to a CSV file.
pub fn write_metrics_csv(path: &Path, forecast: &Forecast) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    let mut header = String::from("date");
    for metric in Metric::ALL {
        header.push(',');
        header.push_str(metric.column_name());
    }
    for metric in Metric::ALL {
        header.push_str(",cum_");
        header.push_str(metric.column_name());
    }
    writeln!(file, "{header}")
        .map_err(|e| AppError::invalid_input(format!("Failed to write export CSV header: {e}")))?;

    for i in 0..forecast.daily.len() {
        let mut row = forecast.daily.dates[i].to_string();
        for metric in Metric::ALL {
            row.push(',');
            row.push_str(&fmt_cell(forecast.daily.column(metric)[i]));
        }
        for metric in Metric::ALL {
            row.push(',');
            row.push_str(&fmt_cell(forecast.cumulative.column(metric)[i]));
        }
        writeln!(file, "{row}")
            .map_err(|e| AppError::invalid_input(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

fn fmt_cell(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        String::new()
    }
}
