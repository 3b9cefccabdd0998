//! ASCII plotting for terminal output.
//!
//! Intentionally "dumb" (fixed-size character grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed values: `o`
//! - fitted/predicted curve: `-`
//! - both on one cell: `*`

use crate::domain::{Forecast, LogCurve};

/// Daily observed vs predicted deaths over the full horizon.
pub fn render_forecast_plot(forecast: &Forecast, width: usize, height: usize) -> String {
    let predicted: Vec<(f64, f64)> = forecast
        .daily
        .predicted_death
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();
    let observed: Vec<(f64, f64)> = forecast
        .daily
        .death
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i as f64, v))
        .collect();

    render_series_plot(
        &format!("daily deaths - observed (o) vs predicted (-) - {}", forecast.region),
        &observed,
        &predicted,
        width,
        height,
    )
}

/// The diagnostic log-space curve: actual vs fitted `ln(daily_deaths)`.
pub fn render_log_fit_plot(curve: &LogCurve, width: usize, height: usize) -> String {
    let fitted: Vec<(f64, f64)> = curve
        .points
        .iter()
        .map(|p| (p.day_index as f64, p.fitted_log))
        .collect();
    let actual: Vec<(f64, f64)> = curve
        .points
        .iter()
        .filter_map(|p| p.actual_log.map(|v| (p.day_index as f64, v)))
        .collect();

    render_series_plot(
        &format!("log daily deaths - actual (o) vs fitted (-) - {}", curve.region),
        &actual,
        &fitted,
        width,
        height,
    )
}

fn render_series_plot(
    title: &str,
    points: &[(f64, f64)],
    curve: &[(f64, f64)],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(20);
    let height = height.max(8);

    let all = points.iter().chain(curve.iter());
    let Some((x_min, x_max, y_min, y_max)) = bounds(all) else {
        return format!("{title}\n(no finite data to plot)\n");
    };

    let mut grid = vec![vec![' '; width]; height];

    for &(x, y) in curve {
        if let Some((col, row)) = to_cell(x, y, x_min, x_max, y_min, y_max, width, height) {
            grid[row][col] = '-';
        }
    }
    for &(x, y) in points {
        if let Some((col, row)) = to_cell(x, y, x_min, x_max, y_min, y_max, width, height) {
            grid[row][col] = if grid[row][col] == '-' { '*' } else { 'o' };
        }
    }

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');

    for (i, row) in grid.iter().enumerate() {
        // Label top, middle and bottom rows with their y value.
        let label = if i == 0 {
            format!("{y_max:>10.2}")
        } else if i == height - 1 {
            format!("{y_min:>10.2}")
        } else if i == height / 2 {
            format!("{:>10.2}", y_min + (y_max - y_min) / 2.0)
        } else {
            " ".repeat(10)
        };
        out.push_str(&label);
        out.push_str(" |");
        out.extend(row.iter());
        out.push('\n');
    }

    out.push_str(&" ".repeat(11));
    out.push('+');
    out.push_str(&"-".repeat(width));
    out.push('\n');
    out.push_str(&format!(
        "{:>11}day {:.0} .. day {:.0}\n",
        "", x_min, x_max
    ));

    out
}

fn bounds<'a>(values: impl Iterator<Item = &'a (f64, f64)>) -> Option<(f64, f64, f64, f64)> {
    let mut found = false;
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in values {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        found = true;
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !found {
        return None;
    }
    // Degenerate ranges still deserve a visible line.
    if x_max - x_min < 1e-12 {
        x_max = x_min + 1.0;
    }
    if y_max - y_min < 1e-12 {
        y_max = y_min + 1.0;
        y_min -= 1.0;
    }
    Some((x_min, x_max, y_min, y_max))
}

#[allow(clippy::too_many_arguments)]
fn to_cell(
    x: f64,
    y: f64,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    width: usize,
    height: usize,
) -> Option<(usize, usize)> {
    if !(x.is_finite() && y.is_finite()) {
        return None;
    }
    let u = (x - x_min) / (x_max - x_min);
    let v = (y - y_min) / (y_max - y_min);
    if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
        return None;
    }
    let col = ((u * (width - 1) as f64).round() as usize).min(width - 1);
    // Row 0 is the top of the grid.
    let row = height - 1 - ((v * (height - 1) as f64).round() as usize).min(height - 1);
    Some((col, row))
}
