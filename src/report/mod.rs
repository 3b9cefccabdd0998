//! Reporting utilities: run summaries, metric tables, region rankings.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use chrono::NaiveDate;

use crate::domain::{Forecast, ForecastConfig, Metric, PiecewiseFit, PreparedSeries};

/// Metrics shown in the terminal table, in column order.
///
/// The full set is still available via CSV/JSON export; the terminal shows
/// the headline columns plus bed demand.
const TABLE_METRICS: [Metric; 5] = [
    Metric::Death,
    Metric::PredictedDeath,
    Metric::Hospitalized,
    Metric::Icu,
    Metric::IcuBeds,
];

/// One region's standing in the ICU-demand ranking.
#[derive(Debug, Clone)]
pub struct RankRow {
    pub region: String,
    pub peak_icu_beds: f64,
    pub peak_date: NaiveDate,
    pub growth_factor: f64,
    pub doubling_days: Option<f64>,
}

/// Format the run summary: data span, boundary, fit diagnostics, warnings.
pub fn format_run_summary(
    prepared: &PreparedSeries,
    fit: &PiecewiseFit,
    config: &ForecastConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== prognosis - COVID-19 forecast from death counts ===\n");
    out.push_str(&format!("Region: {}\n", prepared.region));
    out.push_str(&format!(
        "History: {} day(s) from {} ({} usable pre-lockdown point(s))\n",
        prepared.daily.points.len(),
        prepared.daily.start_date,
        prepared.pre_points.len(),
    ));
    match (prepared.split.lockdown_date, prepared.split.effective_date) {
        (Some(lockdown), Some(effective)) => out.push_str(&format!(
            "Lockdown: {lockdown}, effective in the death curve from {effective} (+{} days)\n",
            config.lockdown_effect_lag_days
        )),
        _ => out.push_str("Lockdown: none supplied - fitting the worst-case no-intervention trend\n"),
    }

    out.push_str("\nFit diagnostics:\n");
    out.push_str(&format!(
        "  pre : n={:<3} slope={:+.4} growth a={:.4} {}\n",
        fit.pre.n_points,
        fit.pre.slope,
        fit.pre.growth_factor(),
        fit.pre
            .doubling_time_days()
            .map(|d| format!("doubling every {d:.1} day(s)"))
            .unwrap_or_else(|| "not growing".to_string()),
    ));
    match &fit.post {
        Some(post) => out.push_str(&format!(
            "  post: n={:<3} slope={:+.4} growth a={:.4}\n",
            post.n_points,
            post.slope,
            post.growth_factor(),
        )),
        None => out.push_str("  post: too few points - whole series treated as pre-lockdown\n"),
    }

    if !prepared.warnings.is_empty() {
        out.push_str(&format!(
            "\nData quality: {} negative daily delta(s) clamped and excluded from the fit\n",
            prepared.warnings.len()
        ));
    }

    out
}

/// Format the tail of the daily and cumulative tables.
///
/// Shows `history_tail` observed days plus the whole forecast horizon.
pub fn format_metric_tables(forecast: &Forecast, history_tail: usize) -> String {
    let mut out = String::new();
    let start = forecast.last_observed_index.saturating_sub(history_tail.saturating_sub(1));

    out.push_str("Daily:\n");
    out.push_str(&format_table(forecast, &forecast.daily, start));
    out.push_str("\nCumulative:\n");
    out.push_str(&format_table(forecast, &forecast.cumulative, start));
    out
}

fn format_table(forecast: &Forecast, table: &crate::domain::MetricSeries, start: usize) -> String {
    let mut out = String::new();

    out.push_str(&format!("{:<12}", "date"));
    for metric in TABLE_METRICS {
        out.push_str(&format!(" {:>15}", metric.column_name()));
    }
    out.push('\n');

    for i in start..table.len() {
        let marker = if i > forecast.last_observed_index { '*' } else { ' ' };
        out.push_str(&format!("{}{:<11}", marker, table.dates[i]));
        for metric in TABLE_METRICS {
            out.push_str(&format!(" {:>15}", fmt_value(table.column(metric)[i])));
        }
        out.push('\n');
    }
    out.push_str("(* forecast)\n");

    out
}

/// Format the ICU-demand ranking table.
pub fn format_rankings(rows: &[RankRow]) -> String {
    let mut out = String::new();
    out.push_str("Regions by projected peak ICU bed demand:\n");
    out.push_str(&format!(
        "{:<4} {:<24} {:>14} {:>12} {:>10} {:>14}\n",
        "#", "region", "peak ICU beds", "peak date", "growth a", "doubling (d)"
    ));
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{:<4} {:<24} {:>14} {:>12} {:>10.4} {:>14}\n",
            i + 1,
            truncate(&row.region, 24),
            fmt_value(row.peak_icu_beds),
            row.peak_date,
            row.growth_factor,
            row.doubling_days
                .map(|d| format!("{d:.1}"))
                .unwrap_or_else(|| "-".to_string()),
        ));
    }
    out
}

fn fmt_value(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    if value.abs() >= 100.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
