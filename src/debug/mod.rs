//! Diagnostics: the log-space actual-vs-fitted curve and a debug bundle.
//!
//! The log curve is the "show me the regression" view: per day, the observed
//! `ln(daily_deaths)` against the fitted segment line, pre and post segments
//! concatenated. The bundle writer dumps the same material (plus config and
//! data-quality notes) to a markdown file for offline inspection.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use crate::domain::{
    ForecastConfig, LogCurve, LogCurvePoint, PiecewiseFit, PreparedSeries, SegmentTag,
};
use crate::error::AppError;

/// Build the diagnostic log curve for a fitted series.
///
/// Days after the split with no post fit fall back to the extrapolated pre
/// line, consistent with treating the whole series as pre-lockdown when the
/// post segment is too thin.
pub fn log_fit_curve(prepared: &PreparedSeries, fit: &PiecewiseFit) -> LogCurve {
    let points = prepared
        .daily
        .points
        .iter()
        .map(|p| {
            let segment = if prepared.split.is_pre(p.date) {
                SegmentTag::Pre
            } else {
                SegmentTag::Post
            };
            let line = match (segment, &fit.post) {
                (SegmentTag::Post, Some(post)) => post,
                _ => &fit.pre,
            };
            LogCurvePoint {
                date: p.date,
                day_index: p.day_index,
                segment,
                actual_log: (p.daily_deaths > 0.0).then(|| p.daily_deaths.ln()),
                fitted_log: line.predict_log(p.day_index as f64),
            }
        })
        .collect();

    LogCurve {
        region: prepared.region.clone(),
        points,
    }
}

/// Write a markdown debug bundle under `debug/` and return its path.
pub fn write_debug_bundle(
    prepared: &PreparedSeries,
    fit: &PiecewiseFit,
    config: &ForecastConfig,
) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir)
        .map_err(|e| AppError::internal(format!("Failed to create debug dir: {e}")))?;

    let slug: String = prepared
        .region
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let path = dir.join(format!("prognosis_debug_{slug}.md"));

    let mut out = String::new();
    render_bundle(&mut out, prepared, fit, config);

    let mut file = File::create(&path)
        .map_err(|e| AppError::internal(format!("Failed to create debug file: {e}")))?;
    file.write_all(out.as_bytes())
        .map_err(|e| AppError::internal(format!("Failed to write debug file: {e}")))?;

    Ok(path)
}

fn render_bundle(out: &mut String, prepared: &PreparedSeries, fit: &PiecewiseFit, config: &ForecastConfig) {
    use std::fmt::Write as _;

    let _ = writeln!(out, "# prognosis debug bundle");
    let _ = writeln!(out, "- region: {}", prepared.region);
    let _ = writeln!(out, "- history: {} day(s) from {}", prepared.daily.points.len(), prepared.daily.start_date);
    match (prepared.split.lockdown_date, prepared.split.effective_date) {
        (Some(lockdown), Some(effective)) => {
            let _ = writeln!(
                out,
                "- lockdown: {lockdown} (effective {effective}, +{} days)",
                config.lockdown_effect_lag_days
            );
        }
        _ => {
            let _ = writeln!(out, "- lockdown: none (worst-case no-intervention fit)");
        }
    }
    let _ = writeln!(
        out,
        "- robust: huber_k={}, iters={}, min_points={}",
        config.huber_k, config.robust_iters, config.min_points
    );

    if !prepared.warnings.is_empty() {
        let _ = writeln!(out, "\n## Data quality");
        for w in &prepared.warnings {
            let _ = writeln!(out, "- {}: negative daily delta {} clamped to 0", w.date, w.raw_delta);
        }
    }

    let _ = writeln!(out, "\n## Segment fits");
    let _ = writeln!(out, "| segment | n | slope | growth a | doubling (days) |");
    let _ = writeln!(out, "| - | - | - | - | - |");
    let doubling = |f: &crate::domain::LogFit| {
        f.doubling_time_days()
            .map(|d| format!("{d:.1}"))
            .unwrap_or_else(|| "-".to_string())
    };
    let _ = writeln!(
        out,
        "| pre | {} | {:.6} | {:.4} | {} |",
        fit.pre.n_points,
        fit.pre.slope,
        fit.pre.growth_factor(),
        doubling(&fit.pre)
    );
    match &fit.post {
        Some(post) => {
            let _ = writeln!(
                out,
                "| post | {} | {:.6} | {:.4} | {} |",
                post.n_points,
                post.slope,
                post.growth_factor(),
                doubling(post)
            );
        }
        None => {
            let _ = writeln!(out, "| post | - | - | - | - |");
        }
    }

    let curve = log_fit_curve(prepared, fit);
    let _ = writeln!(out, "\n## Log daily deaths: actual vs fitted");
    let _ = writeln!(out, "| date | segment | actual | fitted |");
    let _ = writeln!(out, "| - | - | - | - |");
    for p in &curve.points {
        let actual = p
            .actual_log
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "-".to_string());
        let seg = match p.segment {
            SegmentTag::Pre => "pre",
            SegmentTag::Post => "post",
        };
        let _ = writeln!(out, "| {} | {seg} | {actual} | {:.4} |", p.date, p.fitted_log);
    }
}
