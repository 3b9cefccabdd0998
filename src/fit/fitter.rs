//! Robust log-linear segment fitting.
//!
//! Daily new deaths in an uncontrolled outbreak behave like `d(t) = b * a^t`,
//! which a log transform turns into a line: `ln d(t) = ln b + t ln a`. Each
//! lockdown segment gets its own line, fitted by weighted least squares with
//! Huber reweighting so a single anomalous reporting day cannot drag the
//! growth estimate.

use crate::domain::{FitPoint, ForecastConfig, LogFit, PiecewiseFit, PreparedSeries};
use crate::error::AppError;
use crate::math::fit_weighted_line;

/// Weight floor applied during reweighting so no point is dropped entirely.
const MIN_WEIGHT_FACTOR: f64 = 1e-3;

/// Fit both lockdown segments of a prepared series.
///
/// The pre segment must have at least `config.min_points` usable points; this
/// is the single user-visible failure of the whole forecast. A thin or empty
/// post segment is not an error: the fit simply omits it and the series is
/// treated as entirely pre-lockdown.
pub fn fit_piecewise(
    prepared: &PreparedSeries,
    config: &ForecastConfig,
) -> Result<PiecewiseFit, AppError> {
    if prepared.pre_points.len() < config.min_points {
        return Err(AppError::insufficient_data(format!(
            "Not enough data to provide prognosis for '{}': {} usable day(s) before the lockdown \
             became effective, need at least {}. Check the input lockdown date.",
            prepared.region,
            prepared.pre_points.len(),
            config.min_points
        )));
    }

    let pre = fit_segment(&prepared.pre_points, config)?;

    let post = if prepared.post_points.len() >= config.min_points {
        Some(fit_segment(&prepared.post_points, config)?)
    } else {
        None
    };

    Ok(PiecewiseFit { pre, post })
}

/// Fit one segment: `ln(daily_deaths) = intercept + slope * day_index`.
///
/// Robust fitting is a small number of outer iterations:
///
/// - start with uniform weights
/// - solve the weighted least squares line
/// - compute residuals
/// - downweight large residuals (Huber, MAD scale) and repeat
///
/// This is deterministic and resists single-day reporting spikes without
/// discarding data outright.
pub fn fit_segment(points: &[FitPoint], config: &ForecastConfig) -> Result<LogFit, AppError> {
    let ts: Vec<f64> = points.iter().map(|p| p.day_index as f64).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.daily_deaths.ln()).collect();

    if ys.iter().any(|y| !y.is_finite()) {
        return Err(AppError::internal(
            "Non-positive daily deaths reached the log-regression input.",
        ));
    }

    let mut weights = vec![1.0; points.len()];
    let n_fits = config.robust_iters.saturating_add(1);

    let mut line = None;
    for _ in 0..n_fits {
        let (intercept, slope) = fit_weighted_line(&ts, &ys, &weights).ok_or_else(|| {
            AppError::internal("Degenerate segment: could not solve the log-linear fit.")
        })?;
        line = Some((intercept, slope));

        let residuals: Vec<f64> = ts
            .iter()
            .zip(ys.iter())
            .map(|(&t, &y)| y - (intercept + slope * t))
            .collect();
        weights = huber_reweight(&residuals, config.huber_k);
    }

    // n_fits >= 1, so the line is always set by this point.
    let (intercept, slope) = line
        .ok_or_else(|| AppError::internal("Segment fit produced no candidate line."))?;

    let day_indices: Vec<i64> = points.iter().map(|p| p.day_index).collect();
    let fitted_log: Vec<f64> = ts.iter().map(|&t| intercept + slope * t).collect();
    let residuals: Vec<f64> = ys
        .iter()
        .zip(fitted_log.iter())
        .map(|(&y, &f)| y - f)
        .collect();

    Ok(LogFit {
        slope,
        intercept,
        n_points: points.len(),
        day_indices,
        fitted_log,
        residuals,
    })
}

/// Huber weights from residuals, scaled by the median absolute deviation.
///
/// Points inside the cutoff keep full weight; outside it the weight decays as
/// `cutoff / |r|`, floored so no observation vanishes completely.
fn huber_reweight(residuals: &[f64], k: f64) -> Vec<f64> {
    let mut abs: Vec<f64> = residuals
        .iter()
        .map(|r| r.abs())
        .filter(|v| v.is_finite())
        .collect();
    let mad = median_mut(&mut abs).unwrap_or(0.0);
    let scale = (mad / 0.6745).max(1e-12);
    let cutoff = k.max(1e-6) * scale;

    residuals
        .iter()
        .map(|&r| {
            let ar = r.abs();
            if ar <= cutoff || !ar.is_finite() {
                1.0
            } else {
                (cutoff / ar).max(MIN_WEIGHT_FACTOR)
            }
        })
        .collect()
}

fn median_mut(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observation, RegionSeries};
    use crate::error::ErrorKind;
    use crate::series::prepare;
    use chrono::NaiveDate;

    fn points(daily: &[f64]) -> Vec<FitPoint> {
        daily
            .iter()
            .enumerate()
            .map(|(i, &d)| FitPoint {
                day_index: i as i64,
                daily_deaths: d,
            })
            .collect()
    }

    #[test]
    fn constant_deaths_fit_flat() {
        // Scenario: 10 deaths/day for 30 days => slope ~ 0, a ~ 1.
        let config = ForecastConfig::default();
        let fit = fit_segment(&points(&[10.0; 30]), &config).unwrap();
        assert!(fit.slope.abs() < 1e-9, "slope {}", fit.slope);
        assert!((fit.growth_factor() - 1.0).abs() < 1e-9);
        assert!((fit.predict_daily(40.0) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn doubling_deaths_recover_ln2_slope() {
        let daily: Vec<f64> = (0..10).map(|i| 2.0_f64.powi(i)).collect();
        let config = ForecastConfig::default();
        let fit = fit_segment(&points(&daily), &config).unwrap();
        assert!((fit.slope - std::f64::consts::LN_2).abs() < 1e-9);
        assert!((fit.growth_factor() - 2.0).abs() < 1e-9);
        assert!(fit.intercept.abs() < 1e-9);
    }

    #[test]
    fn fitted_curve_matches_b_times_a_pow_t() {
        let daily: Vec<f64> = (0..12).map(|i| 3.0 * 1.3_f64.powi(i)).collect();
        let config = ForecastConfig::default();
        let fit = fit_segment(&points(&daily), &config).unwrap();

        let a = fit.growth_factor();
        let b = fit.level();
        for &t in &fit.day_indices {
            let reconstructed = b * a.powi(t as i32);
            assert!((fit.predict_daily(t as f64) - reconstructed).abs() < 1e-9 * reconstructed);
        }
    }

    #[test]
    fn single_day_spike_barely_moves_robust_slope() {
        // Scenario: steady 10/day with one 1000-death reporting day.
        let mut daily = vec![10.0; 30];
        daily[25] = 1000.0;
        let config = ForecastConfig::default();
        let fit = fit_segment(&points(&daily), &config).unwrap();
        assert!(
            fit.slope.abs() < 0.01,
            "robust slope should stay near the flat trend, got {}",
            fit.slope
        );

        // The same data without reweighting is visibly biased.
        let ols_config = ForecastConfig {
            robust_iters: 0,
            ..config
        };
        let ols = fit_segment(&points(&daily), &ols_config).unwrap();
        assert!(ols.slope.abs() > fit.slope.abs());
    }

    #[test]
    fn thin_pre_segment_is_insufficient() {
        let obs: Vec<Observation> = (1..=6)
            .map(|day| Observation {
                date: NaiveDate::from_ymd_opt(2020, 3, day).unwrap(),
                // Flat cumulative count: only day 1 has a positive delta.
                cumulative_deaths: 4.0,
            })
            .collect();
        let series = RegionSeries::from_unsorted("Testland", obs);
        let config = ForecastConfig::default();
        let prepared = prepare(&series, None, &config).unwrap();
        let err = fit_piecewise(&prepared, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn thin_post_segment_is_omitted_not_an_error() {
        // Doubling deaths, lockdown on day 5: the effective split lands past
        // the end of the series, so everything is pre-lockdown.
        let obs: Vec<Observation> = (0..10)
            .map(|i| Observation {
                date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap() + chrono::Duration::days(i),
                cumulative_deaths: (2.0_f64.powi(i as i32 + 1)) - 1.0,
            })
            .collect();
        let series = RegionSeries::from_unsorted("Testland", obs);
        let config = ForecastConfig::default();
        let lockdown = NaiveDate::from_ymd_opt(2020, 3, 6).unwrap();
        let prepared = prepare(&series, Some(lockdown), &config).unwrap();
        let fit = fit_piecewise(&prepared, &config).unwrap();

        assert!(fit.post.is_none());
        assert!((fit.pre.slope - std::f64::consts::LN_2).abs() < 1e-6);
    }

    #[test]
    fn post_segment_fits_only_post_lag_data() {
        // Pre: doubling. Post (after lockdown day 5 + 5-day lag): flat.
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let mut cumulative = 0.0;
        let obs: Vec<Observation> = (0..30)
            .map(|i| {
                let daily = if i <= 9 { 2.0_f64.powi(i) } else { 500.0 };
                cumulative += daily;
                Observation {
                    date: start + chrono::Duration::days(i as i64),
                    cumulative_deaths: cumulative,
                }
            })
            .collect();
        let series = RegionSeries::from_unsorted("Testland", obs);
        let config = ForecastConfig {
            lockdown_effect_lag_days: 5,
            ..ForecastConfig::default()
        };
        let lockdown = start + chrono::Duration::days(4);
        let prepared = prepare(&series, Some(lockdown), &config).unwrap();
        let fit = fit_piecewise(&prepared, &config).unwrap();

        let post = fit.post.expect("post segment should fit");
        assert!(post.day_indices.iter().all(|&t| t > 9));
        assert!(post.slope.abs() < 1e-6, "flat post trend, got {}", post.slope);
        assert!(fit.pre.slope > 0.5);
    }
}
