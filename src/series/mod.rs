//! Series preparation: cumulative counts to a clean, split daily series.
//!
//! Responsibilities:
//!
//! - align raw cumulative deaths onto a gap-free calendar-day axis
//! - derive daily deltas, clamping reporting corrections to zero
//! - split the series at the effective lockdown boundary
//! - collect the positive-delta points each segment's regression will use
//!
//! No fitting logic here; the output is a `PreparedSeries` that the fitter
//! and projector consume read-only.

use chrono::Duration;

use crate::domain::{
    DailyPoint, DailySeries, FitPoint, ForecastConfig, LockdownSplit, PreparedSeries,
    QualityWarning, RegionSeries,
};
use crate::error::AppError;

/// Prepare a raw region series for fitting.
///
/// Missing days carry the cumulative count forward (zero new deaths).
/// Negative deltas are clamped to zero and recorded as quality warnings.
/// Fails with `InsufficientData` when the aligned series is shorter than
/// `config.min_history_days`.
pub fn prepare(
    series: &RegionSeries,
    lockdown_date: Option<chrono::NaiveDate>,
    config: &ForecastConfig,
) -> Result<PreparedSeries, AppError> {
    let daily = build_daily_series(series, config)?;
    let (daily, warnings) = daily;

    let split = LockdownSplit::new(lockdown_date, config.lockdown_effect_lag_days);

    let mut pre_points = Vec::new();
    let mut post_points = Vec::new();
    for p in &daily.points {
        // Zero and clamped-negative days stay in the raw series for display
        // but are excluded here: log of a non-positive delta is undefined.
        if p.daily_deaths <= 0.0 {
            continue;
        }
        let point = FitPoint {
            day_index: p.day_index,
            daily_deaths: p.daily_deaths,
        };
        if split.is_pre(p.date) {
            pre_points.push(point);
        } else {
            post_points.push(point);
        }
    }

    Ok(PreparedSeries {
        region: series.region.clone(),
        daily,
        split,
        pre_points,
        post_points,
        warnings,
    })
}

fn build_daily_series(
    series: &RegionSeries,
    config: &ForecastConfig,
) -> Result<(DailySeries, Vec<QualityWarning>), AppError> {
    let Some(first) = series.observations.first() else {
        return Err(AppError::insufficient_data(format!(
            "No death observations for region '{}'.",
            series.region
        )));
    };
    let last = series.observations.last().map(|o| o.date).unwrap_or(first.date);

    let n_days = last.signed_duration_since(first.date).num_days() + 1;
    if (n_days as usize) < config.min_history_days {
        return Err(AppError::insufficient_data(format!(
            "Only {n_days} day(s) of history for region '{}'; need at least {}.",
            series.region, config.min_history_days
        )));
    }

    let mut points = Vec::with_capacity(n_days as usize);
    let mut warnings = Vec::new();

    let mut obs_iter = series.observations.iter().peekable();
    let mut prev_cumulative = 0.0;
    for day_index in 0..n_days {
        let date = first.date + Duration::days(day_index);

        // Carry the cumulative count forward over gaps.
        let mut cumulative = prev_cumulative;
        while let Some(obs) = obs_iter.peek() {
            if obs.date > date {
                break;
            }
            cumulative = obs.cumulative_deaths;
            obs_iter.next();
        }

        let raw_delta = if day_index == 0 {
            // The first day has no predecessor; treat the opening count as
            // that day's new deaths so cumulative sums stay aligned.
            cumulative
        } else {
            cumulative - prev_cumulative
        };

        let daily_deaths = if raw_delta < 0.0 {
            warnings.push(QualityWarning { date, raw_delta });
            0.0
        } else {
            raw_delta
        };

        points.push(DailyPoint {
            date,
            day_index,
            daily_deaths,
        });
        prev_cumulative = cumulative.max(prev_cumulative);
    }

    Ok((
        DailySeries {
            start_date: first.date,
            points,
        },
        warnings,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use crate::error::ErrorKind;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, day).unwrap()
    }

    fn series(obs: &[(u32, f64)]) -> RegionSeries {
        RegionSeries::from_unsorted(
            "Testland",
            obs.iter()
                .map(|&(day, c)| Observation {
                    date: d(day),
                    cumulative_deaths: c,
                })
                .collect(),
        )
    }

    #[test]
    fn gaps_carry_cumulative_forward() {
        let s = series(&[(1, 2.0), (2, 5.0), (5, 5.0), (6, 9.0)]);
        let prepared = prepare(&s, None, &ForecastConfig::default()).unwrap();

        let deltas: Vec<f64> = prepared.daily.points.iter().map(|p| p.daily_deaths).collect();
        assert_eq!(deltas, vec![2.0, 3.0, 0.0, 0.0, 0.0, 4.0]);
        assert_eq!(prepared.daily.points.len(), 6);
        for (i, p) in prepared.daily.points.iter().enumerate() {
            assert_eq!(p.day_index, i as i64);
        }
    }

    #[test]
    fn negative_deltas_clamped_and_warned() {
        let s = series(&[(1, 5.0), (2, 9.0), (3, 7.0), (4, 10.0), (5, 12.0)]);
        let prepared = prepare(&s, None, &ForecastConfig::default()).unwrap();

        assert_eq!(prepared.warnings.len(), 1);
        assert_eq!(prepared.warnings[0].date, d(3));
        assert_eq!(prepared.warnings[0].raw_delta, -2.0);
        assert_eq!(prepared.daily.points[2].daily_deaths, 0.0);
        // The clamped day is excluded from the regression input.
        assert!(prepared.pre_points.iter().all(|p| p.day_index != 2));
    }

    #[test]
    fn short_history_is_insufficient() {
        let s = series(&[(1, 1.0), (2, 2.0)]);
        let err = prepare(&s, None, &ForecastConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn split_separates_segments_with_effect_lag() {
        let obs: Vec<(u32, f64)> = (1..=31).map(|day| (day, day as f64)).collect();
        let s = series(&obs);
        let config = ForecastConfig {
            lockdown_effect_lag_days: 5,
            ..ForecastConfig::default()
        };
        let prepared = prepare(&s, Some(d(10)), &config).unwrap();

        assert_eq!(prepared.split.effective_date, Some(d(15)));
        // Day 1 has the opening count, days 2..=31 each add one death.
        assert!(prepared.pre_points.iter().all(|p| p.day_index <= 14));
        assert!(prepared.post_points.iter().all(|p| p.day_index > 14));
        assert!(!prepared.post_points.is_empty());
    }

    #[test]
    fn no_lockdown_means_everything_pre() {
        let obs: Vec<(u32, f64)> = (1..=10).map(|day| (day, day as f64)).collect();
        let prepared = prepare(&series(&obs), None, &ForecastConfig::default()).unwrap();
        assert!(prepared.post_points.is_empty());
        assert_eq!(prepared.pre_points.len(), 10);
    }
}
