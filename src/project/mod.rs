//! Forecast projection: from the fitted death curve to every metric.
//!
//! All projected metrics hang off the **pre-lockdown** fit. The lag/ratio
//! chain (infection -> symptom -> hospitalization -> ICU -> death) only holds
//! for infections that happened before the lockdown took effect, so the post
//! fit is never fed into the projector; it exists for diagnostics only.
//!
//! Rules (all constants live in `ProjectionRates`):
//!
//! - `predicted_death(t) = b * a^t` from the pre fit
//! - `infected(t) = predicted_death(t + infection_to_death_days) / fatality_rate`
//! - symptomatic / hospitalized / ICU are fixed fractions of the infection
//!   cohort at their respective onset lags
//! - bed demand: each predicted death occupies `beds_per_death` hospital beds
//!   from `lead` days before the death until `tail` days after it (same for
//!   ICU beds with its own multiplier and lead)

use crate::domain::{Forecast, MetricSeries, Metric, PiecewiseFit, PreparedSeries, ForecastConfig};
use crate::error::AppError;

/// Project the fitted curve into daily and cumulative metric tables.
///
/// The tables cover the union of the observed history and
/// `config.lookahead_days` of forecast.
pub fn project(
    prepared: &PreparedSeries,
    fit: &PiecewiseFit,
    config: &ForecastConfig,
) -> Result<Forecast, AppError> {
    let rates = &config.rates;
    let last_observed = prepared.daily.last_day_index();
    let n = (last_observed + config.lookahead_days.max(0) + 1) as usize;

    let pre = &fit.pre;
    // The curve is a closed-form exponential, so shifted lookups stay exact
    // even outside the tabulated range (negative day indices included).
    let predicted = |t: f64| pre.predict_daily(t);
    let infected_at = |t: f64| predicted(t + rates.infection_to_death_days as f64) / rates.fatality_rate;

    let mut dates = Vec::with_capacity(n);
    let mut death = Vec::with_capacity(n);
    let mut predicted_death = Vec::with_capacity(n);
    let mut infected = Vec::with_capacity(n);
    let mut symptomatic = Vec::with_capacity(n);
    let mut hospitalized = Vec::with_capacity(n);
    let mut icu = Vec::with_capacity(n);
    let mut hospital_beds = Vec::with_capacity(n);
    let mut icu_beds = Vec::with_capacity(n);

    for i in 0..n {
        let t = i as f64;
        dates.push(prepared.daily.date_for(i as i64));

        death.push(if i as i64 <= last_observed {
            prepared.daily.points[i].daily_deaths
        } else {
            f64::NAN
        });

        let pd = predicted(t);
        if !pd.is_finite() {
            return Err(AppError::internal(format!(
                "Non-finite predicted deaths at day {i} for '{}'.",
                prepared.region
            )));
        }
        predicted_death.push(pd);

        infected.push(infected_at(t));
        symptomatic.push(rates.symptomatic_rate * infected_at(t - rates.incubation_days as f64));
        hospitalized
            .push(rates.hospitalized_rate * infected_at(t - rates.infection_to_hospital_days as f64));
        icu.push(rates.icu_rate * infected_at(t - rates.infection_to_icu_days as f64));

        hospital_beds.push(bed_occupancy(
            t as i64,
            rates.beds_per_death,
            rates.hospital_bed_lead_days,
            rates.bed_tail_days,
            &predicted,
        ));
        icu_beds.push(bed_occupancy(
            t as i64,
            rates.icu_beds_per_death,
            rates.icu_bed_lead_days,
            rates.bed_tail_days,
            &predicted,
        ));
    }

    let daily = MetricSeries {
        dates,
        death,
        predicted_death,
        infected,
        symptomatic,
        hospitalized,
        icu,
        hospital_beds,
        icu_beds,
    };
    let cumulative = cumulative_of(&daily);

    Ok(Forecast {
        region: prepared.region.clone(),
        last_observed_index: last_observed as usize,
        daily,
        cumulative,
    })
}

/// Beds occupied on `day` by deaths whose occupancy window covers it.
///
/// A death on day `t` occupies beds over `[t - lead, t + tail)`, so day `u`
/// collects deaths with `t` in `(u - tail, u + lead]`.
fn bed_occupancy(day: i64, per_death: f64, lead: i64, tail: i64, predicted: &impl Fn(f64) -> f64) -> f64 {
    let mut total = 0.0;
    for t in (day - tail + 1)..=(day + lead) {
        total += per_death * predicted(t as f64);
    }
    total
}

/// Cumulative variant: NaN-skipping prefix sums per column.
///
/// NaN entries (unobserved `death` days) stay NaN in the cumulative table but
/// do not poison the running sum, matching how the daily table treats them.
fn cumulative_of(daily: &MetricSeries) -> MetricSeries {
    MetricSeries {
        dates: daily.dates.clone(),
        death: running_sum(&daily.death),
        predicted_death: running_sum(&daily.predicted_death),
        infected: running_sum(&daily.infected),
        symptomatic: running_sum(&daily.symptomatic),
        hospitalized: running_sum(&daily.hospitalized),
        icu: running_sum(&daily.icu),
        hospital_beds: running_sum(&daily.hospital_beds),
        icu_beds: running_sum(&daily.icu_beds),
    }
}

fn running_sum(values: &[f64]) -> Vec<f64> {
    let mut sum = 0.0;
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                f64::NAN
            } else {
                sum += v;
                sum
            }
        })
        .collect()
}

/// Peak value and its date for one metric column (used for rankings).
pub fn peak_of(series: &MetricSeries, metric: Metric) -> Option<(chrono::NaiveDate, f64)> {
    let column = series.column(metric);
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in column.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        if best.map(|(_, b)| v > b).unwrap_or(true) {
            best = Some((i, v));
        }
    }
    best.map(|(i, v)| (series.dates[i], v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observation, RegionSeries};
    use crate::fit::fit_piecewise;
    use crate::series::prepare;
    use chrono::NaiveDate;

    fn flat_series(days: usize, daily: f64) -> RegionSeries {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let obs = (0..days)
            .map(|i| Observation {
                date: start + chrono::Duration::days(i as i64),
                cumulative_deaths: daily * (i as f64 + 1.0),
            })
            .collect();
        RegionSeries::from_unsorted("Testland", obs)
    }

    fn run(series: &RegionSeries, config: &ForecastConfig) -> Forecast {
        let prepared = prepare(series, None, config).unwrap();
        let fit = fit_piecewise(&prepared, config).unwrap();
        project(&prepared, &fit, config).unwrap()
    }

    #[test]
    fn flat_series_projects_flat_predictions() {
        // Scenario: constant 10/day, no lockdown => predicted_death ~ 10 everywhere.
        let config = ForecastConfig::default();
        let forecast = run(&flat_series(30, 10.0), &config);

        assert_eq!(forecast.daily.len(), 30 + config.lookahead_days as usize);
        for &v in &forecast.daily.predicted_death {
            assert!((v - 10.0).abs() < 1e-6, "predicted {v}");
        }
        // infected = death / 1% = 1000/day at every lag.
        for &v in &forecast.daily.infected {
            assert!((v - 1000.0).abs() < 1e-3);
        }
    }

    #[test]
    fn ratio_invariants_hold_at_lag_alignment() {
        let config = ForecastConfig::default();
        let forecast = run(&flat_series(30, 10.0), &config);
        let rates = &config.rates;
        let daily = &forecast.daily;

        for i in 20..daily.len() {
            let inf_at_symptom_onset =
                daily.infected[i - rates.incubation_days as usize];
            let inf_at_hospital_onset =
                daily.infected[i - rates.infection_to_hospital_days as usize];
            let inf_at_icu_onset = daily.infected[i - rates.infection_to_icu_days as usize];

            assert!((daily.symptomatic[i] / inf_at_symptom_onset - 0.20).abs() < 1e-9);
            assert!((daily.hospitalized[i] / inf_at_hospital_onset - 0.15).abs() < 1e-9);
            assert!((daily.icu[i] / inf_at_icu_onset - 0.05).abs() < 1e-9);
        }
    }

    #[test]
    fn cumulative_is_prefix_sum_of_daily() {
        let config = ForecastConfig::default();
        let forecast = run(&flat_series(25, 7.0), &config);

        for metric in Metric::ALL {
            let daily = forecast.daily.column(metric);
            let cumulative = forecast.cumulative.column(metric);
            let mut sum = 0.0;
            for i in 0..daily.len() {
                if daily[i].is_nan() {
                    assert!(cumulative[i].is_nan());
                    continue;
                }
                sum += daily[i];
                assert!(
                    (cumulative[i] - sum).abs() < 1e-9 * sum.abs().max(1.0),
                    "{:?} at {i}",
                    metric
                );
            }
        }
    }

    #[test]
    fn observed_death_is_nan_past_history() {
        let config = ForecastConfig::default();
        let forecast = run(&flat_series(20, 5.0), &config);

        assert_eq!(forecast.last_observed_index, 19);
        assert!(!forecast.daily.death[19].is_nan());
        assert!(forecast.daily.death[20].is_nan());
        assert!(forecast.cumulative.death[20].is_nan());
    }

    #[test]
    fn flat_bed_occupancy_matches_window_size() {
        // With constant predicted deaths d, occupancy is
        // per_death * d * (lead + tail) once the window is fully inside.
        let config = ForecastConfig::default();
        let forecast = run(&flat_series(30, 10.0), &config);
        let rates = &config.rates;

        let expected_hosp = rates.beds_per_death
            * 10.0
            * (rates.hospital_bed_lead_days + rates.bed_tail_days) as f64;
        let expected_icu = rates.icu_beds_per_death
            * 10.0
            * (rates.icu_bed_lead_days + rates.bed_tail_days) as f64;

        let mid = forecast.daily.len() / 2;
        assert!((forecast.daily.hospital_beds[mid] - expected_hosp).abs() < 1e-3);
        assert!((forecast.daily.icu_beds[mid] - expected_icu).abs() < 1e-3);
    }

    #[test]
    fn forecast_is_idempotent() {
        let config = ForecastConfig::default();
        let series = flat_series(30, 10.0);
        let a = run(&series, &config);
        let b = run(&series, &config);

        // Bit-level comparison; NaN != NaN defeats a plain equality check.
        assert_eq!(a.daily.dates, b.daily.dates);
        for metric in Metric::ALL {
            for (table_a, table_b) in [(&a.daily, &b.daily), (&a.cumulative, &b.cumulative)] {
                let xs = table_a.column(metric);
                let ys = table_b.column(metric);
                assert_eq!(xs.len(), ys.len());
                for (x, y) in xs.iter().zip(ys.iter()) {
                    assert_eq!(x.to_bits(), y.to_bits(), "{metric:?}");
                }
            }
        }
    }

    #[test]
    fn peak_of_skips_nan() {
        let series = MetricSeries {
            dates: (0..3)
                .map(|i| NaiveDate::from_ymd_opt(2020, 3, 1).unwrap() + chrono::Duration::days(i))
                .collect(),
            death: vec![1.0, f64::NAN, 0.5],
            predicted_death: vec![0.0; 3],
            infected: vec![0.0; 3],
            symptomatic: vec![0.0; 3],
            hospitalized: vec![0.0; 3],
            icu: vec![0.0; 3],
            hospital_beds: vec![0.0; 3],
            icu_beds: vec![0.0; 3],
        };
        let (date, value) = peak_of(&series, Metric::Death).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(value, 1.0);
    }
}
