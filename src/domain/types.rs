//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and projection
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// One projected metric column.
///
/// `Death` is the raw observed series; everything else is derived from the
/// fitted pre-lockdown death curve via fixed lag/ratio rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Death,
    PredictedDeath,
    Infected,
    Symptomatic,
    Hospitalized,
    Icu,
    HospitalBeds,
    IcuBeds,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Death,
        Metric::PredictedDeath,
        Metric::Infected,
        Metric::Symptomatic,
        Metric::Hospitalized,
        Metric::Icu,
        Metric::HospitalBeds,
        Metric::IcuBeds,
    ];

    /// Column name used in CSV/JSON exports and table headers.
    pub fn column_name(self) -> &'static str {
        match self {
            Metric::Death => "death",
            Metric::PredictedDeath => "predicted_death",
            Metric::Infected => "infected",
            Metric::Symptomatic => "symptomatic",
            Metric::Hospitalized => "hospitalized",
            Metric::Icu => "ICU",
            Metric::HospitalBeds => "hospital_beds",
            Metric::IcuBeds => "ICU_beds",
        }
    }
}

/// One raw observation: cumulative confirmed deaths as of `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub cumulative_deaths: f64,
}

/// Ordered cumulative death counts for one region (country or US state).
///
/// Construction sorts by date and keeps the last value for duplicate dates,
/// so downstream code can rely on strictly increasing dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSeries {
    pub region: String,
    pub observations: Vec<Observation>,
}

impl RegionSeries {
    pub fn from_unsorted(region: impl Into<String>, mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.date);
        observations.dedup_by(|b, a| {
            if a.date == b.date {
                // Keep the later row: sources occasionally re-publish a date.
                a.cumulative_deaths = b.cumulative_deaths;
                true
            } else {
                false
            }
        });
        Self {
            region: region.into(),
            observations,
        }
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }
}

/// One day of the gap-free daily series.
///
/// `day_index` counts from the first observed date and doubles as the
/// regression time axis `t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub day_index: i64,
    /// New deaths on this day, clamped to `>= 0`.
    pub daily_deaths: f64,
}

/// Gap-free daily death series derived from a `RegionSeries`.
///
/// Invariant: `points[i].day_index == i` — one entry per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub start_date: NaiveDate,
    pub points: Vec<DailyPoint>,
}

impl DailySeries {
    pub fn date_for(&self, day_index: i64) -> NaiveDate {
        self.start_date + Duration::days(day_index)
    }

    pub fn last_day_index(&self) -> i64 {
        self.points.len() as i64 - 1
    }
}

/// The pre/post lockdown boundary.
///
/// A lockdown only shows up in the death curve after the infection-to-death
/// latency, so the effective boundary is `lockdown_date + effect_lag_days`.
/// With no lockdown date the boundary is at +infinity: the whole series is
/// pre-lockdown, which is the deliberate worst-case no-intervention default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockdownSplit {
    pub lockdown_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
}

impl LockdownSplit {
    pub fn new(lockdown_date: Option<NaiveDate>, effect_lag_days: i64) -> Self {
        Self {
            lockdown_date,
            effective_date: lockdown_date.map(|d| d + Duration::days(effect_lag_days)),
        }
    }

    /// Is `date` attributed to pre-lockdown infections?
    pub fn is_pre(&self, date: NaiveDate) -> bool {
        match self.effective_date {
            Some(split) => date <= split,
            None => true,
        }
    }
}

/// Which fitted segment a day belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentTag {
    Pre,
    Post,
}

/// A single regression input point: positive daily deaths at a day index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitPoint {
    pub day_index: i64,
    pub daily_deaths: f64,
}

/// Non-fatal data quality issue found while preparing a series.
///
/// Negative daily deltas are reporting corrections; they are clamped to zero
/// in the daily series and excluded from the regression input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWarning {
    pub date: NaiveDate,
    pub raw_delta: f64,
}

/// Output of series preparation: everything the fitter and projector need.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSeries {
    pub region: String,
    pub daily: DailySeries,
    pub split: LockdownSplit,
    /// Positive-delta points on or before the effective split.
    pub pre_points: Vec<FitPoint>,
    /// Positive-delta points after the effective split (possibly empty).
    pub post_points: Vec<FitPoint>,
    pub warnings: Vec<QualityWarning>,
}

/// A robust linear fit of `ln(daily_deaths)` against the day index.
///
/// The slope directly yields the daily multiplicative growth factor
/// `a = exp(slope)`; the intercept yields `b = exp(intercept)` in
/// `d(t) = b * a^t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogFit {
    pub slope: f64,
    pub intercept: f64,
    pub n_points: usize,
    /// Day indices of the points the fit was computed from.
    pub day_indices: Vec<i64>,
    /// Fitted `ln(daily_deaths)` at `day_indices`.
    pub fitted_log: Vec<f64>,
    /// `actual_log - fitted_log` at `day_indices`.
    pub residuals: Vec<f64>,
}

impl LogFit {
    pub fn predict_log(&self, day_index: f64) -> f64 {
        self.intercept + self.slope * day_index
    }

    pub fn predict_daily(&self, day_index: f64) -> f64 {
        self.predict_log(day_index).exp()
    }

    /// Daily multiplicative growth factor `a = exp(slope)`.
    pub fn growth_factor(&self) -> f64 {
        self.slope.exp()
    }

    /// `b = exp(intercept)` in `d(t) = b * a^t`.
    pub fn level(&self) -> f64 {
        self.intercept.exp()
    }

    /// Days for the daily death count to double, if it is growing.
    pub fn doubling_time_days(&self) -> Option<f64> {
        if self.slope > 0.0 {
            Some(std::f64::consts::LN_2 / self.slope)
        } else {
            None
        }
    }
}

/// The two-segment piecewise fit.
///
/// `post` is `None` when no lockdown date was supplied or the post segment has
/// too few usable points; the whole series is then treated as pre-lockdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseFit {
    pub pre: LogFit,
    pub post: Option<LogFit>,
}

/// One row of the diagnostic log-space curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogCurvePoint {
    pub date: NaiveDate,
    pub day_index: i64,
    pub segment: SegmentTag,
    /// `ln(daily_deaths)`, absent on zero-death days.
    pub actual_log: Option<f64>,
    pub fitted_log: f64,
}

/// Actual vs fitted `ln(daily_deaths)`, pre and post segments concatenated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogCurve {
    pub region: String,
    pub points: Vec<LogCurvePoint>,
}

/// Per-day values for every metric over the same date axis.
///
/// The observed `death` column is NaN past the last observation; cumulative
/// sums skip NaN entries so the two variants stay consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub dates: Vec<NaiveDate>,
    pub death: Vec<f64>,
    pub predicted_death: Vec<f64>,
    pub infected: Vec<f64>,
    pub symptomatic: Vec<f64>,
    pub hospitalized: Vec<f64>,
    pub icu: Vec<f64>,
    pub hospital_beds: Vec<f64>,
    pub icu_beds: Vec<f64>,
}

impl MetricSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::Death => &self.death,
            Metric::PredictedDeath => &self.predicted_death,
            Metric::Infected => &self.infected,
            Metric::Symptomatic => &self.symptomatic,
            Metric::Hospitalized => &self.hospitalized,
            Metric::Icu => &self.icu,
            Metric::HospitalBeds => &self.hospital_beds,
            Metric::IcuBeds => &self.icu_beds,
        }
    }
}

/// Final forecast output: daily and cumulative metric tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub region: String,
    /// Index of the last observed day within the tables.
    pub last_observed_index: usize,
    pub daily: MetricSeries,
    pub cumulative: MetricSeries,
}

/// Fixed epidemiological ratios and lags used by the projector.
///
/// All values are named configuration so they can be overridden for testing
/// and regional calibration. Defaults follow the published model assumptions:
/// 1% case fatality, 20% symptomatic, 15% hospitalized, 5% ICU; 5 days
/// incubation, 13 days infection to hospital, 15 to ICU, 20 to death.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRates {
    /// Fraction of infections that end in death.
    pub fatality_rate: f64,
    /// Fraction of infections that develop symptoms.
    pub symptomatic_rate: f64,
    /// Fraction of infections that need a hospital bed.
    pub hospitalized_rate: f64,
    /// Fraction of infections that need ICU care.
    pub icu_rate: f64,

    /// Days from infection to death (incubation + progression).
    pub infection_to_death_days: i64,
    /// Days from infection to symptom onset.
    pub incubation_days: i64,
    /// Days from infection to hospitalization.
    pub infection_to_hospital_days: i64,
    /// Days from infection to ICU admission.
    pub infection_to_icu_days: i64,

    /// Hospital beds occupied per eventual death.
    pub beds_per_death: f64,
    /// ICU beds occupied per eventual death.
    pub icu_beds_per_death: f64,
    /// Bed occupancy starts this many days before the death.
    pub hospital_bed_lead_days: i64,
    /// ICU occupancy starts this many days before the death.
    pub icu_bed_lead_days: i64,
    /// Occupancy continues this many days past the death.
    pub bed_tail_days: i64,
}

impl Default for ProjectionRates {
    fn default() -> Self {
        Self {
            fatality_rate: 0.01,
            symptomatic_rate: 0.20,
            hospitalized_rate: 0.15,
            icu_rate: 0.05,
            infection_to_death_days: 20,
            incubation_days: 5,
            infection_to_hospital_days: 13,
            infection_to_icu_days: 15,
            beds_per_death: 15.0,
            icu_beds_per_death: 5.0,
            hospital_bed_lead_days: 7,
            icu_bed_lead_days: 5,
            bed_tail_days: 10,
        }
    }
}

/// Full forecasting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Days until a lockdown measurably slows the death growth rate.
    pub lockdown_effect_lag_days: i64,
    /// Minimum days of history required to attempt a forecast.
    pub min_history_days: usize,
    /// Minimum positive-delta points required per fitted segment.
    pub min_points: usize,
    /// Huber IRLS reweight iterations (0 disables robust reweighting).
    pub robust_iters: usize,
    /// Huber tuning constant (larger = less downweighting).
    pub huber_k: f64,
    /// Forecast horizon past the last observation.
    pub lookahead_days: i64,
    pub rates: ProjectionRates,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lockdown_effect_lag_days: 21,
            min_history_days: 5,
            min_points: 3,
            robust_iters: 5,
            huber_k: 1.345,
            lookahead_days: 30,
            rates: ProjectionRates::default(),
        }
    }
}
