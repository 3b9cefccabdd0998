//! JHU CSSE death-count time series.
//!
//! The upstream files are wide CSVs: identifying columns first, then one
//! column per calendar date (`m/d/yy`). The global file carries one row per
//! country/province pair; the US file one row per county. Both are aggregated
//! here to one `RegionSeries` per country or US state.
//!
//! The fetch is a point-in-time snapshot; the core never refreshes it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use reqwest::blocking::Client;

use crate::domain::{Observation, RegionSeries};
use crate::error::AppError;

const GLOBAL_DEATHS_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_deaths_global.csv";
const US_DEATHS_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_deaths_US.csv";

pub struct JhuClient {
    client: Client,
}

impl JhuClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Fetch cumulative deaths per country.
    pub fn fetch_global(&self) -> Result<Vec<RegionSeries>, AppError> {
        let body = self.fetch(GLOBAL_DEATHS_URL)?;
        parse_deaths_csv(&body, "Country/Region")
    }

    /// Fetch cumulative deaths per US state.
    pub fn fetch_us_states(&self) -> Result<Vec<RegionSeries>, AppError> {
        let body = self.fetch(US_DEATHS_URL)?;
        parse_deaths_csv(&body, "Province_State")
    }

    fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| AppError::network(format!("Failed to fetch JHU data: {e}")))
    }
}

impl Default for JhuClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a wide JHU deaths CSV, aggregating rows by `region_column`.
///
/// Non-date leading columns (lat/long, FIPS, population, ...) are identified
/// by failing to parse as `m/d/yy` and skipped.
pub fn parse_deaths_csv(body: &str, region_column: &str) -> Result<Vec<RegionSeries>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::invalid_input(format!("Failed to read JHU CSV headers: {e}")))?
        .clone();

    let region_idx = headers
        .iter()
        .position(|h| h == region_column)
        .ok_or_else(|| {
            AppError::invalid_input(format!("JHU CSV is missing the `{region_column}` column."))
        })?;

    let date_columns: Vec<(usize, NaiveDate)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| parse_jhu_date(h).map(|d| (idx, d)))
        .collect();
    if date_columns.is_empty() {
        return Err(AppError::invalid_input(
            "JHU CSV has no recognizable date columns.",
        ));
    }

    // BTreeMap keeps the region listing deterministic and sorted.
    let mut totals: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::invalid_input(format!("JHU CSV parse error on row {}: {e}", row_idx + 2))
        })?;
        let Some(region) = record.get(region_idx).filter(|r| !r.is_empty()) else {
            continue;
        };

        let sums = totals
            .entry(region.to_string())
            .or_insert_with(|| vec![0.0; date_columns.len()]);
        for (slot, &(col, _)) in date_columns.iter().enumerate() {
            // Blank cells happen on freshly added rows; treat them as zero.
            let value: f64 = record
                .get(col)
                .and_then(|v| if v.is_empty() { None } else { v.parse().ok() })
                .unwrap_or(0.0);
            sums[slot] += value;
        }
    }

    Ok(totals
        .into_iter()
        .map(|(region, sums)| {
            let observations = date_columns
                .iter()
                .zip(sums)
                .map(|(&(_, date), cumulative_deaths)| Observation {
                    date,
                    cumulative_deaths,
                })
                .collect();
            RegionSeries::from_unsorted(region, observations)
        })
        .collect())
}

fn parse_jhu_date(header: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(header, "%m/%d/%y").ok()
}
