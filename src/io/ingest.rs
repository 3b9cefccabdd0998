//! Local CSV ingest and normalization.
//!
//! Accepts a long-format CSV with a `date` column (ISO `YYYY-MM-DD`) and a
//! `cumulative_deaths` (or `deaths`) column.
//!
//! Design goals, same as the remote path:
//! - strict schema for required columns, with clear errors
//! - row-level validation: skip bad rows, but report what happened
//! - no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{Observation, RegionSeries};
use crate::error::AppError;

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the normalized series plus skipped-row diagnostics.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub series: RegionSeries,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a region's cumulative deaths from a local CSV.
///
/// `region` overrides the region name; otherwise the file stem is used.
pub fn load_region_csv(path: &Path, region: Option<&str>) -> Result<IngestedSeries, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::invalid_input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = *header_map
        .get("date")
        .ok_or_else(|| AppError::invalid_input("Missing required column: `date`"))?;
    let deaths_idx = *header_map
        .get("cumulative_deaths")
        .or_else(|| header_map.get("deaths"))
        .ok_or_else(|| {
            AppError::invalid_input("Missing required column: `cumulative_deaths` (or `deaths`)")
        })?;

    let mut observations = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header row, CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, date_idx, deaths_idx) {
            Ok(obs) => observations.push(obs),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if observations.is_empty() {
        return Err(AppError::insufficient_data(format!(
            "No valid rows in CSV '{}'.",
            path.display()
        )));
    }

    let region_name = region
        .map(str::to_string)
        .or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "unknown".to_string());

    Ok(IngestedSeries {
        series: RegionSeries::from_unsorted(region_name, observations),
        row_errors,
        rows_read,
    })
}

fn parse_row(record: &StringRecord, date_idx: usize, deaths_idx: usize) -> Result<Observation, String> {
    let date_raw = record.get(date_idx).ok_or("Missing `date` cell")?;
    let date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d")
        .map_err(|e| format!("Bad date '{date_raw}': {e}"))?;

    let deaths_raw = record.get(deaths_idx).ok_or("Missing deaths cell")?;
    let cumulative_deaths: f64 = deaths_raw
        .parse()
        .map_err(|e| format!("Bad death count '{deaths_raw}': {e}"))?;
    if !cumulative_deaths.is_finite() || cumulative_deaths < 0.0 {
        return Err(format!("Death count out of range: {cumulative_deaths}"));
    }

    Ok(Observation {
        date,
        cumulative_deaths,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on
    // the first header; strip it or schema validation reports a missing
    // column that is plainly there.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("prognosis_ingest_{name}_{}.csv", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_long_format_csv() {
        let path = write_temp(
            "ok",
            "date,cumulative_deaths\n2020-03-01,1\n2020-03-02,3\n2020-03-03,6\n",
        );
        let ingested = load_region_csv(&path, Some("Testland")).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ingested.series.region, "Testland");
        assert_eq!(ingested.series.observations.len(), 3);
        assert_eq!(ingested.rows_read, 3);
        assert!(ingested.row_errors.is_empty());
        assert_eq!(ingested.series.observations[2].cumulative_deaths, 6.0);
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let path = write_temp(
            "bad_rows",
            "date,deaths\n2020-03-01,1\nnot-a-date,2\n2020-03-03,oops\n2020-03-04,4\n",
        );
        let ingested = load_region_csv(&path, None).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ingested.series.observations.len(), 2);
        assert_eq!(ingested.row_errors.len(), 2);
        assert_eq!(ingested.row_errors[0].line, 3);
    }

    #[test]
    fn missing_required_column_fails() {
        let path = write_temp("no_deaths", "date,cases\n2020-03-01,5\n");
        let err = load_region_csv(&path, None).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    }

    #[test]
    fn region_defaults_to_file_stem() {
        let path = write_temp("stemland", "date,deaths\n2020-03-01,5\n");
        let ingested = load_region_csv(&path, None).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(ingested.series.region.starts_with("prognosis_ingest_stemland"));
    }
}
