//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the data source (JHU fetch, local CSV, synthetic sample)
//! - runs the forecast pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use rayon::prelude::*;

use crate::cli::{Command, ForecastArgs, RankArgs, SourceArgs};
use crate::data::{JhuClient, SampleSpec, generate_outbreak, lockdown_hint};
use crate::domain::{ForecastConfig, Metric, RegionSeries};
use crate::error::AppError;
use crate::project::peak_of;
use crate::report::RankRow;

pub mod pipeline;

/// Entry point for the `prognosis` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Forecast(args) => handle_forecast(args, OutputMode::Forecast),
        Command::Debug(args) => handle_forecast(args, OutputMode::Debug),
        Command::Rank(args) => handle_rank(args),
        Command::Regions(args) => handle_regions(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Forecast,
    Debug,
}

fn handle_forecast(args: ForecastArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args);
    let (series, source_lockdown) = resolve_series(&args)?;

    let lockdown = args
        .lockdown
        .or(source_lockdown)
        .or_else(|| {
            if args.lockdown_hint {
                lockdown_hint(&series.region)
            } else {
                None
            }
        });

    let run = pipeline::run_full(&series, lockdown, &config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.prepared, &run.fit, &config)
    );

    match mode {
        OutputMode::Forecast => {
            println!(
                "{}",
                crate::report::format_metric_tables(&run.forecast, args.history_tail)
            );
            if args.plot && !args.no_plot {
                println!(
                    "{}",
                    crate::plot::render_forecast_plot(&run.forecast, args.width, args.height)
                );
            }
        }
        OutputMode::Debug => {
            if args.plot && !args.no_plot {
                println!(
                    "{}",
                    crate::plot::render_log_fit_plot(&run.log_curve, args.width, args.height)
                );
            }
            if args.bundle {
                let path = crate::debug::write_debug_bundle(&run.prepared, &run.fit, &config)?;
                println!("Debug bundle written to {}", path.display());
            }
        }
    }

    if let Some(path) = &args.export {
        crate::io::write_metrics_csv(path, &run.forecast)?;
        println!("Metrics exported to {}", path.display());
    }
    if let Some(path) = &args.export_json {
        crate::io::write_forecast_json(path, &run.prepared, &run.fit, &run.forecast)?;
        println!("Forecast exported to {}", path.display());
    }

    Ok(())
}

fn handle_rank(args: RankArgs) -> Result<(), AppError> {
    let regions = load_all_regions(&args.source)?;
    let config = ForecastConfig {
        lookahead_days: args.lookahead,
        ..ForecastConfig::default()
    };

    // Regions are independent pure computations; fan them out. Regions with
    // too little data simply drop out of the ranking.
    let mut rows: Vec<RankRow> = regions
        .par_iter()
        .filter_map(|series| {
            let lockdown = if args.lockdown_hints {
                lockdown_hint(&series.region)
            } else {
                None
            };
            let run = pipeline::run_full(series, lockdown, &config).ok()?;
            let (peak_date, peak_icu_beds) = peak_of(&run.forecast.daily, Metric::IcuBeds)?;
            Some(RankRow {
                region: series.region.clone(),
                peak_icu_beds,
                peak_date,
                growth_factor: run.fit.pre.growth_factor(),
                doubling_days: run.fit.pre.doubling_time_days(),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.peak_icu_beds
            .partial_cmp(&a.peak_icu_beds)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows.truncate(args.top);

    println!("{}", crate::report::format_rankings(&rows));
    Ok(())
}

fn handle_regions(args: SourceArgs) -> Result<(), AppError> {
    let regions = load_all_regions(&args)?;
    for series in &regions {
        println!("{}", series.region);
    }
    Ok(())
}

/// Resolve a single region series from the selected source.
fn resolve_series(args: &ForecastArgs) -> Result<(RegionSeries, Option<chrono::NaiveDate>), AppError> {
    if let Some(path) = &args.source.csv {
        let ingested = crate::io::load_region_csv(path, args.region.as_deref())?;
        for err in &ingested.row_errors {
            eprintln!("warning: line {}: {}", err.line, err.message);
        }
        return Ok((ingested.series, None));
    }

    if args.source.sample {
        let spec = SampleSpec {
            seed: args.source.seed,
            ..SampleSpec::default()
        };
        let (series, lockdown) = generate_outbreak(&spec)?;
        return Ok((series, lockdown));
    }

    let region = args.region.as_deref().ok_or_else(|| {
        AppError::invalid_input("`--region` is required with the JHU source (see `regions`).")
    })?;
    let regions = load_all_regions(&args.source)?;
    let series = regions
        .into_iter()
        .find(|s| s.region.eq_ignore_ascii_case(region))
        .ok_or_else(|| {
            AppError::invalid_input(format!(
                "Unknown region '{region}' (see the `regions` command)."
            ))
        })?;
    Ok((series, None))
}

fn load_all_regions(source: &SourceArgs) -> Result<Vec<RegionSeries>, AppError> {
    if let Some(path) = &source.csv {
        let ingested = crate::io::load_region_csv(path, None)?;
        return Ok(vec![ingested.series]);
    }
    if source.sample {
        let (series, _) = generate_outbreak(&SampleSpec {
            seed: source.seed,
            ..SampleSpec::default()
        })?;
        return Ok(vec![series]);
    }

    let client = JhuClient::new();
    if source.us_states {
        client.fetch_us_states()
    } else {
        client.fetch_global()
    }
}

fn forecast_config_from_args(args: &ForecastArgs) -> ForecastConfig {
    ForecastConfig {
        lockdown_effect_lag_days: args.effect_lag,
        min_points: args.min_points,
        robust_iters: args.robust_iters,
        huber_k: args.huber_k,
        lookahead_days: args.lookahead,
        ..ForecastConfig::default()
    }
}
