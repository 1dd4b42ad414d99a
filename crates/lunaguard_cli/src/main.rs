//! Command-line front end for `lunaguard_core`.
//!
//! # Responsibility
//! - Verify core crate linkage without the Flutter runtime.
//! - Compute forecasts offline and inspect a device cache file.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lunaguard_core::predict::calendar::{format_long, CycleCalendar};
use lunaguard_core::{CacheResult, EntityKind, LocalCache, SqliteLocalCache};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lunaguard", version, about = "LunaGuard core tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print core ping and version.
    Info,
    /// Print the cycle forecast for a start date as JSON.
    Forecast {
        /// First day of the last period (YYYY-MM-DD).
        #[arg(long)]
        last_start: NaiveDate,
        #[arg(long, default_value_t = 28)]
        cycle_length: u32,
        #[arg(long, default_value_t = 5)]
        period_length: u32,
        /// Defaults to the current UTC date.
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Print one cached namespace as JSON.
    CacheDump {
        #[arg(long)]
        db: PathBuf,
        /// `period`, `contacts` or `sos_alerts`.
        #[arg(long)]
        kind: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Command::Info) {
        Command::Info => {
            println!("lunaguard_core ping={}", lunaguard_core::ping());
            println!("lunaguard_core version={}", lunaguard_core::core_version());
            Ok(())
        }
        Command::Forecast {
            last_start,
            cycle_length,
            period_length,
            today,
        } => forecast(last_start, cycle_length, period_length, today),
        Command::CacheDump { db, kind } => cache_dump(&db, &kind),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn forecast(
    last_start: NaiveDate,
    cycle_length: u32,
    period_length: u32,
    today: Option<NaiveDate>,
) -> Result<(), String> {
    let today = today.unwrap_or_else(|| chrono::Utc::now().date_naive());
    let output = forecast_json(last_start, cycle_length, period_length, today)?;
    let rendered = serde_json::to_string_pretty(&output).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}

fn forecast_json(
    last_start: NaiveDate,
    cycle_length: u32,
    period_length: u32,
    today: NaiveDate,
) -> Result<Value, String> {
    let calendar = CycleCalendar::try_new(last_start, cycle_length, period_length, today)
        .map_err(|err| err.to_string())?;
    let forecast = calendar.forecast;

    Ok(json!({
        "forecast": forecast,
        "nextPeriodLabel": format_long(forecast.next_period_date),
        "ovulationLabel": format_long(forecast.ovulation_date),
        "nextPeriodDays": calendar.next_period_days,
        "fertilityDays": calendar.fertility_days,
    }))
}

fn cache_dump(db: &Path, kind: &str) -> Result<(), String> {
    let kind = EntityKind::parse(kind).ok_or_else(|| format!("unknown kind `{kind}`"))?;
    let cache = SqliteLocalCache::open(db).map_err(|err| err.to_string())?;
    let output = cache_json(&cache, kind).map_err(|err| err.to_string())?;
    let rendered = serde_json::to_string_pretty(&output).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}

fn cache_json(cache: &SqliteLocalCache, kind: EntityKind) -> CacheResult<Value> {
    Ok(json!({
        "namespace": kind.namespace(),
        "revision": cache.revision(kind)?,
        "records": cache.get_all(kind)?,
    }))
}
