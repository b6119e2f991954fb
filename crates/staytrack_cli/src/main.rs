//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `staytrack_core` linkage without the Flutter/FFI runtime.
//! - Run one deterministic in-memory ledger calculation.

use chrono::NaiveDate;
use staytrack_core::db::open_db_in_memory;
use staytrack_core::{SqliteTripRepository, SqliteVisaRepository, TripDraft, TripSegment, TripService};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("staytrack_core ping={}", staytrack_core::ping());
    println!("staytrack_core version={}", staytrack_core::core_version());

    match sample_calculation() {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("sample calculation failed: {message}");
            ExitCode::FAILURE
        }
    }
}

fn sample_calculation() -> Result<String, String> {
    let date = |m, d| NaiveDate::from_ymd_opt(2025, m, d).ok_or("invalid sample date");
    let conn = open_db_in_memory().map_err(|err| err.to_string())?;
    let service = TripService::new(
        SqliteTripRepository::try_new(&conn).map_err(|err| err.to_string())?,
        SqliteVisaRepository::try_new(&conn).map_err(|err| err.to_string())?,
    );

    let segments = vec![
        TripSegment::stay("DE", date(1, 1)?, date(3, 1)?).map_err(|err| err.to_string())?,
        TripSegment::stay("AT", date(3, 1)?, date(3, 15)?).map_err(|err| err.to_string())?,
    ];
    service
        .save_trip(TripDraft::new(segments), date(1, 1)?)
        .map_err(|err| err.to_string())?;

    let calculation = service
        .days_calculation(date(3, 15)?)
        .map_err(|err| err.to_string())?;
    Ok(format!(
        "sample period={}..{} used={} remaining={} near_limit={}",
        calculation.period_start,
        calculation.period_end,
        calculation.total_days_used,
        calculation.remaining_days,
        calculation.is_near_limit
    ))
}
