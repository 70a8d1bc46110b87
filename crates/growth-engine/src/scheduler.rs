//! Period scheduler.
//!
//! Simulated time is independent of wall-clock time: every call extends the
//! timeline by exactly one 12-hour period starting where the persisted state
//! left off.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use growth_core::{PeriodKind, Result, SimError, SimulationPeriod};

pub const PERIOD_HOURS: i64 = 12;

/// Hour at which day periods start.
pub const DAY_START_HOUR: u32 = 6;

/// Start of the first simulated period, 2025-05-01 06:00.
pub fn simulation_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, 1)
        .and_then(|date| date.and_hms_opt(DAY_START_HOUR, 0, 0))
        .unwrap_or_default()
}

/// Compute the period following `prior_end`.
///
/// With no prior state the timeline starts at [`simulation_epoch`] as a day
/// period. Otherwise the new period starts exactly at `prior_end`, which must
/// sit on a 6-hour boundary.
pub fn next_period(prior_end: Option<NaiveDateTime>) -> Result<SimulationPeriod> {
    let start = match prior_end {
        None => simulation_epoch(),
        Some(end) => {
            check_alignment(end)?;
            end
        }
    };
    let end = start
        .checked_add_signed(TimeDelta::hours(PERIOD_HOURS))
        .ok_or_else(|| SimError::config(format!("period starting {start} overflows")))?;
    let kind = if start.hour() == DAY_START_HOUR {
        PeriodKind::Day
    } else {
        PeriodKind::Night
    };
    Ok(SimulationPeriod { start, end, kind })
}

fn check_alignment(end: NaiveDateTime) -> Result<()> {
    let aligned = end.hour() % 6 == 0
        && end.minute() == 0
        && end.second() == 0
        && end.nanosecond() == 0;
    if aligned {
        Ok(())
    } else {
        Err(SimError::config(format!(
            "last_period_end {end} is not aligned to a 6-hour boundary"
        )))
    }
}
