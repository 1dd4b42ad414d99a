//! Cycle forecast derivation.
//!
//! Ovulation is modeled with a constant 14-day luteal phase counted back from
//! the cycle midpoint: `ovulation = start + (floor(L / 2) - 14)` days. For
//! cycles shorter than 28 days this lands before `start`; the model keeps
//! that approximation instead of correcting it.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

const LUTEAL_PHASE_DAYS: i64 = 14;
const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;
const FERTILE_DAYS_AFTER_OVULATION: i64 = 1;

/// Forecast dates for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleForecast {
    pub next_period_date: NaiveDate,
    /// Negative when the next period is overdue.
    pub days_until_next_period: i64,
    pub ovulation_date: NaiveDate,
    pub fertility_window_start: NaiveDate,
    pub fertility_window_end: NaiveDate,
}

impl CycleForecast {
    pub fn is_overdue(&self) -> bool {
        self.days_until_next_period < 0
    }

    /// Inclusive list of fertile days, always seven entries.
    pub fn fertility_window_days(&self) -> Vec<NaiveDate> {
        self.fertility_window_start
            .iter_days()
            .take_while(|day| *day <= self.fertility_window_end)
            .collect()
    }

    pub fn is_in_fertility_window(&self, date: NaiveDate) -> bool {
        date >= self.fertility_window_start && date <= self.fertility_window_end
    }
}

/// Derives the forecast for a cycle starting at `last_start`.
///
/// `days_until_next_period` is the ceiling of the day distance from `today`;
/// with calendar dates that distance is already whole, so it is exact.
///
/// # Panics
/// - When a forecast date falls outside the supported calendar range. Stored
///   records never get there; use `try_predict_cycle` for unchecked input.
pub fn predict_cycle(last_start: NaiveDate, cycle_length: u32, today: NaiveDate) -> CycleForecast {
    let cycle_days = i64::from(cycle_length);
    let next_period_date = last_start + Duration::days(cycle_days);
    let ovulation_date = last_start + Duration::days(cycle_days / 2 - LUTEAL_PHASE_DAYS);

    CycleForecast {
        next_period_date,
        days_until_next_period: (next_period_date - today).num_days(),
        ovulation_date,
        fertility_window_start: ovulation_date - Duration::days(FERTILE_DAYS_BEFORE_OVULATION),
        fertility_window_end: ovulation_date + Duration::days(FERTILE_DAYS_AFTER_OVULATION),
    }
}

/// Same as `predict_cycle`, but `None` instead of a panic when a date
/// overflows.
pub fn try_predict_cycle(
    last_start: NaiveDate,
    cycle_length: u32,
    today: NaiveDate,
) -> Option<CycleForecast> {
    let cycle_days = i64::from(cycle_length);
    let next_period_date = last_start.checked_add_signed(Duration::days(cycle_days))?;
    let ovulation_date =
        last_start.checked_add_signed(Duration::days(cycle_days / 2 - LUTEAL_PHASE_DAYS))?;

    Some(CycleForecast {
        next_period_date,
        days_until_next_period: (next_period_date - today).num_days(),
        ovulation_date,
        fertility_window_start: ovulation_date
            .checked_sub_signed(Duration::days(FERTILE_DAYS_BEFORE_OVULATION))?,
        fertility_window_end: ovulation_date
            .checked_add_signed(Duration::days(FERTILE_DAYS_AFTER_OVULATION))?,
    })
}
