//! Temporal codec: calendar dates to comparable instants.
//!
//! Instants are whole seconds since the Unix epoch, computed in UTC so
//! that the mapping does not depend on the host time zone.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CdIndexError, Result};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// `NaiveDate::num_days_from_ce()` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Days counted per year when sizing a citation window.
pub const DAYS_PER_WINDOW_YEAR: i64 = 365;

/// A point in time, seconds since 1970-01-01T00:00:00Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Instant(pub i64);

impl Instant {
    pub fn seconds(self) -> i64 {
        self.0
    }

    /// Instant shifted forward by a window, saturating at the far future.
    pub fn saturating_add(self, window: TimeWindow) -> Instant {
        Instant(self.0.saturating_add(window.0))
    }
}

/// Length of the forward citation window, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow(pub i64);

impl TimeWindow {
    /// `years * 365` days. Leap days are not counted.
    pub fn from_years(years: u32) -> Self {
        TimeWindow(years as i64 * DAYS_PER_WINDOW_YEAR * SECONDS_PER_DAY)
    }

    pub fn seconds(self) -> i64 {
        self.0
    }
}

/// Encode a (year, month, day) triple. Missing month or day default to 1.
///
/// Fails with `InvalidDate` when the triple is not a calendar date.
pub fn encode(year: i32, month: Option<u32>, day: Option<u32>) -> Result<Instant> {
    let date = NaiveDate::from_ymd_opt(year, month.unwrap_or(1), day.unwrap_or(1))
        .ok_or(CdIndexError::InvalidDate { year, month, day })?;
    Ok(date_to_instant(date))
}

fn date_to_instant(date: NaiveDate) -> Instant {
    let days = date.num_days_from_ce() as i64 - UNIX_EPOCH_DAYS_FROM_CE;
    Instant(days * SECONDS_PER_DAY)
}

/// Latest creation instant whose forward window is fully observable.
///
/// Computed once per run as December 31st of `cutoff_year - window_years`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub year: i32,
    pub instant: Instant,
}

impl Horizon {
    /// Fails with `InvalidConfig` unless `cutoff_year - window_years` is a
    /// representable year no later than `cutoff_year`.
    pub fn new(cutoff_year: i32, window_years: u32) -> Result<Self> {
        let year = i32::try_from(window_years)
            .ok()
            .and_then(|w| cutoff_year.checked_sub(w))
            .filter(|&y| y <= cutoff_year)
            .ok_or_else(|| {
                CdIndexError::InvalidConfig(format!(
                    "window of {window_years} years does not fit before cutoff year {cutoff_year}"
                ))
            })?;
        let instant = encode(year, Some(12), Some(31))?;
        Ok(Self { year, instant })
    }

    /// Whether an instant falls on or before the horizon.
    pub fn covers(&self, instant: Instant) -> bool {
        instant <= self.instant
    }
}
