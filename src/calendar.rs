//! Calendar arithmetic for the clock.
//!
//! This module holds the [`DateTime`] value owned by the clock and the two algorithms that move it
//! forward:
//!
//! - [`DateTime::advance_one_second`], the per-second tick, an increment with cascading carry
//! - [`DateTime::normalize`], an iterative correction that folds out-of-range fields back into a
//!   canonical date after bulk arithmetic
//!
//! Month lengths follow the proleptic Gregorian calendar (see [`is_leap`] and [`days_in_month`]).
//!
//! # Error Handling
//!
//! Construction and normalization errors are reported via [`CalendarError`].

use core::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Number of months in a year.
pub const MONTHS_PER_YEAR: u8 = 12;

const SECONDS_PER_MINUTE: u32 = 60;
const MINUTES_PER_HOUR: u32 = 60;
const HOURS_PER_DAY: u32 = 24;

/// Month lengths of a common year, January first.
const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Returns `true` if `year` is a Gregorian leap year.
pub fn is_leap(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Returns the number of days (28..=31) in `month` of `year`.
///
/// `month` must be 1-12. Callers validate it first; an out-of-range month trips a debug assertion
/// and otherwise reports 31.
pub fn days_in_month(month: u8, year: i32) -> u8 {
    debug_assert!(
        (1..=MONTHS_PER_YEAR).contains(&month),
        "month out of range: {}",
        month
    );
    if month == 2 && is_leap(year) {
        return 29;
    }
    DAYS_IN_MONTH
        .get(usize::from(month).wrapping_sub(1))
        .copied()
        .unwrap_or(31)
}

/// Errors that can occur while building or normalizing a [`DateTime`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalendarError {
    /// A field is outside its legal range
    InvalidDateTime,
    /// Day 0 cannot be normalized
    InvalidDay,
    /// Month 0 cannot be normalized
    InvalidMonth,
    /// Carrying into the year overflowed
    YearOverflow,
}

/// A calendar date and wall-clock time with one-second resolution.
///
/// At rest every field is within its legal range and `day` never exceeds
/// [`days_in_month`]`(month, year)`. No time zone is attached.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Year, no upper bound
    pub year: i32,
    /// Month (1-12)
    pub month: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Hour (0-23)
    pub hour: u8,
    /// Minute (0-59)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
}

impl Default for DateTime {
    fn default() -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTime {
    /// Creates a validated `DateTime`.
    ///
    /// # Errors
    /// Returns `CalendarError::InvalidDateTime` if any field is out of range.
    pub fn new(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, CalendarError> {
        let dt = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        if dt.is_valid() {
            Ok(dt)
        } else {
            Err(CalendarError::InvalidDateTime)
        }
    }

    /// Returns `true` if every field is within its legal range.
    pub fn is_valid(&self) -> bool {
        (1..=MONTHS_PER_YEAR).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.month, self.year)
            && u32::from(self.hour) < HOURS_PER_DAY
            && u32::from(self.minute) < MINUTES_PER_HOUR
            && u32::from(self.second) < SECONDS_PER_MINUTE
    }

    /// Advances the value by exactly one second.
    ///
    /// Overflow carries second -> minute -> hour -> day -> month -> year. The value must be valid
    /// going in; it is valid coming out. The year wraps from `i32::MAX` to `i32::MIN`.
    pub fn advance_one_second(&mut self) {
        self.second += 1;
        if u32::from(self.second) < SECONDS_PER_MINUTE {
            return;
        }
        self.second = 0;
        self.minute += 1;
        if u32::from(self.minute) < MINUTES_PER_HOUR {
            return;
        }
        self.minute = 0;
        self.hour += 1;
        if u32::from(self.hour) < HOURS_PER_DAY {
            return;
        }
        self.hour = 0;
        self.day += 1;
        if self.day <= days_in_month(self.month, self.year) {
            return;
        }
        self.day = 1;
        self.month += 1;
        if self.month <= MONTHS_PER_YEAR {
            return;
        }
        self.month = 1;
        self.year = self.year.wrapping_add(1);
    }

    /// Folds out-of-range fields back into a canonical date and time.
    ///
    /// Seconds, minutes and hours are reduced by division and the quotient carried upward. Months
    /// past December are carried into the year, then whole months are subtracted from `day` until
    /// it fits the month it lands in.
    ///
    /// # Errors
    /// * `CalendarError::InvalidDay` if `day` is 0
    /// * `CalendarError::InvalidMonth` if `month` is 0
    /// * `CalendarError::YearOverflow` if the carry does not fit the year
    pub fn normalize(self) -> Result<Self, CalendarError> {
        if self.day == 0 {
            return Err(CalendarError::InvalidDay);
        }
        if self.month == 0 {
            return Err(CalendarError::InvalidMonth);
        }

        let second = u32::from(self.second);
        let mut minute = u32::from(self.minute) + second / SECONDS_PER_MINUTE;
        let second = second % SECONDS_PER_MINUTE;
        let mut hour = u32::from(self.hour) + minute / MINUTES_PER_HOUR;
        minute %= MINUTES_PER_HOUR;
        let mut day = u32::from(self.day) + hour / HOURS_PER_DAY;
        hour %= HOURS_PER_DAY;

        let month_index = self.month - 1;
        let mut year = self
            .year
            .checked_add(i32::from(month_index / MONTHS_PER_YEAR))
            .ok_or(CalendarError::YearOverflow)?;
        let mut month = month_index % MONTHS_PER_YEAR + 1;

        // day >= 1 and every month has at least 28 days, so this terminates
        while day > u32::from(days_in_month(month, year)) {
            day -= u32::from(days_in_month(month, year));
            month += 1;
            if month > MONTHS_PER_YEAR {
                month = 1;
                year = year.checked_add(1).ok_or(CalendarError::YearOverflow)?;
            }
        }

        let normalized = Self {
            year,
            month,
            day: u8::try_from(day).map_err(|_| CalendarError::InvalidDateTime)?,
            hour: u8::try_from(hour).map_err(|_| CalendarError::InvalidDateTime)?,
            minute: u8::try_from(minute).map_err(|_| CalendarError::InvalidDateTime)?,
            second: u8::try_from(second).map_err(|_| CalendarError::InvalidDateTime)?,
        };
        if normalized != self {
            trace!("normalize: {:?} -> {:?}", self, normalized);
        }
        Ok(normalized)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl TryFrom<DateTime> for NaiveDateTime {
    type Error = CalendarError;

    fn try_from(dt: DateTime) -> Result<Self, Self::Error> {
        NaiveDate::from_ymd_opt(dt.year, u32::from(dt.month), u32::from(dt.day))
            .and_then(|d| {
                d.and_hms_opt(
                    u32::from(dt.hour),
                    u32::from(dt.minute),
                    u32::from(dt.second),
                )
            })
            .ok_or(CalendarError::InvalidDateTime)
    }
}

impl From<NaiveDateTime> for DateTime {
    fn from(ndt: NaiveDateTime) -> Self {
        // chrono keeps every component in range, and folds leap seconds into the nanoseconds
        Self {
            year: ndt.year(),
            month: ndt.month() as u8,
            day: ndt.day() as u8,
            hour: ndt.hour() as u8,
            minute: ndt.minute() as u8,
            second: ndt.second() as u8,
        }
    }
}
