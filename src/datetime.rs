//! Calendar value type and the arithmetic behind it.
//!
//! [`DateTime`] is a plain year/month/day/hour/minute/second/weekday tuple
//! covering 2000-2099. It converts to and from a linear count of seconds since
//! 2000-01-01 00:00:00 (and, by adding [`EPOCH_OFFSET`], Unix time) without
//! any timezone, DST or leap-second handling.
//!
//! # Validation
//!
//! Field values are deliberately not checked: a day of 40 is stored as given
//! and only produces a wrong linear count later. The conversions use wrapping
//! arithmetic so such values never panic. Use the chrono conversions when a
//! validated value is needed.

use core::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Seconds between 1970-01-01 00:00:00 and 2000-01-01 00:00:00.
pub const EPOCH_OFFSET: u32 = 946_684_800;

/// Seconds in one day.
pub const SECONDS_PER_DAY: u32 = 86_400;

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Month offsets for Sakamoto's day-of-week congruence.
const WEEKDAY_OFFSETS: [u8; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];

/// Errors produced when building or converting a [`DateTime`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// The fields do not form a real calendar date and time
    InvalidDateTime,
    /// The year is outside 2000-2099
    YearOutOfRange,
    /// A build date/time string is too short or names an unknown month
    MalformedBuildString,
}

/// Returns the day of the week for a Gregorian date, 1 = Sunday .. 7 = Saturday.
///
/// Only meaningful for years after 1752 and months 1-12.
#[must_use]
pub fn day_of_week(year: u16, month: u8, day: u8) -> u8 {
    let mut y = u32::from(year);
    if month < 3 {
        y = y.wrapping_sub(1);
    }
    let offset = WEEKDAY_OFFSETS[usize::from(month.wrapping_sub(1)) % WEEKDAY_OFFSETS.len()];
    let sum = y
        .wrapping_add(y / 4)
        .wrapping_sub(y / 100)
        .wrapping_add(y / 400)
        .wrapping_add(u32::from(offset))
        .wrapping_add(u32::from(day));
    // sum % 7 is at most 6
    (sum % 7) as u8 + 1
}

const fn is_leap(year_offset: u8) -> bool {
    year_offset % 4 == 0
}

/// Days since 2000-01-01 for a date given as an offset from 2000.
fn days_since_2000(year_offset: u8, month: u8, day: u8) -> u32 {
    let y = u32::from(year_offset);
    let preceding_months: u32 = DAYS_IN_MONTH
        .iter()
        .take(usize::from(month.saturating_sub(1)))
        .map(|&d| u32::from(d))
        .sum();
    let mut days = u32::from(day).wrapping_add(preceding_months);
    if month > 2 && is_leap(year_offset) {
        days = days.wrapping_add(1);
    }
    days.wrapping_add(365 * y)
        .wrapping_add((y + 3) / 4)
        .wrapping_sub(1)
}

fn two_digits(text: &[u8], at: usize) -> u8 {
    let tens = match text[at] {
        c @ b'0'..=b'9' => c - b'0',
        _ => 0,
    };
    (10 * tens).wrapping_add(text[at + 1].wrapping_sub(b'0'))
}

fn month_from_abbreviation(name: &[u8]) -> Option<u8> {
    let month = match name[0] {
        b'J' if name[1] == b'a' => 1,
        b'J' if name[2] == b'n' => 6,
        b'J' => 7,
        b'F' => 2,
        b'M' if name[2] == b'r' => 3,
        b'M' => 5,
        b'A' if name[2] == b'r' => 4,
        b'A' => 8,
        b'S' => 9,
        b'O' => 10,
        b'N' => 11,
        b'D' => 12,
        _ => return None,
    };
    Some(month)
}

/// Calendar date and time between 2000 and 2099.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    year_offset: u8,
    month: u8,
    date: u8,
    hour: u8,
    minute: u8,
    second: u8,
    weekday: u8,
}

impl DateTime {
    /// Builds a value from explicit fields.
    ///
    /// A year of 2000 or later is stored as its offset from 2000; smaller
    /// values are taken to be offsets already. The weekday (1 = Sunday) is
    /// stored as given, not computed.
    #[must_use]
    pub fn new(year: u16, month: u8, date: u8, hour: u8, minute: u8, second: u8, weekday: u8) -> Self {
        let year = if year >= 2000 { year - 2000 } else { year };
        Self {
            // truncation matches the 8-bit year register
            year_offset: year as u8,
            month,
            date,
            hour,
            minute,
            second,
            weekday,
        }
    }

    /// Decomposes a count of seconds since 2000-01-01 00:00:00.
    ///
    /// Uses the divisible-by-four leap rule, which holds for 2000-2099.
    #[must_use]
    pub fn from_y2k_seconds(seconds: u32) -> Self {
        let mut days = seconds / SECONDS_PER_DAY;
        let mut t = seconds % SECONDS_PER_DAY;
        let second = (t % 60) as u8;
        t /= 60;
        let minute = (t % 60) as u8;
        let hour = (t / 60) as u8;

        let mut year_offset: u8 = 0;
        loop {
            let year_days = if is_leap(year_offset) { 366 } else { 365 };
            if days < year_days {
                break;
            }
            days -= year_days;
            year_offset += 1;
        }

        let leap = is_leap(year_offset);
        let mut month: u8 = 1;
        for (index, &length) in DAYS_IN_MONTH.iter().enumerate() {
            let length = u32::from(length) + u32::from(leap && index == 1);
            if days < length {
                break;
            }
            days -= length;
            month += 1;
        }
        // days is below the month length here
        let date = days as u8 + 1;

        Self {
            year_offset,
            month,
            date,
            hour,
            minute,
            second,
            weekday: day_of_week(2000 + u16::from(year_offset), month, date),
        }
    }

    /// Converts Unix time to a calendar value.
    ///
    /// Timestamps before 2000-01-01 00:00:00 clamp to that instant.
    #[must_use]
    pub fn from_epoch(timestamp: u32) -> Self {
        Self::from_y2k_seconds(timestamp.saturating_sub(EPOCH_OFFSET))
    }

    /// Parses the date/time strings produced by build tooling, for example
    /// `"Dec 26 2009"` and `"12:34:56"`.
    ///
    /// Fields are read positionally as two digits. The weekday is computed.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::MalformedBuildString`] when the date is shorter
    /// than 11 bytes, the time shorter than 8 bytes, or the month
    /// abbreviation is unknown.
    pub fn from_build_strings(date: &str, time: &str) -> Result<Self, DateTimeError> {
        let date = date.as_bytes();
        let time = time.as_bytes();
        if date.len() < 11 || time.len() < 8 {
            return Err(DateTimeError::MalformedBuildString);
        }
        let month = month_from_abbreviation(date).ok_or(DateTimeError::MalformedBuildString)?;
        let year_offset = two_digits(date, 9);
        let day = two_digits(date, 4);
        let value = Self {
            year_offset,
            month,
            date: day,
            hour: two_digits(time, 0),
            minute: two_digits(time, 3),
            second: two_digits(time, 6),
            weekday: day_of_week(2000 + u16::from(year_offset), month, day),
        };
        debug!("parsed build time {}", value.y2k_seconds());
        Ok(value)
    }

    /// Seconds (0-59)
    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// Minutes (0-59)
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Hours (0-23)
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Day of the month (1-31)
    #[must_use]
    pub const fn date(&self) -> u8 {
        self.date
    }

    /// Month (1-12)
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Full year, e.g. 2024
    #[must_use]
    pub const fn year(&self) -> u16 {
        2000 + self.year_offset as u16
    }

    /// Year as an offset from 2000
    #[must_use]
    pub const fn year_offset(&self) -> u8 {
        self.year_offset
    }

    /// Day of the week, 1 = Sunday .. 7 = Saturday
    #[must_use]
    pub const fn day_of_week(&self) -> u8 {
        self.weekday
    }

    /// Seconds since 2000-01-01 00:00:00.
    #[must_use]
    pub fn y2k_seconds(&self) -> u32 {
        let days = days_since_2000(self.year_offset, self.month, self.date);
        let time_of_day = u32::from(self.hour)
            .wrapping_mul(60)
            .wrapping_add(u32::from(self.minute))
            .wrapping_mul(60)
            .wrapping_add(u32::from(self.second));
        days.wrapping_mul(SECONDS_PER_DAY).wrapping_add(time_of_day)
    }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub fn epoch(&self) -> u32 {
        self.y2k_seconds().wrapping_add(EPOCH_OFFSET)
    }
}

impl Default for DateTime {
    /// 2000-01-01 00:00:00, a Saturday.
    fn default() -> Self {
        Self::from_y2k_seconds(0)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year(),
            self.month,
            self.date,
            self.hour,
            self.minute,
            self.second
        )
    }
}

impl TryFrom<&NaiveDateTime> for DateTime {
    type Error = DateTimeError;

    fn try_from(datetime: &NaiveDateTime) -> Result<Self, Self::Error> {
        if !(2000..=2099).contains(&datetime.year()) {
            error!("year {} outside 2000-2099", datetime.year());
            return Err(DateTimeError::YearOutOfRange);
        }
        let year = u16::try_from(datetime.year()).map_err(|_| DateTimeError::YearOutOfRange)?;
        let narrow = |v: u32| u8::try_from(v).map_err(|_| DateTimeError::InvalidDateTime);
        let weekday = datetime.weekday().number_from_sunday();
        Ok(Self::new(
            year,
            narrow(datetime.month())?,
            narrow(datetime.day())?,
            narrow(datetime.hour())?,
            narrow(datetime.minute())?,
            narrow(datetime.second())?,
            narrow(weekday)?,
        ))
    }
}

impl TryFrom<DateTime> for NaiveDateTime {
    type Error = DateTimeError;

    fn try_from(datetime: DateTime) -> Result<Self, Self::Error> {
        NaiveDate::from_ymd_opt(
            i32::from(datetime.year()),
            u32::from(datetime.month),
            u32::from(datetime.date),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(datetime.hour),
                u32::from(datetime.minute),
                u32::from(datetime.second),
            )
        })
        .ok_or(DateTimeError::InvalidDateTime)
    }
}
