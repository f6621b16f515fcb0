use crate::error::{Error, TollResult};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Canonical date format used to join calendar days with statement rows
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar month in a specific year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Create a period, rejecting months outside 1..=12
    pub fn new(year: i32, month: u32) -> TollResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth(month.to_string()));
        }
        // Out-of-range years are rejected by chrono
        NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidMonth(format!("{}-{:02}", year, month)))?;
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        // Validated in `new`
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// First day of the following month, the exclusive end of the window
    pub fn next_first_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
    }

    /// Whether a date falls inside the month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Query window as UTC midnights, end exclusive
    pub fn utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            midnight_utc(self.first_day()),
            midnight_utc(self.next_first_day()),
        )
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Format a timestamp the way the calendar API expects, e.g. `2022-03-01T00:00:00Z`
pub fn rfc3339_utc(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format a date as a canonical join key
pub fn canonical_date(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

/// Parse the month typed at the prompt
pub fn parse_month(input: &str) -> TollResult<u32> {
    let trimmed = input.trim();
    let month = trimmed
        .parse::<u32>()
        .map_err(|_| Error::InvalidMonth(trimmed.to_string()))?;
    if !(1..=12).contains(&month) {
        return Err(Error::InvalidMonth(trimmed.to_string()));
    }
    Ok(month)
}
