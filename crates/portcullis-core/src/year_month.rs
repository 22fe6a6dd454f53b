//! `yyyyMM` year-month request parameters.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string is not a valid `yyyyMM` value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not convert '{input}' to YearMonth: {reason}")]
pub struct ParseYearMonthError {
    input: String,
    reason: &'static str,
}

impl ParseYearMonthError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }

    /// Returns the rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// A calendar month, written as `yyyyMM` in query and path parameters.
///
/// # Example
///
/// ```
/// use portcullis_core::YearMonth;
///
/// let ym: YearMonth = "202403".parse().unwrap();
/// assert_eq!(ym.year(), 2024);
/// assert_eq!(ym.month(), 3);
/// assert_eq!(ym.to_string(), "202403");
/// assert!("2024-3".parse::<YearMonth>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a year-month, returning `None` if `month` is not in `1..=12`
    /// or `year` is outside `0..=9999`.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        ((0..=9999).contains(&year) && (1..=12).contains(&month)).then_some(Self { year, month })
    }

    /// Returns the year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the month, `1..=12`.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Returns the first day of the month.
    #[must_use]
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Returns the year-month a date falls in.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }
}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 {
            return Err(ParseYearMonthError::new(s, "expected 6 characters"));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseYearMonthError::new(s, "expected digits only"));
        }
        let year = s[..4]
            .parse()
            .map_err(|_| ParseYearMonthError::new(s, "invalid year"))?;
        let month = s[4..]
            .parse()
            .map_err(|_| ParseYearMonthError::new(s, "invalid month"))?;
        Self::new(year, month).ok_or_else(|| ParseYearMonthError::new(s, "month out of range"))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
