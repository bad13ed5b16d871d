//! Calendar months, the time bucket for sales trends and forecasts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month, ordered chronologically and labeled `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year:  i32,
    month: u32,
}

impl Month {
    /// Returns `None` unless `month` is in 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// January of `year`.
    pub const fn january(year: i32) -> Self {
        Self { year, month: 1 }
    }

    /// The month a date falls in.
    pub fn of(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn year(&self) -> i32  { self.year }
    pub fn month(&self) -> u32 { self.month }

    /// The following calendar month, rolling over December.
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// The month `n` months after this one.
    pub fn plus(&self, n: u32) -> Self {
        let total = i64::from(self.year) * 12 + i64::from(self.month - 1) + i64::from(n);
        Self {
            year:  total.div_euclid(12) as i32,
            month: total.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMonthError(String);

impl fmt::Display for ParseMonthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a YYYY-MM month label", self.0)
    }
}

impl std::error::Error for ParseMonthError {}

impl FromStr for Month {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMonthError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succ_rolls_over_december() {
        let dec = Month::new(2024, 12).unwrap();
        assert_eq!(dec.succ(), Month::new(2025, 1).unwrap());
        assert_eq!(dec.plus(3).to_string(), "2025-03");
    }

    #[test]
    fn plus_matches_repeated_succ() {
        let start = Month::new(2023, 11).unwrap();
        let mut stepped = start;
        for n in 0..40 {
            assert_eq!(start.plus(n), stepped, "n={n}");
            stepped = stepped.succ();
        }
    }

    #[test]
    fn plus_jumps_far_ahead_directly() {
        let m = Month::new(2024, 1).unwrap().plus(12_000_001);
        assert_eq!(m, Month::new(1_002_024, 2).unwrap());
    }

    #[test]
    fn label_round_trips_through_from_str() {
        let m: Month = "2024-07".parse().unwrap();
        assert_eq!(m, Month::of(NaiveDate::from_ymd_opt(2024, 7, 19).unwrap()));
        assert!("2024-13".parse::<Month>().is_err());
        assert!("July".parse::<Month>().is_err());
    }
}
