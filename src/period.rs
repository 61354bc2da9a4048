use chrono::{Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::utils::{validate_year, validate_year_month, ValidationError};

/// A calendar month, rendered as `YYYY_MM` in file names and URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Every month from `first` to `last`, both inclusive
    pub fn range_inclusive(first: YearMonth, last: YearMonth) -> Vec<YearMonth> {
        let mut months = Vec::new();
        let mut current = first.first_day();
        let end = last.first_day();

        while let Some(date) = current.filter(|d| Some(*d) <= end) {
            months.push(YearMonth::from(date));
            current = date.checked_add_months(Months::new(1));
        }

        months
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = validate_year_month(s)?;
        Ok(Self { year, month })
    }
}

/// Period requested by an export: a whole year or a single month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    Month(YearMonth),
}

impl Period {
    /// Months covered by the period, in calendar order
    pub fn months(&self) -> Vec<YearMonth> {
        match *self {
            Period::Year(year) => (1..=12).map(|month| YearMonth { year, month }).collect(),
            Period::Month(ym) => vec![ym],
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year(year) => write!(f, "{year}"),
            Period::Month(ym) => write!(f, "{ym}"),
        }
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    /// Accepts `YYYY_MM` first, then `YYYY`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(ym) = s.parse::<YearMonth>() {
            return Ok(Period::Month(ym));
        }
        validate_year(s)
            .map(Period::Year)
            .map_err(|_| ValidationError::YearMonth(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_month_display_pads_month() {
        let ym = YearMonth::new(2019, 3).unwrap();
        assert_eq!(ym.to_string(), "2019_03");
    }

    #[test]
    fn test_year_month_new_rejects_bad_month() {
        assert!(YearMonth::new(2019, 0).is_none());
        assert!(YearMonth::new(2019, 13).is_none());
    }

    #[test]
    fn test_range_inclusive_crosses_year() {
        let months = YearMonth::range_inclusive(
            YearMonth::new(2014, 11).unwrap(),
            YearMonth::new(2015, 2).unwrap(),
        );
        let labels: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["2014_11", "2014_12", "2015_01", "2015_02"]);
    }

    #[test]
    fn test_range_inclusive_empty_when_reversed() {
        let months = YearMonth::range_inclusive(
            YearMonth::new(2015, 2).unwrap(),
            YearMonth::new(2014, 11).unwrap(),
        );
        assert!(months.is_empty());
    }

    #[test]
    fn test_period_parse_year() {
        let period: Period = "2020".parse().unwrap();
        assert_eq!(period, Period::Year(2020));
        assert_eq!(period.months().len(), 12);
        assert_eq!(period.to_string(), "2020");
    }

    #[test]
    fn test_period_parse_month() {
        let period: Period = "2020_07".parse().unwrap();
        assert_eq!(period.months(), vec![YearMonth::new(2020, 7).unwrap()]);
        assert_eq!(period.to_string(), "2020_07");
    }

    #[test]
    fn test_period_parse_invalid() {
        assert!("2020_13".parse::<Period>().is_err());
        assert!("1999".parse::<Period>().is_err());
        assert!("july".parse::<Period>().is_err());
    }
}
