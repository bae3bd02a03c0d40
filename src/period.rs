//! Reporting periods.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{Datelike, Months, NaiveDate};

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(NaiveDate);

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn previous(&self) -> Option<Self> {
        self.0.checked_sub_months(Months::new(1)).map(Self)
    }

    pub fn years_ago(&self, years: u32) -> Option<Self> {
        self.0.checked_sub_months(Months::new(12 * years)).map(Self)
    }

    /// All twelve months of `year`, January first.
    pub fn months_of(year: i32) -> Vec<Self> {
        (1..=12).filter_map(|m| Self::new(year, m)).collect()
    }

    /// Human label such as `May 2025`.
    pub fn label(&self) -> String {
        self.0.format("%b %Y").to_string()
    }

    /// Earlier periods each month's report is compared against, labelled.
    pub fn comparisons(&self) -> Vec<(String, Self)> {
        [self.previous(), self.years_ago(1), self.years_ago(5)]
            .into_iter()
            .flatten()
            .map(|m| (m.label(), m))
            .collect()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl FromStr for Month {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .with_context(|| format!("invalid month '{s}', expected YYYY-MM"))?;
        Ok(Self(date))
    }
}
