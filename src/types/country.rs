//! ISO-3 country codes and inclusive year ranges

use crate::errors::{MonitorError, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Validated ISO 3166-1 alpha-3 country code, stored upper-case
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse and normalize a country code ("ind" -> "IND")
    pub fn new(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MonitorError::InvalidCountry(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a comma separated list, skipping blank entries
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::new)
            .collect()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CountryCode {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

/// Inclusive range of calendar years
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(MonitorError::InvalidYearRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether `year` falls inside the range (both ends inclusive)
    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    /// Range from 2000 through the current calendar year
    pub fn default_window() -> Self {
        Self {
            start: 2000,
            end: chrono::Utc::now().year(),
        }
    }
}

impl fmt::Display for YearRange {
    /// Formats as the World Bank `date` query value, e.g. `2000:2024`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_normalizes_case() {
        let code = CountryCode::new(" ind ").unwrap();
        assert_eq!(code.as_str(), "IND");
    }

    #[test]
    fn test_country_code_rejects_bad_input() {
        assert!(CountryCode::new("IN").is_err());
        assert!(CountryCode::new("INDI").is_err());
        assert!(CountryCode::new("I1D").is_err());
        assert!(CountryCode::new("").is_err());
    }

    #[test]
    fn test_parse_list() {
        let codes = CountryCode::parse_list("bgd, PAK,,lka").unwrap();
        let strs: Vec<&str> = codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(strs, vec!["BGD", "PAK", "LKA"]);

        assert!(CountryCode::parse_list("BGD,XX").is_err());
    }

    #[test]
    fn test_country_code_serde() {
        let code: CountryCode = serde_json::from_str("\"npl\"").unwrap();
        assert_eq!(code.as_str(), "NPL");
        assert!(serde_json::from_str::<CountryCode>("\"nepal\"").is_err());
    }

    #[test]
    fn test_year_range() {
        let range = YearRange::new(2000, 2024).unwrap();
        assert!(range.contains(2000));
        assert!(range.contains(2024));
        assert!(!range.contains(2025));
        assert_eq!(range.to_string(), "2000:2024");

        assert!(YearRange::new(2024, 2000).is_err());
        assert!(YearRange::new(2015, 2015).is_ok());
    }
}
