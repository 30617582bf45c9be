//! Observations and per-country time series
//!
//! A `Series` is the canonical, ascending-by-year view of one
//! (country, indicator) pair:
//! - No two observations share a year (first occurrence wins)
//! - Gaps are allowed; a missing year and a null value mean the same thing

use crate::types::country::{CountryCode, YearRange};
use serde::{Deserialize, Serialize};

/// A single data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub country: CountryCode,
    pub year: i32,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(country: CountryCode, year: i32, value: Option<f64>) -> Self {
        Self { country, year, value }
    }

    /// Value if present and finite
    pub fn usable_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

/// Ordered, gap-tolerant series for one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    country: CountryCode,
    observations: Vec<Observation>,
}

impl Series {
    /// Build a series from observations in encounter order.
    ///
    /// Observations for other countries are ignored. Sorting is stable, so
    /// when two observations share a year the one encountered first is kept.
    pub fn new(country: CountryCode, observations: Vec<Observation>) -> Self {
        let mut observations: Vec<Observation> = observations
            .into_iter()
            .filter(|o| o.country == country)
            .collect();
        observations.sort_by_key(|o| o.year);
        observations.dedup_by_key(|o| o.year);

        Self { country, observations }
    }

    /// An explicit empty series
    pub fn empty(country: CountryCode) -> Self {
        Self {
            country,
            observations: Vec::new(),
        }
    }

    /// Convenience constructor from `(year, value)` pairs
    pub fn from_values(country: CountryCode, values: &[(i32, f64)]) -> Self {
        let observations = values
            .iter()
            .map(|&(year, value)| Observation::new(country.clone(), year, Some(value)))
            .collect();
        Self::new(country, observations)
    }

    pub fn country(&self) -> &CountryCode {
        &self.country
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// `(year, value)` for every observation carrying a finite value, ascending
    pub fn usable(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.observations
            .iter()
            .filter_map(|o| o.usable_value().map(|v| (o.year, v)))
    }

    /// Latest usable data point
    pub fn latest(&self) -> Option<(i32, f64)> {
        self.usable().last()
    }

    /// Earliest usable data point with `year >= from_year`
    pub fn first_at_or_after(&self, from_year: i32) -> Option<(i32, f64)> {
        self.usable().find(|&(year, _)| year >= from_year)
    }

    /// Copy of the series restricted to `range`
    pub fn within(&self, range: YearRange) -> Series {
        Series {
            country: self.country.clone(),
            observations: self
                .observations
                .iter()
                .filter(|o| range.contains(o.year))
                .cloned()
                .collect(),
        }
    }

    /// Trailing rolling mean over usable points, with a minimum of one period
    pub fn rolling_mean(&self, window: usize) -> Vec<(i32, f64)> {
        let window = window.max(1);
        let points: Vec<(i32, f64)> = self.usable().collect();

        points
            .iter()
            .enumerate()
            .map(|(i, &(year, _))| {
                let from = (i + 1).saturating_sub(window);
                let slice = &points[from..=i];
                let mean = slice.iter().map(|&(_, v)| v).sum::<f64>() / slice.len() as f64;
                (year, mean)
            })
            .collect()
    }
}
