//! Series normalizer
//!
//! Turns raw API records into one canonical `Series` per country.
//! Record-level defects (null or non-numeric value, unparsable year,
//! missing or invalid country code) are skipped, never fatal.

use crate::fetch::RawRecord;
use crate::types::{CountryCode, Observation, Series};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Group, clean, sort and de-duplicate raw records.
///
/// Every country in `requested` is present in the result, with an empty
/// series when it had no usable data. Countries that appear in the data but
/// were not requested are kept as well.
pub fn normalize(records: &[RawRecord], requested: &[CountryCode]) -> BTreeMap<CountryCode, Series> {
    let mut grouped: BTreeMap<CountryCode, Vec<Observation>> = BTreeMap::new();
    let mut dropped = 0usize;

    for record in records {
        match to_observation(record) {
            Some(obs) => grouped.entry(obs.country.clone()).or_default().push(obs),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, total = records.len(), "dropped unusable records");
    }

    let mut result: BTreeMap<CountryCode, Series> = grouped
        .into_iter()
        .map(|(country, observations)| {
            let series = Series::new(country.clone(), observations);
            (country, series)
        })
        .collect();

    for country in requested {
        result
            .entry(country.clone())
            .or_insert_with(|| Series::empty(country.clone()));
    }

    result
}

fn to_observation(record: &RawRecord) -> Option<Observation> {
    let country = record
        .country_iso3
        .as_deref()
        .and_then(|code| CountryCode::new(code).ok())?;
    let year = parse_year(&record.date)?;
    let value = parse_value(&record.value)?;

    Some(Observation::new(country, year, Some(value)))
}

/// Year from a number or numeric string
pub fn parse_year(raw: &Value) -> Option<i32> {
    match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .and_then(|f| i32::try_from(f as i64).ok())
            }
        }
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Finite value from a number or numeric string
pub fn parse_value(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}
