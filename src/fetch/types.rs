//! Request key and World Bank wire types
//!
//! A World Bank series response is a two element array: pagination
//! metadata followed by an array of observation records (or `null` when
//! there is no data).

use crate::errors::{MonitorError, Result};
use crate::types::{CountryCode, DataSource, YearRange};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What to fetch: a set of countries, one indicator, a year window and
/// the source serving the indicator.
///
/// Countries are kept sorted and de-duplicated so that two requests for the
/// same selection compare (and hash) equal regardless of input order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesRequest {
    source: DataSource,
    countries: Vec<CountryCode>,
    indicator: String,
    years: YearRange,
}

impl SeriesRequest {
    pub fn new(countries: &[CountryCode], indicator: &str, years: YearRange) -> Self {
        let mut countries = countries.to_vec();
        countries.sort();
        countries.dedup();

        Self {
            source: DataSource::WorldBank,
            countries,
            indicator: indicator.trim().to_string(),
            years,
        }
    }

    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn countries(&self) -> &[CountryCode] {
        &self.countries
    }

    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    /// Countries joined the way the API path expects (`IND;PAK`)
    pub fn country_path(&self) -> String {
        self.countries
            .iter()
            .map(CountryCode::as_str)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// `{ "id": ..., "value": ... }` reference object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// One observation record exactly as received.
///
/// `date` and `value` stay untyped; the normalizer decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, rename = "countryiso3code")]
    pub country_iso3: Option<String>,
    #[serde(default)]
    pub country: Option<NamedRef>,
    #[serde(default)]
    pub indicator: Option<NamedRef>,
    #[serde(default)]
    pub date: Value,
    #[serde(default)]
    pub value: Value,
}

impl RawRecord {
    /// Record with the given code, year and value (handy for sources and tests)
    pub fn new(country_iso3: &str, date: Value, value: Value) -> Self {
        Self {
            country_iso3: Some(country_iso3.to_string()),
            date,
            value,
            ..Self::default()
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// Total pages the server holds for the query
    pub pages: u32,
}

/// One decoded page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub meta: PageMeta,
    pub records: Vec<RawRecord>,
    /// Server sent `null` for the data element
    pub exhausted: bool,
}

/// Indicator metadata from `/indicator/{code}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorMeta {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub source_note: String,
    #[serde(default)]
    pub source_organization: String,
    #[serde(default)]
    pub source: Option<NamedRef>,
}

impl IndicatorMeta {
    /// Source name, falling back to the organization
    pub fn source_name(&self) -> &str {
        self.source
            .as_ref()
            .and_then(|s| s.value.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.source_organization)
    }
}

/// Reads a count that may arrive as a number or a numeric string
fn read_count(meta: &Value, key: &str) -> Option<u64> {
    match meta.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// API error envelope: `[{"message": [{"id": ..., "key": ..., "value": ...}]}]`
fn api_error_message(body: &[Value]) -> Option<String> {
    let messages = body.first()?.get("message")?.as_array()?;
    let text = messages
        .iter()
        .filter_map(|m| {
            m.get("value")
                .or_else(|| m.get("key"))
                .and_then(Value::as_str)
                .map(str::trim)
        })
        .collect::<Vec<_>>()
        .join("; ");
    Some(if text.is_empty() { "unspecified API error".to_string() } else { text })
}

/// Validate the `[meta, data]` shape and split it
fn split_envelope(body: &Value) -> Result<(&Value, &Value)> {
    let items = body
        .as_array()
        .ok_or_else(|| MonitorError::MalformedResponse("expected a JSON array".to_string()))?;

    if let Some(message) = api_error_message(items) {
        return Err(MonitorError::MalformedResponse(format!("API error: {}", message)));
    }

    match items.as_slice() {
        [meta, data, ..] if meta.is_object() => Ok((meta, data)),
        _ => Err(MonitorError::MalformedResponse(
            "expected [metadata, records]".to_string(),
        )),
    }
}

/// Decode one series page
pub fn parse_page(body: &Value) -> Result<Page> {
    let (meta, data) = split_envelope(body)?;

    let pages = read_count(meta, "pages").ok_or_else(|| {
        MonitorError::MalformedResponse("pagination metadata lacks `pages`".to_string())
    })?;
    let pages = u32::try_from(pages).map_err(|_| {
        MonitorError::MalformedResponse(format!("page count {} out of range", pages))
    })?;
    let meta = PageMeta { pages };

    let (records, exhausted) = match data {
        Value::Null => (Vec::new(), true),
        Value::Array(items) => {
            let records = items
                .iter()
                .filter_map(|item| match serde_json::from_value::<RawRecord>(item.clone()) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::debug!("skipping undecodable record: {}", e);
                        None
                    }
                })
                .collect();
            (records, false)
        }
        _ => {
            return Err(MonitorError::MalformedResponse(
                "records element is neither an array nor null".to_string(),
            ))
        }
    };

    Ok(Page { meta, records, exhausted })
}

/// Decode an `/indicator/{code}` metadata response
pub fn parse_indicator_meta(code: &str, body: &Value) -> Result<IndicatorMeta> {
    let (_, data) = split_envelope(body)?;

    let first = data
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| MonitorError::UnknownIndicator(code.to_string()))?;

    let mut meta: IndicatorMeta = serde_json::from_value(first.clone())?;
    if meta.id.is_empty() {
        meta.id = code.to_string();
    }
    if meta.name.is_empty() {
        meta.name = code.to_string();
    }
    Ok(meta)
}
