//! UN SDG Global Database client
//!
//! Serves indicators whose catalogue source is `un_sdg`. The UN endpoints
//! take one M49 area code per request, so each country is fetched on its own:
//! - ISO3 -> M49 from a built-in table, then a REST Countries lookup
//! - `GET {api}/Series/Data?seriesCode=..&area=..&timePeriod=Y1-Y2`
//! - when that yields nothing usable, the SDMX dataflow `DF_SDG_GLH`
//!   keyed `{series}.{m49}.A`, keeping the disaggregation that scores
//!   closest to a national total

use crate::errors::{MonitorError, Result};
use crate::fetch::http::{build_client, get_json, is_not_found};
use crate::fetch::retry::RetryManager;
use crate::fetch::types::{RawRecord, SeriesRequest};
use crate::fetch::SeriesSource;
use crate::types::{CountryCode, YearRange};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// UN SDG API v1 root
pub const DEFAULT_API_URL: &str = "https://unstats.un.org/SDGAPI/v1/sdg";

/// SDMX REST data path for the global SDG dataflow
pub const DEFAULT_SDMX_URL: &str = "https://data.un.org/ws/rest/data/IAEG-SDGs,DF_SDG_GLH";

/// REST Countries v3.1 root, used for M49 codes missing from the table
pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1";

/// Request timeout (40 seconds; SDMX queries are slow)
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

/// M49 codes for the usual focus and peer countries
const M49_TABLE: [(&str, u16); 18] = [
    ("IND", 356),
    ("BGD", 50),
    ("PAK", 586),
    ("LKA", 144),
    ("NPL", 524),
    ("CHN", 156),
    ("USA", 840),
    ("BRA", 76),
    ("RUS", 643),
    ("ZAF", 710),
    ("IDN", 360),
    ("MEX", 484),
    ("TUR", 792),
    ("GBR", 826),
    ("DEU", 276),
    ("FRA", 250),
    ("JPN", 392),
    ("VNM", 704),
];

/// Dimension values that mark an aggregate slice
const TOTAL_TOKENS: [&str; 7] = ["T", "TOTAL", "TOTL", "ALL", "BTSX", "ALLAREA", "ALLAGE"];

/// Reporting-type values for nationally produced figures
const NATIONAL_REPORTING: [&str; 3] = ["G", "NAT", "NATIONAL"];

/// UN SDG API client
#[derive(Debug)]
pub struct UnSdgClient {
    client: Client,
    api_url: String,
    sdmx_url: String,
    countries_url: String,
    retry: RetryManager,
    /// M49 codes resolved remotely during this process
    resolved: Mutex<HashMap<CountryCode, u16>>,
}

impl UnSdgClient {
    /// Create client with default endpoints
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_API_URL, REQUEST_TIMEOUT, RetryManager::new())
    }

    /// Create client with custom API root, timeout and retry policy
    pub fn with_config(api_url: &str, timeout: Duration, retry: RetryManager) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_url: trim_url(api_url),
            sdmx_url: DEFAULT_SDMX_URL.to_string(),
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
            retry,
            resolved: Mutex::new(HashMap::new()),
        })
    }

    /// Override the SDMX data path
    pub fn with_sdmx_url(mut self, url: &str) -> Self {
        self.sdmx_url = trim_url(url);
        self
    }

    /// Override the REST Countries root
    pub fn with_countries_url(mut self, url: &str) -> Self {
        self.countries_url = trim_url(url);
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// UN M49 area code for a country, or `None` when it cannot be resolved
    pub async fn m49_code(&self, country: &CountryCode) -> Option<u16> {
        if let Some(code) = table_m49(country) {
            return Some(code);
        }
        let cached = self.lock_resolved().get(country).copied();
        if cached.is_some() {
            return cached;
        }

        let url = format!("{}/alpha/{}", self.countries_url, country);
        let looked_up = self
            .retry
            .execute_with_retry(|| get_json(&self.client, &url, &[]))
            .await;

        match looked_up {
            Ok(body) => {
                let code = parse_ccn3(&body);
                match code {
                    Some(code) => {
                        self.lock_resolved().insert(country.clone(), code);
                    }
                    None => debug!(%country, "no M49 code in country lookup"),
                }
                code
            }
            Err(e) if is_not_found(&e) => {
                debug!(%country, "country unknown to lookup service");
                None
            }
            Err(e) => {
                warn!(%country, error = %e, "M49 lookup failed");
                None
            }
        }
    }

    /// All usable records for one series and one country
    pub async fn fetch_country(
        &self,
        series: &str,
        country: &CountryCode,
        years: YearRange,
    ) -> Result<Vec<RawRecord>> {
        let area = match self.m49_code(country).await {
            Some(area) => area,
            None => {
                warn!(%country, "skipping country without an M49 code");
                return Ok(Vec::new());
            }
        };

        match self.series_data(series, area, country, years).await {
            Ok(records) if !records.is_empty() => return Ok(records),
            Ok(_) => debug!(series, %country, "Series/Data empty, trying SDMX"),
            Err(e @ (MonitorError::NetworkError(_) | MonitorError::RateLimited { .. })) => return Err(e),
            Err(e) => debug!(series, %country, error = %e, "Series/Data failed, trying SDMX"),
        }

        self.sdmx_data(series, area, country, years).await
    }

    async fn series_data(
        &self,
        series: &str,
        area: u16,
        country: &CountryCode,
        years: YearRange,
    ) -> Result<Vec<RawRecord>> {
        let url = format!("{}/Series/Data", self.api_url);
        let query = [
            ("seriesCode", series.to_string()),
            ("area", area.to_string()),
            ("timePeriod", format!("{}-{}", years.start, years.end)),
        ];

        let body = self
            .retry
            .execute_with_retry(|| get_json(&self.client, &url, &query))
            .await?;
        parse_series_data(&body, country)
    }

    async fn sdmx_data(
        &self,
        series: &str,
        area: u16,
        country: &CountryCode,
        years: YearRange,
    ) -> Result<Vec<RawRecord>> {
        let url = format!("{}/{}.{}.A", self.sdmx_url, series, area);
        let query = [
            ("time", years.to_string()),
            ("contentType", "json".to_string()),
        ];

        let fetched = self
            .retry
            .execute_with_retry(|| get_json(&self.client, &url, &query))
            .await;
        match fetched {
            Ok(body) => parse_sdmx(&body, country),
            // SDMX answers "no results" with 404
            Err(e) if is_not_found(&e) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn lock_resolved(&self) -> std::sync::MutexGuard<'_, HashMap<CountryCode, u16>> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SeriesSource for UnSdgClient {
    async fn fetch(&self, request: &SeriesRequest) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        for country in request.countries() {
            let fetched = self
                .fetch_country(request.indicator(), country, request.years())
                .await?;
            debug!(series = request.indicator(), %country, records = fetched.len(), "fetched UN series");
            records.extend(fetched);
        }
        Ok(records)
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn table_m49(country: &CountryCode) -> Option<u16> {
    M49_TABLE
        .iter()
        .find(|(iso3, _)| *iso3 == country.as_str())
        .map(|(_, code)| *code)
}

/// `ccn3` from a REST Countries response (a list, or a single object)
fn parse_ccn3(body: &Value) -> Option<u16> {
    let entry = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match entry.get("ccn3")? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        _ => None,
    }
}

/// Decode a `Series/Data` response: a bare list, or an object with `data`.
///
/// Items without a period or with an empty value are skipped here so an
/// all-empty answer falls through to SDMX.
pub fn parse_series_data(body: &Value, country: &CountryCode) -> Result<Vec<RawRecord>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| MonitorError::MalformedResponse("Series/Data lacks a `data` array".to_string()))?,
        _ => {
            return Err(MonitorError::MalformedResponse(
                "Series/Data is neither a list nor an object".to_string(),
            ))
        }
    };

    Ok(items
        .iter()
        .filter_map(|item| {
            let period = item
                .get("timePeriod")
                .or_else(|| item.get("timePeriodStart"))
                .filter(|v| !v.is_null())?;
            let value = item.get("value").filter(|v| !is_blank(v))?;
            Some(RawRecord::new(country.as_str(), period.clone(), value.clone()))
        })
        .collect())
}

/// Decode an SDMX-JSON data message, keeping the best scoring series
pub fn parse_sdmx(body: &Value, country: &CountryCode) -> Result<Vec<RawRecord>> {
    let series = match body.pointer("/dataSets/0/series").and_then(Value::as_object) {
        Some(series) if !series.is_empty() => series,
        _ => return Ok(Vec::new()),
    };

    let dimensions = body
        .pointer("/structure/dimensions")
        .ok_or_else(|| MonitorError::MalformedResponse("SDMX message lacks dimensions".to_string()))?;
    let series_dims = dimensions
        .get("series")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let obs_dims = dimensions
        .get("observation")
        .and_then(Value::as_array)
        .ok_or_else(|| MonitorError::MalformedResponse("SDMX message lacks observation dimensions".to_string()))?;

    let time_pos = obs_dims
        .iter()
        .position(|dim| {
            dim.get("id")
                .and_then(Value::as_str)
                .map_or(false, |id| id.to_ascii_uppercase().starts_with("TIME"))
        })
        .ok_or_else(|| MonitorError::MalformedResponse("SDMX message has no time dimension".to_string()))?;
    let time_values = obs_dims[time_pos]
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| MonitorError::MalformedResponse("SDMX time dimension has no values".to_string()))?;

    let mut best: Option<(&Map<String, Value>, u32)> = None;
    for (key, entry) in series {
        let observations = match entry.get("observations").and_then(Value::as_object) {
            Some(obs) if !obs.is_empty() => obs,
            _ => continue,
        };
        let score = score_series_key(series_dims, key);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((observations, score));
        }
    }
    let observations = match best {
        Some((observations, _)) => observations,
        None => return Ok(Vec::new()),
    };

    Ok(observations
        .iter()
        .filter_map(|(key, obs)| {
            let positions = parse_key(key)?;
            let year = time_values.get(*positions.get(time_pos)?)?.get("id")?;
            let value = obs.get(0).filter(|v| !v.is_null())?;
            Some(RawRecord::new(country.as_str(), year.clone(), value.clone()))
        })
        .collect())
}

/// Score a series key such as `0:3:1`: totals earn 2 per dimension,
/// nationally reported figures 3 more
pub fn score_series_key(dims: &[Value], key: &str) -> u32 {
    let positions = parse_key(key).unwrap_or_default();

    dims.iter()
        .zip(positions)
        .map(|(dim, pos)| {
            let value = dim.get("values").and_then(|v| v.get(pos));
            let id = upper_field(value, "id");
            let name = upper_field(value, "name");

            let mut score = 0;
            if TOTAL_TOKENS.iter().any(|t| id.contains(t) || name.contains(t)) {
                score += 2;
            }
            let dim_id = upper_field(Some(dim), "id");
            if dim_id == "REPORTING_TYPE" && NATIONAL_REPORTING.contains(&id.as_str()) {
                score += 3;
            }
            score
        })
        .sum()
}

fn parse_key(key: &str) -> Option<Vec<usize>> {
    key.split(':').map(|part| part.parse().ok()).collect()
}

fn upper_field(value: Option<&Value>, field: &str) -> String {
    value
        .and_then(|v| v.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_uppercase()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
