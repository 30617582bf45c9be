//! World Bank Indicators API client
//!
//! Fetches indicator observations for a set of countries:
//! - Endpoint: GET /country/{iso3;iso3}/indicator/{code}?format=json
//! - Pages are requested until the server reports no more (or the page
//!   ceiling is hit) and concatenated before normalization
//! - Every request carries a bounded timeout; transient failures go
//!   through the retry manager

use crate::errors::Result;
use crate::fetch::http::{build_client, get_json};
use crate::fetch::retry::RetryManager;
use crate::fetch::types::{parse_indicator_meta, parse_page, IndicatorMeta, Page, RawRecord, SeriesRequest};
use crate::fetch::SeriesSource;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default World Bank API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";

/// Request timeout (30 seconds)
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per page
pub const DEFAULT_PER_PAGE: u32 = 20_000;

/// Upper bound on pages followed for a single request
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// World Bank API client
#[derive(Debug, Clone)]
pub struct WorldBankClient {
    client: Client,
    base_url: String,
    per_page: u32,
    max_pages: u32,
    retry: RetryManager,
}

impl WorldBankClient {
    /// Create client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_BASE_URL, REQUEST_TIMEOUT, RetryManager::new())
    }

    /// Create client with custom endpoint, timeout and retry policy
    pub fn with_config(base_url: &str, timeout: Duration, retry: RetryManager) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            retry,
        })
    }

    /// Override page size and page ceiling
    pub fn with_paging(mut self, per_page: u32, max_pages: u32) -> Self {
        self.per_page = per_page.max(1);
        self.max_pages = max_pages.max(1);
        self
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch every page for a request and concatenate the records
    pub async fn fetch_series(&self, request: &SeriesRequest) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let decoded = self.fetch_page(request, page).await?;
            debug!(
                indicator = request.indicator(),
                page,
                pages = decoded.meta.pages,
                records = decoded.records.len(),
                "fetched page"
            );
            records.extend(decoded.records);

            if decoded.exhausted || page >= decoded.meta.pages {
                break;
            }
            if page >= self.max_pages {
                warn!(
                    indicator = request.indicator(),
                    max_pages = self.max_pages,
                    reported_pages = decoded.meta.pages,
                    "page ceiling reached, stopping pagination"
                );
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    /// Fetch and decode one page, retrying transient failures
    async fn fetch_page(&self, request: &SeriesRequest, page: u32) -> Result<Page> {
        let url = format!(
            "{}/country/{}/indicator/{}",
            self.base_url,
            request.country_path(),
            request.indicator()
        );
        let query = [
            ("format", "json".to_string()),
            ("per_page", self.per_page.to_string()),
            ("page", page.to_string()),
            ("date", request.years().to_string()),
        ];

        let body = self
            .retry
            .execute_with_retry(|| get_json(&self.client, &url, &query))
            .await?;
        parse_page(&body)
    }

    /// Fetch WDI metadata (name, unit, definition, source) for one code
    pub async fn indicator_meta(&self, code: &str) -> Result<IndicatorMeta> {
        let url = format!("{}/indicator/{}", self.base_url, code.trim());
        let query = [("format", "json".to_string())];

        let body = self
            .retry
            .execute_with_retry(|| get_json(&self.client, &url, &query))
            .await?;
        parse_indicator_meta(code, &body)
    }
}

#[async_trait]
impl SeriesSource for WorldBankClient {
    async fn fetch(&self, request: &SeriesRequest) -> Result<Vec<RawRecord>> {
        self.fetch_series(request).await
    }
}
