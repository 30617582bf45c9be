//! Per-source dispatch
//!
//! The service holds one `SeriesSource`; the router behind it forwards each
//! request to the client registered for the request's data source.

use crate::errors::{MonitorError, Result};
use crate::fetch::types::{RawRecord, SeriesRequest};
use crate::fetch::SeriesSource;
use crate::types::DataSource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes requests to a source by `DataSource`
#[derive(Default, Clone)]
pub struct SourceRouter {
    routes: HashMap<DataSource, Arc<dyn SeriesSource>>,
}

impl SourceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the client for one data source
    pub fn route(mut self, source: DataSource, client: Arc<dyn SeriesSource>) -> Self {
        self.routes.insert(source, client);
        self
    }

    pub fn has_route(&self, source: DataSource) -> bool {
        self.routes.contains_key(&source)
    }
}

#[async_trait]
impl SeriesSource for SourceRouter {
    async fn fetch(&self, request: &SeriesRequest) -> Result<Vec<RawRecord>> {
        let client = self.routes.get(&request.source()).ok_or_else(|| {
            MonitorError::ConfigError(format!("no client configured for {} indicators", request.source()))
        })?;
        client.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CountryCode, YearRange};
    use serde_json::json;

    struct Fixed(&'static str);

    #[async_trait]
    impl SeriesSource for Fixed {
        async fn fetch(&self, _request: &SeriesRequest) -> Result<Vec<RawRecord>> {
            Ok(vec![RawRecord::new(self.0, json!(2020), json!(1.0))])
        }
    }

    fn request() -> SeriesRequest {
        SeriesRequest::new(
            &[CountryCode::new("IND").unwrap()],
            "X",
            YearRange::new(2000, 2020).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_dispatch_by_source() {
        let router = SourceRouter::new()
            .route(DataSource::WorldBank, Arc::new(Fixed("AAA")))
            .route(DataSource::UnSdg, Arc::new(Fixed("BBB")));

        let wb = router.fetch(&request()).await.unwrap();
        assert_eq!(wb[0].country_iso3.as_deref(), Some("AAA"));

        let un = router.fetch(&request().with_source(DataSource::UnSdg)).await.unwrap();
        assert_eq!(un[0].country_iso3.as_deref(), Some("BBB"));
    }

    #[tokio::test]
    async fn test_missing_route() {
        let router = SourceRouter::new().route(DataSource::WorldBank, Arc::new(Fixed("AAA")));
        assert!(!router.has_route(DataSource::UnSdg));
        assert!(matches!(
            router.fetch(&request().with_source(DataSource::UnSdg)).await,
            Err(MonitorError::ConfigError(_))
        ));
    }
}
