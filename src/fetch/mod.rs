//! Series fetching (remote statistics APIs)
//!
//! - `SeriesSource` trait: the seam the cache and service depend on
//! - `WorldBankClient`: paginated World Bank Indicators implementation
//! - `UnSdgClient`: UN SDG Global Database, with SDMX fallback
//! - `SourceRouter`: picks the client for a request's data source
//! - `RetryManager`: bounded exponential backoff for transient failures

pub mod client;
mod http;
pub mod retry;
pub mod router;
pub mod types;
pub mod un_sdg;

use crate::errors::Result;
use async_trait::async_trait;

// Re-export commonly used types
pub use client::WorldBankClient;
pub use retry::RetryManager;
pub use router::SourceRouter;
pub use types::{IndicatorMeta, RawRecord, SeriesRequest};
pub use un_sdg::UnSdgClient;

/// Anything that can produce raw observations for a request
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Fetch all raw records for the request.
    ///
    /// Fails with `NetworkError`, `RateLimited` or `MalformedResponse`;
    /// performs no caching.
    async fn fetch(&self, request: &SeriesRequest) -> Result<Vec<RawRecord>>;
}
