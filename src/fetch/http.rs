//! Shared HTTP plumbing for the remote clients
//!
//! One GET attempt, with the response status mapped onto the error
//! taxonomy: 429 is `RateLimited`, 5xx is a transient `NetworkError`, any
//! other non-success status is `HttpStatus`.

use crate::errors::{MonitorError, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Longest error body excerpt kept in `HttpStatus` errors
const BODY_EXCERPT: usize = 200;

/// reqwest client with a per-request timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("sdgprogress/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| MonitorError::ConfigError(format!("failed to build HTTP client: {}", e)))
}

/// Single GET attempt decoded as JSON
pub(crate) async fn get_json(client: &Client, url: &str, query: &[(&str, String)]) -> Result<Value> {
    let response = client.get(url).query(query).send().await?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        return Err(MonitorError::RateLimited { retry_after_secs });
    }

    if status.is_server_error() {
        return Err(MonitorError::NetworkError(format!("HTTP {} from {}", status, url)));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MonitorError::HttpStatus {
            status: status.as_u16(),
            body: body.chars().take(BODY_EXCERPT).collect(),
        });
    }

    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// True for a 404 from the remote side
pub(crate) fn is_not_found(err: &MonitorError) -> bool {
    matches!(err, MonitorError::HttpStatus { status: 404, .. })
}
