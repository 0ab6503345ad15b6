//! HTTP fetcher for the content analyzer
//!
//! One GET per analysis, no retries. Redirects are followed by the client.
//! Both the request and the body read stop as soon as the cancellation token
//! fires.

use crate::analyzer::AnalysisError;
use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Response body decoded as text
    pub body: String,

    /// HTTP protocol version string, e.g. `HTTP/1.1`
    pub protocol: String,
}

/// Builds an HTTP client with proper configuration
///
/// No overall request timeout is set here: the analysis task owns the
/// deadline and cancels the fetch when it passes.
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sitelens::config::UserAgentConfig;
/// use sitelens::analyzer::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", config.crawler_name, config.crawler_version);

    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body
///
/// # Error Mapping
///
/// | Condition | Error |
/// |-----------|-------|
/// | Connection, DNS, TLS, or body read failure | `Fetch` |
/// | HTTP status >= 400 | `HttpStatus` |
/// | Token cancelled while waiting | `Cancelled` |
pub async fn fetch_page(
    client: &Client,
    url: &str,
    cancel: &CancellationToken,
) -> Result<FetchedPage, AnalysisError> {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
        response = client.get(url).send() => {
            response.map_err(|e| AnalysisError::Fetch(e.to_string()))?
        }
    };

    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(AnalysisError::HttpStatus {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    let protocol = format!("{:?}", response.version());

    let body = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
        body = response.text() => body.map_err(|e| AnalysisError::Fetch(e.to_string()))?,
    };

    tracing::trace!("Fetched {} ({} bytes, {})", url, body.len(), protocol);

    Ok(FetchedPage { body, protocol })
}
