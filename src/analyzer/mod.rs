//! Content analyzer for submitted pages
//!
//! This module turns a URL into page metrics:
//! - a single HTTP GET (see `fetcher`)
//! - a lenient HTML parse and one iterative pass over the element tree (see `parser`)
//! - the HTML version placeholder derived from the protocol version
//!
//! Every failure is mapped onto [`AnalysisError`]; nothing escapes as a panic.

mod fetcher;
mod parser;

pub use fetcher::{build_http_client, fetch_page, FetchedPage};
pub use parser::{analyze_document, detect_html_version};

use crate::config::UserAgentConfig;
use crate::state::AnalysisResult;
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Error code recorded for timed-out analyses
pub const TIMEOUT_ERROR_CODE: i64 = 408;

/// Classified analysis failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("{0}")]
    Fetch(String),

    #[error("unreachable: {code} {reason}")]
    HttpStatus { code: u16, reason: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("Timed out")]
    Timeout,

    #[error("Analysis cancelled")]
    Cancelled,
}

/// Failure kinds, so callers branch on kind instead of message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FetchFailure,
    HttpStatusFailure,
    ParseFailure,
    TimeoutFailure,
    Cancelled,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(_) => ErrorKind::FetchFailure,
            Self::HttpStatus { .. } => ErrorKind::HttpStatusFailure,
            Self::Parse(_) => ErrorKind::ParseFailure,
            Self::Timeout => ErrorKind::TimeoutFailure,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The integer code stored alongside the reason text
    ///
    /// HTTP failures carry their status code, timeouts carry 408, and every
    /// other failure carries 0.
    pub fn error_code(&self) -> i64 {
        match self {
            Self::HttpStatus { code, .. } => i64::from(*code),
            Self::Timeout => TIMEOUT_ERROR_CODE,
            _ => 0,
        }
    }
}

/// Something that can analyze a page
///
/// The pipeline depends on this trait rather than on [`HttpAnalyzer`], so
/// tests can substitute slow, gated, or failing analyzers.
#[async_trait]
pub trait PageAnalyzer: Send + Sync {
    /// Analyzes the page at `url`
    ///
    /// Implementations should stop early and return
    /// [`AnalysisError::Cancelled`] once `cancel` fires.
    async fn analyze(
        &self,
        url: &str,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError>;
}

/// Analyzer that fetches pages over HTTP
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    client: Client,
}

impl HttpAnalyzer {
    /// Builds an analyzer with its own HTTP client
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl PageAnalyzer for HttpAnalyzer {
    async fn analyze(
        &self,
        url: &str,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        analyze_url(&self.client, url, &cancel).await
    }
}

/// Fetches and analyzes one page
///
/// # Steps
///
/// 1. GET the URL (network failure -> `Fetch`, status >= 400 -> `HttpStatus`)
/// 2. Parse the body on the blocking pool (a panicking parse -> `Parse`)
/// 3. Label the HTML version from the response protocol
///
/// The inaccessible-link count is part of the result but is never computed
/// and stays zero.
pub async fn analyze_url(
    client: &Client,
    url: &str,
    cancel: &CancellationToken,
) -> Result<AnalysisResult, AnalysisError> {
    let page = fetch_page(client, url, cancel).await?;

    if cancel.is_cancelled() {
        return Err(AnalysisError::Cancelled);
    }

    let base_url = url.to_string();
    let FetchedPage { body, protocol } = page;
    let mut result = tokio::task::spawn_blocking(move || analyze_document(&body, &base_url))
        .await
        .map_err(|e| AnalysisError::Parse(e.to_string()))?;

    if cancel.is_cancelled() {
        return Err(AnalysisError::Cancelled);
    }

    result.html_version = detect_html_version(&protocol).to_string();
    Ok(result)
}
