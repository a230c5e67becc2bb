// src/scout/fetch.rs
// =============================================================================
// This module fetches one page and classifies it.
//
// For every URI the crawl visits:
// 1. GET the page (bounded timeout, redirects followed)
// 2. Not a 200 or not HTML?       -> dead end (no match, no links)
// 3. Body contains the query?     -> match (links are not extracted)
// 4. Otherwise                    -> extract links to follow
//
// Network failures never bubble up to the crawl: Scout::check turns them
// into a dead-end report and logs them.
// =============================================================================

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::links::extract_references;
use super::Report;
use crate::memory::{Memory, Resolution};

// How many redirects a single request may follow
const MAX_REDIRECTS: usize = 10;

// Why a fetch produced no response to classify.
//
// These are all transient from the crawl's point of view: the page is
// treated as a dead end and never retried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response within the configured timeout
    #[error("request to {uri} timed out")]
    Timeout { uri: Url },

    /// Host unreachable, connection refused, DNS failure
    #[error("could not connect to {uri}: {reason}")]
    Connect { uri: Url, reason: String },

    /// The connection broke while the body was read
    #[error("failed to read body of {uri}: {reason}")]
    Body { uri: Url, reason: String },

    /// Anything else reqwest reports (redirect loops, protocol errors, ...)
    #[error("request to {uri} failed: {reason}")]
    Request { uri: Url, reason: String },
}

impl FetchError {
    // Sorts a reqwest error into one of our categories
    fn from_request(uri: &Url, error: reqwest::Error) -> Self {
        let uri = uri.clone();
        if error.is_timeout() {
            FetchError::Timeout { uri }
        } else if error.is_connect() {
            FetchError::Connect {
                uri,
                reason: error.to_string(),
            }
        } else {
            FetchError::Request {
                uri,
                reason: error.to_string(),
            }
        }
    }
}

// Builds the HTTP client used by the crawl and the verifier
//
// - HTTP/1.1 only
// - the same timeout for connecting and for the whole request
// - redirects are followed automatically
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("query-crawler/", env!("CARGO_PKG_VERSION")))
        .http1_only()
        .connect_timeout(timeout)
        .timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()
}

// Fetches pages on behalf of the crawl, memoized through Memory
pub struct Scout {
    client: Client,
    memory: Arc<Memory>,
}

impl Scout {
    pub fn new(memory: Arc<Memory>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            memory,
        })
    }

    pub fn memory(&self) -> &Arc<Memory> {
        &self.memory
    }

    // Returns the report for `source`, fetching it only if no other branch
    // has done so already.
    //
    // Blocks while another branch is fetching the same URI. Returns None,
    // without fetching, if `cancel` fired while waiting for the lock.
    // Otherwise some report is always stored, even when the request fails.
    pub async fn check(
        &self,
        source: &Url,
        query: &str,
        cancel: &CancellationToken,
    ) -> Option<Resolution> {
        let lock = self.memory.acquire(source).await;
        if cancel.is_cancelled() {
            debug!(%source, "cancelled while waiting for lock");
            return None;
        }

        let resolution = self
            .memory
            .resolve(&lock, |uri| async move {
                match self.fetch(&uri, query).await {
                    Ok(report) => report,
                    Err(error) => {
                        warn!(%error, "💥 failed request");
                        Report::dead_end(uri, query, 0)
                    }
                }
            })
            .await;

        self.memory.release(lock);
        Some(resolution)
    }

    // Performs one GET and classifies the response. Not memoized.
    pub async fn fetch(&self, source: &Url, query: &str) -> Result<Report, FetchError> {
        debug!(%source, "fetching");

        let response = self
            .client
            .get(source.clone())
            .send()
            .await
            .map_err(|error| FetchError::from_request(source, error))?;

        let status = response.status();
        let html = is_html(response.headers());
        // After redirects this is the URI the content actually came from
        let location = response.url().clone();

        let body = response.bytes().await.map_err(|error| FetchError::Body {
            uri: source.clone(),
            reason: error.to_string(),
        })?;
        let response_size = body.len();

        if status != StatusCode::OK || !html {
            debug!(%source, %status, html, "dead end");
            return Ok(Report::dead_end(source.clone(), query, response_size));
        }

        let text = String::from_utf8_lossy(&body);
        if text.contains(query) {
            debug!(%source, "query found");
            return Ok(Report::matched(source.clone(), query, response_size));
        }

        let references = extract_references(&text, &location);
        debug!(%source, references = references.len(), "links extracted");
        Ok(Report::expanded(
            source.clone(),
            query,
            references,
            response_size,
        ))
    }
}

// True if any content-type header is compatible with text/html
fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get_all(CONTENT_TYPE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(html_compatible)
}

// MIME compatibility with text/html, wildcards included.
// Parameters such as charset are ignored.
fn html_compatible(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    matches!(essence.as_str(), "text/html" | "text/*" | "*/*")
}
