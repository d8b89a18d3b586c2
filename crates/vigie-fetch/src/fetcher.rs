//! Time-bounded content retrieval.
//!
//! The [`Fetcher`] contract is that `fetch` never fails: timeouts, DNS errors,
//! refused connections and non-2xx statuses all come back as a
//! [`FetchResult`] whose `error` field is set. Higher stages branch on data
//! instead of propagating errors, which is what lets each probe stage degrade
//! on its own.

use crate::error::{FetchError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;
use vigie_core::HttpConfig;

/// Accept header for HTML documents.
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5";

/// Accept header for XML documents (sitemaps).
pub const ACCEPT_XML: &str = "application/xml,text/xml;q=0.9,*/*;q=0.5";

/// Accept header for JSON documents (web app manifests).
pub const ACCEPT_JSON: &str = "application/manifest+json,application/json;q=0.9,*/*;q=0.5";

/// Per-call fetch options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Whole-request timeout, including body download
    pub timeout: Duration,
    /// Body size cap; the body is cut there and `truncated` is set
    pub max_bytes: Option<usize>,
    /// Value of the `Accept` request header
    pub accept: Option<String>,
    /// Keep the body of non-2xx responses instead of discarding it
    pub treat_error_status_as_data: bool,
}

impl FetchOptions {
    /// Options with the given timeout and no other constraint.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_bytes: None,
            accept: None,
            treat_error_status_as_data: false,
        }
    }

    /// Options with a timeout given in milliseconds.
    #[must_use]
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self::new(Duration::from_millis(timeout_ms))
    }

    /// Cap the body size.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Set the `Accept` header.
    #[must_use]
    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept = Some(accept.to_string());
        self
    }

    /// Keep bodies of error responses.
    #[must_use]
    pub fn keep_error_body(mut self) -> Self {
        self.treat_error_status_as_data = true;
        self
    }

    fn timeout_ms(&self) -> u64 {
        duration_ms(self.timeout)
    }
}

/// Outcome of one network call. Failure is a field, never an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    /// URL as requested
    pub url: String,
    /// URL after redirects (equal to `url` when none happened or the call failed)
    pub final_url: String,
    /// Decoded body (lossy UTF-8), empty on failure
    pub content: String,
    /// Response headers with lower-cased names
    pub headers: BTreeMap<String, String>,
    /// HTTP status, 0 when no response was received
    pub status_code: u16,
    /// Failure description, if any
    pub error: Option<String>,
    /// Wall-clock duration of the call
    pub elapsed_ms: u64,
    /// Whether the body was cut at `max_bytes`
    pub truncated: bool,
}

impl FetchResult {
    /// Build a failed result carrying no response.
    #[must_use]
    pub fn failed(url: &str, error: &FetchError, elapsed: Duration) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            content: String::new(),
            headers: BTreeMap::new(),
            status_code: 0,
            error: Some(error.to_string()),
            elapsed_ms: duration_ms(elapsed),
            truncated: false,
        }
    }

    /// A 2xx response with no transport or body error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status_code)
    }

    /// Look up a response header by (case-insensitive) name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The media type of the `Content-Type` header, lower-cased, without parameters.
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        self.header("content-type").map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or(ct)
                .trim()
                .to_ascii_lowercase()
        })
    }
}

/// Source of fetched content.
///
/// Implementations must be re-entrant: probes share one fetcher and may run
/// concurrently.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`. Never fails; see [`FetchResult::error`].
    async fn fetch(&self, url: &str, options: &FetchOptions) -> FetchResult;
}

/// `reqwest`-backed fetcher. Single attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher from HTTP settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> FetchResult {
        let started = Instant::now();
        let timeout_ms = options.timeout_ms();

        let parsed = match parse_http_url(url) {
            Ok(parsed) => parsed,
            Err(e) => return FetchResult::failed(url, &e, started.elapsed()),
        };

        let mut request = self.client.get(parsed).timeout(options.timeout);
        if let Some(accept) = &options.accept {
            request = request.header(ACCEPT, accept.as_str());
        }

        let mut response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = FetchError::from_reqwest(&e, timeout_ms);
                debug!(url, error = %err, "fetch failed");
                return FetchResult::failed(url, &err, started.elapsed());
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();
        let headers = collect_headers(response.headers());

        if !status.is_success() && !options.treat_error_status_as_data {
            debug!(url, status = status.as_u16(), "non-success status");
            return FetchResult {
                url: url.to_string(),
                final_url,
                content: String::new(),
                headers,
                status_code: status.as_u16(),
                error: Some(FetchError::Status(status.as_u16()).to_string()),
                elapsed_ms: duration_ms(started.elapsed()),
                truncated: false,
            };
        }

        let mut body = Vec::new();
        let mut truncated = false;
        let mut body_error = None;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if let Some(limit) = options.max_bytes {
                        let room = limit.saturating_sub(body.len());
                        if chunk.len() > room {
                            body.extend_from_slice(&chunk[..room]);
                            truncated = true;
                            break;
                        }
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    body_error = Some(FetchError::from_reqwest(&e, timeout_ms));
                    break;
                }
            }
        }

        let error = if status.is_success() {
            body_error.map(|e| e.to_string())
        } else {
            Some(FetchError::Status(status.as_u16()).to_string())
        };

        if truncated {
            debug!(url, limit = ?options.max_bytes, "body truncated");
        }

        FetchResult {
            url: url.to_string(),
            final_url,
            content: String::from_utf8_lossy(&body).into_owned(),
            headers,
            status_code: status.as_u16(),
            error,
            elapsed_ms: duration_ms(started.elapsed()),
            truncated,
        }
    }
}

/// Accept only absolute http(s) URLs.
pub(crate) fn parse_http_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(parsed)
    } else {
        Err(FetchError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )))
    }
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collected
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_options_builder() {
        let options = FetchOptions::with_timeout_ms(3000)
            .with_max_bytes(1024)
            .with_accept(ACCEPT_XML)
            .keep_error_body();

        assert_eq!(options.timeout, Duration::from_millis(3000));
        assert_eq!(options.max_bytes, Some(1024));
        assert_eq!(options.accept.as_deref(), Some(ACCEPT_XML));
        assert!(options.treat_error_status_as_data);
    }

    #[test]
    fn test_failed_result_is_not_success() {
        let result = FetchResult::failed(
            "https://example.com/",
            &FetchError::Timeout(3000),
            Duration::from_millis(3001),
        );
        assert!(!result.is_success());
        assert_eq!(result.status_code, 0);
        assert_eq!(result.error.as_deref(), Some("timeout after 3000 ms"));
        assert_eq!(result.elapsed_ms, 3001);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut result = FetchResult::failed(
            "https://example.com/",
            &FetchError::Status(500),
            Duration::ZERO,
        );
        result
            .headers
            .insert("content-type".to_string(), "Text/HTML; charset=utf-8".to_string());

        assert_eq!(result.header("Content-Type"), Some("Text/HTML; charset=utf-8"));
        assert_eq!(result.media_type().as_deref(), Some("text/html"));
    }

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("https://example.com/").is_ok());
        assert!(parse_http_url("ftp://example.com/").is_err());
        assert!(parse_http_url("/relative").is_err());
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new(&HttpConfig::default()).is_ok());
    }
}
