//! In-memory fetcher serving canned responses.
//!
//! Enabled by the `test-utils` feature. Probe test suites use it to get
//! deterministic, offline fixtures. Responses may carry an artificial delay,
//! which is compared against the call timeout the same way a real network
//! call would be.

use crate::error::FetchError;
use crate::fetcher::{duration_ms, parse_http_url, FetchOptions, FetchResult, Fetcher};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct MemoryResponse {
    status: u16,
    body: String,
    headers: BTreeMap<String, String>,
    delay: Duration,
}

impl MemoryResponse {
    /// A response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: BTreeMap::new(),
            delay: Duration::ZERO,
        }
    }

    /// A `200 OK` HTML page.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(200, body).with_header("content-type", "text/html; charset=utf-8")
    }

    /// Add a response header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Delay the response.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Fetcher answering from a fixed URL → response table.
///
/// Unknown URLs behave like a refused connection.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    routes: HashMap<String, MemoryResponse>,
    calls: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    /// Create an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for an exact URL.
    #[must_use]
    pub fn with_route(mut self, url: &str, response: MemoryResponse) -> Self {
        self.routes.insert(url.to_string(), response);
        self
    }

    /// URLs requested so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> FetchResult {
        let started = Instant::now();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }

        if let Err(e) = parse_http_url(url) {
            return FetchResult::failed(url, &e, started.elapsed());
        }

        let Some(route) = self.routes.get(url) else {
            let err = FetchError::Connect(format!("no route for {url}"));
            return FetchResult::failed(url, &err, started.elapsed());
        };

        if route.delay >= options.timeout {
            tokio::time::sleep(options.timeout).await;
            let err = FetchError::Timeout(duration_ms(options.timeout));
            return FetchResult::failed(url, &err, started.elapsed());
        }
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        let success = (200..300).contains(&route.status);
        let error = (!success).then(|| FetchError::Status(route.status).to_string());

        let (content, truncated) = if success || options.treat_error_status_as_data {
            match options.max_bytes {
                Some(limit) if route.body.len() > limit => {
                    let cut = String::from_utf8_lossy(&route.body.as_bytes()[..limit]).into_owned();
                    (cut, true)
                }
                _ => (route.body.clone(), false),
            }
        } else {
            (String::new(), false)
        };

        FetchResult {
            url: url.to_string(),
            final_url: url.to_string(),
            content,
            headers: route.headers.clone(),
            status_code: route.status,
            error,
            elapsed_ms: duration_ms(started.elapsed()),
            truncated,
        }
    }
}
