//! Resource fetching for Vigie probes.
//!
//! Provides the [`Fetcher`] seam used by every probe stage, an HTTP
//! implementation on top of `reqwest`, and (with the `test-utils` feature) an
//! in-memory implementation for replaying fixtures.

pub mod error;
pub mod fetcher;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use error::{FetchError, Result};
pub use fetcher::{
    FetchOptions, FetchResult, Fetcher, HttpFetcher, ACCEPT_HTML, ACCEPT_JSON, ACCEPT_XML,
};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{MemoryFetcher, MemoryResponse};
