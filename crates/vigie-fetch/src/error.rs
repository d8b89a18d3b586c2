use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Why a fetch did not produce a usable body.
///
/// These never cross the probe boundary as errors: the fetcher renders them
/// into `FetchResult::error`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("timeout after {0} ms")]
    Timeout(u64),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("body read failed: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("client construction failed: {0}")]
    Client(String),
}

impl FetchError {
    /// Classify a reqwest error into the network taxonomy.
    pub fn from_reqwest(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(FetchError::Status(404).to_string(), "HTTP 404");
        assert_eq!(FetchError::Timeout(3000).to_string(), "timeout after 3000 ms");
    }
}
