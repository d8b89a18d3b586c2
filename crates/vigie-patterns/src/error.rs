//! Error types for pattern libraries.

use thiserror::Error;

/// Errors raised while building or loading pattern libraries.
#[derive(Error, Debug)]
pub enum PatternError {
    /// A pattern is not a valid regular expression
    #[error("invalid pattern in {library}/{category}: {source}")]
    InvalidRegex {
        /// Library name
        library: String,
        /// Category name
        category: String,
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },

    /// Failed to parse a library TOML document
    #[error("failed to parse pattern library TOML in {path}: {source}")]
    ParseError {
        /// Path (or `<builtin>`) of the document
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// Library failed validation
    #[error("invalid pattern library {library}: {reason}")]
    ValidationError {
        /// Library name
        library: String,
        /// Reason for validation failure
        reason: String,
    },

    /// Override directory not found
    #[error("pattern directory not found at {path}")]
    DirectoryNotFound {
        /// Expected directory path
        path: String,
    },

    /// I/O error while reading pattern files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pattern operations.
pub type Result<T> = std::result::Result<T, PatternError>;
