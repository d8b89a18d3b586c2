//! Vigie Patterns - declarative pattern libraries and the text classifier.
//!
//! Probes never hard-code keywords: every link-text, URL-path, content
//! section, consent feature, vendor and endpoint pattern lives in a named
//! library, compiled once per process.
//!
//! # Architecture
//!
//! - **Categories** ([`category`]): declarative specs compiled to case-insensitive regexes
//! - **Classifier** ([`classifier`]): found/missing partition of ordered categories
//! - **Catalog** ([`catalog`]): built-in libraries and set-level overrides
//! - **Loader** ([`loader`]): override files from the `[patterns] dir` directory
//!
//! # Example
//!
//! ```rust
//! use vigie_patterns::{libraries, sets, Catalog};
//!
//! let catalog = Catalog::builtin();
//! let result = catalog.classify(
//!     libraries::USER_RIGHTS,
//!     sets::SECTIONS,
//!     "Vous disposez d'un droit d'accès et de rectification.",
//! );
//! assert!(result.is_found("access"));
//! assert!(result.is_found("rectification"));
//! assert!(!result.is_found("portability"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod catalog;
pub mod category;
pub mod classifier;
pub mod error;
pub mod loader;

// Re-export commonly used types
pub use catalog::{libraries, sets, Catalog, PatternLibrary};
pub use category::{Category, CategorySpec, Composition};
pub use classifier::{classify, first_match, matches, Classification, ClassifiedItem};
pub use error::{PatternError, Result};
pub use loader::CatalogLoader;
