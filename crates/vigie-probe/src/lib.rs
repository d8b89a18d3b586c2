//! Vigie Probe - time-bounded compliance probes.
//!
//! Each probe fetches one origin page, discovers the artifact it checks
//! (legal notice, privacy policy, consent banner, third-party resources...),
//! classifies it against the pattern libraries and returns a scored
//! [`ComplianceReport`]. Probes never fail: degraded stages are reported
//! in-band, and only an unreachable origin page turns into an
//! `Erreur d'analyse` report.
//!
//! # Architecture
//!
//! - **Engine** ([`engine`]): mandatory origin fetch, budget, dispatch
//! - **Budget** ([`budget`]): latching wall-clock budget over optional stages
//! - **Scope** ([`scope`]): same-site filter and registrable domains
//! - **Resolver** ([`resolver`]): footer → body → sitemap fallback chain
//! - **Inventory** ([`inventory`], [`vendors`]): deduplicated resource discovery
//! - **Scorer** ([`scorer`]): weighted, uniform and deduction scoring
//! - **Runner** ([`runner`]): several probes on one URL, summarized
//!
//! # Example
//!
//! ```rust,no_run
//! use vigie_core::AppConfig;
//! use vigie_probe::{ProbeKind, ScanRunner};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = ScanRunner::from_config(&AppConfig::default())?;
//! let summary = runner
//!     .run("https://www.example.com/", &[ProbeKind::LegalNotice, ProbeKind::CookieConsent])
//!     .await?;
//!
//! for report in &summary.reports {
//!     println!("{}: {} ({})", report.probe, report.score, report.level);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod budget;
pub mod engine;
pub mod error;
pub mod extract;
pub mod inventory;
pub mod link_header;
pub mod probes;
pub mod report;
pub mod resolver;
pub mod robots;
pub mod runner;
pub mod scope;
pub mod scorer;
pub mod sitemap;
pub mod vendors;

// Re-export commonly used types
pub use budget::{Stage, TimeBudget};
pub use engine::{ProbeContext, ProbeEngine, ProbeSettings};
pub use error::{ProbeError, Result};
pub use probes::ProbeKind;
pub use report::{ComplianceLevel, ComplianceReport, InventoryItem, ResourceInventory, ScanSummary};
pub use runner::ScanRunner;
pub use scope::is_same_scope;
