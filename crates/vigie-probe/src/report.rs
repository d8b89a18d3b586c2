//! Probe output types.
//!
//! Field names of [`ComplianceReport`] and [`ScanSummary`] are a stable JSON
//! contract consumed by the persistence and presentation layers.

use crate::probes::ProbeKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;
use vigie_core::Provenance;

/// Compliance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceLevel {
    /// Score of 85 or more
    #[serde(rename = "Conforme")]
    Compliant,
    /// Score between 60 and 84
    #[serde(rename = "Partiellement conforme")]
    PartiallyCompliant,
    /// Score below 60
    #[serde(rename = "Non conforme")]
    NonCompliant,
    /// The artifact could not be located
    #[serde(rename = "Critique")]
    Critical,
    /// The origin page could not be fetched
    #[serde(rename = "Erreur d'analyse")]
    AnalysisError,
}

impl ComplianceLevel {
    /// Tier for a located artifact.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => Self::Compliant,
            60..=84 => Self::PartiallyCompliant,
            _ => Self::NonCompliant,
        }
    }

    /// Tier including the not-found override.
    #[must_use]
    pub fn assess(found: bool, score: u8) -> Self {
        if found {
            Self::from_score(score)
        } else {
            Self::Critical
        }
    }

    /// Serialized label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "Conforme",
            Self::PartiallyCompliant => "Partiellement conforme",
            Self::NonCompliant => "Non conforme",
            Self::Critical => "Critique",
            Self::AnalysisError => "Erreur d'analyse",
        }
    }
}

impl fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Canonical absolute URL
    pub url: String,
    /// Every way the resource was discovered
    pub provenance: BTreeSet<Provenance>,
    /// Classification (endpoint shape, vendor category or resource kind)
    pub category: String,
    /// Vendor host, for third-party resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    /// Registrable domain of the resource host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrable: Option<String>,
    /// Shares the page's registrable domain
    #[serde(default)]
    pub same_site: bool,
}

/// Bounded list of discovered resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInventory {
    /// Items in discovery order
    pub items: Vec<InventoryItem>,
    /// A cap dropped at least one item
    pub truncated: bool,
}

impl ResourceInventory {
    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// No item was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items of one category.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a InventoryItem> {
        self.items.iter().filter(move |item| item.category == category)
    }
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    /// Probe that produced the report
    pub probe: ProbeKind,
    /// Probed URL
    pub url: String,
    /// Probe start time
    pub timestamp: DateTime<Utc>,
    /// The probed artifact was located
    pub found: bool,
    /// URL of the located artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    /// How the artifact was located
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_via: Option<String>,
    /// Labels of satisfied categories
    pub found_items: Vec<String>,
    /// Labels of missing categories
    pub missing_items: Vec<String>,
    /// Score in `[0, 100]`
    pub score: u8,
    /// Compliance tier
    pub level: ComplianceLevel,
    /// One entry per problem found
    pub issues: Vec<String>,
    /// Remediation hints
    pub recommendations: Vec<String>,
    /// Wall-clock duration of the probe
    pub elapsed_ms: u64,
    /// A stage was skipped, or the probe ran past its budget
    pub exceeded_budget: bool,
    /// Origin fetch failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Discovered resources, for resource probes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<ResourceInventory>,
}

impl ComplianceReport {
    /// An empty report for `probe` on `url`, to be filled by the probe.
    #[must_use]
    pub fn new(probe: ProbeKind, url: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            probe,
            url: url.to_string(),
            timestamp,
            found: false,
            target_url: None,
            detected_via: None,
            found_items: Vec::new(),
            missing_items: Vec::new(),
            score: 0,
            level: ComplianceLevel::Critical,
            issues: Vec::new(),
            recommendations: Vec::new(),
            elapsed_ms: 0,
            exceeded_budget: false,
            error: None,
            inventory: None,
        }
    }

    /// The report returned when the origin page could not be fetched.
    #[must_use]
    pub fn origin_failure(
        probe: ProbeKind,
        url: &str,
        timestamp: DateTime<Utc>,
        error: &str,
    ) -> Self {
        let mut report = Self::new(probe, url, timestamp);
        report.level = ComplianceLevel::AnalysisError;
        report.error = Some(error.to_string());
        report.issues = vec![format!("La page n'a pas pu être analysée : {error}")];
        report.recommendations =
            vec!["Vérifiez que la page est accessible publiquement puis relancez l'analyse.".to_string()];
        report
    }

    /// Counts toward the critical tally of a scan.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(
            self.level,
            ComplianceLevel::Critical | ComplianceLevel::AnalysisError
        )
    }
}

/// Aggregate of several probes on one URL, handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    /// Unique scan identifier
    pub scan_id: Uuid,
    /// Scanned URL
    pub url: String,
    /// Scan start time
    pub timestamp: DateTime<Utc>,
    /// Rounded average of probe scores, 0 without probes
    pub score: u8,
    /// `Critique` and `Erreur d'analyse` reports
    pub critical_count: usize,
    /// `Non conforme` reports
    pub warning_count: usize,
    /// `Partiellement conforme` reports
    pub improvement_count: usize,
    /// Individual reports
    pub reports: Vec<ComplianceReport>,
}

impl ScanSummary {
    /// Summarize `reports`.
    #[must_use]
    pub fn from_reports(url: &str, timestamp: DateTime<Utc>, reports: Vec<ComplianceReport>) -> Self {
        let total: usize = reports.iter().map(|r| usize::from(r.score)).sum();
        let score = if reports.is_empty() {
            0
        } else {
            let n = reports.len();
            u8::try_from((total * 2 + n) / (2 * n)).unwrap_or(100)
        };

        let count = |level: ComplianceLevel| reports.iter().filter(|r| r.level == level).count();

        Self {
            scan_id: Uuid::new_v4(),
            url: url.to_string(),
            timestamp,
            score,
            critical_count: reports.iter().filter(|r| r.is_critical()).count(),
            warning_count: count(ComplianceLevel::NonCompliant),
            improvement_count: count(ComplianceLevel::PartiallyCompliant),
            reports,
        }
    }
}
