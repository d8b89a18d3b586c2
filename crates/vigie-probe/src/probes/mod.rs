//! Probe implementations.
//!
//! Every probe receives the already fetched origin page and the running
//! budget, and fills one [`ComplianceReport`].

mod cookie_consent;
mod document;
mod endpoints;
mod mixed_content;
mod pwa_manifest;
mod third_party;

pub use cookie_consent::CMP_OVERRIDES;
pub use pwa_manifest::{PwaFeature, PWA_FEATURES};

use crate::budget::TimeBudget;
use crate::engine::{OriginPage, ProbeContext};
use crate::error::ProbeError;
use crate::report::ComplianceReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeKind {
    /// Mentions légales / imprint
    LegalNotice,
    /// Privacy policy sections
    PrivacyPolicy,
    /// Cookie consent banner
    CookieConsent,
    /// Data-subject rights disclosure
    UserRights,
    /// Third-party vendor inventory
    ThirdParty,
    /// Insecure references on an https page
    MixedContent,
    /// Publicly referenced API and configuration endpoints
    Endpoints,
    /// Web app manifest and service worker
    PwaManifest,
}

impl ProbeKind {
    /// Every probe, in scan order.
    pub const ALL: [ProbeKind; 8] = [
        Self::LegalNotice,
        Self::PrivacyPolicy,
        Self::CookieConsent,
        Self::UserRights,
        Self::ThirdParty,
        Self::MixedContent,
        Self::Endpoints,
        Self::PwaManifest,
    ];

    /// Stable name, identical to the serialized value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LegalNotice => "legal-notice",
            Self::PrivacyPolicy => "privacy-policy",
            Self::CookieConsent => "cookie-consent",
            Self::UserRights => "user-rights",
            Self::ThirdParty => "third-party",
            Self::MixedContent => "mixed-content",
            Self::Endpoints => "endpoints",
            Self::PwaManifest => "pwa-manifest",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ProbeError::UnknownProbe(s.to_string()))
    }
}

/// Run `kind` on an already fetched origin page.
pub(crate) async fn dispatch(
    kind: ProbeKind,
    ctx: &ProbeContext,
    origin: &OriginPage,
    budget: &TimeBudget,
    timestamp: DateTime<Utc>,
) -> ComplianceReport {
    let report = ComplianceReport::new(kind, &origin.target.to_string(), timestamp);
    match kind {
        ProbeKind::LegalNotice => {
            document::run(&document::LEGAL_NOTICE, ctx, origin, budget, report).await
        }
        ProbeKind::PrivacyPolicy => {
            document::run(&document::PRIVACY_POLICY, ctx, origin, budget, report).await
        }
        ProbeKind::UserRights => {
            document::run(&document::USER_RIGHTS, ctx, origin, budget, report).await
        }
        ProbeKind::CookieConsent => cookie_consent::run(ctx, origin, budget, report).await,
        ProbeKind::ThirdParty => third_party::run(ctx, origin, report),
        ProbeKind::MixedContent => mixed_content::run(origin, report),
        ProbeKind::Endpoints => endpoints::run(ctx, origin, budget, report).await,
        ProbeKind::PwaManifest => pwa_manifest::run(ctx, origin, budget, report).await,
    }
}
