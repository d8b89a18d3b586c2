//! Shared types used across the Vigie probe engine.
//!
//! This module defines the probe input (`ProbeTarget`) and the discovery
//! vocabulary (`Provenance`, `Candidate`) shared by the resolver and the
//! resource aggregator.

use crate::error::VigieError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

/// The page a probe runs against.
///
/// Created once per probe invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    url: Url,
    origin_domain: String,
}

impl ProbeTarget {
    /// Parse and validate a probe target.
    ///
    /// # Errors
    /// Returns error if the URL is not absolute, not `http`/`https`, or has no host.
    pub fn parse(raw: &str) -> Result<Self, VigieError> {
        let url = Url::parse(raw.trim()).map_err(|e| VigieError::InvalidTarget {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(VigieError::InvalidTarget {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let origin_domain = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| VigieError::InvalidTarget {
                url: raw.to_string(),
                reason: "missing host".to_string(),
            })?
            .to_ascii_lowercase();

        Ok(Self { url, origin_domain })
    }

    /// The full target URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host of the target URL, lower-cased.
    #[must_use]
    pub fn origin_domain(&self) -> &str {
        &self.origin_domain
    }

    /// `scheme://host[:port]` of the target, without trailing slash.
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Whether the target is served over TLS.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Resolve a path or URL against the target origin.
    #[must_use]
    pub fn join(&self, path: &str) -> Option<Url> {
        self.url.join(path).ok()
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// How a candidate URL was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Anchor inside the page footer region
    FooterLink,
    /// Anchor anywhere in the page
    BodyLink,
    /// `<loc>` entry of a sitemap
    Sitemap,
    /// `Allow`/`Disallow` directive of robots.txt
    RobotsRule,
    /// `content` attribute of a `<meta>` tag
    MetaTag,
    /// Entry of the HTTP `Link` response header
    LinkHeader,
    /// `<link rel="manifest">` reference
    ManifestLink,
    /// `src`/`href` of an embedded resource (script, image, stylesheet, frame)
    PageResource,
}

impl Provenance {
    /// Stable string form, identical to the serialized value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FooterLink => "footer-link",
            Self::BodyLink => "body-link",
            Self::Sitemap => "sitemap",
            Self::RobotsRule => "robots-rule",
            Self::MetaTag => "meta-tag",
            Self::LinkHeader => "link-header",
            Self::ManifestLink => "manifest-link",
            Self::PageResource => "page-resource",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered URL together with every way it was found.
///
/// Provenance is additive: merging the same URL twice keeps both provenances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Absolute URL
    pub url: String,
    /// Discovery methods, never empty
    pub provenance: BTreeSet<Provenance>,
    /// Link text or other raw text associated with the URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl Candidate {
    /// Create a candidate with a single provenance.
    #[must_use]
    pub fn new(url: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            url: url.into(),
            provenance: BTreeSet::from([provenance]),
            raw_text: None,
        }
    }

    /// Attach raw text (link text, meta name).
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.raw_text = Some(text);
        }
        self
    }

    /// Merge another discovery of the same URL into this candidate.
    pub fn merge(&mut self, other: Candidate) {
        self.provenance.extend(other.provenance);
        if self.raw_text.is_none() {
            self.raw_text = other.raw_text;
        }
    }

    /// The earliest provenance in discovery priority order.
    #[must_use]
    pub fn primary_provenance(&self) -> Option<Provenance> {
        self.provenance.iter().next().copied()
    }
}
