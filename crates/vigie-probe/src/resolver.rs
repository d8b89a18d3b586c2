//! Link discovery resolver.
//!
//! Locates a target document (legal notice, privacy policy) that the origin
//! page may not link directly. The chain stops at the first success:
//!
//! 1. footer anchors,
//! 2. all anchors,
//! 3. `<loc>` entries of `/sitemap.xml` and the in-scope sitemaps it indexes.
//!
//! An anchor matches when its text, title, aria-label and href satisfy the
//! `link-text` category, or its resolved path satisfies `url-path`. Sitemap
//! entries can only match on `url-path`.

use crate::budget::{Stage, TimeBudget};
use crate::engine::{OriginPage, ProbeContext};
use crate::extract::{document_text, Anchor};
use crate::scope::is_same_scope;
use crate::sitemap::SitemapWalker;
use std::ops::ControlFlow;
use tracing::debug;
use url::Url;
use vigie_core::{Candidate, Provenance};
use vigie_fetch::ACCEPT_HTML;
use vigie_patterns::Category;

/// Name of the link-text category of a `links` set.
pub const LINK_TEXT: &str = "link-text";
/// Name of the URL-path category of a `links` set.
pub const URL_PATH: &str = "url-path";

/// Content of the located target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetContent {
    /// Visible text of the fetched target
    Text(String),
    /// The target was located but could not be read
    Unanalyzable(String),
}

/// Runs the fallback chain for one probe.
pub struct LinkResolver<'a> {
    ctx: &'a ProbeContext,
    origin: &'a OriginPage,
    budget: &'a TimeBudget,
    link_text: Option<&'a Category>,
    url_path: Option<&'a Category>,
}

impl<'a> LinkResolver<'a> {
    /// Create a resolver matching against a `links` category set.
    #[must_use]
    pub fn new(
        ctx: &'a ProbeContext,
        origin: &'a OriginPage,
        budget: &'a TimeBudget,
        links: &'a [Category],
    ) -> Self {
        Self {
            ctx,
            origin,
            budget,
            link_text: links.iter().find(|c| c.name() == LINK_TEXT),
            url_path: links.iter().find(|c| c.name() == URL_PATH),
        }
    }

    /// Locate the target, or `None` when every stage came up empty.
    pub async fn resolve(&self) -> Option<Candidate> {
        if let Some(candidate) = self.match_anchors() {
            return Some(candidate);
        }
        self.match_sitemaps().await
    }

    /// Footer anchors first, then every anchor.
    #[must_use]
    pub fn match_anchors(&self) -> Option<Candidate> {
        let anchors = &self.origin.page.anchors;
        let footer = anchors
            .iter()
            .filter(|a| a.in_footer)
            .find_map(|a| self.match_anchor(a, Provenance::FooterLink));
        if footer.is_some() {
            return footer;
        }
        anchors
            .iter()
            .find_map(|a| self.match_anchor(a, Provenance::BodyLink))
    }

    fn match_anchor(&self, anchor: &Anchor, provenance: Provenance) -> Option<Candidate> {
        if anchor.href.starts_with('#') {
            return None;
        }
        let url = anchor.url.as_ref()?;
        if !is_same_scope(url.as_str(), self.origin.origin_domain()) {
            return None;
        }

        let by_text = self
            .link_text
            .is_some_and(|category| category.matches(&anchor.match_text()));
        let by_path = self.path_matches(url);
        if !(by_text || by_path) {
            return None;
        }

        debug!(
            url = %url,
            provenance = %provenance,
            by_text,
            by_path,
            "target located from anchor"
        );
        Some(Candidate::new(without_fragment(url), provenance).with_text(anchor.text.clone()))
    }

    async fn match_sitemaps(&self) -> Option<Candidate> {
        if self.url_path.is_none() {
            return None;
        }
        let seed = self.origin.target.join("/sitemap.xml")?;
        let origin_domain = self.origin.origin_domain();

        let mut located = None;
        let walker = SitemapWalker::new(self.ctx, self.budget, origin_domain);
        walker
            .walk(vec![seed], |loc| {
                if !is_same_scope(loc, origin_domain) {
                    return ControlFlow::Continue(());
                }
                let Ok(url) = self.origin.base().join(loc) else {
                    return ControlFlow::Continue(());
                };
                if self.path_matches(&url) {
                    located = Some(url);
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;

        located.map(|url| {
            debug!(url = %url, "target located from sitemap");
            Candidate::new(without_fragment(&url), Provenance::Sitemap)
        })
    }

    fn path_matches(&self, url: &Url) -> bool {
        self.url_path
            .is_some_and(|category| category.matches(url.path()))
    }

    /// Fetch the located target as a budget-checked optional stage.
    pub async fn fetch_target(&self, candidate: &Candidate) -> TargetContent {
        let Ok(url) = Url::parse(&candidate.url) else {
            return TargetContent::Unanalyzable(format!("URL invalide : {}", candidate.url));
        };

        if without_fragment(&url) == without_fragment(self.origin.base()) {
            return TargetContent::Text(self.origin.page.text.clone());
        }

        match self
            .ctx
            .fetch_optional(self.budget, Stage::Target, &url, ACCEPT_HTML)
            .await
        {
            None => TargetContent::Unanalyzable("budget de temps dépassé".to_string()),
            Some(result) if result.is_success() => TargetContent::Text(document_text(&result.content)),
            Some(result) => TargetContent::Unanalyzable(
                result
                    .error
                    .unwrap_or_else(|| format!("HTTP {}", result.status_code)),
            ),
        }
    }
}

fn without_fragment(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}
