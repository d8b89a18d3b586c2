//! Sitemap parsing and bounded traversal.

use crate::budget::{Stage, TimeBudget};
use crate::engine::ProbeContext;
use crate::scope::is_same_scope;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{HashSet, VecDeque};
use std::ops::ControlFlow;
use tracing::debug;
use url::Url;
use vigie_fetch::ACCEPT_XML;

/// Root element of a sitemap document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// `<urlset>`: page entries
    UrlSet,
    /// `<sitemapindex>`: child sitemaps
    Index,
    /// Anything else
    Unknown,
}

/// Parsed sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sitemap {
    /// Root element kind
    pub kind: SitemapKind,
    /// `<loc>` values in document order
    pub locs: Vec<String>,
}

/// Parse a sitemap or sitemap index. Malformed XML yields whatever was read
/// before the error.
#[must_use]
pub fn parse_sitemap(xml: &str) -> Sitemap {
    let mut kind = None;
    let mut locs = Vec::new();
    let mut in_loc = false;
    let mut current = String::new();

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if kind.is_none() {
                    kind = Some(match name {
                        b"urlset" => SitemapKind::UrlSet,
                        b"sitemapindex" => SitemapKind::Index,
                        _ => SitemapKind::Unknown,
                    });
                }
                if name == b"loc" {
                    in_loc = true;
                    current.clear();
                }
            }
            Ok(Event::Text(ref e)) if in_loc => {
                if let Ok(text) = e.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::CData(e)) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"loc" => {
                let loc = current.trim();
                if !loc.is_empty() {
                    locs.push(loc.to_string());
                }
                in_loc = false;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(error = %e, "sitemap parse stopped");
                break;
            }
            _ => {}
        }
    }

    Sitemap {
        kind: kind.unwrap_or(SitemapKind::Unknown),
        locs,
    }
}

/// Breadth-first sitemap traversal bounded by `max_sitemaps` fetches and the
/// probe budget.
pub struct SitemapWalker<'a> {
    ctx: &'a ProbeContext,
    budget: &'a TimeBudget,
    origin_domain: &'a str,
}

impl<'a> SitemapWalker<'a> {
    /// Create a walker for one probe.
    #[must_use]
    pub fn new(ctx: &'a ProbeContext, budget: &'a TimeBudget, origin_domain: &'a str) -> Self {
        Self {
            ctx,
            budget,
            origin_domain,
        }
    }

    /// Visit the page entries of `seeds` and of the in-scope child sitemaps
    /// they index. `on_loc` may stop the walk early. Returns the number of
    /// sitemaps fetched.
    pub async fn walk<F>(&self, seeds: Vec<Url>, mut on_loc: F) -> usize
    where
        F: FnMut(&str) -> ControlFlow<()>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<Url> = VecDeque::new();
        for seed in seeds {
            if seen.insert(seed.to_string()) {
                queue.push_back(seed);
            }
        }

        let mut fetched = 0;
        while let Some(url) = queue.pop_front() {
            if fetched >= self.ctx.settings.max_sitemaps {
                debug!(remaining = queue.len() + 1, "sitemap fetch cap reached");
                break;
            }
            let Some(result) = self
                .ctx
                .fetch_optional(self.budget, Stage::Sitemap, &url, ACCEPT_XML)
                .await
            else {
                break;
            };
            fetched += 1;

            if !result.is_success() {
                debug!(url = %url, error = ?result.error, "sitemap unavailable");
                continue;
            }

            let sitemap = parse_sitemap(&result.content);
            debug!(
                url = %url,
                kind = ?sitemap.kind,
                entries = sitemap.locs.len(),
                "sitemap parsed"
            );

            if sitemap.kind == SitemapKind::Index {
                for loc in sitemap.locs {
                    if !is_same_scope(&loc, self.origin_domain) {
                        continue;
                    }
                    if let Ok(child) = url.join(&loc) {
                        if seen.insert(child.to_string()) {
                            queue.push_back(child);
                        }
                    }
                }
                continue;
            }

            for loc in &sitemap.locs {
                if on_loc(loc).is_break() {
                    return fetched;
                }
            }
        }

        fetched
    }
}
