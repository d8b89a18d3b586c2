//! Resource discovery aggregator.
//!
//! [`InventoryBuilder`] dedupes discovered URLs by canonical form and merges
//! their provenance. [`collect_endpoints`] feeds it from every passive source
//! the site exposes: anchors, meta tags, the `Link` header, robots.txt,
//! sitemaps and the web app manifest reference.

use crate::budget::{Stage, TimeBudget};
use crate::engine::{OriginPage, ProbeContext, ProbeSettings};
use crate::link_header::parse_link_header;
use crate::report::{InventoryItem, ResourceInventory};
use crate::robots::parse_robots;
use crate::scope::is_same_scope;
use crate::sitemap::SitemapWalker;
use std::collections::{BTreeSet, HashMap};
use std::ops::ControlFlow;
use tracing::debug;
use url::Url;
use vigie_core::Provenance;
use vigie_patterns::{first_match, libraries, sets, Category};

/// Category of items that match no endpoint shape.
pub const RESOURCE: &str = "resource";
/// Category of the web app manifest.
pub const MANIFEST: &str = "manifest";
/// Category of sitemaps declared in robots.txt.
pub const SITEMAP: &str = "sitemap";

const ACCEPT_TEXT: &str = "text/plain,*/*;q=0.5";

/// Canonical form used for deduplication: fragment removed. Host case and
/// default ports are already normalized by [`Url`].
#[must_use]
pub fn canonical_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// Bounded, deduplicating inventory.
#[derive(Debug)]
pub struct InventoryBuilder {
    items: Vec<InventoryItem>,
    index: HashMap<String, usize>,
    per_category: HashMap<String, usize>,
    max_items: usize,
    max_per_category: usize,
    truncated: bool,
}

impl InventoryBuilder {
    /// Create a builder with explicit caps.
    #[must_use]
    pub fn new(max_items: usize, max_per_category: usize) -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
            per_category: HashMap::new(),
            max_items,
            max_per_category,
            truncated: false,
        }
    }

    /// Create a builder with the configured caps.
    #[must_use]
    pub fn from_settings(settings: &ProbeSettings) -> Self {
        Self::new(settings.max_inventory_items, settings.max_items_per_category)
    }

    /// Record `url`. A URL seen before only gains `provenance`; a new URL is
    /// dropped (and the inventory marked truncated) when a cap is reached.
    /// Returns the stored item.
    pub fn add(
        &mut self,
        url: &Url,
        provenance: Provenance,
        category: &str,
    ) -> Option<&mut InventoryItem> {
        let key = canonical_url(url);
        if let Some(&pos) = self.index.get(&key) {
            let item = &mut self.items[pos];
            item.provenance.insert(provenance);
            return Some(item);
        }

        let in_category = self.per_category.get(category).copied().unwrap_or(0);
        if self.items.len() >= self.max_items || in_category >= self.max_per_category {
            if !self.truncated {
                debug!(url = %key, category, "inventory cap reached");
            }
            self.truncated = true;
            return None;
        }

        self.per_category.insert(category.to_string(), in_category + 1);
        self.index.insert(key.clone(), self.items.len());
        self.items.push(InventoryItem {
            url: key,
            provenance: BTreeSet::from([provenance]),
            category: category.to_string(),
            vendor: None,
            registrable: None,
            same_site: false,
        });
        self.items.last_mut()
    }

    /// Number of distinct items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Nothing recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finish the inventory.
    #[must_use]
    pub fn build(self) -> ResourceInventory {
        ResourceInventory {
            items: self.items,
            truncated: self.truncated,
        }
    }
}

/// Collect the in-scope endpoint inventory of a site.
///
/// Anchors, robots rules and sitemap entries are kept only when their path
/// has an endpoint shape. Meta tag URLs, `Link` header targets, robots
/// `Sitemap:` lines and the manifest are kept regardless.
pub async fn collect_endpoints(
    ctx: &ProbeContext,
    origin: &OriginPage,
    budget: &TimeBudget,
) -> ResourceInventory {
    let shapes = ctx.catalog.categories(libraries::ENDPOINTS, sets::API);
    let domain = origin.origin_domain();
    let base = origin.base();
    let page = &origin.page;
    let mut builder = InventoryBuilder::from_settings(&ctx.settings);

    let in_scope = |url: &Url| is_same_scope(url.as_str(), domain);

    for anchor in &page.anchors {
        let Some(url) = anchor.url.as_ref().filter(|u| in_scope(*u)) else {
            continue;
        };
        if let Some(shape) = endpoint_shape(shapes, url) {
            let provenance = if anchor.in_footer {
                Provenance::FooterLink
            } else {
                Provenance::BodyLink
            };
            builder.add(url, provenance, shape);
        }
    }

    for meta in &page.metas {
        let content = meta.content.trim();
        let url_like = content.starts_with("http://")
            || content.starts_with("https://")
            || (content.starts_with('/') && !content.starts_with("//"));
        if !url_like {
            continue;
        }
        if let Some(url) = base.join(content).ok().filter(|u| in_scope(u)) {
            let shape = endpoint_shape(shapes, &url).unwrap_or(RESOURCE);
            builder.add(&url, Provenance::MetaTag, shape);
        }
    }

    if let Some(header) = origin.fetch.header("link") {
        for entry in parse_link_header(header) {
            if let Some(url) = base.join(&entry.target).ok().filter(|u| in_scope(u)) {
                let shape = endpoint_shape(shapes, &url).unwrap_or(RESOURCE);
                builder.add(&url, Provenance::LinkHeader, shape);
            }
        }
    }

    let mut sitemap_seeds = Vec::new();
    if let Some(robots_url) = origin.target.join("/robots.txt") {
        match ctx
            .fetch_optional(budget, Stage::Robots, &robots_url, ACCEPT_TEXT)
            .await
        {
            Some(result) if result.is_success() => {
                let rules = parse_robots(&result.content);
                for path in rules.rule_paths() {
                    let Ok(url) = robots_url.join(&path) else {
                        continue;
                    };
                    if let Some(shape) = endpoint_shape(shapes, &url) {
                        builder.add(&url, Provenance::RobotsRule, shape);
                    }
                }
                for sitemap in &rules.sitemaps {
                    if let Some(url) = robots_url.join(sitemap).ok().filter(|u| in_scope(u)) {
                        builder.add(&url, Provenance::RobotsRule, SITEMAP);
                        sitemap_seeds.push(url);
                    }
                }
            }
            Some(result) => debug!(error = ?result.error, "robots.txt unavailable"),
            None => {}
        }
    }
    if let Some(default_sitemap) = origin.target.join("/sitemap.xml") {
        sitemap_seeds.push(default_sitemap);
    }

    let walker = SitemapWalker::new(ctx, budget, domain);
    walker
        .walk(sitemap_seeds, |loc| {
            if !is_same_scope(loc, domain) {
                return ControlFlow::Continue(());
            }
            if let Ok(url) = base.join(loc) {
                if let Some(shape) = endpoint_shape(shapes, &url) {
                    builder.add(&url, Provenance::Sitemap, shape);
                }
            }
            ControlFlow::Continue(())
        })
        .await;

    if let Some(url) = page.manifest_url().filter(|u| in_scope(u)) {
        builder.add(&url, Provenance::ManifestLink, MANIFEST);
    }

    builder.build()
}

/// Name of the first endpoint shape the URL path satisfies.
fn endpoint_shape<'a>(shapes: &'a [Category], url: &Url) -> Option<&'a str> {
    first_match(shapes, url.path()).map(Category::name)
}
