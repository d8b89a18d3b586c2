//! Third-party resource inventory and vendor classification.

use crate::extract::PageSnapshot;
use crate::inventory::InventoryBuilder;
use crate::report::ResourceInventory;
use crate::scope::{registrable_domain, same_host_ignoring_www};
use vigie_core::Provenance;
use vigie_patterns::{first_match, Category};

/// Category of vendors that match no taxonomy entry.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Vendor category of `host`, first taxonomy match wins.
#[must_use]
pub fn vendor_category<'a>(taxonomy: &'a [Category], host: &str) -> &'a str {
    first_match(taxonomy, host).map_or(UNCATEGORIZED, Category::name)
}

/// Inventory of the page's embedded resources served from other hosts.
///
/// Hosts equal to `page_host` modulo a leading `www.` are first-party and
/// skipped. Every other host is kept with its registrable domain, flagged
/// `same_site` when it shares the page's registrable domain.
#[must_use]
pub fn collect_third_parties(
    page: &PageSnapshot,
    page_host: &str,
    taxonomy: &[Category],
    mut builder: InventoryBuilder,
) -> ResourceInventory {
    let page_registrable = registrable_domain(page_host);

    for resource in &page.resources {
        let Some(url) = resource.url.as_ref() else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        let Some(host) = url.host_str() else {
            continue;
        };
        if same_host_ignoring_www(host, page_host) {
            continue;
        }

        let registrable = registrable_domain(host);
        let same_site = registrable.is_some() && registrable == page_registrable;
        let category = vendor_category(taxonomy, host);

        if let Some(item) = builder.add(url, Provenance::PageResource, category) {
            item.vendor = Some(host.to_string());
            item.registrable.clone_from(&registrable);
            item.same_site = same_site;
        }
    }

    builder.build()
}
