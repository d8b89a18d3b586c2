//! Fan-out caps: sitemap fetches, secondary fetches and inventory size are
//! bounded whatever the site exposes.

use std::fmt::Write as _;
use std::sync::Arc;

use vigie_fetch::{MemoryFetcher, MemoryResponse};
use vigie_patterns::Catalog;
use vigie_probe::{ComplianceLevel, ComplianceReport, ProbeEngine, ProbeKind, ProbeSettings};

const ORIGIN: &str = "https://example.com/";

async fn run(fetcher: Arc<MemoryFetcher>, kind: ProbeKind) -> ComplianceReport {
    ProbeEngine::new(
        fetcher,
        Arc::new(Catalog::builtin().clone()),
        ProbeSettings::default(),
    )
    .run_url(kind, ORIGIN)
    .await
    .expect("valid url")
}

fn urlset(locs: &[&str]) -> MemoryResponse {
    let mut xml = String::from("<urlset>");
    for loc in locs {
        let _ = write!(xml, "<url><loc>{loc}</loc></url>");
    }
    xml.push_str("</urlset>");
    MemoryResponse::new(200, xml)
}

#[tokio::test]
async fn sitemap_index_children_stop_at_three_fetches() {
    let mut fetcher = MemoryFetcher::new()
        .with_route(ORIGIN, MemoryResponse::html("<html><body></body></html>"))
        .with_route(
            "https://example.com/sitemap.xml",
            MemoryResponse::new(
                200,
                "<sitemapindex>\
                   <sitemap><loc>https://example.com/sitemap-1.xml</loc></sitemap>\
                   <sitemap><loc>https://example.com/sitemap-2.xml</loc></sitemap>\
                   <sitemap><loc>https://example.com/sitemap-3.xml</loc></sitemap>\
                   <sitemap><loc>https://example.com/sitemap-4.xml</loc></sitemap>\
                 </sitemapindex>",
            ),
        );
    for n in 1..=4 {
        fetcher = fetcher.with_route(
            &format!("https://example.com/sitemap-{n}.xml"),
            urlset(&["https://example.com/blog", "https://example.com/boutique"]),
        );
    }
    let fetcher = Arc::new(fetcher);

    let report = run(fetcher.clone(), ProbeKind::LegalNotice).await;

    assert!(!report.found);
    assert_eq!(report.level, ComplianceLevel::Critical);
    assert_eq!(
        fetcher.calls(),
        vec![
            ORIGIN.to_string(),
            "https://example.com/sitemap.xml".to_string(),
            "https://example.com/sitemap-1.xml".to_string(),
            "https://example.com/sitemap-2.xml".to_string(),
        ]
    );
}

#[tokio::test]
async fn robots_sitemaps_stop_at_three_fetches() {
    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_route(ORIGIN, MemoryResponse::html("<html><body></body></html>"))
            .with_route(
                "https://example.com/robots.txt",
                MemoryResponse::new(
                    200,
                    "User-agent: *\n\
                     Sitemap: https://example.com/a.xml\n\
                     Sitemap: https://example.com/b.xml\n\
                     Sitemap: https://example.com/c.xml\n\
                     Sitemap: https://example.com/d.xml\n",
                ),
            )
            .with_route("https://example.com/a.xml", urlset(&["https://example.com/api/v1/a"]))
            .with_route("https://example.com/b.xml", urlset(&["https://example.com/api/v1/b"]))
            .with_route("https://example.com/c.xml", urlset(&["https://example.com/api/v1/c"]))
            .with_route("https://example.com/d.xml", urlset(&["https://example.com/api/v1/d"])),
    );

    let report = run(fetcher.clone(), ProbeKind::Endpoints).await;

    let sitemap_calls: Vec<_> = fetcher
        .calls()
        .into_iter()
        .filter(|url| url.ends_with(".xml"))
        .collect();
    assert_eq!(
        sitemap_calls,
        vec![
            "https://example.com/a.xml".to_string(),
            "https://example.com/b.xml".to_string(),
            "https://example.com/c.xml".to_string(),
        ]
    );

    let inventory = report.inventory.expect("inventory attached");
    assert_eq!(inventory.by_category("sitemap").count(), 4);
    assert_eq!(inventory.by_category("api").count(), 3);
    assert!(!inventory
        .items
        .iter()
        .any(|item| item.url == "https://example.com/api/v1/d"));
}

#[tokio::test]
async fn cookie_consent_fetches_two_scripts_at_most() {
    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_route(
                ORIGIN,
                MemoryResponse::html(
                    r#"<html><head>
                        <script src="/js/a.js"></script>
                        <script src="/js/b.js"></script>
                        <script src="/js/c.js"></script>
                    </head><body><p>Bienvenue</p></body></html>"#,
                ),
            )
            .with_route("https://example.com/js/a.js", MemoryResponse::new(200, "var a = 1;"))
            .with_route("https://example.com/js/b.js", MemoryResponse::new(200, "var b = 2;"))
            .with_route(
                "https://example.com/js/c.js",
                MemoryResponse::new(200, "window.didomiConfig = {};"),
            ),
    );

    let report = run(fetcher.clone(), ProbeKind::CookieConsent).await;

    assert_eq!(
        fetcher.calls(),
        vec![
            ORIGIN.to_string(),
            "https://example.com/js/a.js".to_string(),
            "https://example.com/js/b.js".to_string(),
        ]
    );
    // the platform sits in the third script, which is never read
    assert!(report.detected_via.is_none());
    assert!(!report.found);
}

#[tokio::test]
async fn failed_manifest_link_counts_against_secondary_cap() {
    let fetcher = Arc::new(MemoryFetcher::new().with_route(
        ORIGIN,
        MemoryResponse::html(
            r#"<html><head><link rel="manifest" href="/app.webmanifest"></head><body></body></html>"#,
        ),
    ));

    let report = run(fetcher.clone(), ProbeKind::PwaManifest).await;

    assert_eq!(
        fetcher.calls(),
        vec![
            ORIGIN.to_string(),
            "https://example.com/app.webmanifest".to_string(),
            "https://example.com/manifest.json".to_string(),
        ]
    );
    assert!(!report.found);
    assert_eq!(report.level, ComplianceLevel::Critical);
}

#[tokio::test]
async fn endpoint_inventory_caps_per_category_and_total() {
    let mut body = String::from("<html><body>");
    for pattern in [
        "/cfg{}/config.json",
        "/admin/{}",
        "/graphql/{}",
        "/swagger/{}",
        "/api/{}",
    ] {
        for i in 0..30 {
            let href = pattern.replace("{}", &i.to_string());
            let _ = write!(body, r#"<a href="{href}">lien</a>"#);
        }
    }
    body.push_str("</body></html>");
    let fetcher = Arc::new(MemoryFetcher::new().with_route(ORIGIN, MemoryResponse::html(&body)));

    let report = run(fetcher, ProbeKind::Endpoints).await;
    let inventory = report.inventory.expect("inventory attached");

    assert!(inventory.truncated);
    assert_eq!(inventory.len(), 100);
    for category in ["config", "admin", "graphql", "api-docs"] {
        assert_eq!(inventory.by_category(category).count(), 25, "{category}");
    }
    assert_eq!(inventory.by_category("api").count(), 0);
    assert_eq!(report.score, 0);
}
