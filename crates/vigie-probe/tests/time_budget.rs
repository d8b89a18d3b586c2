//! Budget exhaustion: once an optional stage runs past the budget, every
//! later optional stage is skipped and the report says so.

use std::sync::Arc;
use std::time::Duration;

use vigie_fetch::{MemoryFetcher, MemoryResponse};
use vigie_patterns::Catalog;
use vigie_probe::{ComplianceLevel, ProbeEngine, ProbeKind, ProbeSettings};

const ORIGIN: &str = "https://example.com/";
const SITEMAP: &str = "https://example.com/sitemap.xml";

fn engine(fetcher: Arc<MemoryFetcher>, budget: Duration) -> ProbeEngine {
    ProbeEngine::new(
        fetcher,
        Arc::new(Catalog::builtin().clone()),
        ProbeSettings::default().with_budget(budget),
    )
}

#[tokio::test]
async fn slow_sitemap_skips_target_fetch() {
    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_route(ORIGIN, MemoryResponse::html("<html><body>Accueil</body></html>"))
            .with_route(
                SITEMAP,
                MemoryResponse::new(
                    200,
                    "<urlset><url><loc>https://example.com/mentions-legales</loc></url></urlset>",
                )
                .with_delay(Duration::from_millis(300)),
            )
            .with_route(
                "https://example.com/mentions-legales",
                MemoryResponse::html("<p>Édité par Exemple SAS</p>"),
            ),
    );

    let report = engine(fetcher.clone(), Duration::from_millis(100))
        .run_url(ProbeKind::LegalNotice, ORIGIN)
        .await
        .expect("valid url");

    assert!(report.exceeded_budget);
    assert!(report.found);
    assert_eq!(report.detected_via.as_deref(), Some("sitemap"));
    assert_eq!(report.score, 0);
    assert_eq!(report.level, ComplianceLevel::NonCompliant);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(fetcher.calls(), vec![ORIGIN.to_string(), SITEMAP.to_string()]);
}

#[tokio::test]
async fn slow_sitemap_index_skips_children() {
    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_route(ORIGIN, MemoryResponse::html("<html><body></body></html>"))
            .with_route(
                SITEMAP,
                MemoryResponse::new(
                    200,
                    "<sitemapindex><sitemap><loc>https://example.com/pages.xml</loc></sitemap></sitemapindex>",
                )
                .with_delay(Duration::from_millis(300)),
            )
            .with_route(
                "https://example.com/pages.xml",
                MemoryResponse::new(
                    200,
                    "<urlset><url><loc>https://example.com/confidentialite</loc></url></urlset>",
                ),
            ),
    );

    let report = engine(fetcher.clone(), Duration::from_millis(100))
        .run_url(ProbeKind::PrivacyPolicy, ORIGIN)
        .await
        .expect("valid url");

    assert!(report.exceeded_budget);
    assert!(!report.found);
    assert_eq!(report.level, ComplianceLevel::Critical);
    assert!(!fetcher
        .calls()
        .contains(&"https://example.com/pages.xml".to_string()));
}

#[tokio::test]
async fn slow_robots_skips_sitemaps() {
    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_route(
                ORIGIN,
                MemoryResponse::html(r#"<html><body><a href="/api/v1/status">Statut</a></body></html>"#),
            )
            .with_route(
                "https://example.com/robots.txt",
                MemoryResponse::new(200, "User-agent: *\nDisallow: /admin/\n")
                    .with_delay(Duration::from_millis(300)),
            ),
    );

    let report = engine(fetcher.clone(), Duration::from_millis(100))
        .run_url(ProbeKind::Endpoints, ORIGIN)
        .await
        .expect("valid url");

    assert!(report.exceeded_budget);
    assert_eq!(
        fetcher.calls(),
        vec![ORIGIN.to_string(), "https://example.com/robots.txt".to_string()]
    );

    // robots.txt was read before the budget check refused the sitemap
    let inventory = report.inventory.expect("inventory attached");
    let urls: Vec<_> = inventory.items.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://example.com/api/v1/status", "https://example.com/admin/"]
    );
}

#[tokio::test]
async fn generous_budget_is_not_exceeded() {
    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_route(
                ORIGIN,
                MemoryResponse::html(
                    r#"<html><body><footer><a href="/mentions-legales">Mentions légales</a></footer></body></html>"#,
                ),
            )
            .with_route(
                "https://example.com/mentions-legales",
                MemoryResponse::html("<p>Édité par Exemple SAS</p>")
                    .with_delay(Duration::from_millis(20)),
            ),
    );

    let report = engine(fetcher, Duration::from_secs(5))
        .run_url(ProbeKind::LegalNotice, ORIGIN)
        .await
        .expect("valid url");

    assert!(!report.exceeded_budget);
    assert!(report.found);
    assert_eq!(report.detected_via.as_deref(), Some("footer-link"));
    assert!(report.score > 0);
}
