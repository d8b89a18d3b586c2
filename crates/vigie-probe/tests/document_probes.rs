//! Document probes against a local mock server: every stage of the fallback
//! chain, origin failure and determinism.

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigie_core::HttpConfig;
use vigie_fetch::HttpFetcher;
use vigie_patterns::Catalog;
use vigie_probe::{ComplianceLevel, ProbeEngine, ProbeKind, ProbeSettings};

const FULL_LEGAL_NOTICE: &str = r"<html><body><main>
    <h1>Mentions légales</h1>
    <p>Ce site est édité par Exemple SAS, siège social : 12 rue de la Paix, 75002 Paris.</p>
    <p>Téléphone : 01 23 45 67 89 - contact@example.com</p>
    <p>RCS Paris 123 456 789</p>
    <p>Directeur de la publication : Jean Dupont</p>
    <p>Hébergeur : OVH, 2 rue Kellermann, 59100 Roubaix</p>
</main></body></html>";

const PARTIAL_LEGAL_NOTICE: &str = r"<html><body>
    <p>Édité par Exemple. Écrivez-nous : contact@example.com</p>
</body></html>";

fn engine() -> ProbeEngine {
    let fetcher = HttpFetcher::new(&HttpConfig::default()).expect("build fetcher");
    ProbeEngine::new(
        Arc::new(fetcher),
        Arc::new(Catalog::builtin().clone()),
        ProbeSettings::default(),
    )
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn legal_notice_found_via_footer_link() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><body>
            <nav><a href="/boutique">Boutique</a></nav>
            <footer><a href="/infos">Mentions légales</a></footer>
        </body></html>"#,
    )
    .await;
    mount_html(&server, "/infos", FULL_LEGAL_NOTICE).await;

    let report = engine()
        .run_url(ProbeKind::LegalNotice, &format!("{}/", server.uri()))
        .await
        .expect("valid url");

    assert!(report.found);
    assert_eq!(report.detected_via.as_deref(), Some("footer-link"));
    assert_eq!(report.target_url, Some(format!("{}/infos", server.uri())));
    assert_eq!(report.score, 100);
    assert_eq!(report.level, ComplianceLevel::Compliant);
    assert!(report.missing_items.is_empty());
    assert!(report.issues.is_empty());
    assert!(!report.exceeded_budget);
}

#[tokio::test]
async fn legal_notice_found_via_body_link_and_partially_scored() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><body><p>Voir nos <a href="/mentions-legales">informations</a>.</p></body></html>"#,
    )
    .await;
    mount_html(&server, "/mentions-legales", PARTIAL_LEGAL_NOTICE).await;

    let report = engine()
        .run_url(ProbeKind::LegalNotice, &format!("{}/", server.uri()))
        .await
        .expect("valid url");

    assert!(report.found);
    assert_eq!(report.detected_via.as_deref(), Some("body-link"));
    // editor and contact out of six sections
    assert_eq!(report.score, 33);
    assert_eq!(report.level, ComplianceLevel::NonCompliant);
    assert_eq!(report.found_items.len(), 2);
    assert_eq!(report.missing_items.len(), 4);
    assert_eq!(report.issues.len(), 4);
    assert!(!report.recommendations.is_empty());
    assert!(report.recommendations.len() <= 2);
}

#[tokio::test]
async fn legal_notice_found_via_sitemap() {
    let server = MockServer::start().await;
    mount_html(&server, "/", "<html><body><p>Bienvenue</p></body></html>").await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>{uri}/</loc></url>
              <url><loc>https://elsewhere.example/mentions-legales</loc></url>
              <url><loc>{uri}/mentions-legales</loc></url>
            </urlset>"#,
            uri = server.uri()
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_html(&server, "/mentions-legales", FULL_LEGAL_NOTICE).await;

    let report = engine()
        .run_url(ProbeKind::LegalNotice, &format!("{}/", server.uri()))
        .await
        .expect("valid url");

    assert!(report.found);
    assert_eq!(report.detected_via.as_deref(), Some("sitemap"));
    assert_eq!(report.target_url, Some(format!("{}/mentions-legales", server.uri())));
    assert_eq!(report.score, 100);
}

#[tokio::test]
async fn sitemap_index_is_followed() {
    let server = MockServer::start().await;
    mount_html(&server, "/", "<html><body></body></html>").await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r"<sitemapindex>
                <sitemap><loc>{uri}/sitemap-pages.xml</loc></sitemap>
              </sitemapindex>",
            uri = server.uri()
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-pages.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r"<urlset><url><loc>{uri}/politique-de-confidentialite</loc></url></urlset>",
            uri = server.uri()
        )))
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/politique-de-confidentialite",
        "<html><body><p>Vos droits : droit d'accès, rectification et effacement.</p></body></html>",
    )
    .await;

    let report = engine()
        .run_url(ProbeKind::UserRights, &format!("{}/", server.uri()))
        .await
        .expect("valid url");

    assert!(report.found);
    assert_eq!(report.detected_via.as_deref(), Some("sitemap"));
    // access, rectification, erasure out of eight rights
    assert_eq!(report.score, 38);
    assert_eq!(report.level, ComplianceLevel::NonCompliant);
}

#[tokio::test]
async fn nothing_located_is_critical() {
    let server = MockServer::start().await;
    mount_html(&server, "/", r#"<html><body><a href="/blog">Blog</a></body></html>"#).await;

    let report = engine()
        .run_url(ProbeKind::PrivacyPolicy, &format!("{}/", server.uri()))
        .await
        .expect("valid url");

    assert!(!report.found);
    assert_eq!(report.level, ComplianceLevel::Critical);
    assert_eq!(report.score, 0);
    assert_eq!(report.missing_items.len(), 8);
    assert_eq!(report.issues.len(), 1);
    assert!(report.target_url.is_none());
}

#[tokio::test]
async fn located_but_unreadable_target_scores_zero() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><body><footer><a href="/confidentialite">Confidentialité</a></footer></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/confidentialite"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let report = engine()
        .run_url(ProbeKind::PrivacyPolicy, &format!("{}/", server.uri()))
        .await
        .expect("valid url");

    assert!(report.found);
    assert_eq!(report.score, 0);
    assert_eq!(report.level, ComplianceLevel::NonCompliant);
    assert_eq!(report.issues.len(), 1);
    assert!(report.issues[0].contains("HTTP 503"));
}

#[tokio::test]
async fn origin_failure_is_analysis_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let report = engine()
        .run_url(ProbeKind::LegalNotice, &format!("{}/", server.uri()))
        .await
        .expect("valid url");

    assert_eq!(report.level, ComplianceLevel::AnalysisError);
    assert_eq!(report.score, 0);
    assert_eq!(report.error.as_deref(), Some("HTTP 500"));

    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["level"], "Erreur d'analyse");
    assert_eq!(json["score"], 0);
    assert_eq!(json["error"], "HTTP 500");
}

#[tokio::test]
async fn repeated_runs_are_deterministic() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><body><footer><a href="/mentions-legales">Mentions légales</a></footer></body></html>"#,
    )
    .await;
    mount_html(&server, "/mentions-legales", PARTIAL_LEGAL_NOTICE).await;

    let engine = engine();
    let url = format!("{}/", server.uri());
    let first = engine
        .run_url(ProbeKind::LegalNotice, &url)
        .await
        .expect("valid url");

    for _ in 0..3 {
        let again = engine
            .run_url(ProbeKind::LegalNotice, &url)
            .await
            .expect("valid url");
        assert_eq!(again.score, first.score);
        assert_eq!(again.level, first.level);
        assert_eq!(again.found_items, first.found_items);
        assert_eq!(again.issues, first.issues);
    }
}
