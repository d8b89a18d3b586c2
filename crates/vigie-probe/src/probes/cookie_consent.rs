//! Cookie consent probe.
//!
//! Banner features are matched against the consent-like regions of the origin
//! page (the whole visible text when no region is marked). When features are
//! missing and no consent platform was recognized, up to
//! `max_secondary_fetches` first-party scripts are fetched, since most banners
//! are injected by script.

use crate::budget::{Stage, TimeBudget};
use crate::engine::{OriginPage, ProbeContext};
use crate::extract::ResourceKind;
use crate::report::ComplianceReport;
use crate::scope::is_same_scope;
use crate::scorer::{finalize, issues_for, weighted_score, Recommendations};
use tracing::debug;
use vigie_patterns::{classify, first_match, libraries, sets};

/// Consent platforms assumed to implement every banner feature.
pub const CMP_OVERRIDES: &[&str] = &["tarteaucitron"];

const BANNER: &str = "banner";

/// Accepted for script fetches.
const ACCEPT_SCRIPT: &str = "application/javascript,text/javascript;q=0.9,*/*;q=0.5";

const RECOMMENDATIONS: Recommendations = Recommendations {
    missing: &[
        "Affichez un bandeau de consentement avant tout dépôt de cookie non essentiel.",
        "Utilisez une plateforme de gestion du consentement (CMP) reconnue.",
    ],
    low: &[
        "Ajoutez un bouton « Tout refuser » aussi visible que le bouton « Tout accepter ».",
        "Permettez un choix par finalité (mesure d'audience, publicité, réseaux sociaux).",
    ],
    medium: &["Complétez le bandeau avec les éléments manquants signalés."],
    high: &["Conservez la preuve du consentement et permettez de le retirer à tout moment."],
};

pub(crate) async fn run(
    ctx: &ProbeContext,
    origin: &OriginPage,
    budget: &TimeBudget,
    mut report: ComplianceReport,
) -> ComplianceReport {
    let features = ctx.catalog.categories(libraries::COOKIE_CONSENT, sets::FEATURES);
    let platforms = ctx.catalog.categories(libraries::COOKIE_CONSENT, sets::CMP);
    let page = &origin.page;

    let mut haystack = if page.consent_text.trim().is_empty() {
        page.text.clone()
    } else {
        page.consent_text.clone()
    };
    let mut markup = origin.fetch.content.clone();

    let mut classification = classify(&haystack, features);
    let mut cmp = first_match(platforms, &markup);

    if cmp.is_none() && !classification.missing.is_empty() {
        let scripts: Vec<_> = page
            .resources
            .iter()
            .filter(|r| r.kind == ResourceKind::Script)
            .filter_map(|r| r.url.as_ref())
            .filter(|url| is_same_scope(url.as_str(), origin.origin_domain()))
            .take(ctx.settings.max_secondary_fetches)
            .collect();

        for url in scripts {
            let Some(result) = ctx
                .fetch_optional(budget, Stage::Secondary, url, ACCEPT_SCRIPT)
                .await
            else {
                break;
            };
            if !result.is_success() {
                debug!(url = %url, error = ?result.error, "script unavailable");
                continue;
            }
            haystack.push('\n');
            haystack.push_str(&result.content);
            markup.push('\n');
            markup.push_str(&result.content);
        }

        classification = classify(&haystack, features);
        cmp = first_match(platforms, &markup);
    }

    if let Some(platform) = cmp {
        debug!(cmp = platform.name(), "consent platform detected");
        classification.mark_found(BANNER);
        if CMP_OVERRIDES.contains(&platform.name()) {
            for feature in features {
                classification.mark_found(feature.name());
            }
        }
        report.detected_via = Some(platform.label().to_string());
    }

    report.found = classification.is_found(BANNER);
    report.found_items = classification.found_labels();
    report.missing_items = classification.missing_labels();
    report.issues = issues_for(&classification, features);

    let score = weighted_score(&classification);
    finalize(&mut report, score, &RECOMMENDATIONS);
    report
}
