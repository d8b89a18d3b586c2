//! Mixed content probe.
//!
//! Flags references written with an explicit `http://` scheme on an https
//! page. Scheme-relative and relative references inherit https and are never
//! flagged.

use crate::engine::OriginPage;
use crate::extract::ResourceKind;
use crate::inventory::InventoryBuilder;
use crate::report::ComplianceReport;
use crate::scorer::{deduction_score, finalize, Recommendations};
use tracing::debug;
use vigie_core::Provenance;

/// Inventory cap of flagged references.
const MAX_FLAGGED: usize = 100;

const RECOMMENDATIONS: Recommendations = Recommendations {
    missing: &[],
    low: &[
        "Servez toutes les ressources en HTTPS, en priorité les scripts et les iframes.",
        "Ajoutez la directive CSP « upgrade-insecure-requests » en attendant la correction.",
    ],
    medium: &["Remplacez les URL http:// restantes par leur équivalent https://."],
    high: &["Activez HSTS pour empêcher tout chargement non chiffré."],
};

/// Deduction per flagged reference.
fn penalty(kind: ResourceKind) -> u32 {
    match kind {
        ResourceKind::Script => 25,
        ResourceKind::Iframe | ResourceKind::Stylesheet | ResourceKind::Object | ResourceKind::Form => 20,
        ResourceKind::Media => 10,
        ResourceKind::Image => 5,
    }
}

pub(crate) fn run(origin: &OriginPage, mut report: ComplianceReport) -> ComplianceReport {
    report.found = true;

    if origin.base().scheme() != "https" {
        debug!(url = %origin.base(), "page not served over https");
        report.issues.push(
            "La page n'est pas servie en HTTPS : l'ensemble de son contenu transite en clair."
                .to_string(),
        );
        report.inventory = Some(InventoryBuilder::new(MAX_FLAGGED, MAX_FLAGGED).build());
        finalize(&mut report, 0, &RECOMMENDATIONS);
        return report;
    }

    let mut builder = InventoryBuilder::new(MAX_FLAGGED, MAX_FLAGGED);
    let mut penalties = Vec::new();
    for resource in origin.page.resources.iter().filter(|r| r.is_explicit_http()) {
        let Some(url) = resource.url.as_ref() else {
            continue;
        };
        let before = builder.len();
        builder.add(url, Provenance::PageResource, resource.kind.as_str());
        if builder.len() > before {
            penalties.push(penalty(resource.kind));
        }
    }
    let inventory = builder.build();

    for kind in [
        ResourceKind::Script,
        ResourceKind::Iframe,
        ResourceKind::Stylesheet,
        ResourceKind::Object,
        ResourceKind::Form,
        ResourceKind::Media,
        ResourceKind::Image,
    ] {
        let n = inventory.by_category(kind.as_str()).count();
        if n > 0 {
            report
                .issues
                .push(format!("{n} ressource(s) de type « {kind} » chargée(s) en HTTP."));
            report.found_items.push(kind.as_str().to_string());
        }
    }

    report.inventory = Some(inventory);
    finalize(&mut report, deduction_score(penalties), &RECOMMENDATIONS);
    report
}
