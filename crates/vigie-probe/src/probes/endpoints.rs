//! Exposed endpoints probe.

use crate::budget::TimeBudget;
use crate::engine::{OriginPage, ProbeContext};
use crate::inventory::collect_endpoints;
use crate::report::ComplianceReport;
use crate::scorer::{deduction_score, finalize, Recommendations};
use vigie_patterns::{libraries, sets};

const RECOMMENDATIONS: Recommendations = Recommendations {
    missing: &[],
    low: &[
        "Retirez des pages publiques, du robots.txt et des sitemaps toute référence aux interfaces d'administration et fichiers de configuration.",
        "Protégez les interfaces sensibles par authentification et filtrage réseau.",
    ],
    medium: &[
        "Vérifiez que les API référencées publiquement exigent une authentification.",
        "Désactivez l'introspection GraphQL et la documentation d'API en production.",
    ],
    high: &["Surveillez régulièrement les URL exposées par le site."],
};

pub(crate) async fn run(
    ctx: &ProbeContext,
    origin: &OriginPage,
    budget: &TimeBudget,
    mut report: ComplianceReport,
) -> ComplianceReport {
    let shapes = ctx.catalog.categories(libraries::ENDPOINTS, sets::API);
    let inventory = collect_endpoints(ctx, origin, budget).await;

    let weight_of = |category: &str| {
        shapes
            .iter()
            .find(|c| c.name() == category)
            .map_or(0, |c| c.weight())
    };
    let score = deduction_score(inventory.items.iter().map(|i| weight_of(&i.category)));

    for shape in shapes {
        let n = inventory.by_category(shape.name()).count();
        if n == 0 {
            continue;
        }
        report.found_items.push(shape.label().to_string());
        if shape.weight() > 0 {
            report.issues.push(format!("{} ({n} URL)", shape.issue()));
        }
    }
    if inventory.truncated {
        report
            .issues
            .push("L'inventaire des URL exposées a été tronqué.".to_string());
    }

    report.found = true;
    report.inventory = Some(inventory);
    finalize(&mut report, score, &RECOMMENDATIONS);
    report
}
