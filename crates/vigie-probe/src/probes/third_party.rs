//! Third-party vendor probe.

use crate::engine::{OriginPage, ProbeContext};
use crate::inventory::InventoryBuilder;
use crate::report::ComplianceReport;
use crate::scorer::{deduction_score, finalize, Recommendations};
use crate::vendors::{collect_third_parties, UNCATEGORIZED};
use std::collections::BTreeMap;
use vigie_patterns::{libraries, sets};

/// Deduction per host that matches no vendor category.
const UNCATEGORIZED_PENALTY: u32 = 2;

const RECOMMENDATIONS: Recommendations = Recommendations {
    missing: &[],
    low: &[
        "Réduisez le nombre de services tiers chargés sans consentement préalable.",
        "Conditionnez les traceurs publicitaires et sociaux au consentement de l'utilisateur.",
    ],
    medium: &[
        "Auditez les services tiers et retirez ceux qui ne sont plus utilisés.",
        "Listez les sous-traitants dans la politique de confidentialité.",
    ],
    high: &["Documentez chaque service tiers dans le registre des traitements."],
};

pub(crate) fn run(
    ctx: &ProbeContext,
    origin: &OriginPage,
    mut report: ComplianceReport,
) -> ComplianceReport {
    let taxonomy = ctx.catalog.categories(libraries::THIRD_PARTY, sets::VENDORS);
    let page_host = origin
        .base()
        .host_str()
        .unwrap_or_else(|| origin.origin_domain())
        .to_string();

    let inventory = collect_third_parties(
        &origin.page,
        &page_host,
        taxonomy,
        InventoryBuilder::from_settings(&ctx.settings),
    );

    // one deduction per distinct external host
    let mut hosts: BTreeMap<&str, &str> = BTreeMap::new();
    for item in inventory.items.iter().filter(|i| !i.same_site) {
        if let Some(vendor) = item.vendor.as_deref() {
            hosts.entry(vendor).or_insert(item.category.as_str());
        }
    }

    let penalty = |category: &str| -> u32 {
        if category == UNCATEGORIZED {
            return UNCATEGORIZED_PENALTY;
        }
        ctx.catalog
            .category(libraries::THIRD_PARTY, sets::VENDORS, category)
            .map_or(UNCATEGORIZED_PENALTY, |c| c.weight())
    };
    let score = deduction_score(hosts.values().copied().map(penalty));

    let count = |category: &str| hosts.values().filter(|cat| **cat == category).count();
    report.issues = taxonomy
        .iter()
        .filter(|c| c.weight() > 0)
        .filter_map(|c| {
            let n = count(c.name());
            (n > 0).then(|| format!("{} ({n} hôte(s))", c.issue()))
        })
        .collect();
    let unknown = count(UNCATEGORIZED);
    if unknown > 0 {
        report
            .issues
            .push(format!("{unknown} hôte(s) tiers non identifié(s) chargé(s) par la page."));
    }

    report.found = true;
    report.found_items = hosts.keys().map(|host| (*host).to_string()).collect();
    if inventory.truncated {
        report
            .issues
            .push("L'inventaire des ressources tierces a été tronqué.".to_string());
    }
    report.inventory = Some(inventory);

    finalize(&mut report, score, &RECOMMENDATIONS);
    report
}
