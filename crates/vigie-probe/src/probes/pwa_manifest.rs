//! Web app manifest and service worker probe.

use crate::budget::{Stage, TimeBudget};
use crate::engine::{OriginPage, ProbeContext};
use crate::report::ComplianceReport;
use crate::scorer::{finalize, Recommendations};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use url::Url;
use vigie_core::Provenance;
use vigie_fetch::ACCEPT_JSON;

/// A scored manifest feature.
#[derive(Debug, Clone, Copy)]
pub struct PwaFeature {
    /// Identifier
    pub name: &'static str,
    /// Display label
    pub label: &'static str,
    /// Score contribution
    pub weight: u32,
    /// Issue raised when absent
    pub issue: &'static str,
}

/// Manifest features, weights summing to 100.
pub const PWA_FEATURES: &[PwaFeature] = &[
    PwaFeature {
        name: "manifest",
        label: "Manifeste d'application",
        weight: 20,
        issue: "Aucun manifeste d'application web n'a été trouvé.",
    },
    PwaFeature {
        name: "name",
        label: "Nom de l'application",
        weight: 10,
        issue: "Le manifeste ne déclare ni « name » ni « short_name ».",
    },
    PwaFeature {
        name: "start-url",
        label: "URL de démarrage",
        weight: 10,
        issue: "Le manifeste ne déclare pas de « start_url ».",
    },
    PwaFeature {
        name: "display",
        label: "Mode d'affichage",
        weight: 10,
        issue: "Le manifeste ne déclare pas de mode « display » autonome.",
    },
    PwaFeature {
        name: "icons",
        label: "Icônes 192 et 512 px",
        weight: 20,
        issue: "Le manifeste ne fournit pas d'icônes en 192x192 et 512x512.",
    },
    PwaFeature {
        name: "theme-color",
        label: "Couleur de thème",
        weight: 10,
        issue: "Le manifeste ne déclare pas de « theme_color ».",
    },
    PwaFeature {
        name: "service-worker",
        label: "Service worker",
        weight: 20,
        issue: "Aucun enregistrement de service worker n'a été détecté sur la page.",
    },
];

/// Fallback locations, relative to the origin.
const WELL_KNOWN_PATHS: &[&str] = &["/manifest.json", "/manifest.webmanifest"];

static SERVICE_WORKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"serviceWorker\s*\.\s*register\s*\(").expect("valid regex")
});

const RECOMMENDATIONS: Recommendations = Recommendations {
    missing: &[
        "Ajoutez un manifeste d'application web référencé par <link rel=\"manifest\">.",
        "Enregistrez un service worker pour le fonctionnement hors ligne.",
    ],
    low: &[
        "Complétez le manifeste : name, start_url, display et icônes 192/512 px.",
        "Enregistrez un service worker servi en HTTPS.",
    ],
    medium: &["Complétez les champs manquants du manifeste."],
    high: &["Testez l'installation de l'application sur mobile et ordinateur."],
};

/// Features present in a parsed manifest.
fn manifest_has(feature: &str, manifest: &Value) -> bool {
    let non_empty = |key: &str| {
        manifest
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|v| !v.trim().is_empty())
    };
    match feature {
        "name" => non_empty("name") || non_empty("short_name"),
        "start-url" => non_empty("start_url"),
        "display" => manifest
            .get("display")
            .and_then(Value::as_str)
            .is_some_and(|d| matches!(d.trim(), "standalone" | "fullscreen" | "minimal-ui")),
        "icons" => has_icon_sizes(manifest, &["192x192", "512x512"]),
        "theme-color" => non_empty("theme_color"),
        _ => false,
    }
}

fn has_icon_sizes(manifest: &Value, wanted: &[&str]) -> bool {
    let Some(icons) = manifest.get("icons").and_then(Value::as_array) else {
        return false;
    };
    let sizes: Vec<String> = icons
        .iter()
        .filter_map(|icon| icon.get("sizes").and_then(Value::as_str))
        .flat_map(str::split_ascii_whitespace)
        .map(str::to_ascii_lowercase)
        .collect();
    wanted.iter().all(|w| sizes.iter().any(|s| s == w))
}

pub(crate) async fn run(
    ctx: &ProbeContext,
    origin: &OriginPage,
    budget: &TimeBudget,
    mut report: ComplianceReport,
) -> ComplianceReport {
    let linked = origin
        .page
        .manifest_url()
        .map(|url| (url, Provenance::ManifestLink.as_str()));
    let well_known = WELL_KNOWN_PATHS
        .iter()
        .filter_map(|path| origin.target.join(path))
        .map(|url| (url, "well-known"));
    let candidates: Vec<(Url, &str)> = linked
        .into_iter()
        .chain(well_known)
        .take(ctx.settings.max_secondary_fetches)
        .collect();

    let mut manifest = None;
    let mut parse_error = None;
    for (url, via) in candidates {
        let Some(result) = ctx
            .fetch_optional(budget, Stage::Secondary, &url, ACCEPT_JSON)
            .await
        else {
            break;
        };
        if !result.is_success() {
            debug!(url = %url, error = ?result.error, "manifest unavailable");
            continue;
        }
        report.target_url = Some(url.to_string());
        report.detected_via = Some(via.to_string());
        match serde_json::from_str::<Value>(&result.content) {
            Ok(value) if value.is_object() => manifest = Some(value),
            Ok(_) => parse_error = Some("le document n'est pas un objet JSON".to_string()),
            Err(e) => parse_error = Some(e.to_string()),
        }
        break;
    }

    let service_worker = SERVICE_WORKER.is_match(&origin.page.inline_scripts)
        || SERVICE_WORKER.is_match(&origin.fetch.content);

    report.found = report.target_url.is_some();
    let mut score = 0;
    for feature in PWA_FEATURES {
        let present = match feature.name {
            "manifest" => report.found,
            "service-worker" => service_worker,
            name => manifest.as_ref().is_some_and(|m| manifest_has(name, m)),
        };
        if present {
            score += feature.weight;
            report.found_items.push(feature.label.to_string());
        } else {
            report.missing_items.push(feature.label.to_string());
            if feature.name == "service-worker" || report.found {
                report.issues.push(feature.issue.to_string());
            }
        }
    }
    if !report.found {
        report.issues.insert(0, PWA_FEATURES[0].issue.to_string());
    }
    if let Some(error) = parse_error {
        report
            .issues
            .push(format!("Le manifeste n'est pas un JSON valide : {error}."));
    }

    finalize(
        &mut report,
        u8::try_from(score.min(100)).unwrap_or(100),
        &RECOMMENDATIONS,
    );
    report
}
