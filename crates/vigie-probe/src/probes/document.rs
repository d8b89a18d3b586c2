//! Document probes: legal notice, privacy policy and user rights.
//!
//! All three locate a page through the resolver, classify its text against a
//! section set and score it uniformly.

use crate::budget::TimeBudget;
use crate::engine::{OriginPage, ProbeContext};
use crate::report::ComplianceReport;
use crate::resolver::{LinkResolver, TargetContent};
use crate::scorer::{finalize, issues_for, uniform_score, Recommendations};
use tracing::{debug, warn};
use vigie_patterns::{classify, libraries, sets, Category};

/// Static description of a document probe.
pub(crate) struct DocumentProbe {
    links_library: &'static str,
    sections_library: &'static str,
    not_found: &'static str,
    recommendations: Recommendations,
}

pub(crate) const LEGAL_NOTICE: DocumentProbe = DocumentProbe {
    links_library: libraries::LEGAL_NOTICE,
    sections_library: libraries::LEGAL_NOTICE,
    not_found: "Aucune page de mentions légales n'a été trouvée depuis la page analysée.",
    recommendations: Recommendations {
        missing: &[
            "Publiez une page de mentions légales accessible depuis le pied de page de chaque page.",
            "Indiquez l'éditeur, le directeur de la publication et l'hébergeur du site.",
        ],
        low: &[
            "Complétez les mentions légales : identité de l'éditeur, coordonnées et immatriculation.",
            "Ajoutez les coordonnées de l'hébergeur (nom, adresse, téléphone).",
        ],
        medium: &["Complétez les informations manquantes signalées dans les mentions légales."],
        high: &["Vérifiez régulièrement que les mentions légales restent à jour."],
    },
};

pub(crate) const PRIVACY_POLICY: DocumentProbe = DocumentProbe {
    links_library: libraries::PRIVACY_POLICY,
    sections_library: libraries::PRIVACY_POLICY,
    not_found: "Aucune politique de confidentialité n'a été trouvée depuis la page analysée.",
    recommendations: Recommendations {
        missing: &[
            "Publiez une politique de confidentialité accessible depuis chaque page du site.",
            "Décrivez les traitements de données personnelles, leurs finalités et leurs bases légales.",
        ],
        low: &[
            "Précisez les finalités, les bases légales et les durées de conservation des données.",
            "Indiquez comment contacter le responsable du traitement ou le DPO.",
        ],
        medium: &["Complétez les sections manquantes de la politique de confidentialité."],
        high: &["Mettez à jour la politique de confidentialité à chaque nouveau traitement."],
    },
};

pub(crate) const USER_RIGHTS: DocumentProbe = DocumentProbe {
    links_library: libraries::PRIVACY_POLICY,
    sections_library: libraries::USER_RIGHTS,
    not_found: "Aucune page décrivant les droits des personnes n'a été trouvée.",
    recommendations: Recommendations {
        missing: &[
            "Informez les utilisateurs de leurs droits dans la politique de confidentialité.",
            "Indiquez la procédure pour exercer ces droits et l'adresse de contact.",
        ],
        low: &[
            "Listez chacun des droits : accès, rectification, effacement, portabilité, opposition, limitation.",
            "Mentionnez le droit d'introduire une réclamation auprès de la CNIL.",
        ],
        medium: &["Complétez la liste des droits avec ceux qui ne sont pas mentionnés."],
        high: &["Précisez le délai de réponse aux demandes d'exercice des droits."],
    },
};

pub(crate) async fn run(
    probe: &DocumentProbe,
    ctx: &ProbeContext,
    origin: &OriginPage,
    budget: &TimeBudget,
    mut report: ComplianceReport,
) -> ComplianceReport {
    let links = ctx.catalog.categories(probe.links_library, sets::LINKS);
    let sections = ctx.catalog.categories(probe.sections_library, sets::SECTIONS);
    let resolver = LinkResolver::new(ctx, origin, budget, links);

    let Some(candidate) = resolver.resolve().await else {
        debug!(probe = %report.probe, "target not located");
        report.found = false;
        report.missing_items = labels(sections);
        report.issues.push(probe.not_found.to_string());
        finalize(&mut report, 0, &probe.recommendations);
        return report;
    };

    report.found = true;
    report.detected_via = candidate.primary_provenance().map(|p| p.as_str().to_string());
    report.target_url = Some(candidate.url.clone());

    let score = match resolver.fetch_target(&candidate).await {
        TargetContent::Text(text) => {
            let classification = classify(&text, sections);
            report.found_items = classification.found_labels();
            report.missing_items = classification.missing_labels();
            report.issues = issues_for(&classification, sections);
            uniform_score(classification.found.len(), classification.total())
        }
        TargetContent::Unanalyzable(reason) => {
            warn!(
                probe = %report.probe,
                target = %candidate.url,
                reason = %reason,
                "target located but unanalyzable"
            );
            report.missing_items = labels(sections);
            report.issues.push(format!(
                "La page {} a été trouvée mais son contenu n'a pas pu être analysé ({reason}).",
                candidate.url
            ));
            0
        }
    };

    finalize(&mut report, score, &probe.recommendations);
    report
}

fn labels(categories: &[Category]) -> Vec<String> {
    categories.iter().map(|c| c.label().to_string()).collect()
}
