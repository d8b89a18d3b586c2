//! Score, level, issues and recommendations.
//!
//! Three scoring modes share one level table:
//!
//! - weighted: sum of the weights of present features;
//! - uniform: every section is worth `100 / N`, rounded at the end;
//! - deduction: `100` minus the penalties of flagged items.
//!
//! All scores are clamped to `[0, 100]`.

use crate::report::{ComplianceLevel, ComplianceReport};
use vigie_patterns::{Category, Classification};

/// Weighted-feature score.
#[must_use]
pub fn weighted_score(classification: &Classification) -> u8 {
    clamp(u64::from(classification.found_weight()))
}

/// Uniform-section score: `round(found * 100 / total)`. No sections means
/// nothing is missing, hence 100.
#[must_use]
pub fn uniform_score(found: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let found = found.min(total);
    let rounded = (found * 200 + total) / (2 * total);
    clamp(u64::try_from(rounded).unwrap_or(u64::MAX))
}

/// Deduction score: `100 - sum(penalties)`, floored at 0.
#[must_use]
pub fn deduction_score(penalties: impl IntoIterator<Item = u32>) -> u8 {
    let total: u64 = penalties.into_iter().map(u64::from).sum();
    clamp(100u64.saturating_sub(total))
}

fn clamp(score: u64) -> u8 {
    u8::try_from(score.min(100)).unwrap_or(100)
}

/// One issue per missing category, in declared order.
#[must_use]
pub fn issues_for(classification: &Classification, categories: &[Category]) -> Vec<String> {
    classification
        .missing
        .iter()
        .map(|item| {
            categories
                .iter()
                .find(|c| c.name() == item.category)
                .map_or_else(
                    || format!("Élément manquant : {}.", item.label),
                    |c| c.issue().to_string(),
                )
        })
        .collect()
}

/// Recommendation texts of a probe, by score bracket.
#[derive(Debug, Clone, Copy)]
pub struct Recommendations {
    /// Artifact not located
    pub missing: &'static [&'static str],
    /// Score below 60
    pub low: &'static [&'static str],
    /// Score between 60 and 84
    pub medium: &'static [&'static str],
    /// Score of 85 or more
    pub high: &'static [&'static str],
}

impl Recommendations {
    /// At most two recommendations for `level`.
    #[must_use]
    pub fn for_level(&self, level: ComplianceLevel) -> Vec<String> {
        let bracket: &[&str] = match level {
            ComplianceLevel::Critical => self.missing,
            ComplianceLevel::NonCompliant => self.low,
            ComplianceLevel::PartiallyCompliant => self.medium,
            ComplianceLevel::Compliant => self.high,
            ComplianceLevel::AnalysisError => &[],
        };
        bracket.iter().take(2).map(ToString::to_string).collect()
    }
}

/// Fill score, level and recommendations of a report.
pub fn finalize(report: &mut ComplianceReport, score: u8, recommendations: &Recommendations) {
    report.score = score.min(100);
    report.level = ComplianceLevel::assess(report.found, report.score);
    report.recommendations = recommendations.for_level(report.level);
}
