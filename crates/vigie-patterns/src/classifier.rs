//! Text classification against ordered category lists.

use crate::category::Category;
use serde::Serialize;

/// Outcome for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedItem {
    /// Category identifier
    pub category: String,
    /// Category label
    pub label: String,
    /// Whether the text satisfied the category
    pub matched: bool,
    /// Category weight
    pub weight: u32,
}

impl ClassifiedItem {
    fn from_category(category: &Category, matched: bool) -> Self {
        Self {
            category: category.name().to_string(),
            label: category.label().to_string(),
            matched,
            weight: category.weight(),
        }
    }
}

/// Partition of categories into found and missing, each in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Categories the text satisfied
    pub found: Vec<ClassifiedItem>,
    /// Categories the text did not satisfy
    pub missing: Vec<ClassifiedItem>,
}

impl Classification {
    /// Number of categories evaluated.
    #[must_use]
    pub fn total(&self) -> usize {
        self.found.len() + self.missing.len()
    }

    /// Whether the named category was found.
    #[must_use]
    pub fn is_found(&self, name: &str) -> bool {
        self.found.iter().any(|item| item.category == name)
    }

    /// Sum of the weights of found categories.
    #[must_use]
    pub fn found_weight(&self) -> u32 {
        self.found.iter().map(|item| item.weight).sum()
    }

    /// Labels of found categories.
    #[must_use]
    pub fn found_labels(&self) -> Vec<String> {
        self.found.iter().map(|item| item.label.clone()).collect()
    }

    /// Labels of missing categories.
    #[must_use]
    pub fn missing_labels(&self) -> Vec<String> {
        self.missing.iter().map(|item| item.label.clone()).collect()
    }

    /// Move a missing category to the end of `found`.
    pub fn mark_found(&mut self, name: &str) {
        if let Some(pos) = self.missing.iter().position(|item| item.category == name) {
            let mut item = self.missing.remove(pos);
            item.matched = true;
            self.found.push(item);
        }
    }
}

/// Evaluate every category against `text`.
#[must_use]
pub fn classify(text: &str, categories: &[Category]) -> Classification {
    let mut classification = Classification::default();
    for category in categories {
        let matched = category.matches(text);
        let item = ClassifiedItem::from_category(category, matched);
        if matched {
            classification.found.push(item);
        } else {
            classification.missing.push(item);
        }
    }
    classification
}

/// Whether `text` satisfies `category`.
#[must_use]
pub fn matches(category: &Category, text: &str) -> bool {
    category.matches(text)
}

/// The first category, in declared order, that `text` satisfies.
#[must_use]
pub fn first_match<'a>(categories: &'a [Category], text: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.matches(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategorySpec, Composition};

    fn compile(name: &str, weight: u32, patterns: &[&str]) -> Category {
        Category::compile(
            "test",
            &CategorySpec {
                name: name.to_string(),
                label: Some(name.to_uppercase()),
                composition: Composition::Any,
                patterns: patterns.iter().map(ToString::to_string).collect(),
                weight,
                issue: None,
            },
        )
        .expect("compile category")
    }

    #[test]
    fn test_classify_partitions_in_declared_order() {
        let categories = vec![
            compile("editor", 1, &["éditeur"]),
            compile("host", 1, &["hébergeur"]),
            compile("rcs", 1, &[r"\bRCS\b"]),
        ];

        let result = classify("Éditeur : ACME SAS, RCS Paris 123", &categories);

        let found: Vec<_> = result.found.iter().map(|i| i.category.as_str()).collect();
        let missing: Vec<_> = result.missing.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(found, vec!["editor", "rcs"]);
        assert_eq!(missing, vec!["host"]);
        assert_eq!(result.total(), 3);
        assert!(result.found.iter().all(|i| i.matched));
        assert!(result.missing.iter().all(|i| !i.matched));
    }

    #[test]
    fn test_first_match_respects_order() {
        let categories = vec![
            compile("security", 0, &[r"(?:^|\.)challenges\.cloudflare\.com$"]),
            compile("performance", 1, &[r"(?:^|\.)cloudflare\.com$"]),
        ];

        let hit = first_match(&categories, "challenges.cloudflare.com").expect("match");
        assert_eq!(hit.name(), "security");

        let hit = first_match(&categories, "cdnjs.cloudflare.com").expect("match");
        assert_eq!(hit.name(), "performance");

        assert!(first_match(&categories, "example.org").is_none());
    }

    #[test]
    fn test_found_weight_and_mark_found() {
        let categories = vec![
            compile("banner", 20, &["cookies"]),
            compile("reject", 30, &["refuser"]),
        ];
        let mut result = classify("Ce site utilise des cookies", &categories);
        assert_eq!(result.found_weight(), 20);
        assert!(!result.is_found("reject"));

        result.mark_found("reject");
        assert_eq!(result.found_weight(), 50);
        assert!(result.missing.is_empty());
        assert_eq!(result.found_labels(), vec!["BANNER", "REJECT"]);
    }

    #[test]
    fn test_empty_text_matches_nothing() {
        let categories = vec![compile("a", 1, &["a"])];
        let result = classify("", &categories);
        assert!(result.found.is_empty());
        assert_eq!(result.missing_labels(), vec!["A"]);
    }
}
