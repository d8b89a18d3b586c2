//! Declarative pattern categories and their compiled form.

use crate::error::{PatternError, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// How the patterns of a category combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    /// One matching pattern is enough
    #[default]
    Any,
    /// Every pattern must match
    All,
}

/// A category as written in a library file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Stable identifier, unique within its set
    pub name: String,

    /// Human-readable label; defaults to `name`
    #[serde(default)]
    pub label: Option<String>,

    /// Pattern composition
    #[serde(default)]
    pub composition: Composition,

    /// Case-insensitive regular expressions
    pub patterns: Vec<String>,

    /// Score weight (feature weight or deduction, depending on the scorer mode)
    #[serde(default)]
    pub weight: u32,

    /// Issue text reported when the category is missing
    #[serde(default)]
    pub issue: Option<String>,
}

/// A compiled category.
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    label: String,
    composition: Composition,
    patterns: Vec<Regex>,
    weight: u32,
    issue: String,
}

impl Category {
    /// Compile a category. `library` is only used for error reporting.
    ///
    /// # Errors
    /// Returns error if the category has no pattern or a pattern does not compile.
    pub fn compile(library: &str, spec: &CategorySpec) -> Result<Self> {
        if spec.name.trim().is_empty() {
            return Err(PatternError::ValidationError {
                library: library.to_string(),
                reason: "category name cannot be empty".to_string(),
            });
        }
        if spec.patterns.is_empty() {
            return Err(PatternError::ValidationError {
                library: library.to_string(),
                reason: format!("category '{}' has no patterns", spec.name),
            });
        }

        let patterns = spec
            .patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| PatternError::InvalidRegex {
                        library: library.to_string(),
                        category: spec.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let label = spec
            .label
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| spec.name.clone());
        let issue = spec
            .issue
            .clone()
            .unwrap_or_else(|| format!("Élément manquant : {label}."));

        Ok(Self {
            name: spec.name.clone(),
            label,
            composition: spec.composition,
            patterns,
            weight: spec.weight,
            issue,
        })
    }

    /// Stable identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Pattern composition.
    #[must_use]
    pub fn composition(&self) -> Composition {
        self.composition
    }

    /// Weight (feature weight or deduction).
    #[must_use]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Issue text for a missing category.
    #[must_use]
    pub fn issue(&self) -> &str {
        &self.issue
    }

    /// Whether `text` satisfies this category.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self.composition {
            Composition::Any => self.patterns.iter().any(|re| re.is_match(text)),
            Composition::All => self.patterns.iter().all(|re| re.is_match(text)),
        }
    }
}
