//! Named pattern libraries.
//!
//! A library groups named category sets (for example the `links` and
//! `sections` sets of the `legal-notice` library). The built-in libraries are
//! compiled once per process; a [`Catalog`] can replace individual sets with
//! overrides loaded from disk.

use crate::category::{Category, CategorySpec};
use crate::classifier::{classify, Classification};
use crate::error::{PatternError, Result};
use crate::loader::CatalogLoader;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};
use vigie_core::PatternsConfig;

/// Built-in library names.
pub mod libraries {
    /// Legal notice discovery and sections
    pub const LEGAL_NOTICE: &str = "legal-notice";
    /// Privacy policy discovery and sections
    pub const PRIVACY_POLICY: &str = "privacy-policy";
    /// Data-subject rights
    pub const USER_RIGHTS: &str = "user-rights";
    /// Consent banner features and CMP signatures
    pub const COOKIE_CONSENT: &str = "cookie-consent";
    /// Third-party vendor taxonomy
    pub const THIRD_PARTY: &str = "third-party";
    /// API and configuration endpoint shapes
    pub const ENDPOINTS: &str = "endpoints";
}

/// Category set names used by the built-in libraries.
pub mod sets {
    /// `link-text` and `url-path` discovery categories
    pub const LINKS: &str = "links";
    /// Content sections of a located document
    pub const SECTIONS: &str = "sections";
    /// Weighted consent features
    pub const FEATURES: &str = "features";
    /// Consent-management platform signatures
    pub const CMP: &str = "cmp";
    /// Vendor taxonomy
    pub const VENDORS: &str = "vendors";
    /// Endpoint shapes
    pub const API: &str = "api";
}

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("legal_notice.toml", include_str!("../libraries/legal_notice.toml")),
    ("privacy_policy.toml", include_str!("../libraries/privacy_policy.toml")),
    ("user_rights.toml", include_str!("../libraries/user_rights.toml")),
    ("cookie_consent.toml", include_str!("../libraries/cookie_consent.toml")),
    ("third_party.toml", include_str!("../libraries/third_party.toml")),
    ("endpoints.toml", include_str!("../libraries/endpoints.toml")),
];

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    let libraries = BUILTIN_SOURCES
        .iter()
        .map(|(path, source)| PatternLibrary::from_toml_str(source, &format!("<builtin>/{path}")))
        .collect::<Result<Vec<_>>>()
        .expect("built-in pattern libraries are valid");
    Catalog::from_libraries(libraries)
});

#[derive(Debug, Deserialize)]
struct LibraryFile {
    name: String,
    #[serde(flatten)]
    sets: BTreeMap<String, Vec<CategorySpec>>,
}

/// A compiled library: named, ordered category sets.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    name: String,
    sets: BTreeMap<String, Vec<Category>>,
}

impl PatternLibrary {
    /// Compile a library from specs.
    ///
    /// # Errors
    /// Returns error if the library is empty, a set repeats a category name,
    /// or a category does not compile.
    pub fn from_specs(name: &str, sets: BTreeMap<String, Vec<CategorySpec>>) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(PatternError::ValidationError {
                library: name.to_string(),
                reason: "library name cannot be empty".to_string(),
            });
        }
        if sets.is_empty() {
            return Err(PatternError::ValidationError {
                library: name.to_string(),
                reason: "library defines no category set".to_string(),
            });
        }

        let mut compiled = BTreeMap::new();
        for (set_name, specs) in sets {
            let mut seen = HashSet::new();
            let mut categories = Vec::with_capacity(specs.len());
            for spec in &specs {
                if !seen.insert(spec.name.clone()) {
                    return Err(PatternError::ValidationError {
                        library: name.to_string(),
                        reason: format!("duplicate category '{}' in set '{set_name}'", spec.name),
                    });
                }
                categories.push(Category::compile(name, spec)?);
            }
            compiled.insert(set_name, categories);
        }

        Ok(Self {
            name: name.to_string(),
            sets: compiled,
        })
    }

    /// Parse and compile a library TOML document. `origin` names the document
    /// in errors.
    ///
    /// # Errors
    /// Returns error if the TOML is malformed or the library is invalid.
    pub fn from_toml_str(source: &str, origin: &str) -> Result<Self> {
        let file: LibraryFile = toml::from_str(source).map_err(|e| PatternError::ParseError {
            path: origin.to_string(),
            source: e,
        })?;
        Self::from_specs(&file.name, file.sets)
    }

    /// Library name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Categories of a set, empty when the set does not exist.
    #[must_use]
    pub fn set(&self, set: &str) -> &[Category] {
        self.sets.get(set).map(Vec::as_slice).unwrap_or_default()
    }

    /// Names of the sets this library defines.
    pub fn set_names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    /// Replace this library's sets with those defined by `other`.
    fn overlay(&mut self, other: PatternLibrary) {
        for (set, categories) in other.sets {
            debug!(library = %self.name, set = %set, "overriding pattern set");
            self.sets.insert(set, categories);
        }
    }
}

/// Process-wide, read-only collection of pattern libraries.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    libraries: BTreeMap<String, PatternLibrary>,
}

impl Catalog {
    /// The built-in catalog.
    #[must_use]
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    /// Build a catalog from compiled libraries. Later libraries with the same
    /// name replace earlier ones.
    #[must_use]
    pub fn from_libraries(libraries: impl IntoIterator<Item = PatternLibrary>) -> Self {
        let libraries = libraries
            .into_iter()
            .map(|lib| (lib.name.clone(), lib))
            .collect();
        Self { libraries }
    }

    /// The built-in catalog with overrides from `[patterns] dir`, if set.
    ///
    /// # Errors
    /// Returns error if the configured directory does not exist or cannot be read.
    pub fn load(config: &PatternsConfig) -> Result<Self> {
        let mut catalog = Self::builtin().clone();
        if let Some(dir) = &config.dir {
            let loader = CatalogLoader::new(dir)?;
            let overrides = loader.load_all()?;
            catalog = catalog.with_overrides(overrides);
        }
        Ok(catalog)
    }

    /// Apply overrides set by set. Unknown libraries are added as-is.
    #[must_use]
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = PatternLibrary>) -> Self {
        for library in overrides {
            match self.libraries.get_mut(&library.name) {
                Some(existing) => existing.overlay(library),
                None => {
                    info!(library = %library.name, "adding pattern library");
                    self.libraries.insert(library.name.clone(), library);
                }
            }
        }
        self
    }

    /// Look up a library.
    #[must_use]
    pub fn library(&self, name: &str) -> Option<&PatternLibrary> {
        self.libraries.get(name)
    }

    /// Categories of `library`/`set`, empty when either is unknown.
    #[must_use]
    pub fn categories(&self, library: &str, set: &str) -> &[Category] {
        self.library(library)
            .map(|lib| lib.set(set))
            .unwrap_or_default()
    }

    /// Look up one category by name.
    #[must_use]
    pub fn category(&self, library: &str, set: &str, name: &str) -> Option<&Category> {
        self.categories(library, set)
            .iter()
            .find(|c| c.name() == name)
    }

    /// Classify `text` against `library`/`set`.
    #[must_use]
    pub fn classify(&self, library: &str, set: &str, text: &str) -> Classification {
        classify(text, self.categories(library, set))
    }

    /// Names of all libraries.
    pub fn library_names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_libraries_compile() {
        let catalog = Catalog::builtin();
        let names: Vec<_> = catalog.library_names().collect();
        assert_eq!(
            names,
            vec![
                libraries::COOKIE_CONSENT,
                libraries::ENDPOINTS,
                libraries::LEGAL_NOTICE,
                libraries::PRIVACY_POLICY,
                libraries::THIRD_PARTY,
                libraries::USER_RIGHTS,
            ]
        );
    }

    #[test]
    fn test_builtin_section_counts() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.categories(libraries::LEGAL_NOTICE, sets::SECTIONS).len(), 6);
        assert_eq!(catalog.categories(libraries::PRIVACY_POLICY, sets::SECTIONS).len(), 8);
        assert_eq!(catalog.categories(libraries::USER_RIGHTS, sets::SECTIONS).len(), 8);
        assert_eq!(catalog.categories(libraries::LEGAL_NOTICE, sets::LINKS).len(), 2);
    }

    #[test]
    fn test_cookie_feature_weights_sum_to_100() {
        let total: u32 = Catalog::builtin()
            .categories(libraries::COOKIE_CONSENT, sets::FEATURES)
            .iter()
            .map(Category::weight)
            .sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_legal_notice_link_categories() {
        let catalog = Catalog::builtin();
        let text = catalog
            .category(libraries::LEGAL_NOTICE, sets::LINKS, "link-text")
            .expect("link-text");
        let path = catalog
            .category(libraries::LEGAL_NOTICE, sets::LINKS, "url-path")
            .expect("url-path");

        assert!(text.matches("Mentions légales"));
        assert!(text.matches("Legal notice"));
        assert!(!text.matches("Contact"));
        assert!(path.matches("/mentions-legales"));
        assert!(path.matches("/fr/mentions-l%C3%A9gales/"));
        assert!(!path.matches("/blog/article"));
    }

    #[test]
    fn test_privacy_data_collection_requires_both_parts() {
        let catalog = Catalog::builtin();
        let category = catalog
            .category(libraries::PRIVACY_POLICY, sets::SECTIONS, "data-collection")
            .expect("data-collection");

        assert!(category.matches("Nous collectons les données personnelles suivantes"));
        assert!(!category.matches("Nous collectons des fonds pour une association"));
        assert!(!category.matches("Vos données personnelles sont importantes"));
    }

    #[test]
    fn test_unknown_set_is_empty() {
        let catalog = Catalog::builtin();
        assert!(catalog.categories("nope", sets::LINKS).is_empty());
        assert!(catalog.categories(libraries::LEGAL_NOTICE, "nope").is_empty());
        assert!(catalog.classify("nope", "nope", "text").found.is_empty());
    }

    #[test]
    fn test_overrides_replace_only_defined_sets() {
        let override_lib = PatternLibrary::from_toml_str(
            r#"
name = "legal-notice"

[[sections]]
name = "only"
patterns = ["unique"]
"#,
            "test",
        )
        .expect("parse override");

        let catalog = Catalog::builtin().clone().with_overrides([override_lib]);

        let sections = catalog.categories(libraries::LEGAL_NOTICE, sets::SECTIONS);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name(), "only");
        assert_eq!(catalog.categories(libraries::LEGAL_NOTICE, sets::LINKS).len(), 2);
        assert_eq!(Catalog::builtin().categories(libraries::LEGAL_NOTICE, sets::SECTIONS).len(), 6);
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let err = PatternLibrary::from_toml_str(
            r#"
name = "dup"

[[sections]]
name = "a"
patterns = ["x"]

[[sections]]
name = "a"
patterns = ["y"]
"#,
            "test",
        )
        .expect_err("duplicate names");
        assert!(err.to_string().contains("duplicate category 'a'"));
    }

    #[test]
    fn test_load_without_dir_is_builtin() {
        let catalog = Catalog::load(&PatternsConfig::default()).expect("load catalog");
        assert_eq!(catalog.library_names().count(), 6);
    }
}
