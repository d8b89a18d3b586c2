//! robots.txt parsing.
//!
//! The probes read robots.txt for what it reveals, not to decide what they
//! may crawl: every `Allow`/`Disallow` path of every group is kept, together
//! with the global `Sitemap:` directives.

/// Directives collected from a robots.txt file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    /// `Allow` paths, all groups
    pub allowed: Vec<String>,
    /// `Disallow` paths, all groups
    pub disallowed: Vec<String>,
    /// `Sitemap` URLs
    pub sitemaps: Vec<String>,
}

impl RobotsRules {
    /// `Allow` and `Disallow` paths in file order, deduplicated, with any
    /// trailing `*`/`$` wildcard removed.
    #[must_use]
    pub fn rule_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for raw in self.allowed.iter().chain(&self.disallowed) {
            let path = raw.trim_end_matches(['*', '$']);
            if path.is_empty() || path == "/" {
                continue;
            }
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }
        paths
    }
}

/// Parse a robots.txt body.
#[must_use]
pub fn parse_robots(txt: &str) -> RobotsRules {
    let mut rules = RobotsRules::default();

    for line in txt.lines() {
        // Remove comments
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key.trim().to_ascii_lowercase().as_str() {
            "allow" => rules.allowed.push(value.to_string()),
            "disallow" => rules.disallowed.push(value.to_string()),
            "sitemap" => rules.sitemaps.push(value.to_string()),
            _ => {}
        }
    }

    rules
}
