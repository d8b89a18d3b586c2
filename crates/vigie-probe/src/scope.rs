//! Domain scope filter and registrable-domain helpers.
//!
//! Artifact-discovery probes only accept candidates that belong to the probed
//! site. A host is in scope when it equals the origin host, is a subdomain of
//! it, or is a parent of it (so `example.com` stays in scope for a probe
//! started on `www.example.com`). Both containment checks are anchored on a
//! dot, and a public suffix is never accepted as a parent.

use url::{ParseError, Url};

/// Whether `candidate` (absolute, scheme-relative or relative) belongs to
/// `origin_domain`.
///
/// Relative references are in scope. Malformed URLs and host-less schemes
/// (`mailto:`, `javascript:`, `tel:`) are not.
#[must_use]
pub fn is_same_scope(candidate: &str, origin_domain: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return false;
    }

    let parsed = if candidate.starts_with("//") {
        Url::parse(&format!("https:{candidate}"))
    } else {
        Url::parse(candidate)
    };

    match parsed {
        Ok(url) => {
            if !matches!(url.scheme(), "http" | "https") {
                return false;
            }
            url.host_str()
                .is_some_and(|host| host_in_scope(host, origin_domain))
        }
        Err(ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

/// Host-level scope check.
#[must_use]
pub fn host_in_scope(host: &str, origin_domain: &str) -> bool {
    let host = normalize_host(host);
    let origin = normalize_host(origin_domain);
    if host.is_empty() || origin.is_empty() {
        return false;
    }

    host == origin
        || host.ends_with(&format!(".{origin}"))
        || (origin.ends_with(&format!(".{host}")) && !is_public_suffix(&host))
}

/// Whether `host` is itself a public suffix (`com`, `co.uk`, `github.io`).
#[must_use]
pub fn is_public_suffix(host: &str) -> bool {
    let host = normalize_host(host);
    psl::suffix_str(&host).is_some_and(|suffix| suffix == host)
}

/// Registrable domain (public suffix plus one label) of `host`.
#[must_use]
pub fn registrable_domain(host: &str) -> Option<String> {
    let host = normalize_host(host);
    psl::domain_str(&host).map(str::to_string)
}

/// Whether two hosts are the same site modulo a leading `www.`.
#[must_use]
pub fn same_host_ignoring_www(a: &str, b: &str) -> bool {
    let a = normalize_host(a);
    let b = normalize_host(b);
    strip_www(&a) == strip_www(&b)
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}
