//! HTTP `Link` header parsing (`<url>; rel="x", <url2>; rel=y`).

/// One entry of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Target reference, as written between `<` and `>`
    pub target: String,
    /// Relation types, lower-cased
    pub rels: Vec<String>,
}

/// Parse a `Link` header value. Entries without a `<...>` target are skipped.
#[must_use]
pub fn parse_link_header(value: &str) -> Vec<LinkEntry> {
    split_entries(value)
        .into_iter()
        .filter_map(|entry| parse_entry(&entry))
        .collect()
}

/// Split on commas that are outside `<...>` and quoted strings.
fn split_entries(value: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut in_target = false;
    let mut in_quotes = false;

    for c in value.chars() {
        match c {
            '<' if !in_quotes => in_target = true,
            '>' if !in_quotes => in_target = false,
            '"' if !in_target => in_quotes = !in_quotes,
            ',' if !in_target && !in_quotes => {
                entries.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    entries.push(current);
    entries
}

fn parse_entry(entry: &str) -> Option<LinkEntry> {
    let entry = entry.trim();
    let rest = entry.strip_prefix('<')?;
    let (target, params) = rest.split_once('>')?;
    let target = target.trim();
    if target.is_empty() {
        return None;
    }

    let mut rels = Vec::new();
    for param in params.split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("rel") {
            rels.extend(
                value
                    .trim()
                    .trim_matches('"')
                    .split_ascii_whitespace()
                    .map(str::to_ascii_lowercase),
            );
        }
    }

    Some(LinkEntry {
        target: target.to_string(),
        rels,
    })
}
