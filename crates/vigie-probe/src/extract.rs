//! Markup extraction.
//!
//! The origin page is parsed once into a [`PageSnapshot`] of owned values, so
//! that the parsed DOM never lives across an `.await`.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::fmt;
use url::Url;

static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

static RESOURCES: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "img[src], script[src], link[href], iframe[src], frame[src], video[src], \
         audio[src], source[src], object[data], embed[src], form[action]",
    )
    .expect("valid selector")
});

static METAS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[content]").expect("valid selector"));

static SCRIPTS: Lazy<Selector> = Lazy::new(|| Selector::parse("script").expect("valid selector"));

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("valid selector"));

static MARKED: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[id], [class]").expect("valid selector"));

static CONSENT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)cookie|consent|gdpr|rgpd|\bcmp\b|privacy-banner").expect("valid regex")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Kind of embedded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// `<img src>`
    Image,
    /// `<script src>`
    Script,
    /// `<link rel="stylesheet" href>`
    Stylesheet,
    /// `<iframe src>` / `<frame src>`
    Iframe,
    /// `<video>`, `<audio>`, `<source>`
    Media,
    /// `<object data>` / `<embed src>`
    Object,
    /// `<form action>`
    Form,
}

impl ResourceKind {
    /// Stable name, identical to the serialized value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::Iframe => "iframe",
            Self::Media => "media",
            Self::Object => "object",
            Self::Form => "form",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hyperlink of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// `href` as written
    pub href: String,
    /// `href` resolved against the page URL
    pub url: Option<Url>,
    /// Visible text, whitespace-collapsed
    pub text: String,
    /// `title` attribute
    pub title: Option<String>,
    /// `aria-label` attribute
    pub aria_label: Option<String>,
    /// Inside the footer region
    pub in_footer: bool,
}

impl Anchor {
    /// Text + title + aria-label + href, the haystack for link-text categories.
    #[must_use]
    pub fn match_text(&self) -> String {
        [
            Some(self.text.as_str()),
            self.title.as_deref(),
            self.aria_label.as_deref(),
            Some(self.href.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// An embedded resource reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Resource kind
    pub kind: ResourceKind,
    /// Attribute value as written
    pub raw: String,
    /// Attribute value resolved against the page URL
    pub url: Option<Url>,
}

impl ResourceRef {
    /// Written with an explicit `http://` scheme.
    #[must_use]
    pub fn is_explicit_http(&self) -> bool {
        self.raw
            .trim_start()
            .get(..7)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http://"))
    }
}

/// A `<meta>` tag with content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    /// `name`, `property`, `http-equiv` or `itemprop`, lower-cased
    pub key: Option<String>,
    /// `content` attribute
    pub content: String,
}

/// Owned extraction of one HTML document.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// Base URL used to resolve references
    pub base: Url,
    /// Hyperlinks in document order
    pub anchors: Vec<Anchor>,
    /// Embedded resources in document order
    pub resources: Vec<ResourceRef>,
    /// Meta tags in document order
    pub metas: Vec<MetaTag>,
    /// `href` of the first `<link rel="manifest">`
    pub manifest_href: Option<String>,
    /// Visible body text
    pub text: String,
    /// Text and markers of consent-banner-like regions
    pub consent_text: String,
    /// Concatenated inline script bodies
    pub inline_scripts: String,
}

impl PageSnapshot {
    /// Parse `html`, resolving references against `base`.
    #[must_use]
    pub fn parse(html: &str, base: &Url) -> Self {
        let document = Html::parse_document(html);

        let anchors = document
            .select(&ANCHORS)
            .filter_map(|el| {
                let href = el.value().attr("href")?.trim().to_string();
                Some(Anchor {
                    url: base.join(&href).ok(),
                    text: element_text(el),
                    title: non_empty_attr(el, "title"),
                    aria_label: non_empty_attr(el, "aria-label"),
                    in_footer: in_footer(el),
                    href,
                })
            })
            .collect();

        let mut resources = Vec::new();
        let mut manifest_href = None;
        for el in document.select(&RESOURCES) {
            let tag = el.value().name();
            let (kind, attr) = match tag {
                "img" => (ResourceKind::Image, "src"),
                "script" => (ResourceKind::Script, "src"),
                "iframe" | "frame" => (ResourceKind::Iframe, "src"),
                "video" | "audio" | "source" => (ResourceKind::Media, "src"),
                "object" => (ResourceKind::Object, "data"),
                "embed" => (ResourceKind::Object, "src"),
                "form" => (ResourceKind::Form, "action"),
                "link" => {
                    if has_rel(el, "manifest") && manifest_href.is_none() {
                        manifest_href = non_empty_attr(el, "href");
                    }
                    if !has_rel(el, "stylesheet") {
                        continue;
                    }
                    (ResourceKind::Stylesheet, "href")
                }
                _ => continue,
            };
            let Some(raw) = non_empty_attr(el, attr) else {
                continue;
            };
            resources.push(ResourceRef {
                kind,
                url: base.join(&raw).ok(),
                raw,
            });
        }

        let metas = document
            .select(&METAS)
            .filter_map(|el| {
                let content = non_empty_attr(el, "content")?;
                let key = ["name", "property", "http-equiv", "itemprop"]
                    .iter()
                    .find_map(|attr| el.value().attr(attr))
                    .map(|k| k.trim().to_ascii_lowercase());
                Some(MetaTag { key, content })
            })
            .collect();

        let text = document
            .select(&BODY)
            .next()
            .map_or_else(|| visible_text(document.root_element()), visible_text);

        let inline_scripts = document
            .select(&SCRIPTS)
            .filter(|el| el.value().attr("src").is_none())
            .map(|el| el.text().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            base: base.clone(),
            anchors,
            resources,
            metas,
            manifest_href,
            text,
            consent_text: consent_text(&document),
            inline_scripts,
        }
    }

    /// The manifest reference resolved against the base URL.
    #[must_use]
    pub fn manifest_url(&self) -> Option<Url> {
        self.manifest_href
            .as_deref()
            .and_then(|href| self.base.join(href).ok())
    }
}

/// Visible text of an HTML document (script, style and template content excluded).
#[must_use]
pub fn document_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&BODY)
        .next()
        .map_or_else(|| visible_text(document.root_element()), visible_text)
}

/// Collapse runs of whitespace into single spaces.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            matches!(
                ancestor.value(),
                Node::Element(e) if matches!(e.name(), "script" | "style" | "noscript" | "template")
            )
        });
        if !hidden {
            parts.push(text);
        }
    }
    collapse_whitespace(&parts.join(" "))
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn non_empty_attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn has_rel(el: ElementRef<'_>, rel: &str) -> bool {
    el.value()
        .attr("rel")
        .is_some_and(|value| value.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case(rel)))
}

fn in_footer(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(is_footer_region)
}

fn is_footer_region(el: ElementRef<'_>) -> bool {
    let value = el.value();
    value.name() == "footer"
        || value
            .attr("role")
            .is_some_and(|role| role.eq_ignore_ascii_case("contentinfo"))
        || value
            .id()
            .is_some_and(|id| id.to_ascii_lowercase().contains("footer"))
        || value
            .classes()
            .any(|class| class.to_ascii_lowercase().contains("footer"))
}

fn consent_marker(el: ElementRef<'_>) -> Option<String> {
    let value = el.value();
    let marker = [value.id(), value.attr("class")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    CONSENT_MARKER.is_match(&marker).then_some(marker)
}

/// Text of the outermost consent-like regions, prefixed with their id/class
/// markers.
fn consent_text(document: &Html) -> String {
    let mut regions = Vec::new();
    for el in document.select(&MARKED) {
        let Some(marker) = consent_marker(el) else {
            continue;
        };
        let nested = el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| consent_marker(ancestor).is_some());
        if nested {
            continue;
        }
        regions.push(format!("{marker} {}", visible_text(el)));
    }
    regions.join("\n")
}
