//! Allow-list HTML cleaning shared by both ends of the interchange boundary.
//!
//! Policy violations are never reported as errors: the offending subtree,
//! element wrapper, attribute or declaration is dropped and a `trace` event is
//! emitted. `sanitize(sanitize(x)) == sanitize(x)` holds for every input.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::dom::{DomNode, Element, serialize};
use crate::parser::parse_fragment;
use crate::style::{StyleMap, has_balanced_quotes};

/// Elements removed together with everything inside them.
pub const BLOCKED_TAGS: &[&str] = &[
    "script", "style", "object", "embed", "form", "input", "button", "textarea", "select", "link",
    "meta", "base", "head", "title", "noscript", "template", "frame", "frameset", "applet", "svg",
    "math",
];

pub const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "span", "strong", "b", "em", "i", "u", "s", "strike", "del", "ins", "mark", "code",
    "sub", "sup", "a", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "ul", "ol", "li", "pre",
    "hr", "img", "table", "thead", "tbody", "tfoot", "tr", "td", "th", "colgroup", "col", "div",
    "details", "summary", "time", "iframe", "figure",
];

pub const LINK_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "sms"];

pub const IFRAME_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
    "player.vimeo.com",
    "platform.twitter.com",
];

pub const STYLE_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "text-decoration",
    "text-align",
    "text-indent",
    "vertical-align",
    "line-height",
    "letter-spacing",
    "white-space",
    "width",
    "min-width",
    "max-width",
    "height",
    "min-height",
    "max-height",
    "margin",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
    "padding",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "border",
    "border-top",
    "border-right",
    "border-bottom",
    "border-left",
    "border-color",
    "border-style",
    "border-width",
    "border-collapse",
    "border-spacing",
    "table-layout",
    "display",
    "float",
    "flex",
    "flex-direction",
    "flex-wrap",
    "justify-content",
    "align-items",
    "gap",
    "column-gap",
    "row-gap",
    "grid-template-columns",
    "grid-column",
    "grid-row",
    "--table-border-style",
    "--table-layout",
    "--table-width",
    "--table-alignment",
    "--table-cell-padding",
];

const ALIGNMENTS: &[&str] = &["left", "center", "right", "full", "none"];
const LINK_TARGETS: &[&str] = &["_blank", "_self", "_parent", "_top"];

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("invalid digits regex"));

static CLASS_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("invalid class regex"));

static DATA_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data-[a-z0-9][a-z0-9-]*$").expect("invalid data attr regex"));

static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z][a-z0-9+.-]*):").expect("invalid scheme regex"));

static UNSAFE_STYLE_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)expression\s*\(|url\s*\(|javascript\s*:|\\|<|>")
        .expect("invalid style value regex")
});

static DEFAULT_SANITIZER: Lazy<Sanitizer> = Lazy::new(Sanitizer::default);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePolicy {
    pub link_schemes: Vec<String>,
    pub iframe_hosts: Vec<String>,
    pub style_properties: Vec<String>,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            link_schemes: LINK_SCHEMES.iter().map(|s| s.to_string()).collect(),
            iframe_hosts: IFRAME_HOSTS.iter().map(|s| s.to_string()).collect(),
            style_properties: STYLE_PROPERTIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    policy: SanitizePolicy,
}

/// Sanitizes `html` with the default policy.
pub fn sanitize(html: &str) -> String {
    DEFAULT_SANITIZER.sanitize(html)
}

/// Returns the href to keep, or `None` when the attribute must be dropped.
pub fn sanitize_link_href(href: &str) -> Option<String> {
    DEFAULT_SANITIZER.link_href(href)
}

/// Returns the image src to keep, or an empty string when it is not allowed.
pub fn sanitize_image_src(src: &str) -> String {
    let trimmed = src.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let normalized = normalize_url(trimmed);
    if normalized.starts_with("//") {
        return String::new();
    }

    match scheme_of(&normalized) {
        None => trimmed.to_string(),
        Some("http" | "https") => match Url::parse(trimmed) {
            Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => trimmed.to_string(),
            _ => String::new(),
        },
        Some(_) => String::new(),
    }
}

/// Filters a `style` attribute value. `None` means nothing survived.
pub fn sanitize_style(style: &str) -> Option<String> {
    DEFAULT_SANITIZER.style(style)
}

/// True when `value` may appear as a declaration value.
pub fn is_safe_style_value(value: &str) -> bool {
    !value.trim().is_empty() && !UNSAFE_STYLE_VALUE.is_match(value) && has_balanced_quotes(value)
}

impl Sanitizer {
    pub fn new(policy: SanitizePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SanitizePolicy {
        &self.policy
    }

    pub fn sanitize(&self, html: &str) -> String {
        serialize(&self.sanitize_nodes(parse_fragment(html)))
    }

    pub fn sanitize_nodes(&self, nodes: Vec<DomNode>) -> Vec<DomNode> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                DomNode::Text(text) => out.push(DomNode::Text(text)),
                DomNode::Comment(_) => {}
                DomNode::Element(el) => {
                    if BLOCKED_TAGS.contains(&el.tag.as_str()) {
                        tracing::trace!(tag = %el.tag, "sanitizer dropped blocked element");
                        continue;
                    }
                    if !ALLOWED_TAGS.contains(&el.tag.as_str()) {
                        tracing::trace!(tag = %el.tag, "sanitizer unwrapped element");
                        out.extend(self.sanitize_nodes(el.children));
                        continue;
                    }
                    if let Some(el) = self.element(el) {
                        out.push(DomNode::Element(el));
                    }
                }
            }
        }
        out
    }

    fn element(&self, mut el: Element) -> Option<Element> {
        let tag = el.tag.clone();
        let attrs = std::mem::take(&mut el.attrs);
        for attr in attrs {
            if let Some(value) = self.attribute(&tag, &attr.name, &attr.value) {
                el.attrs.push(crate::dom::Attribute {
                    name: attr.name,
                    value,
                });
            } else {
                tracing::trace!(tag = %tag, attr = %attr.name, "sanitizer dropped attribute");
            }
        }

        match tag.as_str() {
            "img" => {
                if el.attr("src").is_none_or(str::is_empty) {
                    tracing::trace!("sanitizer dropped image without an allowed src");
                    return None;
                }
            }
            "iframe" => {
                if el.attr("src").is_none() {
                    tracing::trace!("sanitizer dropped iframe outside the allow-list");
                    return None;
                }
                el.children.clear();
                return Some(el);
            }
            _ => {}
        }

        let children = std::mem::take(&mut el.children);
        el.children = self.sanitize_nodes(children);
        Some(el)
    }

    fn attribute(&self, tag: &str, name: &str, value: &str) -> Option<String> {
        if name.starts_with("on") {
            return None;
        }

        match name {
            "class" => return filter_classes(value),
            "style" => return self.style(value),
            "title" | "dir" | "lang" => return Some(value.to_string()),
            "data-alignment" => {
                return ALIGNMENTS.contains(&value).then(|| value.to_string());
            }
            _ => {}
        }

        match (tag, name) {
            ("a", "href") => self.link_href(value),
            ("a", "target") => LINK_TARGETS.contains(&value).then(|| value.to_string()),
            ("a", "rel") => Some(value.to_string()),
            ("img", "src") => {
                let src = sanitize_image_src(value);
                (!src.is_empty()).then_some(src)
            }
            ("img", "alt") => Some(value.to_string()),
            ("img" | "iframe", "width" | "height") => digits(value),
            ("img", "loading") => matches!(value, "lazy" | "eager").then(|| value.to_string()),
            ("iframe", "src") => self.iframe_src(value),
            ("iframe", "allow") => Some(value.to_string()),
            ("iframe", "allowfullscreen" | "frameborder") => Some(value.to_string()),
            ("td" | "th", "colspan" | "rowspan") => digits(value),
            ("col", "span") => digits(value),
            ("ol", "start") => digits(value),
            ("time", "datetime") => Some(value.to_string()),
            ("details", "open") => Some(String::new()),
            (_, name) if DATA_ATTR.is_match(name) => Some(value.to_string()),
            _ => None,
        }
    }

    pub fn link_href(&self, href: &str) -> Option<String> {
        let trimmed = href.trim();
        let normalized = normalize_url(trimmed);
        if normalized.starts_with("//") {
            return None;
        }
        if normalized.starts_with('/') {
            return Some(trimmed.to_string());
        }

        let scheme = scheme_of(&normalized)?;
        self.policy
            .link_schemes
            .iter()
            .any(|allowed| allowed == scheme)
            .then(|| trimmed.to_string())
    }

    fn iframe_src(&self, src: &str) -> Option<String> {
        let trimmed = src.trim();
        let url = Url::parse(trimmed).ok()?;
        if url.scheme() != "https" {
            return None;
        }
        let host = url.host_str()?;
        self.policy
            .iframe_hosts
            .iter()
            .any(|allowed| allowed == host)
            .then(|| trimmed.to_string())
    }

    pub fn style(&self, style: &str) -> Option<String> {
        let mut map = StyleMap::parse(style);
        map.retain(|prop, value| {
            let keep = self.policy.style_properties.iter().any(|p| p == prop)
                && is_safe_style_value(value);
            if !keep {
                tracing::trace!(prop, "sanitizer dropped style declaration");
            }
            keep
        });
        (!map.is_empty()).then(|| map.to_string())
    }
}

fn filter_classes(value: &str) -> Option<String> {
    let kept: Vec<&str> = value
        .split_ascii_whitespace()
        .filter(|token| CLASS_TOKEN.is_match(token))
        .collect();
    (!kept.is_empty()).then(|| kept.join(" "))
}

fn digits(value: &str) -> Option<String> {
    DIGITS.is_match(value).then(|| value.to_string())
}

// Lowercased with control characters and whitespace removed, so that
// `java\tscript:` and ` JAVASCRIPT:` classify like `javascript:`.
fn normalize_url(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control() && !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn scheme_of(normalized: &str) -> Option<&str> {
    let caps = SCHEME.captures(normalized)?;
    caps.get(1).map(|m| m.as_str())
}
