use richfield_html::{DomNode, Element, StyleMap, is_safe_style_value};
use serde::{Deserialize, Serialize};

pub const IS_BOLD: u32 = 1;
pub const IS_ITALIC: u32 = 1 << 1;
pub const IS_STRIKETHROUGH: u32 = 1 << 2;
pub const IS_UNDERLINE: u32 = 1 << 3;
pub const IS_CODE: u32 = 1 << 4;
pub const IS_SUBSCRIPT: u32 = 1 << 5;
pub const IS_SUPERSCRIPT: u32 = 1 << 6;

pub const IS_DIRECTIONLESS: u32 = 1;
pub const IS_UNMERGEABLE: u32 = 1 << 1;

/// Inline style properties a text run may carry.
pub const TEXT_STYLE_PROPERTIES: &[&str] = &["color", "background-color", "font-family", "font-size"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Bold,
    Italic,
    Strikethrough,
    Underline,
    Code,
    Subscript,
    Superscript,
}

impl TextFormat {
    /// Outermost first, in export nesting order.
    pub const ALL: [TextFormat; 7] = [
        TextFormat::Bold,
        TextFormat::Italic,
        TextFormat::Strikethrough,
        TextFormat::Underline,
        TextFormat::Code,
        TextFormat::Subscript,
        TextFormat::Superscript,
    ];

    pub fn bit(self) -> u32 {
        match self {
            TextFormat::Bold => IS_BOLD,
            TextFormat::Italic => IS_ITALIC,
            TextFormat::Strikethrough => IS_STRIKETHROUGH,
            TextFormat::Underline => IS_UNDERLINE,
            TextFormat::Code => IS_CODE,
            TextFormat::Subscript => IS_SUBSCRIPT,
            TextFormat::Superscript => IS_SUPERSCRIPT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextFormat::Bold => "bold",
            TextFormat::Italic => "italic",
            TextFormat::Strikethrough => "strikethrough",
            TextFormat::Underline => "underline",
            TextFormat::Code => "code",
            TextFormat::Subscript => "subscript",
            TextFormat::Superscript => "superscript",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    fn tag(self) -> &'static str {
        match self {
            TextFormat::Bold => "strong",
            TextFormat::Italic => "em",
            TextFormat::Strikethrough => "s",
            TextFormat::Underline => "u",
            TextFormat::Code => "code",
            TextFormat::Subscript => "sub",
            TextFormat::Superscript => "sup",
        }
    }
}

/// A run of text with a format bitmask, an inline style string and detail flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    pub text: String,
    #[serde(default)]
    pub format: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub style: String,
    #[serde(default)]
    pub detail: u32,
}

impl TextData {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.set_format(format, true);
        self
    }

    pub fn with_style(mut self, style: &str) -> Self {
        self.style = normalize_text_style(style);
        self
    }

    pub fn has_format(&self, format: TextFormat) -> bool {
        self.format & format.bit() != 0
    }

    /// Subscript and superscript exclude each other.
    pub fn set_format(&mut self, format: TextFormat, on: bool) {
        if on {
            self.format |= format.bit();
            match format {
                TextFormat::Subscript => self.format &= !IS_SUPERSCRIPT,
                TextFormat::Superscript => self.format &= !IS_SUBSCRIPT,
                _ => {}
            }
        } else {
            self.format &= !format.bit();
        }
    }

    pub fn toggle_format(&mut self, format: TextFormat) {
        let on = !self.has_format(format);
        self.set_format(format, on);
    }

    pub fn style_map(&self) -> StyleMap {
        StyleMap::parse(&self.style)
    }

    pub fn style_value(&self, prop: &str) -> Option<String> {
        self.style_map().get(prop).map(str::to_string)
    }

    /// Sets or clears one style property. Properties outside the text allow-list and
    /// unsafe values are ignored.
    pub fn set_style_property(&mut self, prop: &str, value: Option<&str>) {
        if !TEXT_STYLE_PROPERTIES.contains(&prop) {
            return;
        }
        let mut map = self.style_map();
        match value {
            Some(value) if is_safe_style_value(value) => map.set(prop, value.trim()),
            Some(_) => return,
            None => {
                map.remove(prop);
            }
        }
        self.style = map.to_string();
    }

    /// Adds properties from `other` that this run does not set yet.
    pub fn merge_style_missing(&mut self, other: &StyleMap) {
        let mut map = self.style_map();
        map.merge_missing(other);
        self.style = normalize_text_style(&map.to_string());
    }

    pub fn is_unmergeable(&self) -> bool {
        self.detail & IS_UNMERGEABLE != 0
    }

    /// True when two runs can be joined into one.
    pub fn same_marks(&self, other: &TextData) -> bool {
        !self.is_unmergeable()
            && !other.is_unmergeable()
            && self.format == other.format
            && self.style == other.style
            && self.detail == other.detail
    }

    pub(crate) fn export_dom(&self) -> Vec<DomNode> {
        if self.text.is_empty() {
            return Vec::new();
        }

        let mut node = DomNode::text(self.text.clone());
        for format in TextFormat::ALL.into_iter().rev() {
            if self.has_format(format) {
                node = Element::new(format.tag()).with_child(node).into();
            }
        }
        if !self.style.is_empty() {
            node = Element::new("span")
                .with_attr("style", self.style.clone())
                .with_child(node)
                .into();
        }
        vec![node]
    }
}

/// Keeps only allow-listed, safe declarations, in canonical `prop: value;` form.
pub fn normalize_text_style(style: &str) -> String {
    let mut map = StyleMap::parse(style);
    map.retain(|prop, value| TEXT_STYLE_PROPERTIES.contains(&prop) && is_safe_style_value(value));
    map.to_string()
}

/// Reads the text formats implied by an element's inline style.
pub(crate) fn formats_from_style(style: &StyleMap) -> Vec<TextFormat> {
    let mut formats = Vec::new();
    if let Some(weight) = style.get("font-weight") {
        let bold = weight == "bold"
            || weight == "bolder"
            || weight.parse::<u32>().is_ok_and(|w| w >= 600);
        if bold {
            formats.push(TextFormat::Bold);
        }
    }
    if style.get("font-style") == Some("italic") {
        formats.push(TextFormat::Italic);
    }
    if let Some(decoration) = style.get("text-decoration") {
        if decoration.contains("underline") {
            formats.push(TextFormat::Underline);
        }
        if decoration.contains("line-through") {
            formats.push(TextFormat::Strikethrough);
        }
    }
    match style.get("vertical-align") {
        Some("sub") => formats.push(TextFormat::Subscript),
        Some("super") => formats.push(TextFormat::Superscript),
        _ => {}
    }
    formats
}
