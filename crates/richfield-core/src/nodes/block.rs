use richfield_html::{Element, StyleMap};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
    Start,
    End,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
            TextAlign::Start => "start",
            TextAlign::End => "end",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            "start" => Some(TextAlign::Start),
            "end" => Some(TextAlign::End),
            _ => None,
        }
    }

    pub(crate) fn from_element(el: &Element) -> Option<Self> {
        let style = StyleMap::parse(el.attr("style").unwrap_or(""));
        style
            .get("text-align")
            .and_then(Self::parse)
            .or_else(|| el.attr("align").and_then(Self::parse))
    }
}

fn with_align(el: Element, align: Option<TextAlign>) -> Element {
    match align {
        Some(align) => el.with_attr("style", format!("text-align: {};", align.as_str())),
        None => el,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

impl ParagraphData {
    pub(crate) fn export_element(&self) -> Element {
        with_align(Element::new("p"), self.align)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingData {
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

impl HeadingData {
    pub fn new(level: u8) -> Self {
        Self {
            level: level.clamp(1, 6),
            align: None,
        }
    }

    pub(crate) fn export_element(&self) -> Element {
        with_align(
            Element::new(format!("h{}", self.level.clamp(1, 6))),
            self.align,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[default]
    Bullet,
    Number,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Bullet => "bullet",
            ListKind::Number => "number",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bullet" | "ul" => Some(ListKind::Bullet),
            "number" | "ol" => Some(ListKind::Number),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListData {
    pub kind: ListKind,
    #[serde(default = "default_list_start")]
    pub start: u32,
}

fn default_list_start() -> u32 {
    1
}

impl ListData {
    pub fn new(kind: ListKind) -> Self {
        Self { kind, start: 1 }
    }

    pub(crate) fn export_element(&self) -> Element {
        match self.kind {
            ListKind::Bullet => Element::new("ul"),
            ListKind::Number if self.start != 1 => {
                Element::new("ol").with_attr("start", self.start.to_string())
            }
            ListKind::Number => Element::new("ol"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkData {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl LinkData {
    /// Internal links (leading `/`) open in place; everything else opens in a new tab.
    pub fn with_default_target(url: impl Into<String>) -> Self {
        let url = url.into();
        if is_internal_url(&url) {
            Self {
                url,
                ..Self::default()
            }
        } else {
            Self {
                url,
                target: Some("_blank".to_string()),
                rel: Some("noopener noreferrer".to_string()),
                title: None,
            }
        }
    }

    pub(crate) fn export_element(&self) -> Element {
        let href = (!self.url.is_empty()).then(|| self.url.clone());
        Element::new("a")
            .with_opt_attr("href", href)
            .with_opt_attr("target", self.target.clone())
            .with_opt_attr("rel", self.rel.clone())
            .with_opt_attr("title", self.title.clone())
    }
}

pub fn is_internal_url(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}
