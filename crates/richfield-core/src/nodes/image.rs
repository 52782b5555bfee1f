use richfield_html::{DomNode, Element, sanitize_image_src, sanitize_link_href};
use serde::{Deserialize, Serialize};

/// Image width or height. Zero and `"inherit"` both mean [`Dimension::Inherit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "DimensionRepr", into = "DimensionRepr")]
pub enum Dimension {
    #[default]
    Inherit,
    Px(u32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Number(u64),
    Text(String),
}

impl From<DimensionRepr> for Dimension {
    fn from(value: DimensionRepr) -> Self {
        match value {
            DimensionRepr::Number(n) => Dimension::from_px(u32::try_from(n).unwrap_or(0)),
            DimensionRepr::Text(s) => Dimension::parse(&s),
        }
    }
}

impl From<Dimension> for DimensionRepr {
    fn from(value: Dimension) -> Self {
        match value {
            Dimension::Inherit => DimensionRepr::Text("inherit".to_string()),
            Dimension::Px(n) => DimensionRepr::Number(u64::from(n)),
        }
    }
}

impl Dimension {
    pub fn from_px(px: u32) -> Self {
        if px == 0 {
            Dimension::Inherit
        } else {
            Dimension::Px(px)
        }
    }

    /// Non-numeric input falls back to `Inherit`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let digits = value.strip_suffix("px").unwrap_or(value);
        digits
            .parse::<u32>()
            .map(Dimension::from_px)
            .unwrap_or(Dimension::Inherit)
    }

    pub fn px(self) -> Option<u32> {
        match self {
            Dimension::Inherit => None,
            Dimension::Px(n) => Some(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageAlignment {
    #[default]
    None,
    Left,
    Center,
    Right,
    Full,
}

impl ImageAlignment {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageAlignment::None => "none",
            ImageAlignment::Left => "left",
            ImageAlignment::Center => "center",
            ImageAlignment::Right => "right",
            ImageAlignment::Full => "full",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(ImageAlignment::None),
            "left" => Some(ImageAlignment::Left),
            "center" => Some(ImageAlignment::Center),
            "right" => Some(ImageAlignment::Right),
            "full" => Some(ImageAlignment::Full),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageLoading {
    #[default]
    Lazy,
    Eager,
}

impl ImageLoading {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageLoading::Lazy => "lazy",
            ImageLoading::Eager => "eager",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lazy" => Some(ImageLoading::Lazy),
            "eager" => Some(ImageLoading::Eager),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub src: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub width: Dimension,
    #[serde(default)]
    pub height: Dimension,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub css_classes: String,
    #[serde(default)]
    pub alignment: ImageAlignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
    #[serde(default)]
    pub loading: ImageLoading,
}

impl ImageData {
    /// Returns `None` when `src` does not survive sanitization.
    pub fn new(src: &str, alt_text: impl Into<String>) -> Option<Self> {
        let src = sanitize_image_src(src);
        if src.is_empty() {
            return None;
        }
        Some(Self {
            src,
            alt_text: alt_text.into(),
            ..Self::default()
        })
    }

    /// Keeps only class tokens made of `[A-Za-z0-9_-]`.
    pub fn set_css_classes(&mut self, classes: &str) {
        self.css_classes = classes
            .split_ascii_whitespace()
            .filter(|token| {
                token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            })
            .collect::<Vec<_>>()
            .join(" ");
    }

    /// Sets the link, dropping it when the url is not an allowed href.
    pub fn set_link(&mut self, url: Option<&str>, target: Option<&str>) {
        self.link_url = url.and_then(sanitize_link_href);
        self.link_target = match &self.link_url {
            Some(_) => target
                .filter(|t| matches!(*t, "_blank" | "_self" | "_parent" | "_top"))
                .map(str::to_string),
            None => None,
        };
    }

    pub(crate) fn export_image_element(&self) -> Element {
        let mut img = Element::new("img")
            .with_attr("src", self.src.clone())
            .with_attr("alt", self.alt_text.clone());
        if let Some(width) = self.width.px() {
            img.set_attr("width", width.to_string());
        }
        if let Some(height) = self.height.px() {
            img.set_attr("height", height.to_string());
        }
        if !self.css_classes.is_empty() {
            img.set_attr("class", self.css_classes.clone());
        }
        img.set_attr("data-alignment", self.alignment.as_str());
        img.set_attr("loading", self.loading.as_str());
        img
    }

    pub(crate) fn export_dom(&self) -> Vec<DomNode> {
        let img = self.export_image_element();
        match &self.link_url {
            Some(url) => {
                let link = Element::new("a")
                    .with_attr("href", url.clone())
                    .with_opt_attr("target", self.link_target.clone())
                    .with_opt_attr(
                        "rel",
                        (self.link_target.as_deref() == Some("_blank"))
                            .then_some("noopener noreferrer"),
                    )
                    .with_child(img);
                vec![link.into()]
            }
            None => vec![img.into()],
        }
    }

    /// Reads an `<img>`, optionally wrapped in a link. `None` when the src is not allowed.
    pub(crate) fn from_element(img: &Element, link: Option<&Element>) -> Option<Self> {
        let mut data = ImageData::new(img.attr("src")?, img.attr("alt").unwrap_or(""))?;
        data.width = img.attr("width").map(Dimension::parse).unwrap_or_default();
        data.height = img.attr("height").map(Dimension::parse).unwrap_or_default();
        data.set_css_classes(img.attr("class").unwrap_or(""));
        data.alignment = img
            .attr("data-alignment")
            .and_then(ImageAlignment::parse)
            .unwrap_or_default();
        data.loading = img
            .attr("loading")
            .and_then(ImageLoading::parse)
            .unwrap_or_default();
        if let Some(link) = link {
            data.set_link(link.attr("href"), link.attr("target"));
        }
        Some(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_is_inherit() {
        assert_eq!(Dimension::from_px(0), Dimension::Inherit);
        assert_eq!(Dimension::parse("120px"), Dimension::Px(120));
        assert_eq!(Dimension::parse("auto"), Dimension::Inherit);
        let json = serde_json::to_value(Dimension::Inherit).unwrap();
        assert_eq!(json, serde_json::json!("inherit"));
        let back: Dimension = serde_json::from_value(serde_json::json!(0)).unwrap();
        assert_eq!(back, Dimension::Inherit);
    }

    #[test]
    fn rejects_data_urls() {
        assert!(ImageData::new("data:image/png;base64,AAA", "x").is_none());
        assert!(ImageData::new("/uploads/a.png", "x").is_some());
    }
}
