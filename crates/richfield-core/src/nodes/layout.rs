use once_cell::sync::Lazy;
use regex::Regex;
use richfield_html::{Element, StyleMap};
use serde::{Deserialize, Serialize};

pub const MIN_LAYOUT_COLUMNS: u8 = 2;
pub const MAX_LAYOUT_COLUMNS: u8 = 4;

static FR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?fr$").expect("invalid fr token regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutData {
    pub columns: u8,
    pub template: String,
}

impl LayoutData {
    /// Column count is clamped to 2..=4; an invalid template falls back to equal columns.
    pub fn new(columns: u8, template: Option<&str>) -> Self {
        let columns = columns.clamp(MIN_LAYOUT_COLUMNS, MAX_LAYOUT_COLUMNS);
        let template = template
            .map(str::trim)
            .filter(|t| is_valid_template(t, columns))
            .map(|t| t.split_ascii_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_else(|| default_template(columns));
        Self { columns, template }
    }

    pub(crate) fn from_element(el: &Element) -> Self {
        let style = StyleMap::parse(el.attr("style").unwrap_or(""));
        let template = style.get("grid-template-columns");
        let saturate = |n: usize| u8::try_from(n).unwrap_or(MAX_LAYOUT_COLUMNS);
        let columns = el
            .attr("data-columns")
            .and_then(|c| c.trim().parse::<usize>().ok())
            .or_else(|| template.map(|t| t.split_ascii_whitespace().count()))
            .map(saturate)
            .unwrap_or(MIN_LAYOUT_COLUMNS);
        Self::new(columns, template)
    }

    pub(crate) fn export_element(&self) -> Element {
        Element::new("div")
            .with_attr("class", "rf-layout")
            .with_attr("data-columns", self.columns.to_string())
            .with_attr(
                "style",
                format!("grid-template-columns: {};", self.template),
            )
    }
}

pub fn default_template(columns: u8) -> String {
    vec!["1fr"; usize::from(columns)].join(" ")
}

pub fn is_valid_template(template: &str, columns: u8) -> bool {
    let tokens: Vec<&str> = template.split_ascii_whitespace().collect();
    tokens.len() == usize::from(columns) && tokens.iter().all(|t| FR_TOKEN.is_match(t))
}

pub(crate) fn layout_item_element() -> Element {
    Element::new("div").with_attr("class", "rf-layout-item")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_clamped_and_template_validated() {
        let layout = LayoutData::new(7, Some("1fr 2fr"));
        assert_eq!(layout.columns, 4);
        assert_eq!(layout.template, "1fr 1fr 1fr 1fr");

        let layout = LayoutData::new(2, Some("1fr  2.5fr"));
        assert_eq!(layout.template, "1fr 2.5fr");

        let layout = LayoutData::new(3, Some("1fr url(x) 1fr"));
        assert_eq!(layout.template, "1fr 1fr 1fr");
    }

    #[test]
    fn oversized_column_counts_saturate() {
        let many = vec!["1fr"; 258].join(" ");
        let el = Element::new("div").with_attr("style", format!("grid-template-columns: {many};"));
        assert_eq!(LayoutData::from_element(&el).columns, MAX_LAYOUT_COLUMNS);

        let el = Element::new("div").with_attr("data-columns", "300");
        let layout = LayoutData::from_element(&el);
        assert_eq!(layout.columns, MAX_LAYOUT_COLUMNS);
        assert_eq!(layout.template, "1fr 1fr 1fr 1fr");
    }
}
