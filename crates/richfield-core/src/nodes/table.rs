use once_cell::sync::Lazy;
use regex::Regex;
use richfield_html::{Element, StyleMap, is_safe_style_value};
use serde::{Deserialize, Serialize};

pub const TABLE_BORDER_STYLE: &str = "--table-border-style";
pub const TABLE_LAYOUT: &str = "--table-layout";
pub const TABLE_WIDTH: &str = "--table-width";
pub const TABLE_ALIGNMENT: &str = "--table-alignment";
pub const TABLE_CELL_PADDING: &str = "--table-cell-padding";

const TABLE_STYLE_PROPERTIES: &[&str] = &[
    TABLE_BORDER_STYLE,
    TABLE_LAYOUT,
    TABLE_WIDTH,
    TABLE_ALIGNMENT,
    TABLE_CELL_PADDING,
];

/// Span limits browsers apply when laying out `colspan` and `rowspan`.
pub const MAX_COL_SPAN: u32 = 1000;
pub const MAX_ROW_SPAN: u32 = 65534;

/// Reads a span attribute. Overlong digit strings saturate at `max`.
fn parse_span(value: &str, max: u32) -> u32 {
    let value = value.trim();
    match value.parse::<u32>() {
        Ok(n) => n.clamp(1, max),
        Err(_) if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => max,
        Err(_) => 1,
    }
}

fn row_span_from_json<'de, D: serde::Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(u32::deserialize(d)?.clamp(1, MAX_ROW_SPAN))
}

fn col_span_from_json<'de, D: serde::Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(u32::deserialize(d)?.clamp(1, MAX_COL_SPAN))
}

static CSS_LENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(auto|\d+(\.\d+)?(px|%|em|rem))$").expect("invalid css length regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    /// Table-level settings encoded as CSS custom properties.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub style: String,
}

impl TableData {
    pub fn style_value(&self, prop: &str) -> Option<String> {
        StyleMap::parse(&self.style).get(prop).map(str::to_string)
    }

    /// Sets or clears one table property. Invalid values are ignored and
    /// reported as `false`.
    pub fn set_style_value(&mut self, prop: &str, value: Option<&str>) -> bool {
        if !TABLE_STYLE_PROPERTIES.contains(&prop) {
            return false;
        }
        let mut map = StyleMap::parse(&self.style);
        match value {
            None => {
                map.remove(prop);
            }
            Some(value) => {
                let Some(value) = validate_table_style(prop, value) else {
                    return false;
                };
                map.set(prop, value);
            }
        }
        self.style = map.to_string();
        true
    }

    pub(crate) fn from_element(el: &Element) -> Self {
        let mut data = TableData::default();
        let style = StyleMap::parse(el.attr("style").unwrap_or(""));
        for prop in TABLE_STYLE_PROPERTIES {
            if let Some(value) = style.get(prop) {
                data.set_style_value(prop, Some(value));
            }
        }
        data
    }

    pub(crate) fn export_element(&self) -> Element {
        let table = Element::new("table");
        let table = if self.style.is_empty() {
            table
        } else {
            table.with_attr("style", self.style.clone())
        };
        table.with_child(Element::new("tbody"))
    }
}

fn validate_table_style(prop: &str, value: &str) -> Option<String> {
    let value = value.trim().to_ascii_lowercase();
    let ok = match prop {
        TABLE_BORDER_STYLE => matches!(
            value.as_str(),
            "solid" | "dashed" | "dotted" | "double" | "none"
        ),
        TABLE_LAYOUT => matches!(value.as_str(), "auto" | "fixed"),
        TABLE_ALIGNMENT => matches!(value.as_str(), "left" | "center" | "right"),
        TABLE_WIDTH | TABLE_CELL_PADDING => CSS_LENGTH.is_match(&value),
        _ => false,
    };
    ok.then_some(value)
}

/// Which header axes a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderState {
    #[default]
    None,
    Row,
    Column,
    Both,
}

impl HeaderState {
    pub fn is_header(self) -> bool {
        self != HeaderState::None
    }

    pub fn has_row(self) -> bool {
        matches!(self, HeaderState::Row | HeaderState::Both)
    }

    pub fn has_column(self) -> bool {
        matches!(self, HeaderState::Column | HeaderState::Both)
    }

    pub fn from_axes(row: bool, column: bool) -> Self {
        match (row, column) {
            (false, false) => HeaderState::None,
            (true, false) => HeaderState::Row,
            (false, true) => HeaderState::Column,
            (true, true) => HeaderState::Both,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HeaderState::None => "none",
            HeaderState::Row => "row",
            HeaderState::Column => "column",
            HeaderState::Both => "both",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(HeaderState::None),
            "row" => Some(HeaderState::Row),
            "column" => Some(HeaderState::Column),
            "both" => Some(HeaderState::Both),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellData {
    #[serde(default)]
    pub header: HeaderState,
    #[serde(default = "one", deserialize_with = "row_span_from_json")]
    pub row_span: u32,
    #[serde(default = "one", deserialize_with = "col_span_from_json")]
    pub col_span: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

fn one() -> u32 {
    1
}

impl Default for TableCellData {
    fn default() -> Self {
        Self {
            header: HeaderState::None,
            row_span: 1,
            col_span: 1,
            width: None,
            background_color: None,
        }
    }
}

impl TableCellData {
    pub fn header(header: HeaderState) -> Self {
        Self {
            header,
            ..Self::default()
        }
    }

    pub(crate) fn from_element(el: &Element) -> Self {
        let span = |name: &str, max: u32| el.attr(name).map_or(1, |v| parse_span(v, max));
        let header = match el.attr("data-header-state").and_then(HeaderState::parse) {
            Some(state) => state,
            None if el.tag == "th" => HeaderState::Row,
            None => HeaderState::None,
        };
        let style = StyleMap::parse(el.attr("style").unwrap_or(""));
        let width = style
            .get("width")
            .and_then(|w| w.strip_suffix("px"))
            .and_then(|w| w.trim().parse::<u32>().ok());
        let background_color = style
            .get("background-color")
            .filter(|v| is_safe_style_value(v))
            .map(str::to_string);

        Self {
            header,
            row_span: span("rowspan", MAX_ROW_SPAN),
            col_span: span("colspan", MAX_COL_SPAN),
            width,
            background_color,
        }
    }

    pub(crate) fn export_element(&self) -> Element {
        let mut el = if self.header.is_header() {
            Element::new("th").with_attr("data-header-state", self.header.as_str())
        } else {
            Element::new("td")
        };
        if self.col_span > 1 {
            el.set_attr("colspan", self.col_span.to_string());
        }
        if self.row_span > 1 {
            el.set_attr("rowspan", self.row_span.to_string());
        }
        let mut style = StyleMap::new();
        if let Some(width) = self.width {
            style.set("width", format!("{width}px"));
        }
        if let Some(color) = &self.background_color {
            style.set("background-color", color.clone());
        }
        if !style.is_empty() {
            el.set_attr("style", style.to_string());
        }
        el
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_style_rejects_unknown_values() {
        let mut table = TableData::default();
        assert!(table.set_style_value(TABLE_BORDER_STYLE, Some("dashed")));
        assert!(table.set_style_value(TABLE_WIDTH, Some("100%")));
        assert!(!table.set_style_value(TABLE_WIDTH, Some("expression(1)")));
        assert!(!table.set_style_value("color", Some("red")));
        assert_eq!(
            table.style,
            "--table-border-style: dashed; --table-width: 100%;"
        );
    }

    #[test]
    fn th_without_state_is_a_row_header() {
        let el = Element::new("th").with_attr("colspan", "2");
        let cell = TableCellData::from_element(&el);
        assert_eq!(cell.header, HeaderState::Row);
        assert_eq!(cell.col_span, 2);
        assert_eq!(cell.row_span, 1);
    }

    #[test]
    fn spans_are_capped_at_browser_limits() {
        let el = Element::new("td")
            .with_attr("colspan", "4000000000")
            .with_attr("rowspan", "99999999999");
        let cell = TableCellData::from_element(&el);
        assert_eq!((cell.col_span, cell.row_span), (MAX_COL_SPAN, MAX_ROW_SPAN));

        let el = Element::new("td").with_attr("colspan", "0").with_attr("rowspan", "3");
        let cell = TableCellData::from_element(&el);
        assert_eq!((cell.col_span, cell.row_span), (1, 3));
    }
}
