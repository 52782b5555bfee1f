//! Node variants and their static HTML form.

mod block;
mod collapsible;
mod date;
mod embed;
mod image;
mod layout;
mod table;
mod text;

pub use block::*;
pub use collapsible::CollapsibleData;
pub use date::*;
pub use embed::*;
pub use image::*;
pub use layout::{
    LayoutData, MAX_LAYOUT_COLUMNS, MIN_LAYOUT_COLUMNS, default_template, is_valid_template,
};
pub use table::*;
pub use text::*;

pub(crate) use text::formats_from_style;

use richfield_html::{DomNode, Element};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeData {
    Root,
    Paragraph(ParagraphData),
    Heading(HeadingData),
    Quote,
    List(ListData),
    ListItem,
    Link(LinkData),
    LineBreak,
    #[serde(rename = "extended-text")]
    Text(TextData),
    Image(ImageData),
    Table(TableData),
    TableRow,
    TableCell(TableCellData),
    Layout(LayoutData),
    LayoutItem,
    #[serde(rename = "youtube")]
    YouTube(YouTubeData),
    Tweet(TweetData),
    Collapsible(CollapsibleData),
    CollapsibleTitle,
    CollapsibleContent,
    Date(DateData),
    HorizontalRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading,
    Quote,
    List,
    ListItem,
    Link,
    LineBreak,
    Text,
    Image,
    Table,
    TableRow,
    TableCell,
    Layout,
    LayoutItem,
    YouTube,
    Tweet,
    Collapsible,
    CollapsibleTitle,
    CollapsibleContent,
    Date,
    HorizontalRule,
}

impl NodeKind {
    pub const ALL: [NodeKind; 22] = [
        NodeKind::Root,
        NodeKind::Paragraph,
        NodeKind::Heading,
        NodeKind::Quote,
        NodeKind::List,
        NodeKind::ListItem,
        NodeKind::Link,
        NodeKind::LineBreak,
        NodeKind::Text,
        NodeKind::Image,
        NodeKind::Table,
        NodeKind::TableRow,
        NodeKind::TableCell,
        NodeKind::Layout,
        NodeKind::LayoutItem,
        NodeKind::YouTube,
        NodeKind::Tweet,
        NodeKind::Collapsible,
        NodeKind::CollapsibleTitle,
        NodeKind::CollapsibleContent,
        NodeKind::Date,
        NodeKind::HorizontalRule,
    ];

    /// The `type` tag used in the JSON tree format.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::Quote => "quote",
            NodeKind::List => "list",
            NodeKind::ListItem => "list-item",
            NodeKind::Link => "link",
            NodeKind::LineBreak => "line-break",
            NodeKind::Text => "extended-text",
            NodeKind::Image => "image",
            NodeKind::Table => "table",
            NodeKind::TableRow => "table-row",
            NodeKind::TableCell => "table-cell",
            NodeKind::Layout => "layout",
            NodeKind::LayoutItem => "layout-item",
            NodeKind::YouTube => "youtube",
            NodeKind::Tweet => "tweet",
            NodeKind::Collapsible => "collapsible",
            NodeKind::CollapsibleTitle => "collapsible-title",
            NodeKind::CollapsibleContent => "collapsible-content",
            NodeKind::Date => "date",
            NodeKind::HorizontalRule => "horizontal-rule",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// Non-editable nodes rendered as a single unit.
    pub fn is_decorator(self) -> bool {
        matches!(
            self,
            NodeKind::Image
                | NodeKind::YouTube
                | NodeKind::Tweet
                | NodeKind::Date
                | NodeKind::HorizontalRule
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a node contributes to exported HTML.
#[derive(Debug, Clone)]
pub enum DomExport {
    /// Children are exported into the element found at `slot` (a child index path).
    Element { element: Element, slot: Vec<usize> },
    /// Complete output; children are not exported.
    Leaf(Vec<DomNode>),
    /// Only the children are exported.
    Children,
}

impl DomExport {
    fn element(element: Element) -> Self {
        DomExport::Element {
            element,
            slot: Vec::new(),
        }
    }
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Root => NodeKind::Root,
            NodeData::Paragraph(_) => NodeKind::Paragraph,
            NodeData::Heading(_) => NodeKind::Heading,
            NodeData::Quote => NodeKind::Quote,
            NodeData::List(_) => NodeKind::List,
            NodeData::ListItem => NodeKind::ListItem,
            NodeData::Link(_) => NodeKind::Link,
            NodeData::LineBreak => NodeKind::LineBreak,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Image(_) => NodeKind::Image,
            NodeData::Table(_) => NodeKind::Table,
            NodeData::TableRow => NodeKind::TableRow,
            NodeData::TableCell(_) => NodeKind::TableCell,
            NodeData::Layout(_) => NodeKind::Layout,
            NodeData::LayoutItem => NodeKind::LayoutItem,
            NodeData::YouTube(_) => NodeKind::YouTube,
            NodeData::Tweet(_) => NodeKind::Tweet,
            NodeData::Collapsible(_) => NodeKind::Collapsible,
            NodeData::CollapsibleTitle => NodeKind::CollapsibleTitle,
            NodeData::CollapsibleContent => NodeKind::CollapsibleContent,
            NodeData::Date(_) => NodeKind::Date,
            NodeData::HorizontalRule => NodeKind::HorizontalRule,
        }
    }

    pub fn paragraph() -> Self {
        NodeData::Paragraph(ParagraphData::default())
    }

    pub fn text(text: impl Into<String>) -> Self {
        NodeData::Text(TextData::new(text))
    }

    pub fn as_text(&self) -> Option<&TextData> {
        match self {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextData> {
        match self {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_table_cell(&self) -> Option<&TableCellData> {
        match self {
            NodeData::TableCell(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_table_cell_mut(&mut self) -> Option<&mut TableCellData> {
        match self {
            NodeData::TableCell(cell) => Some(cell),
            _ => None,
        }
    }

    /// Text alignment for the block types that carry one.
    pub fn align(&self) -> Option<TextAlign> {
        match self {
            NodeData::Paragraph(p) => p.align,
            NodeData::Heading(h) => h.align,
            _ => None,
        }
    }

    pub fn export_dom(&self) -> DomExport {
        match self {
            NodeData::Root => DomExport::Children,
            NodeData::Paragraph(p) => DomExport::element(p.export_element()),
            NodeData::Heading(h) => DomExport::element(h.export_element()),
            NodeData::Quote => DomExport::element(Element::new("blockquote")),
            NodeData::List(list) => DomExport::element(list.export_element()),
            NodeData::ListItem => DomExport::element(Element::new("li")),
            NodeData::Link(link) => DomExport::element(link.export_element()),
            NodeData::LineBreak => DomExport::Leaf(vec![Element::new("br").into()]),
            NodeData::Text(text) => DomExport::Leaf(text.export_dom()),
            NodeData::Image(image) => DomExport::Leaf(image.export_dom()),
            NodeData::Table(table) => DomExport::Element {
                element: table.export_element(),
                slot: vec![0],
            },
            NodeData::TableRow => DomExport::element(Element::new("tr")),
            NodeData::TableCell(cell) => DomExport::element(cell.export_element()),
            NodeData::Layout(layout) => DomExport::element(layout.export_element()),
            NodeData::LayoutItem => DomExport::element(layout::layout_item_element()),
            NodeData::YouTube(video) => DomExport::Leaf(vec![video.export_element().into()]),
            NodeData::Tweet(tweet) => DomExport::Leaf(vec![tweet.export_element().into()]),
            NodeData::Collapsible(c) => DomExport::element(c.export_element()),
            NodeData::CollapsibleTitle => DomExport::element(collapsible::title_element()),
            NodeData::CollapsibleContent => DomExport::element(collapsible::content_element()),
            NodeData::Date(date) => DomExport::Leaf(vec![date.export_element().into()]),
            NodeData::HorizontalRule => DomExport::Leaf(vec![Element::new("hr").into()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_match_serde_tags() {
        let samples = [
            NodeData::Root,
            NodeData::paragraph(),
            NodeData::ListItem,
            NodeData::text("x"),
            NodeData::YouTube(YouTubeData::from_url("dQw4w9WgXcQ").unwrap()),
            NodeData::TableCell(TableCellData::default()),
            NodeData::CollapsibleContent,
            NodeData::HorizontalRule,
        ];
        for data in samples {
            let json = serde_json::to_value(&data).unwrap();
            assert_eq!(json["type"], data.kind().as_str());
            assert_eq!(NodeKind::parse(data.kind().as_str()), Some(data.kind()));
        }
    }
}
