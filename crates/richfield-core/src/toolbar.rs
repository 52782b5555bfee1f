//! Read-only summary of the selection for toolbar rendering.

use serde::Serialize;

use crate::config::EditorConfig;
use crate::document::{Document, NodeKey};
use crate::nodes::{NodeData, NodeKind, TextData, TextFormat};
use crate::plugin::PluginRegistry;
use crate::selection::{Point, Selection};
use crate::table_geometry::TableGrid;
use crate::txn::text_block_of;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarState {
    /// Names of formats set on every selected text run.
    pub formats: Vec<String>,
    /// `paragraph`, `h1`..`h6`, `quote`, `bullet`, `number`, or the node type of other blocks.
    pub block_type: Option<String>,
    pub alignment: Option<String>,
    pub link_url: Option<String>,
    pub font_size: u32,
    pub font_family: Option<String>,
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    pub palette: Vec<String>,
    pub in_table: bool,
    pub can_merge_cells: bool,
    pub can_unmerge_cell: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Font size in px of the text at `point`, or the configured default.
pub(crate) fn font_size_at(doc: &Document, point: Option<Point>, config: &EditorConfig) -> u32 {
    point
        .and_then(|point| doc.text(point.key))
        .and_then(|text| text.style_value("font-size"))
        .and_then(|size| size.trim_end_matches("px").trim().parse::<f64>().ok())
        .map(|size| config.clamp_font_size(size.round() as i64))
        .unwrap_or(config.font_size.default)
}

fn selected_texts(doc: &Document, selection: &Selection) -> Vec<NodeKey> {
    match selection {
        Selection::Range { focus, .. } => match selection.ordered_points(doc) {
            Some((start, end)) if start != end => {
                let mut keys = doc.text_nodes_between(start.key, end.key);
                // A range ending at offset 0 does not cover its last text.
                if end.offset == 0 && start.key != end.key {
                    keys.pop();
                }
                keys
            }
            _ => vec![focus.key],
        },
        Selection::Node { keys } => keys.iter().flat_map(|key| doc.text_nodes(*key)).collect(),
        Selection::Table {
            table,
            anchor,
            focus,
        } => TableGrid::build(doc, *table)
            .map(|grid| grid.cells_between(*anchor, *focus))
            .unwrap_or_default()
            .into_iter()
            .flat_map(|cell| doc.text_nodes(cell))
            .collect(),
    }
}

fn block_type(doc: &Document, block: NodeKey) -> Option<String> {
    let name = match doc.data(block)? {
        NodeData::Paragraph(_) => "paragraph".to_string(),
        NodeData::Heading(h) => format!("h{}", h.level),
        NodeData::Quote => "quote".to_string(),
        NodeData::ListItem => match doc.parent(block).and_then(|list| doc.data(list)) {
            Some(NodeData::List(list)) => list.kind.as_str().to_string(),
            _ => "paragraph".to_string(),
        },
        other => other.kind().as_str().to_string(),
    };
    Some(name)
}

fn current_cell(doc: &Document, selection: &Selection) -> Option<NodeKey> {
    match selection {
        Selection::Table { focus, .. } => Some(*focus),
        _ => selection
            .focus_key()
            .and_then(|key| doc.nearest(key, NodeKind::TableCell)),
    }
}

impl ToolbarState {
    pub(crate) fn compute(
        doc: &Document,
        selection: &Selection,
        registry: &PluginRegistry,
        config: &EditorConfig,
        (can_undo, can_redo): (bool, bool),
    ) -> Self {
        let texts: Vec<&TextData> = selected_texts(doc, selection)
            .into_iter()
            .filter_map(|key| doc.text(key))
            .collect();
        let formats = TextFormat::ALL
            .into_iter()
            .filter(|format| !texts.is_empty() && texts.iter().all(|t| t.has_format(*format)))
            .map(|format| format.name().to_string())
            .collect();

        let focus = selection.focus_key();
        let focus_point = match selection {
            Selection::Range { focus, .. } => Some(*focus),
            _ => None,
        };
        let focus_text = focus_point.and_then(|point| doc.text(point.key));
        let block = focus.and_then(|key| text_block_of(doc, registry, key));

        let (can_merge_cells, can_unmerge_cell) = match current_cell(doc, selection) {
            Some(cell) => {
                let grid = doc
                    .nearest(cell, NodeKind::Table)
                    .and_then(|table| TableGrid::build(doc, table));
                let can_merge = match (selection, &grid) {
                    (Selection::Table { anchor, focus, .. }, Some(grid)) => {
                        let cells = grid.cells_between(*anchor, *focus);
                        cells.len() > 1 && grid.mergeable_rect(&cells).is_some()
                    }
                    _ => false,
                };
                let can_unmerge = doc
                    .data(cell)
                    .and_then(NodeData::as_table_cell)
                    .is_some_and(|c| c.row_span > 1 || c.col_span > 1);
                (can_merge, can_unmerge)
            }
            None => (false, false),
        };

        Self {
            formats,
            block_type: block.and_then(|block| block_type(doc, block)),
            alignment: block
                .and_then(|block| doc.data(block))
                .and_then(NodeData::align)
                .map(|align| align.as_str().to_string()),
            link_url: focus
                .and_then(|key| doc.nearest(key, NodeKind::Link))
                .and_then(|link| match doc.data(link) {
                    Some(NodeData::Link(link)) => Some(link.url.clone()),
                    _ => None,
                }),
            font_size: font_size_at(doc, focus_point, config),
            font_family: focus_text.and_then(|t| t.style_value("font-family")),
            text_color: focus_text.and_then(|t| t.style_value("color")),
            background_color: focus_text.and_then(|t| t.style_value("background-color")),
            palette: config.colors.clone(),
            in_table: current_cell(doc, selection).is_some(),
            can_merge_cells,
            can_unmerge_cell,
            can_undo,
            can_redo,
        }
    }
}
