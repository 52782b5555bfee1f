use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeKey};
use crate::nodes::NodeKind;

/// A byte offset into a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Range { anchor: Point, focus: Point },
    Node { keys: Vec<NodeKey> },
    /// A rectangle of cells spanned by two corner cells of one table.
    Table {
        table: NodeKey,
        anchor: NodeKey,
        focus: NodeKey,
    },
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Selection::Range {
            anchor: point,
            focus: point,
        }
    }

    pub fn range(anchor: Point, focus: Point) -> Self {
        Selection::Range { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self, Selection::Range { anchor, focus } if anchor == focus)
    }

    pub fn anchor_key(&self) -> Option<NodeKey> {
        match self {
            Selection::Range { anchor, .. } => Some(anchor.key),
            Selection::Node { keys } => keys.first().copied(),
            Selection::Table { anchor, .. } => Some(*anchor),
        }
    }

    pub fn focus_key(&self) -> Option<NodeKey> {
        match self {
            Selection::Range { focus, .. } => Some(focus.key),
            Selection::Node { keys } => keys.last().copied(),
            Selection::Table { focus, .. } => Some(*focus),
        }
    }

    /// Range endpoints in document order.
    pub fn ordered_points(&self, doc: &Document) -> Option<(Point, Point)> {
        let Selection::Range { anchor, focus } = self else {
            return None;
        };
        match compare_points(doc, anchor, focus) {
            Ordering::Greater => Some((*focus, *anchor)),
            _ => Some((*anchor, *focus)),
        }
    }
}

pub fn compare_points(doc: &Document, a: &Point, b: &Point) -> Ordering {
    doc.compare(a.key, b.key).then(a.offset.cmp(&b.offset))
}

/// The first text position in the document, or the root when there is no text.
pub fn first_text_point(doc: &Document) -> Point {
    doc.first_text(doc.root())
        .map(|key| Point::new(key, 0))
        .unwrap_or(Point::new(doc.root(), 0))
}

/// Re-anchors a selection so that every point refers to a live node and a char boundary.
pub fn normalize_selection(doc: &Document, selection: &Selection) -> Selection {
    let fallback = first_text_point(doc);
    match selection {
        Selection::Range { anchor, focus } => {
            let anchor = normalize_point(doc, anchor);
            let focus = normalize_point(doc, focus);
            match (anchor, focus) {
                (Some(anchor), Some(focus)) => Selection::Range { anchor, focus },
                (Some(point), None) | (None, Some(point)) => Selection::collapsed(point),
                (None, None) => Selection::collapsed(fallback),
            }
        }
        Selection::Node { keys } => {
            let keys: Vec<NodeKey> = keys
                .iter()
                .copied()
                .filter(|key| *key != doc.root() && doc.contains(*key))
                .collect();
            if keys.is_empty() {
                Selection::collapsed(fallback)
            } else {
                Selection::Node { keys }
            }
        }
        Selection::Table {
            table,
            anchor,
            focus,
        } => {
            let is_cell_of_table = |cell: &NodeKey| {
                doc.kind(*cell) == Some(NodeKind::TableCell)
                    && doc.nearest(*cell, NodeKind::Table) == Some(*table)
            };
            if doc.kind(*table) == Some(NodeKind::Table)
                && is_cell_of_table(anchor)
                && is_cell_of_table(focus)
            {
                selection.clone()
            } else {
                let point = doc
                    .first_text(*table)
                    .map(|key| Point::new(key, 0))
                    .unwrap_or(fallback);
                Selection::collapsed(point)
            }
        }
    }
}

fn normalize_point(doc: &Document, point: &Point) -> Option<Point> {
    if let Some(text) = doc.text(point.key) {
        return Some(Point::new(
            point.key,
            clamp_to_char_boundary(&text.text, point.offset),
        ));
    }
    if !doc.contains(point.key) {
        return None;
    }
    // Element points resolve to the nearest text inside the element.
    let texts = doc.text_nodes(point.key);
    if point.offset == 0 {
        texts.first().map(|key| Point::new(*key, 0))
    } else {
        texts
            .last()
            .and_then(|key| doc.text(*key).map(|t| Point::new(*key, t.text.len())))
    }
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
