use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeKey, NodeTree};
use crate::error::ApplyError;
use crate::nodes::NodeData;
use crate::selection::{Point, Selection, clamp_to_char_boundary};

/// A single key-addressed tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    InsertNode {
        parent: NodeKey,
        index: usize,
        tree: NodeTree,
    },
    RemoveNode {
        key: NodeKey,
    },
    /// `index` is the position under `parent` after the node has been detached.
    MoveNode {
        key: NodeKey,
        parent: NodeKey,
        index: usize,
    },
    SetData {
        key: NodeKey,
        data: NodeData,
    },
    /// Appends the text of `from` to `into` and removes `from`.
    MergeText {
        into: NodeKey,
        from: NodeKey,
    },
    Wrap {
        keys: Vec<NodeKey>,
        wrapper: NodeData,
    },
    Unwrap {
        key: NodeKey,
    },
}

impl Op {
    pub fn insert(parent: NodeKey, index: usize, tree: NodeTree) -> Self {
        Op::InsertNode {
            parent,
            index,
            tree,
        }
    }

    pub fn remove(key: NodeKey) -> Self {
        Op::RemoveNode { key }
    }
}

/// Applies `op` and keeps `selection` pointing at live text. Returns the key of a created node.
pub fn apply_op(
    doc: &mut Document,
    selection: &mut Selection,
    op: Op,
) -> Result<Option<NodeKey>, ApplyError> {
    match op {
        Op::InsertNode {
            parent,
            index,
            tree,
        } => doc.insert_tree(parent, index, tree).map(Some),
        Op::RemoveNode { key } => {
            let fallback = fallback_point(doc, key);
            doc.remove(key)?;
            remap_removed(doc, selection, fallback);
            Ok(None)
        }
        Op::MoveNode { key, parent, index } => {
            doc.move_node(key, parent, index)?;
            Ok(None)
        }
        Op::SetData { key, data } => {
            doc.set_data(key, data)?;
            clamp_selection(doc, selection, key);
            Ok(None)
        }
        Op::MergeText { into, from } => {
            let appended = doc.text(from).ok_or(ApplyError::NotText(from))?.text.clone();
            let target = doc
                .data_mut(into)?
                .as_text_mut()
                .ok_or(ApplyError::NotText(into))?;
            let shift = target.text.len();
            target.text.push_str(&appended);
            doc.remove(from)?;
            for_each_point(selection, |point| {
                if point.key == from {
                    *point = Point::new(into, shift + point.offset);
                }
            });
            Ok(None)
        }
        Op::Wrap { keys, wrapper } => doc.wrap(&keys, wrapper).map(Some),
        Op::Unwrap { key } => {
            doc.unwrap(key)?;
            Ok(None)
        }
    }
}

fn for_each_point(selection: &mut Selection, mut f: impl FnMut(&mut Point)) {
    if let Selection::Range { anchor, focus } = selection {
        f(anchor);
        f(focus);
    }
}

/// The closest text position outside the subtree about to be removed.
fn fallback_point(doc: &Document, removed: NodeKey) -> Option<Point> {
    let texts = doc.text_nodes(doc.root());
    let inside: Vec<NodeKey> = doc.text_nodes(removed);
    let first_inside = inside.first().copied();
    let split = match first_inside {
        Some(first) => texts.iter().position(|k| *k == first)?,
        None => texts
            .iter()
            .position(|k| doc.compare(*k, removed).is_gt())
            .unwrap_or(texts.len()),
    };
    let before = texts[..split].last().copied();
    if let Some(key) = before {
        let len = doc.text(key).map(|t| t.text.len()).unwrap_or(0);
        return Some(Point::new(key, len));
    }
    texts[split..]
        .iter()
        .find(|k| !inside.contains(*k))
        .map(|key| Point::new(*key, 0))
}

fn remap_removed(doc: &Document, selection: &mut Selection, fallback: Option<Point>) {
    for_each_point(selection, |point| {
        if !doc.contains(point.key) {
            if let Some(fallback) = fallback {
                *point = fallback;
            }
        }
    });
}

fn clamp_selection(doc: &Document, selection: &mut Selection, key: NodeKey) {
    let Some(text) = doc.text(key) else {
        return;
    };
    for_each_point(selection, |point| {
        if point.key == key {
            point.offset = clamp_to_char_boundary(&text.text, point.offset);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_text_moves_caret_into_target() {
        let mut doc = Document::new();
        let p = doc
            .insert_tree(
                doc.root(),
                0,
                NodeTree::new(
                    NodeData::paragraph(),
                    vec![NodeTree::text("ab"), NodeTree::text("cd")],
                ),
            )
            .unwrap();
        let [left, right] = doc.children(p) else {
            panic!("expected two text leaves");
        };
        let (left, right) = (*left, *right);
        let mut selection = Selection::collapsed(Point::new(right, 1));
        apply_op(
            &mut doc,
            &mut selection,
            Op::MergeText {
                into: left,
                from: right,
            },
        )
        .unwrap();
        assert_eq!(doc.text(left).unwrap().text, "abcd");
        assert_eq!(selection, Selection::collapsed(Point::new(left, 3)));
    }

    #[test]
    fn removing_the_caret_node_moves_it_to_previous_text() {
        let mut doc = Document::new();
        let a = doc.insert_tree(doc.root(), 0, NodeTree::paragraph("one")).unwrap();
        let b = doc.insert_tree(doc.root(), 1, NodeTree::paragraph("two")).unwrap();
        let a_text = doc.children(a)[0];
        let b_text = doc.children(b)[0];
        let mut selection = Selection::collapsed(Point::new(b_text, 2));
        apply_op(&mut doc, &mut selection, Op::remove(b)).unwrap();
        assert_eq!(selection, Selection::collapsed(Point::new(a_text, 3)));
    }
}
