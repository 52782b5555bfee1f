use std::collections::BTreeSet;

use serde_json::Value;

use crate::config::EditorConfig;
use crate::document::{Document, NodeKey, NodeTree};
use crate::error::{ApplyError, CommandError};
use crate::events::EditorEvent;
use crate::history::History;
use crate::nodes::{NodeData, NodeKind, TextData};
use crate::ops::{Op, apply_op};
use crate::plugin::{ChildConstraint, CommandOutcome, PluginRegistry};
use crate::selection::{Point, Selection, clamp_to_char_boundary};
use crate::table_geometry::TableGrid;

pub(crate) fn text_block_of(
    doc: &Document,
    registry: &PluginRegistry,
    key: NodeKey,
) -> Option<NodeKey> {
    doc.ancestors(key).into_iter().find(|ancestor| {
        doc.kind(*ancestor).is_some_and(|kind| {
            kind == NodeKind::ListItem
                || (!registry.is_inline(kind)
                    && registry.child_constraint(kind) == ChildConstraint::InlineOnly)
        })
    })
}

/// Writable handle to the document, available only inside [`crate::Editor::update`].
pub struct Txn<'a> {
    doc: &'a mut Document,
    selection: &'a mut Selection,
    registry: &'a PluginRegistry,
    config: &'a EditorConfig,
    history: &'a mut History,
    events: Vec<EditorEvent>,
    dirty: BTreeSet<NodeKey>,
    inserted: Vec<NodeKey>,
    history_applied: bool,
}

pub(crate) struct TxnParts {
    pub events: Vec<EditorEvent>,
    pub dirty: BTreeSet<NodeKey>,
    pub history_applied: bool,
}

impl<'a> Txn<'a> {
    pub(crate) fn new(
        doc: &'a mut Document,
        selection: &'a mut Selection,
        registry: &'a PluginRegistry,
        config: &'a EditorConfig,
        history: &'a mut History,
    ) -> Self {
        Self {
            doc,
            selection,
            registry,
            config,
            history,
            events: Vec::new(),
            dirty: BTreeSet::new(),
            inserted: Vec::new(),
            history_applied: false,
        }
    }

    pub(crate) fn into_parts(self) -> TxnParts {
        TxnParts {
            events: self.events,
            dirty: self.dirty,
            history_applied: self.history_applied,
        }
    }

    pub fn doc(&self) -> &Document {
        self.doc
    }

    pub fn selection(&self) -> &Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        *self.selection = selection;
    }

    pub fn registry(&self) -> &'a PluginRegistry {
        self.registry
    }

    pub fn config(&self) -> &'a EditorConfig {
        self.config
    }

    pub fn emit(&mut self, event: EditorEvent) {
        self.events.push(event);
    }

    /// Nodes inserted by this transaction, in insertion order.
    pub fn inserted_keys(&self) -> &[NodeKey] {
        &self.inserted
    }

    pub fn apply(&mut self, op: Op) -> Result<Option<NodeKey>, ApplyError> {
        match &op {
            Op::InsertNode { parent, .. } => {
                self.dirty.insert(*parent);
            }
            Op::RemoveNode { key } | Op::Unwrap { key } => {
                if let Some(parent) = self.doc.parent(*key) {
                    self.dirty.insert(parent);
                }
            }
            Op::MoveNode { key, parent, .. } => {
                self.dirty.insert(*key);
                self.dirty.insert(*parent);
            }
            Op::SetData { key, .. } => {
                self.dirty.insert(*key);
            }
            Op::MergeText { into, .. } => {
                self.dirty.insert(*into);
            }
            Op::Wrap { keys, .. } => self.dirty.extend(keys.iter().copied()),
        }
        let created = apply_op(self.doc, self.selection, op)?;
        if let Some(key) = created {
            self.dirty.insert(key);
            self.inserted.push(key);
        }
        self.dirty.retain(|key| self.doc.contains(*key));
        Ok(created)
    }

    pub fn insert(
        &mut self,
        parent: NodeKey,
        index: usize,
        tree: NodeTree,
    ) -> Result<NodeKey, ApplyError> {
        self.apply(Op::insert(parent, index, tree))?
            .ok_or(ApplyError::MissingNode(parent))
    }

    pub fn append(&mut self, parent: NodeKey, tree: NodeTree) -> Result<NodeKey, ApplyError> {
        let index = self.doc.children(parent).len();
        self.insert(parent, index, tree)
    }

    pub fn insert_after(&mut self, sibling: NodeKey, tree: NodeTree) -> Result<NodeKey, ApplyError> {
        let parent = self
            .doc
            .parent(sibling)
            .ok_or(ApplyError::MissingNode(sibling))?;
        let index = self
            .doc
            .index_in_parent(sibling)
            .ok_or(ApplyError::MissingNode(sibling))?;
        self.insert(parent, index + 1, tree)
    }

    pub fn remove(&mut self, key: NodeKey) -> Result<(), ApplyError> {
        self.apply(Op::remove(key)).map(|_| ())
    }

    pub fn move_to(&mut self, key: NodeKey, parent: NodeKey, index: usize) -> Result<(), ApplyError> {
        self.apply(Op::MoveNode { key, parent, index }).map(|_| ())
    }

    pub fn set_data(&mut self, key: NodeKey, data: NodeData) -> Result<(), ApplyError> {
        self.apply(Op::SetData { key, data }).map(|_| ())
    }

    pub fn wrap(&mut self, keys: &[NodeKey], wrapper: NodeData) -> Result<NodeKey, ApplyError> {
        let first = keys.first().copied().ok_or(ApplyError::NotSiblings)?;
        self.apply(Op::Wrap {
            keys: keys.to_vec(),
            wrapper,
        })?
        .ok_or(ApplyError::MissingNode(first))
    }

    pub fn unwrap_node(&mut self, key: NodeKey) -> Result<(), ApplyError> {
        self.apply(Op::Unwrap { key }).map(|_| ())
    }

    /// Mutable access to a node's fields. The node is marked dirty.
    pub fn writable(&mut self, key: NodeKey) -> Result<&mut NodeData, ApplyError> {
        self.dirty.insert(key);
        self.doc.data_mut(key)
    }

    pub fn writable_text(&mut self, key: NodeKey) -> Result<&mut TextData, ApplyError> {
        self.writable(key)?
            .as_text_mut()
            .ok_or(ApplyError::NotText(key))
    }

    /// Splits a text node at a byte offset. Returns the new right-hand node, or `None`
    /// when the offset is at either end.
    pub fn split_text(&mut self, key: NodeKey, offset: usize) -> Result<Option<NodeKey>, ApplyError> {
        let data = self.doc.text(key).ok_or(ApplyError::NotText(key))?;
        let offset = clamp_to_char_boundary(&data.text, offset);
        if offset == 0 || offset >= data.text.len() {
            return Ok(None);
        }
        let mut right = data.clone();
        right.text = data.text[offset..].to_string();
        self.writable_text(key)?.text.truncate(offset);
        let new = self.insert_after(key, NodeTree::leaf(NodeData::Text(right)))?;

        if let Selection::Range { anchor, focus } = &mut *self.selection {
            for point in [anchor, focus] {
                if point.key == key && point.offset > offset {
                    *point = Point::new(new, point.offset - offset);
                }
            }
        }
        Ok(Some(new))
    }

    /// Runs a command through its priority chain. A handler that reports
    /// `NotHandled` has its mutations rolled back before the next one runs.
    pub fn dispatch(&mut self, name: &str, payload: &Value) -> Result<CommandOutcome, CommandError> {
        let registry = self.registry;
        let chain = registry.command_chain(name);
        if chain.is_empty() {
            return Err(CommandError::Unknown(name.to_string()));
        }

        for spec in chain {
            if let Some(item) = &spec.toolbar_item {
                if !self.config.is_toolbar_item_enabled(item) {
                    tracing::debug!(command = name, item = %item, "command disabled by toolbar");
                    continue;
                }
            }

            let doc = self.doc.clone();
            let selection = self.selection.clone();
            let events = self.events.len();
            let inserted = self.inserted.len();

            let outcome = (spec.handler)(self, payload);
            if !matches!(outcome, Ok(CommandOutcome::Handled)) {
                *self.doc = doc;
                *self.selection = selection;
                self.events.truncate(events);
                self.inserted.truncate(inserted);
                self.dirty.retain(|key| self.doc.contains(*key));
            }
            match outcome {
                Ok(CommandOutcome::Handled) => {
                    tracing::debug!(command = name, "command handled");
                    return Ok(CommandOutcome::Handled);
                }
                Ok(CommandOutcome::NotHandled) => {}
                Err(err) => {
                    tracing::debug!(command = name, %err, "command failed");
                    return Err(err);
                }
            }
        }
        tracing::debug!(command = name, "command not handled");
        Ok(CommandOutcome::NotHandled)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> Result<bool, CommandError> {
        let Some((doc, selection)) = self.history.undo(self.doc, self.selection)? else {
            return Ok(false);
        };
        self.restore(doc, selection);
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool, CommandError> {
        let Some((doc, selection)) = self.history.redo(self.doc, self.selection)? else {
            return Ok(false);
        };
        self.restore(doc, selection);
        Ok(true)
    }

    fn restore(&mut self, doc: Document, selection: Selection) {
        *self.doc = doc;
        *self.selection = selection;
        self.dirty.insert(NodeKey::ROOT);
        self.history_applied = true;
    }

    /// Caret or range focus when the selection is a text range.
    pub fn focus_point(&self) -> Option<Point> {
        match &*self.selection {
            Selection::Range { focus, .. } => Some(*focus),
            _ => None,
        }
    }

    /// The outermost block at or above `key` whose parent holds blocks.
    pub fn top_block(&self, key: NodeKey) -> Option<NodeKey> {
        let mut current = key;
        loop {
            let parent = self.doc.parent(current)?;
            let parent_kind = self.doc.kind(parent)?;
            if self.registry.child_constraint(parent_kind) == ChildConstraint::BlockOnly {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Blocks with inline content touched by the selection, in document order.
    pub fn selected_blocks(&self) -> Vec<NodeKey> {
        let texts = match &*self.selection {
            Selection::Range { .. } => match self.selection.ordered_points(self.doc) {
                Some((start, end)) => self.doc.text_nodes_between(start.key, end.key),
                None => Vec::new(),
            },
            Selection::Node { keys } => keys
                .iter()
                .flat_map(|key| self.doc.text_nodes(*key))
                .collect(),
            Selection::Table { .. } => self
                .selected_cells()
                .into_iter()
                .flat_map(|cell| self.doc.text_nodes(cell))
                .collect(),
        };
        let mut blocks: Vec<NodeKey> = Vec::new();
        for text in texts {
            if let Some(block) = self.text_block(text) {
                if !blocks.contains(&block) {
                    blocks.push(block);
                }
            }
        }
        blocks
    }

    /// The nearest ancestor holding inline content (paragraph, heading, list item, ...).
    pub fn text_block(&self, key: NodeKey) -> Option<NodeKey> {
        text_block_of(self.doc, self.registry, key)
    }

    /// Cells covered by a table selection, or the focused cell.
    pub fn selected_cells(&self) -> Vec<NodeKey> {
        match &*self.selection {
            Selection::Table {
                table,
                anchor,
                focus,
            } => TableGrid::build(self.doc, *table)
                .map(|grid| grid.cells_between(*anchor, *focus))
                .unwrap_or_default(),
            Selection::Node { keys } => keys
                .iter()
                .copied()
                .filter(|key| self.doc.kind(*key) == Some(NodeKind::TableCell))
                .collect(),
            Selection::Range { focus, .. } => self
                .doc
                .nearest(focus.key, NodeKind::TableCell)
                .into_iter()
                .collect(),
        }
    }

    /// Text nodes a formatting command applies to. Range boundaries are split so that
    /// every returned node is fully selected. A caret gets a fresh empty text node
    /// carrying the caret's marks, unless the caret text is already empty.
    pub fn text_targets(&mut self) -> Result<Vec<NodeKey>, ApplyError> {
        match self.selection.clone() {
            Selection::Range { anchor, focus } if anchor == focus => {
                self.caret_target(focus).map(|key| key.into_iter().collect())
            }
            Selection::Range { .. } => self.isolate_range(),
            Selection::Node { keys } => Ok(keys
                .iter()
                .flat_map(|key| self.doc.text_nodes(*key))
                .collect()),
            Selection::Table { .. } => Ok(self
                .selected_cells()
                .into_iter()
                .flat_map(|cell| self.doc.text_nodes(cell))
                .collect()),
        }
    }

    fn caret_target(&mut self, point: Point) -> Result<Option<NodeKey>, ApplyError> {
        let Some(text) = self.doc.text(point.key) else {
            return Ok(None);
        };
        if text.text.is_empty() {
            return Ok(Some(point.key));
        }
        let mut pending = text.clone();
        pending.text.clear();
        let len = text.text.len();
        let parent = self
            .doc
            .parent(point.key)
            .ok_or(ApplyError::MissingNode(point.key))?;
        let index = self
            .doc
            .index_in_parent(point.key)
            .ok_or(ApplyError::MissingNode(point.key))?;
        let at = if point.offset == 0 {
            index
        } else {
            if point.offset < len {
                self.split_text(point.key, point.offset)?;
            }
            index + 1
        };
        let key = self.insert(parent, at, NodeTree::leaf(NodeData::Text(pending)))?;
        self.set_selection(Selection::collapsed(Point::new(key, 0)));
        Ok(Some(key))
    }

    fn isolate_range(&mut self) -> Result<Vec<NodeKey>, ApplyError> {
        let Some((start, end)) = self.selection.ordered_points(self.doc) else {
            return Ok(Vec::new());
        };
        if start.key == end.key {
            self.split_text(start.key, end.offset)?;
            let middle = self.split_text(start.key, start.offset)?;
            let key = if start.offset == 0 {
                Some(start.key)
            } else {
                middle
            };
            let keys: Vec<NodeKey> = key.into_iter().collect();
            self.select_texts(&keys);
            return Ok(keys);
        }

        let mut keys = self.doc.text_nodes_between(start.key, end.key);
        if end.offset == 0 {
            keys.pop();
        } else {
            self.split_text(end.key, end.offset)?;
        }
        if let Some(first) = keys.first().copied() {
            if first == start.key && start.offset > 0 {
                match self.split_text(start.key, start.offset)? {
                    Some(right) => keys[0] = right,
                    None => {
                        keys.remove(0);
                    }
                }
            }
        }
        self.select_texts(&keys);
        Ok(keys)
    }

    fn select_texts(&mut self, keys: &[NodeKey]) {
        let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
            return;
        };
        let end = self.doc.text(*last).map(|t| t.text.len()).unwrap_or(0);
        self.set_selection(Selection::range(
            Point::new(*first, 0),
            Point::new(*last, end),
        ));
    }

    fn is_empty_paragraph(&self, key: NodeKey) -> bool {
        self.doc.kind(key) == Some(NodeKind::Paragraph)
            && self
                .doc
                .children(key)
                .iter()
                .all(|child| self.doc.text(*child).is_some_and(|t| t.text.is_empty()))
    }

    /// Inserts a block after the focused block, replacing it when it is an empty paragraph.
    /// A paragraph is appended after the block when nothing follows it.
    pub fn insert_block(&mut self, tree: NodeTree) -> Result<NodeKey, ApplyError> {
        let anchor = self
            .selection
            .focus_key()
            .and_then(|key| self.top_block(key));
        let key = match anchor {
            Some(block) => {
                let key = self.insert_after(block, tree)?;
                if self.is_empty_paragraph(block) {
                    self.remove(block)?;
                }
                key
            }
            None => self.append(NodeKey::ROOT, tree)?,
        };

        let kind = self.doc.kind(key).ok_or(ApplyError::MissingNode(key))?;
        if self.doc.next_sibling(key).is_none()
            && self.registry.child_constraint(kind) != ChildConstraint::InlineOnly
        {
            self.insert_after(key, NodeTree::paragraph(""))?;
        }

        let caret = match self.doc.first_text(key) {
            Some(text) => Some(Point::new(
                text,
                self.doc.text(text).map(|t| t.text.len()).unwrap_or(0),
            )),
            None => self
                .doc
                .next_sibling(key)
                .and_then(|next| self.doc.first_text(next))
                .map(|text| Point::new(text, 0)),
        };
        if let Some(caret) = caret {
            self.set_selection(Selection::collapsed(caret));
        }
        Ok(key)
    }

    /// Inserts an inline node at the caret, splitting the caret's text node.
    pub fn insert_inline(&mut self, tree: NodeTree) -> Result<NodeKey, ApplyError> {
        let Some(point) = self.focus_point().filter(|p| self.doc.text(p.key).is_some()) else {
            return self.insert_block(NodeTree::new(NodeData::paragraph(), vec![tree]));
        };
        let len = self.doc.text(point.key).map(|t| t.text.len()).unwrap_or(0);
        let parent = self
            .doc
            .parent(point.key)
            .ok_or(ApplyError::MissingNode(point.key))?;
        let index = self
            .doc
            .index_in_parent(point.key)
            .ok_or(ApplyError::MissingNode(point.key))?;
        let at = if point.offset == 0 {
            index
        } else {
            if point.offset < len {
                self.split_text(point.key, point.offset)?;
            }
            index + 1
        };
        let key = self.insert(parent, at, tree)?;

        let next = match self.doc.next_sibling(key) {
            Some(next) if self.doc.text(next).is_some() => next,
            _ => self.insert_after(key, NodeTree::text(""))?,
        };
        self.set_selection(Selection::collapsed(Point::new(next, 0)));
        Ok(key)
    }

    /// Inserts plain text at the caret, extending the caret's text node.
    pub fn insert_text(&mut self, text: &str) -> Result<bool, ApplyError> {
        let Some(point) = self.focus_point() else {
            return Ok(false);
        };
        let Some(current) = self.doc.text(point.key) else {
            return Ok(false);
        };
        let offset = clamp_to_char_boundary(&current.text, point.offset);
        self.writable_text(point.key)?.text.insert_str(offset, text);
        self.set_selection(Selection::collapsed(Point::new(
            point.key,
            offset + text.len(),
        )));
        Ok(true)
    }
}
