use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::nodes::{NodeData, NodeKind, TextData};

/// Opaque node identity, unique within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(u32);

impl NodeKey {
    pub const ROOT: NodeKey = NodeKey(0);

    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    key: NodeKey,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    data: NodeData,
}

impl NodeEntry {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

/// A detached subtree without keys, used for insertion and import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTree {
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeTree>,
}

impl NodeTree {
    pub fn leaf(data: NodeData) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    pub fn new(data: NodeData, children: Vec<NodeTree>) -> Self {
        Self { data, children }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::leaf(NodeData::text(text))
    }

    /// A paragraph holding a single text leaf.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(NodeData::paragraph(), vec![Self::text(text)])
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Concatenated text of all descendant text leaves.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.data {
            NodeData::Text(text) => out.push_str(&text.text),
            NodeData::LineBreak => out.push('\n'),
            _ => {}
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    pub(crate) fn for_each_data_mut(&mut self, f: &dyn Fn(&mut NodeData)) {
        f(&mut self.data);
        for child in &mut self.children {
            child.for_each_data_mut(f);
        }
    }
}

/// The document tree: an arena of nodes indexed by key, with parent links stored as keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: HashMap<NodeKey, NodeEntry>,
    next_key: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the root.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            NodeKey::ROOT,
            NodeEntry {
                key: NodeKey::ROOT,
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            },
        );
        Self { nodes, next_key: 1 }
    }

    pub fn root(&self) -> NodeKey {
        NodeKey::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(NodeKey::ROOT).is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn get(&self, key: NodeKey) -> Option<&NodeEntry> {
        self.nodes.get(&key)
    }

    pub fn data(&self, key: NodeKey) -> Option<&NodeData> {
        self.nodes.get(&key).map(|entry| &entry.data)
    }

    pub fn kind(&self, key: NodeKey) -> Option<NodeKind> {
        self.data(key).map(NodeData::kind)
    }

    pub fn text(&self, key: NodeKey) -> Option<&TextData> {
        self.data(key).and_then(NodeData::as_text)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&key)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|entry| entry.parent)
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|k| *k == key)
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent(key)?;
        let ix = self.index_in_parent(key)?;
        self.children(parent).get(ix + 1).copied()
    }

    pub fn prev_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent(key)?;
        let ix = self.index_in_parent(key)?;
        ix.checked_sub(1)
            .and_then(|ix| self.children(parent).get(ix).copied())
    }

    /// Child indices from the root down to `key`.
    pub fn path_of(&self, key: NodeKey) -> Option<Vec<usize>> {
        if !self.contains(key) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = key;
        while let Some(parent) = self.parent(current) {
            path.push(self.index_in_parent(current)?);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Document order. Ancestors sort before their descendants.
    pub fn compare(&self, a: NodeKey, b: NodeKey) -> Ordering {
        match (self.path_of(a), self.path_of(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (a, b) => a.is_some().cmp(&b.is_some()),
        }
    }

    /// Descendants of `key` in pre-order, not including `key` itself.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(key).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        self.ancestors(key).contains(&ancestor)
    }

    /// Parent first, root last.
    pub fn ancestors(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut current = self.parent(key);
        while let Some(key) = current {
            out.push(key);
            current = self.parent(key);
        }
        out
    }

    /// `key` itself or its closest ancestor of the given kind.
    pub fn nearest(&self, key: NodeKey, kind: NodeKind) -> Option<NodeKey> {
        self.nearest_where(key, |data| data.kind() == kind)
    }

    pub fn nearest_where(
        &self,
        key: NodeKey,
        mut predicate: impl FnMut(&NodeData) -> bool,
    ) -> Option<NodeKey> {
        let mut current = Some(key);
        while let Some(key) = current {
            if predicate(self.data(key)?) {
                return Some(key);
            }
            current = self.parent(key);
        }
        None
    }

    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        for node in std::iter::once(key).chain(self.descendants(key)) {
            match self.data(node) {
                Some(NodeData::Text(text)) => out.push_str(&text.text),
                Some(NodeData::LineBreak) => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    /// Text leaves under `key` in document order.
    pub fn text_nodes(&self, key: NodeKey) -> Vec<NodeKey> {
        std::iter::once(key)
            .chain(self.descendants(key))
            .filter(|k| matches!(self.data(*k), Some(NodeData::Text(_))))
            .collect()
    }

    pub fn first_text(&self, key: NodeKey) -> Option<NodeKey> {
        self.text_nodes(key).first().copied()
    }

    pub fn last_text(&self, key: NodeKey) -> Option<NodeKey> {
        self.text_nodes(key).last().copied()
    }

    /// Text leaves from `from` to `to` inclusive, in document order.
    pub fn text_nodes_between(&self, from: NodeKey, to: NodeKey) -> Vec<NodeKey> {
        let all = self.text_nodes(NodeKey::ROOT);
        let (Some(a), Some(b)) = (
            all.iter().position(|k| *k == from),
            all.iter().position(|k| *k == to),
        ) else {
            return Vec::new();
        };
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        all[a..=b].to_vec()
    }

    /// Detached copy of the subtree rooted at `key`.
    pub fn subtree(&self, key: NodeKey) -> Option<NodeTree> {
        let entry = self.nodes.get(&key)?;
        let children = entry
            .children
            .iter()
            .filter_map(|child| self.subtree(*child))
            .collect();
        Some(NodeTree::new(entry.data.clone(), children))
    }

    /// All keys in document order, starting with the root.
    pub fn keys(&self) -> Vec<NodeKey> {
        std::iter::once(NodeKey::ROOT)
            .chain(self.descendants(NodeKey::ROOT))
            .collect()
    }

    fn alloc_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    fn entry_mut(&mut self, key: NodeKey) -> Result<&mut NodeEntry, ApplyError> {
        self.nodes.get_mut(&key).ok_or(ApplyError::MissingNode(key))
    }

    /// Inserts an entry with a caller-chosen key. Used when rebuilding from the JSON format.
    pub(crate) fn insert_entry(
        &mut self,
        key: NodeKey,
        parent: NodeKey,
        data: NodeData,
    ) -> Result<(), ApplyError> {
        self.entry_mut(parent)?.children.push(key);
        self.nodes.insert(
            key,
            NodeEntry {
                key,
                parent: Some(parent),
                children: Vec::new(),
                data,
            },
        );
        self.next_key = self.next_key.max(key.0 + 1);
        Ok(())
    }

    pub(crate) fn reserve_keys_above(&mut self, key: NodeKey) {
        self.next_key = self.next_key.max(key.0 + 1);
    }

    pub(crate) fn insert_tree(
        &mut self,
        parent: NodeKey,
        index: usize,
        tree: NodeTree,
    ) -> Result<NodeKey, ApplyError> {
        let len = self.children(parent).len();
        if !self.contains(parent) {
            return Err(ApplyError::MissingNode(parent));
        }
        if index > len {
            return Err(ApplyError::InvalidIndex { parent, index, len });
        }
        let key = self.build(parent, tree);
        self.entry_mut(parent)?.children.insert(index, key);
        Ok(key)
    }

    fn build(&mut self, parent: NodeKey, tree: NodeTree) -> NodeKey {
        let key = self.alloc_key();
        let NodeTree { data, children } = tree;
        self.nodes.insert(
            key,
            NodeEntry {
                key,
                parent: Some(parent),
                children: Vec::new(),
                data,
            },
        );
        let child_keys: Vec<NodeKey> = children
            .into_iter()
            .map(|child| self.build(key, child))
            .collect();
        if let Some(entry) = self.nodes.get_mut(&key) {
            entry.children = child_keys;
        }
        key
    }

    pub(crate) fn remove(&mut self, key: NodeKey) -> Result<NodeTree, ApplyError> {
        if key == NodeKey::ROOT {
            return Err(ApplyError::RootMutation);
        }
        let tree = self.subtree(key).ok_or(ApplyError::MissingNode(key))?;
        if let Some(parent) = self.parent(key) {
            self.entry_mut(parent)?.children.retain(|k| *k != key);
        }
        for node in std::iter::once(key).chain(self.descendants(key)) {
            self.nodes.remove(&node);
        }
        Ok(tree)
    }

    /// Moves `key` under `parent`. `index` is interpreted after `key` has been detached.
    pub(crate) fn move_node(
        &mut self,
        key: NodeKey,
        parent: NodeKey,
        index: usize,
    ) -> Result<(), ApplyError> {
        if key == NodeKey::ROOT {
            return Err(ApplyError::RootMutation);
        }
        if !self.contains(key) {
            return Err(ApplyError::MissingNode(key));
        }
        if !self.contains(parent) {
            return Err(ApplyError::MissingNode(parent));
        }
        if key == parent || self.is_ancestor(key, parent) {
            return Err(ApplyError::Cycle { key, parent });
        }

        let old_parent = self.parent(key).ok_or(ApplyError::MissingNode(key))?;
        let len = self.children(parent).len() - usize::from(old_parent == parent);
        if index > len {
            return Err(ApplyError::InvalidIndex { parent, index, len });
        }
        self.entry_mut(old_parent)?.children.retain(|k| *k != key);
        self.entry_mut(parent)?.children.insert(index, key);
        self.entry_mut(key)?.parent = Some(parent);
        Ok(())
    }

    pub(crate) fn set_data(&mut self, key: NodeKey, data: NodeData) -> Result<NodeData, ApplyError> {
        if key == NodeKey::ROOT && data != NodeData::Root {
            return Err(ApplyError::RootMutation);
        }
        Ok(std::mem::replace(&mut self.entry_mut(key)?.data, data))
    }

    pub(crate) fn data_mut(&mut self, key: NodeKey) -> Result<&mut NodeData, ApplyError> {
        Ok(&mut self.entry_mut(key)?.data)
    }

    /// Wraps sibling nodes in a new parent placed where the first of them was.
    pub(crate) fn wrap(
        &mut self,
        keys: &[NodeKey],
        wrapper: NodeData,
    ) -> Result<NodeKey, ApplyError> {
        let first = *keys.first().ok_or(ApplyError::NotSiblings)?;
        let parent = self.parent(first).ok_or(ApplyError::RootMutation)?;
        let mut ordered = Vec::with_capacity(keys.len());
        for key in keys {
            if self.parent(*key) != Some(parent) {
                return Err(ApplyError::NotSiblings);
            }
            let ix = self.index_in_parent(*key).ok_or(ApplyError::MissingNode(*key))?;
            ordered.push((ix, *key));
        }
        ordered.sort();
        ordered.dedup();

        let index = ordered[0].0;
        let wrapper = self.insert_tree(parent, index, NodeTree::leaf(wrapper))?;
        for (i, (_, key)) in ordered.into_iter().enumerate() {
            self.move_node(key, wrapper, i)?;
        }
        Ok(wrapper)
    }

    /// Replaces a node with its children.
    pub(crate) fn unwrap(&mut self, key: NodeKey) -> Result<Vec<NodeKey>, ApplyError> {
        if key == NodeKey::ROOT {
            return Err(ApplyError::RootMutation);
        }
        let parent = self.parent(key).ok_or(ApplyError::MissingNode(key))?;
        let index = self.index_in_parent(key).ok_or(ApplyError::MissingNode(key))?;
        let children = self.children(key).to_vec();
        for (i, child) in children.iter().enumerate() {
            self.move_node(*child, parent, index + 1 + i)?;
        }
        self.remove(key)?;
        Ok(children)
    }
}
