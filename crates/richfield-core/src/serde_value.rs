use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Document, NodeKey};
use crate::error::EditorError;
use crate::nodes::{NodeData, NodeKind};

const DEFAULT_SCHEMA: &str = "richfield";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

/// One node of the JSON tree format: `{key?, type, ...fields, children}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<NodeKey>,
    #[serde(flatten)]
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SerializedNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichfieldValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub root: SerializedNode,
}

impl RichfieldValue {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            root: serialize_node(doc, doc.root()),
        }
    }

    /// Rebuilds a document. Keys present in the value are preserved; missing ones are allocated.
    pub fn into_document(self) -> Result<Document, EditorError> {
        if self.schema != DEFAULT_SCHEMA || self.version > DEFAULT_VERSION {
            return Err(EditorError::UnsupportedSchema {
                schema: self.schema,
                version: self.version,
            });
        }
        if self.root.data != NodeData::Root {
            return Err(EditorError::InvalidRoot(self.root.data.kind().to_string()));
        }

        let mut used = HashSet::from([NodeKey::ROOT]);
        collect_keys(&self.root.children, &mut used)?;

        let mut doc = Document::new();
        if let Some(max) = used.iter().max() {
            doc.reserve_keys_above(*max);
        }
        let mut next = used.iter().map(|k| k.get()).max().unwrap_or(0) + 1;
        build(&mut doc, NodeKey::ROOT, self.root.children, &mut next)?;
        Ok(doc)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses the JSON form, reporting unknown node types by name.
    pub fn from_json_str(s: &str) -> Result<Self, EditorError> {
        let value: Value = serde_json::from_str(s)?;
        if let Some(root) = value.get("root") {
            check_types(root)?;
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Node kinds used anywhere in the tree.
    pub fn kinds(&self) -> HashSet<NodeKind> {
        fn walk(node: &SerializedNode, out: &mut HashSet<NodeKind>) {
            out.insert(node.data.kind());
            for child in &node.children {
                walk(child, out);
            }
        }
        let mut out = HashSet::new();
        walk(&self.root, &mut out);
        out
    }
}

fn serialize_node(doc: &Document, key: NodeKey) -> SerializedNode {
    SerializedNode {
        key: Some(key),
        data: doc.data(key).cloned().unwrap_or(NodeData::Root),
        children: doc
            .children(key)
            .iter()
            .map(|child| serialize_node(doc, *child))
            .collect(),
    }
}

fn collect_keys(nodes: &[SerializedNode], used: &mut HashSet<NodeKey>) -> Result<(), EditorError> {
    for node in nodes {
        if let Some(key) = node.key {
            if !used.insert(key) {
                return Err(EditorError::DuplicateKey(key));
            }
        }
        collect_keys(&node.children, used)?;
    }
    Ok(())
}

fn build(
    doc: &mut Document,
    parent: NodeKey,
    nodes: Vec<SerializedNode>,
    next: &mut u32,
) -> Result<(), EditorError> {
    for node in nodes {
        if node.data == NodeData::Root {
            return Err(EditorError::InvalidRoot("nested root".to_string()));
        }
        let key = node.key.unwrap_or_else(|| {
            let key = NodeKey::new(*next);
            *next += 1;
            key
        });
        doc.insert_entry(key, parent, node.data)?;
        build(doc, key, node.children, next)?;
    }
    Ok(())
}

fn check_types(node: &Value) -> Result<(), EditorError> {
    if let Some(tag) = node.get("type").and_then(Value::as_str) {
        if NodeKind::parse(tag).is_none() {
            return Err(EditorError::UnknownNodeType(tag.to_string()));
        }
    }
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            check_types(child)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NodeTree;
    use serde_json::json;

    #[test]
    fn keys_survive_a_round_trip() {
        let mut doc = Document::new();
        doc.insert_tree(doc.root(), 0, NodeTree::paragraph("hello"))
            .unwrap();
        let value = RichfieldValue::from_document(&doc);
        let json = value.to_json_pretty().unwrap();
        let back = RichfieldValue::from_json_str(&json)
            .unwrap()
            .into_document()
            .unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn unknown_types_are_reported_by_name() {
        let json = json!({
            "root": {"type": "root", "children": [{"type": "poll"}]}
        });
        let err = RichfieldValue::from_json_str(&json.to_string()).unwrap_err();
        assert!(matches!(err, EditorError::UnknownNodeType(name) if name == "poll"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let json = json!({
            "schema": "richfield",
            "version": 1,
            "root": {"type": "root", "children": [
                {"key": 3, "type": "paragraph"},
                {"key": 3, "type": "paragraph"}
            ]}
        });
        let value = RichfieldValue::from_json_str(&json.to_string()).unwrap();
        assert!(matches!(
            value.into_document(),
            Err(EditorError::DuplicateKey(key)) if key == NodeKey::new(3)
        ));
    }
}
