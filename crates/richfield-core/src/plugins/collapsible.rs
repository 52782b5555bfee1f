use richfield_html::Element;
use serde::Deserialize;

use super::args;
use crate::document::{Document, NodeKey, NodeTree};
use crate::nodes::{CollapsibleData, NodeData, NodeKind};
use crate::ops::Op;
use crate::plugin::{
    ChildConstraint, CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher,
    NodeSpec, NormalizePass, PluginRegistry,
};

pub(crate) struct CollapsiblePlugin;

fn details(el: &Element) -> Option<DomConversion> {
    Some(DomConversion::node(NodeData::Collapsible(CollapsibleData {
        is_open: el.attr("open").is_some(),
    })))
}

fn content(el: &Element) -> Option<DomConversion> {
    el.has_class("rf-collapsible-content")
        .then(|| DomConversion::node(NodeData::CollapsibleContent))
}

/// Keeps every collapsible shaped as exactly one title followed by one content block.
/// One repair per collapsible per run.
struct CollapsibleShape;

impl CollapsibleShape {
    fn repair(doc: &Document, key: NodeKey) -> Vec<Op> {
        let children = doc.children(key);
        let of_kind = |kind: NodeKind| {
            children
                .iter()
                .copied()
                .filter(move |child| doc.kind(*child) == Some(kind))
        };
        let Some(title) = of_kind(NodeKind::CollapsibleTitle).next() else {
            return vec![Op::insert(key, 0, NodeTree::leaf(NodeData::CollapsibleTitle))];
        };
        let Some(content) = of_kind(NodeKind::CollapsibleContent).next() else {
            let body: Vec<NodeKey> = children
                .iter()
                .copied()
                .filter(|child| doc.kind(*child) != Some(NodeKind::CollapsibleTitle))
                .collect();
            if body.is_empty() {
                return vec![Op::insert(
                    key,
                    children.len(),
                    NodeTree::leaf(NodeData::CollapsibleContent),
                )];
            }
            return vec![Op::Wrap {
                keys: body,
                wrapper: NodeData::CollapsibleContent,
            }];
        };
        if children.first() != Some(&title) {
            return vec![Op::MoveNode {
                key: title,
                parent: key,
                index: 0,
            }];
        }

        let extra_contents: Vec<Op> = of_kind(NodeKind::CollapsibleContent)
            .skip(1)
            .map(|key| Op::Unwrap { key })
            .collect();
        if !extra_contents.is_empty() {
            return extra_contents;
        }

        let mut ops = Vec::new();
        let base = doc.children(content).len();
        let extras = children
            .iter()
            .copied()
            .filter(|child| *child != title && *child != content);
        for (i, extra) in extras.enumerate() {
            if doc.kind(extra) == Some(NodeKind::CollapsibleTitle) {
                ops.push(Op::SetData {
                    key: extra,
                    data: NodeData::paragraph(),
                });
            }
            ops.push(Op::MoveNode {
                key: extra,
                parent: content,
                index: base + i,
            });
        }
        ops
    }
}

impl NormalizePass for CollapsibleShape {
    fn id(&self) -> &'static str {
        "collapsible.shape"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        doc.keys()
            .into_iter()
            .filter(|key| doc.kind(*key) == Some(NodeKind::Collapsible))
            .flat_map(|key| Self::repair(doc, key))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct InsertCollapsibleArgs {
    title: String,
    open: bool,
}

impl Default for InsertCollapsibleArgs {
    fn default() -> Self {
        Self {
            title: String::new(),
            open: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToggleCollapsibleArgs {
    key: Option<NodeKey>,
    open: Option<bool>,
}

impl EditorPlugin for CollapsiblePlugin {
    fn id(&self) -> &'static str {
        "collapsible"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::block(
                NodeKind::Collapsible,
                ChildConstraint::Kinds(&[NodeKind::CollapsibleTitle, NodeKind::CollapsibleContent]),
            ),
            NodeSpec::block(NodeKind::CollapsibleTitle, ChildConstraint::InlineOnly),
            NodeSpec::block(NodeKind::CollapsibleContent, ChildConstraint::BlockOnly),
        ]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![
            ImportMatcher::new("details", 0, details),
            ImportMatcher::new("summary", 0, |_| {
                Some(DomConversion::node(NodeData::CollapsibleTitle))
            }),
            ImportMatcher::new("div", 2, content),
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(CollapsibleShape)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("collapsible.insert", "Collapsible section", |txn, payload| {
                let InsertCollapsibleArgs { title, open } = args("collapsible.insert", payload)?;
                let tree = NodeTree::new(
                    NodeData::Collapsible(CollapsibleData { is_open: open }),
                    vec![
                        NodeTree::new(NodeData::CollapsibleTitle, vec![NodeTree::text(title)]),
                        NodeTree::new(NodeData::CollapsibleContent, vec![NodeTree::paragraph("")]),
                    ],
                );
                txn.insert_block(tree)?;
                Ok(CommandOutcome::Handled)
            })
            .description("Insert a collapsible section with the caret in its title.")
            .keywords(["collapsible", "details", "toggle", "accordion"])
            .toolbar_item("collapsible")
            .args_example(serde_json::json!({ "title": "More", "open": true })),
            CommandSpec::new("collapsible.toggle", "Open or close section", |txn, payload| {
                let ToggleCollapsibleArgs { key, open } = args("collapsible.toggle", payload)?;
                let target = key.or_else(|| {
                    txn.selection()
                        .focus_key()
                        .and_then(|focus| txn.doc().nearest(focus, NodeKind::Collapsible))
                });
                let Some(target) = target else {
                    return Ok(CommandOutcome::NotHandled);
                };
                let NodeData::Collapsible(data) = txn.writable(target)? else {
                    return Ok(CommandOutcome::NotHandled);
                };
                data.is_open = open.unwrap_or(!data.is_open);
                Ok(CommandOutcome::Handled)
            })
            .description("Flip or set the open state of a collapsible section.")
            .keywords(["collapsible", "open", "close", "expand"])
            .toolbar_item("collapsible")
            .args_example(serde_json::json!({ "open": false })),
        ]
    }
}
