use richfield_html::Element;
use serde::Deserialize;

use super::args;
use crate::document::NodeKey;
use crate::error::CommandError;
use crate::nodes::{ListData, ListKind, NodeData, NodeKind};
use crate::plugin::{
    ChildConstraint, CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher,
    NodeSpec,
};
use crate::txn::Txn;

pub(crate) struct ListPlugin;

fn ordered_list(el: &Element) -> Option<DomConversion> {
    let mut data = ListData::new(ListKind::Number);
    if let Some(start) = el.attr("start").and_then(|s| s.trim().parse::<u32>().ok()) {
        data.start = start;
    }
    Some(DomConversion::node(NodeData::List(data)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToggleListArgs {
    kind: ListKind,
}

/// Turns a list back into paragraphs. Items holding blocks are unwrapped instead.
fn dissolve_list(txn: &mut Txn<'_>, list: NodeKey) -> Result<(), CommandError> {
    let registry = txn.registry();
    for item in txn.doc().children(list).to_vec() {
        let inline_only = txn.doc().children(item).iter().all(|child| {
            txn.doc()
                .kind(*child)
                .is_some_and(|kind| registry.is_inline(kind))
        });
        if inline_only {
            txn.set_data(item, NodeData::paragraph())?;
        } else {
            txn.unwrap_node(item)?;
        }
    }
    txn.unwrap_node(list)?;
    Ok(())
}

fn toggle_list(txn: &mut Txn<'_>, kind: ListKind) -> Result<CommandOutcome, CommandError> {
    let blocks = txn.selected_blocks();
    let Some(first) = blocks.first().copied() else {
        return Ok(CommandOutcome::NotHandled);
    };

    if txn.doc().kind(first) == Some(NodeKind::ListItem) {
        let Some(list) = txn.doc().parent(first) else {
            return Ok(CommandOutcome::NotHandled);
        };
        let Some(NodeData::List(data)) = txn.doc().data(list).cloned() else {
            return Ok(CommandOutcome::NotHandled);
        };
        if data.kind == kind {
            dissolve_list(txn, list)?;
        } else {
            txn.set_data(list, NodeData::List(ListData { kind, ..data }))?;
        }
        return Ok(CommandOutcome::Handled);
    }

    let parent = txn.doc().parent(first);
    let siblings: Vec<NodeKey> = blocks
        .into_iter()
        .filter(|key| {
            txn.doc().parent(*key) == parent
                && matches!(
                    txn.doc().kind(*key),
                    Some(NodeKind::Paragraph | NodeKind::Heading | NodeKind::Quote)
                )
        })
        .collect();
    if siblings.is_empty() {
        return Ok(CommandOutcome::NotHandled);
    }
    for key in &siblings {
        txn.set_data(*key, NodeData::ListItem)?;
    }
    txn.wrap(&siblings, NodeData::List(ListData::new(kind)))?;
    Ok(CommandOutcome::Handled)
}

impl EditorPlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::block(NodeKind::List, ChildConstraint::Kinds(&[NodeKind::ListItem])),
            NodeSpec::block(NodeKind::ListItem, ChildConstraint::Any),
        ]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![
            ImportMatcher::new("ul", 0, |_| {
                Some(DomConversion::node(NodeData::List(ListData::new(
                    ListKind::Bullet,
                ))))
            }),
            ImportMatcher::new("ol", 0, ordered_list),
            ImportMatcher::new("li", 0, |_| Some(DomConversion::node(NodeData::ListItem))),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("list.toggle", "Toggle list", |txn, payload| {
                let ToggleListArgs { kind } = args("list.toggle", payload)?;
                toggle_list(txn, kind)
            })
            .description("Wrap the selected blocks in a list, switch its kind, or remove it.")
            .keywords(["list", "bullet", "number", "ordered", "unordered"])
            .toolbar_item("list")
            .args_example(serde_json::json!({ "kind": "number" })),
        ]
    }
}
