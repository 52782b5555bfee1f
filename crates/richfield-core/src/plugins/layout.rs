use richfield_html::Element;
use serde::Deserialize;

use super::args;
use crate::document::{Document, NodeTree};
use crate::nodes::{LayoutData, NodeData, NodeKind};
use crate::ops::Op;
use crate::plugin::{
    ChildConstraint, CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher,
    NodeSpec, NormalizePass, PluginRegistry,
};

pub(crate) struct LayoutPlugin;

fn layout(el: &Element) -> Option<DomConversion> {
    if el.has_class("rf-layout") {
        return Some(DomConversion::node(NodeData::Layout(LayoutData::from_element(el))));
    }
    if el.has_class("rf-layout-item") {
        return Some(DomConversion::node(NodeData::LayoutItem));
    }
    None
}

/// A layout always has one item per column.
struct FillLayoutColumns;

impl NormalizePass for FillLayoutColumns {
    fn id(&self) -> &'static str {
        "layout.fill_columns"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for key in doc.keys() {
            let Some(NodeData::Layout(data)) = doc.data(key) else {
                continue;
            };
            let items = doc.children(key).len();
            for index in items..usize::from(data.columns) {
                ops.push(Op::insert(key, index, NodeTree::leaf(NodeData::LayoutItem)));
            }
        }
        ops
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InsertLayoutArgs {
    columns: Option<u8>,
    template: Option<String>,
}

impl EditorPlugin for LayoutPlugin {
    fn id(&self) -> &'static str {
        "layout"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::block(NodeKind::Layout, ChildConstraint::Kinds(&[NodeKind::LayoutItem])),
            NodeSpec::block(NodeKind::LayoutItem, ChildConstraint::BlockOnly),
        ]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![ImportMatcher::new("div", 2, layout)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(FillLayoutColumns)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("layout.insert", "Insert columns", |txn, payload| {
                let InsertLayoutArgs { columns, template } = args("layout.insert", payload)?;
                let data = LayoutData::new(columns.unwrap_or(2), template.as_deref());
                let items = (0..data.columns)
                    .map(|_| NodeTree::new(NodeData::LayoutItem, vec![NodeTree::paragraph("")]))
                    .collect();
                txn.insert_block(NodeTree::new(NodeData::Layout(data), items))?;
                Ok(CommandOutcome::Handled)
            })
            .description("Insert a column layout after the current block.")
            .keywords(["layout", "columns", "grid"])
            .toolbar_item("layout")
            .args_example(serde_json::json!({ "columns": 3, "template": "1fr 2fr 1fr" })),
        ]
    }
}
