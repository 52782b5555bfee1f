use richfield_html::Element;
use serde::Deserialize;

use super::{BLOCK_TAGS, args};
use crate::nodes::{NodeData, NodeKind, ParagraphData, TextAlign};
use crate::normalize::core_passes;
use crate::plugin::{
    ChildConstraint, CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher,
    NodeRole, NodeSpec, NormalizePass,
};

pub(crate) struct CorePlugin;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InsertTextArgs {
    text: String,
}

fn paragraph(el: &Element) -> Option<DomConversion> {
    Some(DomConversion::node(NodeData::Paragraph(ParagraphData {
        align: TextAlign::from_element(el),
    })))
}

/// A `<div>` that only holds inline content reads as a paragraph.
fn plain_div(el: &Element) -> Option<DomConversion> {
    let has_blocks = el
        .element_children()
        .any(|child| BLOCK_TAGS.contains(&child.tag.as_str()));
    if has_blocks {
        return None;
    }
    paragraph(el)
}

impl EditorPlugin for CorePlugin {
    fn id(&self) -> &'static str {
        "core"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::block(NodeKind::Root, ChildConstraint::BlockOnly),
            NodeSpec::block(NodeKind::Paragraph, ChildConstraint::InlineOnly),
            NodeSpec::void(NodeKind::Text, NodeRole::Inline),
            NodeSpec::void(NodeKind::LineBreak, NodeRole::Inline),
        ]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![
            ImportMatcher::new("p", 0, paragraph),
            ImportMatcher::new("div", 0, plain_div),
            ImportMatcher::new("br", 0, |_| Some(DomConversion::leaf(NodeData::LineBreak))),
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        core_passes()
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("text.insert", "Insert text", |txn, payload| {
                let InsertTextArgs { text } = args("text.insert", payload)?;
                if text.is_empty() {
                    return Ok(CommandOutcome::NotHandled);
                }
                Ok(txn.insert_text(&text)?.into())
            })
            .description("Insert plain text at the caret.")
            .keywords(["type", "text", "insert"])
            .args_example(serde_json::json!({ "text": "hello" })),
        ]
    }
}
