use richfield_html::Element;
use serde::Deserialize;

use super::args;
use crate::document::NodeKey;
use crate::error::CommandError;
use crate::nodes::{HeadingData, NodeData, NodeKind, ParagraphData, TextAlign};
use crate::plugin::{
    ChildConstraint, CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher,
    NodeSpec,
};
use crate::txn::Txn;

pub(crate) struct BlockPlugin;

fn heading(el: &Element) -> Option<DomConversion> {
    let level = el.tag.strip_prefix('h')?.parse::<u8>().ok()?;
    let mut data = HeadingData::new(level);
    data.align = TextAlign::from_element(el);
    Some(DomConversion::node(NodeData::Heading(data)))
}

/// Paragraph, heading and quote blocks touched by the selection.
fn text_blocks(txn: &Txn<'_>) -> Vec<NodeKey> {
    txn.selected_blocks()
        .into_iter()
        .filter(|key| {
            matches!(
                txn.doc().kind(*key),
                Some(NodeKind::Paragraph | NodeKind::Heading | NodeKind::Quote)
            )
        })
        .collect()
}

/// Converts every selected text block. When all of them already match `is_target`,
/// they revert to paragraphs instead.
fn set_block_type(
    txn: &mut Txn<'_>,
    is_target: impl Fn(&NodeData) -> bool,
    make: impl Fn(Option<TextAlign>) -> NodeData,
) -> Result<CommandOutcome, CommandError> {
    let blocks = text_blocks(txn);
    if blocks.is_empty() {
        return Ok(CommandOutcome::NotHandled);
    }
    let all_match = blocks
        .iter()
        .all(|key| txn.doc().data(*key).is_some_and(&is_target));
    for key in blocks {
        let align = txn.doc().data(key).and_then(NodeData::align);
        let data = if all_match {
            NodeData::Paragraph(ParagraphData { align })
        } else {
            make(align)
        };
        txn.set_data(key, data)?;
    }
    Ok(CommandOutcome::Handled)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HeadingArgs {
    level: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlignArgs {
    align: Option<String>,
}

impl EditorPlugin for BlockPlugin {
    fn id(&self) -> &'static str {
        "block"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::block(NodeKind::Heading, ChildConstraint::InlineOnly),
            NodeSpec::block(NodeKind::Quote, ChildConstraint::InlineOnly),
        ]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        let mut matchers: Vec<ImportMatcher> = ["h1", "h2", "h3", "h4", "h5", "h6"]
            .into_iter()
            .map(|tag| ImportMatcher::new(tag, 0, heading))
            .collect();
        matchers.push(ImportMatcher::new("blockquote", 0, |_| {
            Some(DomConversion::node(NodeData::Quote))
        }));
        matchers
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.paragraph", "Paragraph", |txn, _payload| {
                let blocks: Vec<NodeKey> = text_blocks(txn)
                    .into_iter()
                    .filter(|key| txn.doc().kind(*key) != Some(NodeKind::Paragraph))
                    .collect();
                if blocks.is_empty() {
                    return Ok(CommandOutcome::NotHandled);
                }
                for key in blocks {
                    let align = txn.doc().data(key).and_then(NodeData::align);
                    txn.set_data(key, NodeData::Paragraph(ParagraphData { align }))?;
                }
                Ok(CommandOutcome::Handled)
            })
            .description("Turn the selected blocks into paragraphs.")
            .keywords(["paragraph", "normal", "text"])
            .toolbar_item("blockType"),
            CommandSpec::new("block.heading", "Heading", |txn, payload| {
                let HeadingArgs { level } = args("block.heading", payload)?;
                let level = match level {
                    None => 1,
                    Some(level @ 1..=6) => level,
                    Some(level) => {
                        return Err(CommandError::invalid_payload(
                            "block.heading",
                            format!("heading level {level} is outside 1..=6"),
                        ));
                    }
                };
                set_block_type(
                    txn,
                    |data| matches!(data, NodeData::Heading(h) if h.level == level),
                    |align| {
                        let mut heading = HeadingData::new(level);
                        heading.align = align;
                        NodeData::Heading(heading)
                    },
                )
            })
            .description("Toggle the selected blocks between a heading level and paragraphs.")
            .keywords(["heading", "title", "h1", "h2", "h3"])
            .toolbar_item("blockType")
            .args_example(serde_json::json!({ "level": 2 })),
            CommandSpec::new("block.quote", "Quote", |txn, _payload| {
                set_block_type(
                    txn,
                    |data| matches!(data, NodeData::Quote),
                    |_| NodeData::Quote,
                )
            })
            .description("Toggle the selected blocks between quotes and paragraphs.")
            .keywords(["quote", "blockquote", "citation"])
            .toolbar_item("blockType"),
            CommandSpec::new("block.align", "Align", |txn, payload| {
                let AlignArgs { align } = args("block.align", payload)?;
                let align = match align.as_deref() {
                    None | Some("") => None,
                    Some(value) => match TextAlign::parse(value) {
                        Some(align) => Some(align),
                        None => {
                            return Err(CommandError::invalid_payload(
                                "block.align",
                                format!("unknown alignment `{value}`"),
                            ));
                        }
                    },
                };
                let blocks = text_blocks(txn);
                let mut changed = false;
                for key in blocks {
                    match txn.writable(key)? {
                        NodeData::Paragraph(p) => p.align = align,
                        NodeData::Heading(h) => h.align = align,
                        _ => continue,
                    }
                    changed = true;
                }
                Ok(changed.into())
            })
            .description("Set or clear text alignment on the selected blocks.")
            .keywords(["align", "left", "center", "right", "justify"])
            .toolbar_item("alignment")
            .args_example(serde_json::json!({ "align": "center" })),
        ]
    }
}
