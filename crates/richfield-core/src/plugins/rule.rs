use crate::document::NodeTree;
use crate::nodes::{NodeData, NodeKind};
use crate::plugin::{
    CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher, NodeRole, NodeSpec,
};

pub(crate) struct RulePlugin;

impl EditorPlugin for RulePlugin {
    fn id(&self) -> &'static str {
        "rule"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::void(NodeKind::HorizontalRule, NodeRole::Block)]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![ImportMatcher::new("hr", 0, |_| {
            Some(DomConversion::leaf(NodeData::HorizontalRule))
        })]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("rule.insert", "Horizontal rule", |txn, _payload| {
                txn.insert_block(NodeTree::leaf(NodeData::HorizontalRule))?;
                Ok(CommandOutcome::Handled)
            })
            .description("Insert a horizontal rule after the current block.")
            .keywords(["rule", "divider", "separator", "hr"])
            .toolbar_item("horizontalRule"),
        ]
    }
}
