use richfield_html::{DomNode, parse_fragment};

use crate::document::NodeTree;
use crate::nodes::NodeData;
use crate::plugin::{ChildConstraint, ChildHandling, DomConversion, PluginRegistry};

/// Parses an HTML fragment into detached trees using the registry's matchers.
/// The input is expected to be sanitized already.
pub fn import_html(html: &str, registry: &PluginRegistry) -> Vec<NodeTree> {
    import_dom(&parse_fragment(html), registry)
}

pub fn import_dom(nodes: &[DomNode], registry: &PluginRegistry) -> Vec<NodeTree> {
    let mut trees = convert_nodes(nodes, registry, false);
    trees.retain(|tree| !is_blank_text(tree));
    trees
}

fn convert_nodes(nodes: &[DomNode], registry: &PluginRegistry, pre: bool) -> Vec<NodeTree> {
    nodes
        .iter()
        .flat_map(|node| convert_node(node, registry, pre))
        .collect()
}

fn convert_node(node: &DomNode, registry: &PluginRegistry, pre: bool) -> Vec<NodeTree> {
    match node {
        DomNode::Comment(_) => Vec::new(),
        DomNode::Text(text) if pre => preformatted_text(text),
        DomNode::Text(text) => vec![NodeTree::text(collapse_whitespace(text))],
        DomNode::Element(el) => {
            let conversion = registry
                .matchers(&el.tag)
                .iter()
                .find_map(|matcher| (matcher.convert)(el))
                .unwrap_or_else(DomConversion::pass_through);
            let pre = pre || conversion.preformatted;

            let mut children = match conversion.children {
                ChildHandling::Convert => convert_nodes(&el.children, registry, pre),
                ChildHandling::Skip => Vec::new(),
            };
            if let Some(for_child) = &conversion.for_child {
                for child in &mut children {
                    child.for_each_data_mut(for_child.as_ref());
                }
            }

            match conversion.node {
                Some(data) => {
                    if !pre {
                        tidy_children(&data, &mut children, registry);
                    }
                    vec![NodeTree::new(data, children)]
                }
                None => children,
            }
        }
    }
}

fn preformatted_text(text: &str) -> Vec<NodeTree> {
    let mut out = Vec::new();
    for (ix, line) in text.split('\n').enumerate() {
        if ix > 0 {
            out.push(NodeTree::leaf(NodeData::LineBreak));
        }
        if !line.is_empty() {
            out.push(NodeTree::text(line));
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0c') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn is_blank_text(tree: &NodeTree) -> bool {
    matches!(&tree.data, NodeData::Text(text) if text.text.trim().is_empty())
}

/// Whitespace handling the way browsers lay it out: block containers ignore
/// whitespace-only text; inline content is trimmed at its edges and never
/// carries two spaces across a node boundary.
fn tidy_children(parent: &NodeData, children: &mut Vec<NodeTree>, registry: &PluginRegistry) {
    let kind = parent.kind();
    let constraint = registry.child_constraint(kind);
    let holds_inline = matches!(constraint, ChildConstraint::InlineOnly | ChildConstraint::Any);

    if !holds_inline || registry.is_inline(kind) {
        if !holds_inline {
            children.retain(|child| !is_blank_text(child));
        }
        return;
    }

    let mut previous_space = true;
    for child in children.iter_mut() {
        match &mut child.data {
            NodeData::Text(text) => {
                if previous_space {
                    text.text = text.text.trim_start_matches(' ').to_string();
                }
                if !text.text.is_empty() {
                    previous_space = text.text.ends_with(' ');
                }
            }
            NodeData::LineBreak => previous_space = true,
            data if registry.is_inline(data.kind()) => previous_space = false,
            _ => previous_space = true,
        }
    }
    if let Some(NodeData::Text(text)) = children.last_mut().map(|c| &mut c.data) {
        let trimmed = text.text.trim_end_matches(' ').len();
        text.text.truncate(trimmed);
    }
    children.retain(|child| !matches!(&child.data, NodeData::Text(t) if t.text.is_empty()));

    if children.len() == 1 && children[0].data == NodeData::LineBreak {
        children.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        assert_eq!(collapse_whitespace("a \n\t b"), "a b");
        assert_eq!(collapse_whitespace("a\u{a0}\u{a0}b"), "a\u{a0}\u{a0}b");
    }

    #[test]
    fn preformatted_lines_become_line_breaks() {
        let trees = preformatted_text("a\nb");
        assert_eq!(trees.len(), 3);
        assert_eq!(trees[1].data, NodeData::LineBreak);
    }
}
