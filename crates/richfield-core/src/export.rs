use richfield_html::{DomNode, serialize};

use crate::document::{Document, NodeKey};
use crate::nodes::{DomExport, NodeData};

/// Depth-first export. `node_dom` decides each node's own output; children are
/// appended into the element slot it names.
pub(crate) fn walk(
    doc: &Document,
    key: NodeKey,
    node_dom: &mut dyn FnMut(NodeKey, &NodeData) -> DomExport,
) -> Vec<DomNode> {
    let Some(data) = doc.data(key) else {
        return Vec::new();
    };
    match node_dom(key, data) {
        DomExport::Leaf(nodes) => nodes,
        DomExport::Children => doc
            .children(key)
            .iter()
            .flat_map(|child| walk(doc, *child, node_dom))
            .collect(),
        DomExport::Element { mut element, slot } => {
            let children: Vec<DomNode> = doc
                .children(key)
                .iter()
                .flat_map(|child| walk(doc, *child, node_dom))
                .collect();
            match element.descendant_mut(&slot) {
                Some(target) => target.children.extend(children),
                None => element.children.extend(children),
            }
            vec![element.into()]
        }
    }
}

/// Static DOM for the subtree at `key`. Depends on tree content only.
pub fn export_dom(doc: &Document, key: NodeKey) -> Vec<DomNode> {
    walk(doc, key, &mut |_, data| data.export_dom())
}

/// The persisted HTML form of the document. Callers sanitize the result.
pub fn export_html(doc: &Document) -> String {
    serialize(&export_dom(doc, doc.root()))
}
