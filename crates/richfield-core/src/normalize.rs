use crate::document::{Document, NodeKey, NodeTree};
use crate::error::ApplyError;
use crate::nodes::{NodeData, NodeKind, TableCellData};
use crate::ops::{Op, apply_op};
use crate::plugin::{ChildConstraint, NormalizePass, PluginRegistry};
use crate::selection::Selection;

/// Runs every registered pass until none of them produces an op.
pub(crate) fn normalize_document(
    doc: &mut Document,
    selection: &mut Selection,
    registry: &PluginRegistry,
    max_iterations: usize,
) -> Result<(), ApplyError> {
    for _ in 0..max_iterations {
        let mut changed = false;
        for pass in registry.normalize_passes() {
            let ops = pass.run(doc, registry);
            if ops.is_empty() {
                continue;
            }
            tracing::trace!(pass = pass.id(), ops = ops.len(), "normalize pass produced ops");
            for op in ops {
                apply_op(doc, selection, op)?;
            }
            changed = true;
        }
        if !changed {
            return Ok(());
        }
    }
    tracing::warn!(iterations = max_iterations, "normalization did not converge");
    Err(ApplyError::NormalizeDidNotConverge(max_iterations))
}

/// Structural passes every registry needs regardless of which node plugins are loaded.
pub(crate) fn core_passes() -> Vec<Box<dyn NormalizePass>> {
    vec![
        Box::new(HoistBlocksOutOfInline),
        Box::new(EnsureChildKinds),
        Box::new(WrapStrayInline),
        Box::new(EnsureBlockContent),
        Box::new(EnsureInlineText),
        Box::new(MergeAdjacentText),
    ]
}

fn keys_with_constraint<'a>(
    doc: &'a Document,
    registry: &'a PluginRegistry,
    mut predicate: impl FnMut(NodeKind, ChildConstraint) -> bool + 'a,
) -> impl Iterator<Item = NodeKey> + 'a {
    doc.keys().into_iter().filter(move |key| {
        doc.kind(*key)
            .is_some_and(|kind| predicate(kind, registry.child_constraint(kind)))
    })
}

fn is_inline(doc: &Document, registry: &PluginRegistry, key: NodeKey) -> bool {
    doc.kind(key).is_some_and(|kind| registry.is_inline(kind))
}

/// Blocks nested in inline-only containers move out to just after the container.
struct HoistBlocksOutOfInline;

impl NormalizePass for HoistBlocksOutOfInline {
    fn id(&self) -> &'static str {
        "core.hoist_blocks"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        let mut keys = doc.keys();
        keys.reverse();
        for key in keys {
            let Some(container) = doc.parent(key) else {
                continue;
            };
            let Some(container_kind) = doc.kind(container) else {
                continue;
            };
            if registry.child_constraint(container_kind) != ChildConstraint::InlineOnly
                || is_inline(doc, registry, key)
            {
                continue;
            }
            let (Some(outer), Some(index)) = (doc.parent(container), doc.index_in_parent(container))
            else {
                continue;
            };
            ops.push(Op::MoveNode {
                key,
                parent: outer,
                index: index + 1,
            });
        }
        ops
    }
}

/// The node a misfit child is wrapped in when its parent only accepts certain kinds.
fn wrapper_for(kind: NodeKind) -> Option<NodeData> {
    match kind {
        NodeKind::ListItem => Some(NodeData::ListItem),
        NodeKind::TableRow => Some(NodeData::TableRow),
        NodeKind::TableCell => Some(NodeData::TableCell(TableCellData::default())),
        NodeKind::LayoutItem => Some(NodeData::LayoutItem),
        _ => None,
    }
}

/// Children of kind-restricted containers are wrapped in the first allowed kind.
/// Consecutive misfits inside a table share one row.
struct EnsureChildKinds;

impl NormalizePass for EnsureChildKinds {
    fn id(&self) -> &'static str {
        "core.child_kinds"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for parent in doc.keys() {
            let Some(kind) = doc.kind(parent) else {
                continue;
            };
            let ChildConstraint::Kinds(allowed) = registry.child_constraint(kind) else {
                continue;
            };
            let Some(first) = allowed.first().copied() else {
                continue;
            };
            let Some(wrapper) = wrapper_for(first) else {
                continue;
            };
            let group = first == NodeKind::TableRow;
            let mut run: Vec<NodeKey> = Vec::new();
            for child in doc.children(parent) {
                let fits = doc.kind(*child).is_some_and(|k| allowed.contains(&k));
                if !fits {
                    run.push(*child);
                    if group {
                        continue;
                    }
                }
                if !run.is_empty() {
                    ops.push(Op::Wrap {
                        keys: std::mem::take(&mut run),
                        wrapper: wrapper.clone(),
                    });
                }
            }
            if !run.is_empty() {
                ops.push(Op::Wrap {
                    keys: run,
                    wrapper: wrapper.clone(),
                });
            }
        }
        ops
    }
}

/// Runs of inline nodes directly under block-only containers become paragraphs.
struct WrapStrayInline;

impl NormalizePass for WrapStrayInline {
    fn id(&self) -> &'static str {
        "core.wrap_inline"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for parent in keys_with_constraint(doc, registry, |_, c| c == ChildConstraint::BlockOnly) {
            let mut run: Vec<NodeKey> = Vec::new();
            for child in doc.children(parent) {
                if is_inline(doc, registry, *child) {
                    run.push(*child);
                } else if !run.is_empty() {
                    ops.push(Op::Wrap {
                        keys: std::mem::take(&mut run),
                        wrapper: NodeData::paragraph(),
                    });
                }
            }
            if !run.is_empty() {
                ops.push(Op::Wrap {
                    keys: run,
                    wrapper: NodeData::paragraph(),
                });
            }
        }
        ops
    }
}

/// Block-only containers, the root included, always hold at least one block.
struct EnsureBlockContent;

impl NormalizePass for EnsureBlockContent {
    fn id(&self) -> &'static str {
        "core.block_content"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        keys_with_constraint(doc, registry, |_, c| c == ChildConstraint::BlockOnly)
            .filter(|key| doc.children(*key).is_empty())
            .map(|key| Op::insert(key, 0, NodeTree::paragraph("")))
            .collect()
    }
}

/// Blocks with inline content always carry a text leaf for the caret. Empty inline
/// containers such as links are dropped.
struct EnsureInlineText;

impl NormalizePass for EnsureInlineText {
    fn id(&self) -> &'static str {
        "core.inline_text"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for key in keys_with_constraint(doc, registry, |kind, c| {
            c == ChildConstraint::InlineOnly || kind == NodeKind::ListItem
        }) {
            let children = doc.children(key);
            if is_inline(doc, registry, key) {
                if children.is_empty() {
                    ops.push(Op::remove(key));
                }
                continue;
            }
            if !children.iter().any(|child| doc.text(*child).is_some())
                && children.iter().all(|child| is_inline(doc, registry, *child))
            {
                ops.push(Op::insert(key, children.len(), NodeTree::text("")));
            }
        }
        ops
    }
}

/// Adjacent text leaves with the same marks collapse into the first one.
struct MergeAdjacentText;

impl NormalizePass for MergeAdjacentText {
    fn id(&self) -> &'static str {
        "core.merge_text"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for parent in doc.keys() {
            let mut anchor: Option<NodeKey> = None;
            for child in doc.children(parent) {
                let Some(text) = doc.text(*child).filter(|t| !t.is_unmergeable()) else {
                    anchor = None;
                    continue;
                };
                match anchor.and_then(|a| doc.text(a).map(|t| (a, t))) {
                    Some((into, prev)) if prev.same_marks(text) => {
                        ops.push(Op::MergeText { into, from: *child });
                    }
                    _ => anchor = Some(*child),
                }
            }
        }
        ops
    }
}
