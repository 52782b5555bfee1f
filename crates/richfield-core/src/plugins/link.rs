use richfield_html::{Element, sanitize_link_href};
use serde::Deserialize;
use serde_json::Value;

use super::args;
use crate::document::NodeKey;
use crate::error::CommandError;
use crate::events::EditorEvent;
use crate::nodes::{LinkData, NodeData, NodeKind};
use crate::plugin::{
    ChildConstraint, CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher,
    NodeSpec,
};
use crate::selection::Selection;
use crate::txn::Txn;

/// Url given to links created without one. The host opens its link editor for it.
pub const PLACEHOLDER_URL: &str = "https://";

pub(crate) struct LinkPlugin;

fn link(el: &Element) -> Option<DomConversion> {
    let url = sanitize_link_href(el.attr("href")?)?;
    Some(DomConversion::node(NodeData::Link(LinkData {
        url,
        target: el.attr("target").map(str::to_string),
        rel: el.attr("rel").map(str::to_string),
        title: el.attr("title").map(str::to_string),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LinkArgs {
    url: Option<String>,
    /// Entry of the internal link catalog.
    slug: Option<String>,
    target: Option<String>,
    rel: Option<String>,
    title: Option<String>,
}

/// Links containing or enclosing the selected text.
fn selected_links(txn: &Txn<'_>) -> Vec<NodeKey> {
    let texts = match txn.selection() {
        Selection::Range { focus, .. } => match txn.selection().ordered_points(txn.doc()) {
            Some((start, end)) if start != end => txn.doc().text_nodes_between(start.key, end.key),
            _ => vec![focus.key],
        },
        Selection::Node { keys } => keys.clone(),
        Selection::Table { .. } => Vec::new(),
    };
    let mut links: Vec<NodeKey> = Vec::new();
    for key in texts {
        if let Some(link) = txn.doc().nearest(key, NodeKind::Link) {
            if !links.contains(&link) {
                links.push(link);
            }
        }
    }
    links
}

fn remove_links(txn: &mut Txn<'_>) -> Result<CommandOutcome, CommandError> {
    let links = selected_links(txn);
    if links.is_empty() {
        return Ok(CommandOutcome::NotHandled);
    }
    for link in links {
        txn.unwrap_node(link)?;
    }
    txn.emit(EditorEvent::CloseLinkEditorDialog);
    Ok(CommandOutcome::Handled)
}

/// Resolves the payload to link fields. `None` means the url was rejected.
fn resolve(txn: &Txn<'_>, payload: &Value) -> Result<Option<(LinkData, bool)>, CommandError> {
    let args: LinkArgs = match payload {
        Value::String(url) => LinkArgs {
            url: Some(url.clone()),
            ..LinkArgs::default()
        },
        _ => args("link.toggle", payload)?,
    };

    let (mut data, placeholder) = if let Some(slug) = &args.slug {
        let Some(entry) = txn.config().internal_link(slug) else {
            tracing::debug!(slug = %slug, "internal link not in catalog");
            return Ok(None);
        };
        let mut data = LinkData::with_default_target(entry.url());
        data.title = Some(entry.title.clone());
        (data, false)
    } else if let Some(url) = args.url.as_deref().filter(|u| !u.trim().is_empty()) {
        let Some(url) = sanitize_link_href(url) else {
            tracing::debug!(url, "rejected link url");
            return Ok(None);
        };
        (LinkData::with_default_target(url), false)
    } else {
        (LinkData::with_default_target(PLACEHOLDER_URL), true)
    };

    if args.target.is_some() {
        data.target = args.target;
    }
    if args.rel.is_some() {
        data.rel = args.rel;
    }
    if args.title.is_some() {
        data.title = args.title;
    }
    Ok(Some((data, placeholder)))
}

/// Groups text nodes into runs of adjacent siblings.
fn sibling_runs(txn: &Txn<'_>, texts: &[NodeKey]) -> Vec<Vec<NodeKey>> {
    let mut runs: Vec<Vec<NodeKey>> = Vec::new();
    for key in texts {
        let extends = runs
            .last()
            .and_then(|run| run.last())
            .is_some_and(|last| txn.doc().next_sibling(*last) == Some(*key));
        match runs.last_mut() {
            Some(run) if extends => run.push(*key),
            _ => runs.push(vec![*key]),
        }
    }
    runs
}

fn toggle_link(txn: &mut Txn<'_>, payload: &Value) -> Result<CommandOutcome, CommandError> {
    if payload.is_null() {
        return remove_links(txn);
    }
    let Some((data, placeholder)) = resolve(txn, payload)? else {
        return Ok(CommandOutcome::NotHandled);
    };

    if let Some(existing) = selected_links(txn).first().copied() {
        txn.set_data(existing, NodeData::Link(data))?;
        return Ok(CommandOutcome::Handled);
    }
    if txn.selection().is_collapsed() {
        return Ok(CommandOutcome::NotHandled);
    }

    let texts: Vec<NodeKey> = txn
        .text_targets()?
        .into_iter()
        .filter(|key| txn.doc().nearest(*key, NodeKind::Link).is_none())
        .collect();
    let mut created = None;
    for run in sibling_runs(txn, &texts) {
        let key = txn.wrap(&run, NodeData::Link(data.clone()))?;
        created.get_or_insert(key);
    }
    let Some(key) = created else {
        return Ok(CommandOutcome::NotHandled);
    };
    txn.emit(EditorEvent::LinkCreated {
        key,
        url: data.url,
        placeholder,
    });
    Ok(CommandOutcome::Handled)
}

impl EditorPlugin for LinkPlugin {
    fn id(&self) -> &'static str {
        "link"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::inline(NodeKind::Link, ChildConstraint::InlineOnly)]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![ImportMatcher::new("a", 0, link)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("link.toggle", "Toggle link", toggle_link)
                .description(
                    "Remove links with a null payload; otherwise create or update the selected link.",
                )
                .keywords(["link", "url", "hyperlink", "unlink"])
                .toolbar_item("link")
                .args_example(serde_json::json!({ "url": "https://example.com" })),
        ]
    }
}
