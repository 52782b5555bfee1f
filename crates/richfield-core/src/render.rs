//! Live editable DOM. Unlike export, rendering carries node keys and embed
//! loading state.

use std::collections::HashMap;

use richfield_html::{DomNode, Element};

use crate::document::{Document, NodeKey};
use crate::export::walk;
use crate::nodes::{DomExport, NodeData, NodeKind};

/// Requested once per embed node. The host loads the widget and reports back
/// through [`crate::Editor::resolve_embed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRequest {
    pub key: NodeKey,
    pub kind: NodeKind,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedState {
    Pending,
    Loaded,
    Failed(String),
}

/// Load state of one embed node, tied to the url it was requested for.
#[derive(Debug, Clone)]
pub(crate) struct EmbedSlot {
    pub url: String,
    pub state: EmbedState,
}

pub trait EmbedLoader {
    fn request(&mut self, request: EmbedRequest);
}

/// A loader that never loads anything. Embeds stay as placeholders.
#[derive(Debug, Default)]
pub struct NoopEmbedLoader;

impl EmbedLoader for NoopEmbedLoader {
    fn request(&mut self, _request: EmbedRequest) {}
}

fn embed_request(key: NodeKey, data: &NodeData) -> Option<EmbedRequest> {
    let (kind, url) = match data {
        NodeData::YouTube(video) => (NodeKind::YouTube, video.embed_url()),
        NodeData::Tweet(tweet) => (NodeKind::Tweet, tweet.status_url()),
        _ => return None,
    };
    Some(EmbedRequest { key, kind, url })
}

fn placeholder(request: &EmbedRequest, state: &EmbedState) -> Element {
    let (state_name, label) = match state {
        EmbedState::Failed(reason) => ("failed", format!("Could not load embed: {reason}")),
        _ => ("pending", "Loading embed".to_string()),
    };
    Element::new("div")
        .with_attr("class", "rf-embed-placeholder")
        .with_attr("data-embed", request.kind.as_str())
        .with_attr("data-embed-state", state_name)
        .with_child(Element::new("span").with_text(label))
        .with_child(
            Element::new("a")
                .with_attr("href", request.url.clone())
                .with_text(request.url.clone()),
        )
}

/// Tags `nodes` with the node key, wrapping them in a `<span>` unless they are
/// a single element.
fn keyed(mut nodes: Vec<DomNode>, key: NodeKey, decorator: bool) -> Vec<DomNode> {
    let mut element = match nodes.len() {
        1 => match nodes.pop() {
            Some(DomNode::Element(element)) => element,
            Some(other) => Element::new("span").with_child(other),
            None => Element::new("span"),
        },
        _ => {
            let mut span = Element::new("span");
            span.children = nodes;
            span
        }
    };
    element.set_attr("data-key", key.get().to_string());
    if decorator {
        element.set_attr("contenteditable", "false");
    }
    vec![element.into()]
}

pub(crate) fn render_dom(
    doc: &Document,
    embeds: &mut HashMap<NodeKey, EmbedSlot>,
    loader: &mut dyn EmbedLoader,
) -> Vec<DomNode> {
    walk(doc, doc.root(), &mut |key, data| {
        if let Some(request) = embed_request(key, data) {
            let stale = embeds
                .get(&key)
                .is_none_or(|slot| slot.url != request.url);
            if stale {
                tracing::debug!(%key, kind = %request.kind, "requesting embed");
                loader.request(request.clone());
                embeds.insert(
                    key,
                    EmbedSlot {
                        url: request.url.clone(),
                        state: EmbedState::Pending,
                    },
                );
            }
            let state = embeds
                .get(&key)
                .map(|slot| slot.state.clone())
                .unwrap_or(EmbedState::Pending);
            let nodes = match (&state, data.export_dom()) {
                (EmbedState::Loaded, DomExport::Leaf(nodes)) => nodes,
                (state, _) => vec![placeholder(&request, state).into()],
            };
            return DomExport::Leaf(keyed(nodes, key, true));
        }

        let decorator = data.kind().is_decorator();
        match data {
            NodeData::Root => DomExport::Children,
            NodeData::Date(date) => {
                let mut live = date.export_element();
                live.children.clear();
                let live = live.with_text(date.display_text());
                DomExport::Leaf(keyed(vec![live.into()], key, true))
            }
            _ => match data.export_dom() {
                DomExport::Element { mut element, slot } => {
                    element.set_attr("data-key", key.get().to_string());
                    DomExport::Element { element, slot }
                }
                DomExport::Leaf(nodes) => DomExport::Leaf(keyed(nodes, key, decorator)),
                DomExport::Children => DomExport::Children,
            },
        }
    })
}
