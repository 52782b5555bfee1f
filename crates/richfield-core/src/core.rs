use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use richfield_html::{DomNode, sanitize, serialize};
use serde_json::Value;

use crate::config::EditorConfig;
use crate::document::{Document, NodeKey};
use crate::error::{CommandError, EditorError};
use crate::events::{EditorEvent, UpdateEvent};
use crate::export::export_html;
use crate::history::History;
use crate::import::import_html;
use crate::nodes::NodeData;
use crate::normalize::normalize_document;
use crate::plugin::{CommandOutcome, PluginRegistry};
use crate::render::{EmbedLoader, EmbedSlot, EmbedState, render_dom};
use crate::selection::{Selection, first_text_point, normalize_selection};
use crate::serde_value::RichfieldValue;
use crate::toolbar::ToolbarState;
use crate::txn::Txn;

type UpdateListener = Box<dyn FnMut(&UpdateEvent)>;
type EventListener = Box<dyn FnMut(&EditorEvent)>;

/// One editing session: the live tree, its selection, history and the
/// sanitized HTML value handed to the host.
pub struct Editor {
    doc: Document,
    selection: Selection,
    registry: PluginRegistry,
    config: EditorConfig,
    history: History,
    html: String,
    embeds: HashMap<NodeKey, EmbedSlot>,
    update_listeners: Vec<UpdateListener>,
    event_listeners: Vec<EventListener>,
    toolbar: RefCell<Option<ToolbarState>>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// An empty editor with every built-in node type and command.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_registry(PluginRegistry::standard(), config)
    }

    pub fn with_registry(registry: PluginRegistry, config: EditorConfig) -> Self {
        let config = config.with_defaults();
        let mut doc = Document::new();
        let mut selection = Selection::collapsed(first_text_point(&doc));
        if let Err(err) = normalize_document(
            &mut doc,
            &mut selection,
            &registry,
            config.max_normalize_iterations,
        ) {
            tracing::warn!(%err, "initial document did not normalize");
        }
        let selection = Selection::collapsed(first_text_point(&doc));
        let history = History::new(config.max_undo);
        let html = sanitize(&export_html(&doc));
        Self {
            doc,
            selection,
            registry,
            config,
            history,
            html,
            embeds: HashMap::new(),
            update_listeners: Vec::new(),
            event_listeners: Vec::new(),
            toolbar: RefCell::new(None),
        }
    }

    /// An editor hydrated from the host's stored HTML value.
    pub fn from_html(html: &str, config: EditorConfig) -> Result<Self, EditorError> {
        let mut editor = Self::new(config);
        editor.set_html(html)?;
        Ok(editor)
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = normalize_selection(&self.doc, &selection);
        self.toolbar.replace(None);
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The sanitized HTML of the last committed state.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn on_update(&mut self, listener: impl FnMut(&UpdateEvent) + 'static) {
        self.update_listeners.push(Box::new(listener));
    }

    pub fn on_event(&mut self, listener: impl FnMut(&EditorEvent) + 'static) {
        self.event_listeners.push(Box::new(listener));
    }

    /// Read-only view of the tree.
    pub fn read<R>(&self, f: impl FnOnce(&Document, &Selection) -> R) -> R {
        f(&self.doc, &self.selection)
    }

    /// Runs `f` as one transaction. Nothing is committed unless `f` reports
    /// `Handled`; otherwise the tree and selection are restored. A committed
    /// transaction is normalized, recorded for undo, exported once and
    /// announced to listeners once.
    pub fn update<F>(&mut self, source: &str, f: F) -> Result<CommandOutcome, EditorError>
    where
        F: FnOnce(&mut Txn<'_>) -> Result<CommandOutcome, CommandError>,
    {
        let doc_before = self.doc.clone();
        let selection_before = self.selection.clone();

        let (outcome, parts) = {
            let mut txn = Txn::new(
                &mut self.doc,
                &mut self.selection,
                &self.registry,
                &self.config,
                &mut self.history,
            );
            let outcome = f(&mut txn);
            (outcome, txn.into_parts())
        };

        match outcome {
            Ok(CommandOutcome::Handled) => {}
            Ok(CommandOutcome::NotHandled) => {
                self.doc = doc_before;
                self.selection = selection_before;
                return Ok(CommandOutcome::NotHandled);
            }
            Err(err) => {
                self.doc = doc_before;
                self.selection = selection_before;
                return Err(err.into());
            }
        }

        if let Err(err) = normalize_document(
            &mut self.doc,
            &mut self.selection,
            &self.registry,
            self.config.max_normalize_iterations,
        ) {
            self.doc = doc_before;
            self.selection = selection_before;
            return Err(err.into());
        }
        self.selection = normalize_selection(&self.doc, &self.selection);

        if !parts.history_applied && self.doc != doc_before {
            self.history.record(&doc_before, &selection_before);
        }
        self.commit(source, parts.dirty, parts.events);
        Ok(CommandOutcome::Handled)
    }

    fn commit(&mut self, source: &str, dirty: BTreeSet<NodeKey>, events: Vec<EditorEvent>) {
        self.html = sanitize(&export_html(&self.doc));
        self.toolbar.replace(None);
        let doc = &self.doc;
        self.embeds
            .retain(|key, _| matches!(doc.data(*key), Some(NodeData::YouTube(_) | NodeData::Tweet(_))));

        let event = UpdateEvent {
            html: self.html.clone(),
            dirty: dirty.into_iter().collect(),
            source: source.to_string(),
        };
        tracing::trace!(source, dirty = event.dirty.len(), "update committed");
        for listener in &mut self.update_listeners {
            listener(&event);
        }
        for event in &events {
            self.notify(event);
        }
    }

    fn notify(&mut self, event: &EditorEvent) {
        for listener in &mut self.event_listeners {
            listener(event);
        }
    }

    /// Runs a named command in its own transaction.
    pub fn dispatch(&mut self, command: &str, payload: Value) -> Result<CommandOutcome, EditorError> {
        self.update(command, |txn| txn.dispatch(command, &payload))
    }

    /// Replaces the document with sanitized, imported HTML. History is cleared.
    pub fn set_html(&mut self, html: &str) -> Result<(), EditorError> {
        let clean = sanitize(html);
        let mut doc = Document::new();
        for (index, tree) in import_html(&clean, &self.registry).into_iter().enumerate() {
            doc.insert_tree(doc.root(), index, tree)?;
        }
        self.replace_document(doc, "hydrate")
    }

    fn replace_document(&mut self, mut doc: Document, source: &str) -> Result<(), EditorError> {
        let mut selection = Selection::collapsed(first_text_point(&doc));
        normalize_document(
            &mut doc,
            &mut selection,
            &self.registry,
            self.config.max_normalize_iterations,
        )?;
        self.doc = doc;
        self.selection = Selection::collapsed(first_text_point(&self.doc));
        self.history.clear();
        self.embeds.clear();
        self.commit(source, BTreeSet::from([NodeKey::ROOT]), Vec::new());
        Ok(())
    }

    /// The tree in the JSON snapshot format.
    pub fn to_value(&self) -> RichfieldValue {
        RichfieldValue::from_document(&self.doc)
    }

    /// Replaces the document from the JSON snapshot format. Node types that are
    /// not registered are rejected.
    pub fn load_value(&mut self, value: RichfieldValue) -> Result<(), EditorError> {
        if let Some(kind) = value
            .kinds()
            .into_iter()
            .find(|kind| !self.registry.is_known_kind(*kind))
        {
            return Err(EditorError::UnknownNodeType(kind.as_str().to_string()));
        }
        let doc = value.into_document()?;
        self.replace_document(doc, "load")
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), EditorError> {
        let value = RichfieldValue::from_json_str(json)?;
        self.load_value(value)
    }

    /// Reports a click on a link node to the host. Returns `false` for other nodes.
    pub fn activate_link(&mut self, key: NodeKey) -> bool {
        let Some(NodeData::Link(link)) = self.doc.data(key) else {
            return false;
        };
        let event = EditorEvent::LinkClicked {
            key,
            url: link.url.clone(),
            href: self.config.resolve_link_url(&link.url),
        };
        self.notify(&event);
        true
    }

    /// The live editable DOM. Embeds not seen before are requested from `loader`.
    pub fn render_dom(&mut self, loader: &mut dyn EmbedLoader) -> Vec<DomNode> {
        render_dom(&self.doc, &mut self.embeds, loader)
    }

    pub fn render_html(&mut self, loader: &mut dyn EmbedLoader) -> String {
        serialize(&self.render_dom(loader))
    }

    /// Records the outcome of an embed load. The tree is not touched.
    pub fn resolve_embed(&mut self, key: NodeKey, result: Result<(), String>) {
        let Some(slot) = self.embeds.get_mut(&key) else {
            tracing::debug!(%key, "embed result for unknown node");
            return;
        };
        slot.state = match result {
            Ok(()) => EmbedState::Loaded,
            Err(reason) => {
                tracing::warn!(%key, url = %slot.url, %reason, "embed failed to load");
                EmbedState::Failed(reason)
            }
        };
    }

    pub fn embed_state(&self, key: NodeKey) -> Option<&EmbedState> {
        self.embeds.get(&key).map(|slot| &slot.state)
    }

    /// Toolbar summary of the current selection, recomputed after each commit.
    pub fn toolbar_state(&self) -> ToolbarState {
        if let Some(state) = self.toolbar.borrow().as_ref() {
            return state.clone();
        }
        let state = ToolbarState::compute(
            &self.doc,
            &self.selection,
            &self.registry,
            &self.config,
            (self.history.can_undo(), self.history.can_redo()),
        );
        self.toolbar.replace(Some(state.clone()));
        state
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        Ok(self.dispatch("history.undo", Value::Null)?.is_handled())
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        Ok(self.dispatch("history.redo", Value::Null)?.is_handled())
    }
}
