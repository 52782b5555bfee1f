use std::collections::HashMap;
use std::sync::Arc;

use richfield_html::Element;
use serde_json::Value;

use crate::document::Document;
use crate::error::{CommandError, EditorError};
use crate::nodes::{NodeData, NodeKind};
use crate::ops::Op;
use crate::plugins;
use crate::txn::Txn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command ran and propagation stops.
    Handled,
    /// Preconditions were not met. Nothing was mutated.
    NotHandled,
}

impl CommandOutcome {
    pub fn is_handled(self) -> bool {
        self == CommandOutcome::Handled
    }
}

impl From<bool> for CommandOutcome {
    fn from(handled: bool) -> Self {
        if handled {
            CommandOutcome::Handled
        } else {
            CommandOutcome::NotHandled
        }
    }
}

pub type CommandHandler =
    Arc<dyn Fn(&mut Txn<'_>, &Value) -> Result<CommandOutcome, CommandError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub args_example: Option<Value>,
    /// Toolbar item gating this command. Disabled items make the command unreachable.
    pub toolbar_item: Option<String>,
    /// Handlers for the same id run from the highest priority down.
    pub priority: i32,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut Txn<'_>, &Value) -> Result<CommandOutcome, CommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            args_example: None,
            toolbar_item: None,
            priority: 0,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn args_example(mut self, args_example: Value) -> Self {
        self.args_example = Some(args_example);
        self
    }

    pub fn toolbar_item(mut self, item: impl Into<String>) -> Self {
        self.toolbar_item = Some(item.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("id", &self.id)
            .field("toolbar_item", &self.toolbar_item)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Block,
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildConstraint {
    None,
    BlockOnly,
    InlineOnly,
    Any,
    /// Only the listed kinds. Misfits are wrapped in the first one.
    Kinds(&'static [NodeKind]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub role: NodeRole,
    pub is_void: bool,
    pub children: ChildConstraint,
}

impl NodeSpec {
    pub fn block(kind: NodeKind, children: ChildConstraint) -> Self {
        Self {
            kind,
            role: NodeRole::Block,
            is_void: false,
            children,
        }
    }

    pub fn inline(kind: NodeKind, children: ChildConstraint) -> Self {
        Self {
            kind,
            role: NodeRole::Inline,
            is_void: false,
            children,
        }
    }

    pub fn void(kind: NodeKind, role: NodeRole) -> Self {
        Self {
            kind,
            role,
            is_void: true,
            children: ChildConstraint::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildHandling {
    #[default]
    Convert,
    Skip,
}

pub type ForChild = Box<dyn Fn(&mut NodeData)>;

/// Result of a matcher accepting a DOM element.
#[derive(Default)]
pub struct DomConversion {
    /// `None` passes the converted children through to the parent.
    pub node: Option<NodeData>,
    pub children: ChildHandling,
    /// Applied to every node converted from this element's descendants.
    pub for_child: Option<ForChild>,
    pub preformatted: bool,
}

impl DomConversion {
    pub fn node(node: NodeData) -> Self {
        Self {
            node: Some(node),
            ..Self::default()
        }
    }

    pub fn leaf(node: NodeData) -> Self {
        Self::node(node).skip_children()
    }

    pub fn pass_through() -> Self {
        Self::default()
    }

    pub fn skip_children(mut self) -> Self {
        self.children = ChildHandling::Skip;
        self
    }

    pub fn for_child(mut self, f: impl Fn(&mut NodeData) + 'static) -> Self {
        self.for_child = Some(Box::new(f));
        self
    }

    pub fn preformatted(mut self) -> Self {
        self.preformatted = true;
        self
    }
}

/// Claims DOM elements by tag. Matchers decline by returning `None` and must not have side effects.
#[derive(Clone, Copy)]
pub struct ImportMatcher {
    pub tag: &'static str,
    pub priority: i32,
    pub convert: fn(&Element) -> Option<DomConversion>,
}

impl ImportMatcher {
    pub fn new(
        tag: &'static str,
        priority: i32,
        convert: fn(&Element) -> Option<DomConversion>,
    ) -> Self {
        Self {
            tag,
            priority,
            convert,
        }
    }
}

pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op>;
}

pub trait EditorPlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn node_specs(&self) -> Vec<NodeSpec> {
        Vec::new()
    }
    fn import_matchers(&self) -> Vec<ImportMatcher> {
        Vec::new()
    }
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<&'static str>,
    node_specs: HashMap<NodeKind, NodeSpec>,
    matchers: HashMap<&'static str, Vec<ImportMatcher>>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
    commands: HashMap<String, Vec<CommandSpec>>,
}

impl PluginRegistry {
    pub fn new(
        plugins: impl IntoIterator<Item = Box<dyn EditorPlugin>>,
    ) -> Result<Self, EditorError> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    /// Paragraphs, text, line breaks and history.
    pub fn core() -> Self {
        Self::builtin(plugins::core_plugins())
    }

    /// Every node type and command this crate ships.
    pub fn standard() -> Self {
        Self::builtin(plugins::standard_plugins())
    }

    fn builtin(plugins: Vec<Box<dyn EditorPlugin>>) -> Self {
        let mut registry = Self::default();
        for plugin in plugins {
            let id = plugin.id();
            if let Err(err) = registry.register_plugin(plugin) {
                tracing::error!(plugin = id, %err, "skipping built-in plugin");
            }
        }
        registry
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn EditorPlugin>) -> Result<(), EditorError> {
        let id = plugin.id();
        if self.plugins.contains(&id) {
            return Err(EditorError::Registry {
                what: "plugin",
                id: id.to_string(),
            });
        }

        let specs = plugin.node_specs();
        for spec in &specs {
            if self.node_specs.contains_key(&spec.kind) {
                return Err(EditorError::Registry {
                    what: "node type",
                    id: spec.kind.to_string(),
                });
            }
        }
        let commands = plugin.commands();
        for cmd in &commands {
            let clash = self
                .commands
                .get(&cmd.id)
                .is_some_and(|existing| existing.iter().any(|c| c.priority == cmd.priority));
            if clash {
                return Err(EditorError::Registry {
                    what: "command",
                    id: cmd.id.clone(),
                });
            }
        }

        self.plugins.push(id);
        for spec in specs {
            self.node_specs.insert(spec.kind, spec);
        }
        for matcher in plugin.import_matchers() {
            let list = self.matchers.entry(matcher.tag).or_default();
            list.push(matcher);
            list.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
        self.normalize_passes.extend(plugin.normalize_passes());
        for cmd in commands {
            let list = self.commands.entry(cmd.id.clone()).or_default();
            list.push(cmd);
            list.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
        Ok(())
    }

    pub fn plugin_ids(&self) -> &[&'static str] {
        &self.plugins
    }

    pub fn node_spec(&self, kind: NodeKind) -> Option<&NodeSpec> {
        self.node_specs.get(&kind)
    }

    pub fn is_known_kind(&self, kind: NodeKind) -> bool {
        self.node_specs.contains_key(&kind)
    }

    /// Unregistered kinds accept anything.
    pub fn child_constraint(&self, kind: NodeKind) -> ChildConstraint {
        self.node_specs
            .get(&kind)
            .map(|spec| spec.children)
            .unwrap_or(ChildConstraint::Any)
    }

    pub fn is_inline(&self, kind: NodeKind) -> bool {
        self.node_specs
            .get(&kind)
            .is_some_and(|spec| spec.role == NodeRole::Inline)
    }

    /// Matchers for a tag, highest priority first.
    pub fn matchers(&self, tag: &str) -> &[ImportMatcher] {
        self.matchers.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn normalize_passes(&self) -> &[Box<dyn NormalizePass>] {
        &self.normalize_passes
    }

    /// Handlers for a command, highest priority first.
    pub fn command_chain(&self, id: &str) -> &[CommandSpec] {
        self.commands.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn command_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
