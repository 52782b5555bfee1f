use std::cell::RefCell;
use std::rc::Rc;

use richfield_core::{
    CommandError, CommandOutcome, CommandSpec, Editor, EditorConfig, EditorError, EditorPlugin,
    NodeKey, NodeTree, PluginRegistry, Point, Selection, UpdateEvent,
};
use serde_json::Value;

struct ShoutPlugin;

impl EditorPlugin for ShoutPlugin {
    fn id(&self) -> &'static str {
        "shout"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("text.insert", "Shout", |txn, payload| {
                let Some(text) = payload.get("text").and_then(Value::as_str) else {
                    return Ok(CommandOutcome::NotHandled);
                };
                if !text.ends_with('!') {
                    return Ok(CommandOutcome::NotHandled);
                }
                Ok(txn.insert_text(&text.to_uppercase())?.into())
            })
            .priority(10),
            CommandSpec::new("text.insert", "Scribble", |txn, _payload| {
                txn.insert_text("scribble")?;
                Ok(CommandOutcome::NotHandled)
            })
            .priority(5),
        ]
    }
}

struct StrayTextPlugin;

impl EditorPlugin for StrayTextPlugin {
    fn id(&self) -> &'static str {
        "stray"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![CommandSpec::new("stray.append", "Append stray text", |txn, _payload| {
            txn.append(NodeKey::ROOT, NodeTree::text("stray"))?;
            Ok(CommandOutcome::Handled)
        })]
    }
}

fn registry_with(plugin: Box<dyn EditorPlugin>) -> PluginRegistry {
    let mut registry = PluginRegistry::standard();
    registry.register_plugin(plugin).unwrap();
    registry
}

fn record_updates(editor: &mut Editor) -> Rc<RefCell<Vec<UpdateEvent>>> {
    let updates = Rc::new(RefCell::new(Vec::new()));
    let sink = updates.clone();
    editor.on_update(move |event| sink.borrow_mut().push(event.clone()));
    updates
}

#[test]
fn unknown_command_is_an_error() {
    let mut editor = Editor::new(EditorConfig::default());
    let err = editor.dispatch("nope.nothing", Value::Null).unwrap_err();
    assert!(matches!(err, EditorError::Command(CommandError::Unknown(ref id)) if id == "nope.nothing"));
}

#[test]
fn malformed_payload_is_rejected_without_changes() {
    let mut editor = Editor::from_html("<p>hello</p>", EditorConfig::default()).unwrap();
    let err = editor
        .dispatch("block.heading", serde_json::json!({ "level": "big" }))
        .unwrap_err();
    assert!(matches!(
        err,
        EditorError::Command(CommandError::InvalidPayload { ref command, .. }) if command == "block.heading"
    ));
    assert_eq!(editor.html(), "<p>hello</p>");
    assert!(!editor.can_undo());
}

#[test]
fn higher_priority_handlers_run_first() {
    let registry = registry_with(Box::new(ShoutPlugin));
    let mut editor = Editor::with_registry(registry, EditorConfig::default());

    editor
        .dispatch("text.insert", serde_json::json!({ "text": "hi!" }))
        .unwrap();
    assert_eq!(editor.html(), "<p>HI!</p>");
}

#[test]
fn declined_handlers_are_rolled_back_before_the_next_one() {
    let registry = registry_with(Box::new(ShoutPlugin));
    let mut editor = Editor::with_registry(registry, EditorConfig::default());

    editor
        .dispatch("text.insert", serde_json::json!({ "text": "hi" }))
        .unwrap();
    assert_eq!(editor.html(), "<p>hi</p>");
}

#[test]
fn duplicate_registrations_are_refused() {
    let mut registry = registry_with(Box::new(ShoutPlugin));
    let err = registry.register_plugin(Box::new(ShoutPlugin)).unwrap_err();
    assert!(matches!(err, EditorError::Registry { what: "plugin", .. }));

    struct Clash;
    impl EditorPlugin for Clash {
        fn id(&self) -> &'static str {
            "clash"
        }
        fn commands(&self) -> Vec<CommandSpec> {
            vec![CommandSpec::new("format.bold", "Bold again", |_, _| {
                Ok(CommandOutcome::NotHandled)
            })]
        }
    }
    let err = PluginRegistry::standard()
        .register_plugin(Box::new(Clash))
        .unwrap_err();
    assert!(matches!(err, EditorError::Registry { what: "command", ref id } if id == "format.bold"));
}

#[test]
fn disabled_toolbar_items_disable_their_commands() {
    let config = EditorConfig::from_json(r#"{ "toolbar": ["italic"] }"#).unwrap();
    let mut editor = Editor::from_html("<p>hello</p>", config).unwrap();
    let text = editor.doc().first_text(editor.doc().root()).unwrap();
    editor.set_selection(Selection::range(Point::new(text, 0), Point::new(text, 5)));

    let bold = editor.dispatch("format.bold", Value::Null).unwrap();
    assert_eq!(bold, CommandOutcome::NotHandled);

    editor.dispatch("format.italic", Value::Null).unwrap();
    assert_eq!(editor.html(), "<p><em>hello</em></p>");
}

#[test]
fn each_committed_update_is_announced_once_and_normalized() {
    let registry = registry_with(Box::new(StrayTextPlugin));
    let mut editor = Editor::with_registry(registry, EditorConfig::default());
    let updates = record_updates(&mut editor);

    editor.dispatch("stray.append", Value::Null).unwrap();
    editor.dispatch("table.delete", Value::Null).unwrap();

    assert_eq!(editor.html(), "<p></p><p>stray</p>");
    let updates = updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].source, "stray.append");
    assert_eq!(updates[0].html, editor.html());
    assert!(!updates[0].dirty.is_empty());
}

#[test]
fn update_closure_errors_roll_back() {
    let mut editor = Editor::from_html("<p>hello</p>", EditorConfig::default()).unwrap();

    let result = editor.update("test", |txn| {
        txn.insert_text("lost")?;
        Err(CommandError::invalid_payload("test", "boom"))
    });

    assert!(result.is_err());
    assert_eq!(editor.html(), "<p>hello</p>");
    assert_eq!(editor.read(|doc, _| doc.text_content(doc.root())), "hello");
}

#[test]
fn registry_lists_commands_for_discovery() {
    let registry = PluginRegistry::standard();
    let ids = registry.command_ids();
    for id in ["format.bold", "link.toggle", "table.merge_cells", "history.undo", "date.insert"] {
        assert!(ids.contains(&id), "{id}");
    }
    let spec = &registry.command_chain("image.insert")[0];
    assert_eq!(spec.toolbar_item.as_deref(), Some("image"));
    assert!(spec.args_example.is_some());
    assert!(spec.keywords.iter().any(|k| k == "picture"));
}
