use richfield_core::{CommandOutcome, Editor, EditorConfig, NodeData, NodeKey, NodeKind, Selection};
use serde_json::Value;

fn collapsible(editor: &Editor) -> NodeKey {
    editor
        .doc()
        .keys()
        .into_iter()
        .find(|key| editor.doc().kind(*key) == Some(NodeKind::Collapsible))
        .unwrap()
}

fn is_open(editor: &Editor, key: NodeKey) -> bool {
    matches!(editor.doc().data(key), Some(NodeData::Collapsible(data)) if data.is_open)
}

#[test]
fn insert_puts_caret_in_the_title() {
    let mut editor = Editor::new(EditorConfig::default());

    editor
        .dispatch("collapsible.insert", serde_json::json!({ "title": "More" }))
        .unwrap();

    assert_eq!(
        editor.html(),
        "<details class=\"rf-collapsible\" open=\"\">\
         <summary class=\"rf-collapsible-title\">More</summary>\
         <div class=\"rf-collapsible-content\"><p></p></div></details><p></p>"
    );
    let Selection::Range { focus, .. } = editor.selection() else {
        panic!("expected caret");
    };
    assert!(editor.doc().nearest(focus.key, NodeKind::CollapsibleTitle).is_some());
    assert_eq!(focus.offset, 4);
}

#[test]
fn toggle_flips_or_sets_open_state() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch("collapsible.insert", serde_json::json!({ "title": "t", "open": false }))
        .unwrap();
    let details = collapsible(&editor);
    assert!(!is_open(&editor, details));
    assert!(editor.html().starts_with("<details class=\"rf-collapsible\">"));

    editor.dispatch("collapsible.toggle", Value::Null).unwrap();
    assert!(is_open(&editor, details));

    editor
        .dispatch("collapsible.toggle", serde_json::json!({ "key": details, "open": true }))
        .unwrap();
    assert!(is_open(&editor, details));

    editor
        .dispatch("collapsible.toggle", serde_json::json!({ "open": false }))
        .unwrap();
    assert!(!is_open(&editor, details));
}

#[test]
fn toggle_outside_a_collapsible_is_not_handled() {
    let mut editor = Editor::from_html("<p>x</p>", EditorConfig::default()).unwrap();
    let outcome = editor.dispatch("collapsible.toggle", Value::Null).unwrap();
    assert_eq!(outcome, CommandOutcome::NotHandled);
}

#[test]
fn malformed_markup_is_reshaped_on_hydrate() {
    let editor = Editor::from_html(
        "<details><p>body</p><summary>Title</summary><p>more</p></details>",
        EditorConfig::default(),
    )
    .unwrap();

    assert_eq!(
        editor.html(),
        "<details class=\"rf-collapsible\">\
         <summary class=\"rf-collapsible-title\">Title</summary>\
         <div class=\"rf-collapsible-content\"><p>body</p><p>more</p></div></details>"
    );
}

#[test]
fn missing_title_gets_an_empty_one() {
    let editor = Editor::from_html(
        "<details open><div class=\"rf-collapsible-content\"><p>body</p></div></details>",
        EditorConfig::default(),
    )
    .unwrap();

    assert_eq!(
        editor.html(),
        "<details class=\"rf-collapsible\" open=\"\">\
         <summary class=\"rf-collapsible-title\"></summary>\
         <div class=\"rf-collapsible-content\"><p>body</p></div></details>"
    );
}
