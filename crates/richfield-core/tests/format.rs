use richfield_core::{CommandOutcome, Editor, EditorConfig, Point, Selection};
use serde_json::Value;

fn select(editor: &mut Editor, from: usize, to: usize) {
    let text = editor.doc().first_text(editor.doc().root()).unwrap();
    editor.set_selection(Selection::range(Point::new(text, from), Point::new(text, to)));
}

fn hello(from: usize, to: usize) -> Editor {
    let mut editor = Editor::from_html("<p>hello</p>", EditorConfig::default()).unwrap();
    select(&mut editor, from, to);
    editor
}

#[test]
fn bold_toggles_on_and_off() {
    let mut editor = hello(0, 5);

    editor.dispatch("format.bold", Value::Null).unwrap();
    assert_eq!(editor.html(), "<p><strong>hello</strong></p>");
    assert_eq!(editor.toolbar_state().formats, vec!["bold".to_string()]);

    editor.dispatch("format.bold", Value::Null).unwrap();
    assert_eq!(editor.html(), "<p>hello</p>");
    assert!(editor.toolbar_state().formats.is_empty());
}

#[test]
fn partial_range_splits_the_run() {
    let mut editor = hello(1, 3);

    editor.dispatch("format.bold", Value::Null).unwrap();
    editor.dispatch("format.italic", Value::Null).unwrap();

    assert_eq!(editor.html(), "<p>h<strong><em>el</em></strong>lo</p>");
    let root = editor.doc().root();
    let paragraph = editor.doc().children(root)[0];
    assert_eq!(editor.doc().children(paragraph).len(), 3);
}

#[test]
fn caret_format_applies_to_typed_text() {
    let mut editor = hello(5, 5);

    editor.dispatch("format.bold", Value::Null).unwrap();
    editor
        .dispatch("text.insert", serde_json::json!({ "text": " world" }))
        .unwrap();

    assert_eq!(editor.html(), "<p>hello<strong> world</strong></p>");
}

#[test]
fn colors_are_validated() {
    let mut editor = hello(0, 5);

    editor
        .dispatch("format.text_color", serde_json::json!({ "color": "#e03131" }))
        .unwrap();
    assert_eq!(editor.html(), "<p><span style=\"color: #e03131;\">hello</span></p>");
    assert_eq!(editor.toolbar_state().text_color.as_deref(), Some("#e03131"));

    let outcome = editor
        .dispatch(
            "format.background_color",
            serde_json::json!({ "color": "url(javascript:x)" }),
        )
        .unwrap();
    assert_eq!(outcome, CommandOutcome::NotHandled);

    editor
        .dispatch("format.text_color", serde_json::json!({ "color": "" }))
        .unwrap();
    assert_eq!(editor.html(), "<p>hello</p>");
}

#[test]
fn font_size_is_clamped_and_steps_from_current() {
    let mut editor = hello(0, 5);

    editor
        .dispatch("format.font_size", serde_json::json!({ "size": 100 }))
        .unwrap();
    assert_eq!(editor.html(), "<p><span style=\"font-size: 72px;\">hello</span></p>");

    editor
        .dispatch("format.font_size", serde_json::json!({ "delta": -2 }))
        .unwrap();
    assert_eq!(editor.toolbar_state().font_size, 70);

    let err = editor
        .dispatch("format.font_size", serde_json::json!({}))
        .unwrap_err();
    assert!(err.to_string().contains("format.font_size"));
}

#[test]
fn font_family_must_be_configured() {
    let mut editor = hello(0, 5);

    let outcome = editor
        .dispatch("format.font_family", serde_json::json!({ "family": "Comic Sans MS" }))
        .unwrap();
    assert_eq!(outcome, CommandOutcome::NotHandled);

    editor
        .dispatch("format.font_family", serde_json::json!({ "family": "Georgia" }))
        .unwrap();
    assert_eq!(editor.toolbar_state().font_family.as_deref(), Some("Georgia"));
}

#[test]
fn clear_removes_formats_and_styles() {
    let mut editor = Editor::from_html(
        "<p><span style=\"color: red;\"><strong><u>hello</u></strong></span></p>",
        EditorConfig::default(),
    )
    .unwrap();
    select(&mut editor, 0, 5);

    editor.dispatch("format.clear", Value::Null).unwrap();

    assert_eq!(editor.html(), "<p>hello</p>");
}

#[test]
fn inline_styles_import_as_formats() {
    let editor = Editor::from_html(
        "<p><span style=\"font-weight: 700; font-style: italic; color: red; position: fixed\">x</span></p>",
        EditorConfig::default(),
    )
    .unwrap();
    assert_eq!(
        editor.html(),
        "<p><span style=\"color: red;\"><strong><em>x</em></strong></span></p>"
    );
}

#[test]
fn heading_and_quote_toggle_back_to_paragraph() {
    let mut editor = hello(2, 2);

    editor
        .dispatch("block.heading", serde_json::json!({ "level": 2 }))
        .unwrap();
    assert_eq!(editor.html(), "<h2>hello</h2>");
    assert_eq!(editor.toolbar_state().block_type.as_deref(), Some("h2"));

    editor
        .dispatch("block.heading", serde_json::json!({ "level": 2 }))
        .unwrap();
    assert_eq!(editor.html(), "<p>hello</p>");

    editor.dispatch("block.quote", Value::Null).unwrap();
    assert_eq!(editor.html(), "<blockquote>hello</blockquote>");
    editor.dispatch("block.paragraph", Value::Null).unwrap();
    assert_eq!(editor.html(), "<p>hello</p>");

    assert!(editor
        .dispatch("block.heading", serde_json::json!({ "level": 9 }))
        .is_err());
}

#[test]
fn alignment_is_kept_across_block_changes() {
    let mut editor = hello(0, 0);

    editor
        .dispatch("block.align", serde_json::json!({ "align": "center" }))
        .unwrap();
    assert_eq!(editor.html(), "<p style=\"text-align: center;\">hello</p>");

    editor
        .dispatch("block.heading", serde_json::json!({ "level": 1 }))
        .unwrap();
    assert_eq!(editor.html(), "<h1 style=\"text-align: center;\">hello</h1>");
    assert_eq!(editor.toolbar_state().alignment.as_deref(), Some("center"));
}

#[test]
fn list_toggle_wraps_switches_and_dissolves() {
    let mut editor = hello(0, 0);

    editor
        .dispatch("list.toggle", serde_json::json!({ "kind": "bullet" }))
        .unwrap();
    assert_eq!(editor.html(), "<ul><li>hello</li></ul>");
    assert_eq!(editor.toolbar_state().block_type.as_deref(), Some("bullet"));

    editor
        .dispatch("list.toggle", serde_json::json!({ "kind": "number" }))
        .unwrap();
    assert_eq!(editor.html(), "<ol><li>hello</li></ol>");

    editor
        .dispatch("list.toggle", serde_json::json!({ "kind": "number" }))
        .unwrap();
    assert_eq!(editor.html(), "<p>hello</p>");
}
