use richfield_core::{
    CommandOutcome, DateFormat, Editor, EditorConfig, NodeData, NodeKey, NodeKind,
    NoopEmbedLoader, format_date,
};

fn date_node(editor: &Editor) -> NodeKey {
    editor
        .doc()
        .keys()
        .into_iter()
        .find(|key| editor.doc().kind(*key) == Some(NodeKind::Date))
        .unwrap()
}

#[test]
fn insert_exports_time_element() {
    let mut editor = Editor::new(EditorConfig::default());

    editor
        .dispatch(
            "date.insert",
            serde_json::json!({ "date": "2024-03-15", "format": "long" }),
        )
        .unwrap();

    assert_eq!(
        editor.html(),
        "<p><time datetime=\"2024-03-15\" data-format=\"long\" data-locale=\"en-US\">March 15, 2024</time></p>"
    );
}

#[test]
fn locales_change_the_text() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch(
            "date.insert",
            serde_json::json!({ "date": "2024-01-05", "format": "full", "locale": "de" }),
        )
        .unwrap();
    assert!(editor.html().contains(">Freitag, 5. Januar 2024</time>"));

    let key = date_node(&editor);
    editor
        .dispatch(
            "date.update",
            serde_json::json!({ "key": key, "format": "short", "locale": "en-GB" }),
        )
        .unwrap();
    assert!(editor.html().contains(">05/01/2024</time>"));
}

#[test]
fn unparseable_dates_are_kept_verbatim() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch("date.insert", serde_json::json!({ "date": "someday" }))
        .unwrap();

    assert_eq!(
        editor.html(),
        "<p><time datetime=\"someday\" data-format=\"medium\" data-locale=\"en-US\">someday</time></p>"
    );
}

#[test]
fn empty_date_means_today() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch("date.insert", serde_json::json!({ "date": "", "format": "iso" }))
        .unwrap();

    let key = date_node(&editor);
    let Some(NodeData::Date(data)) = editor.doc().data(key) else {
        panic!("expected date");
    };
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(data.date, today);
}

#[test]
fn relative_dates_export_in_long_form_but_render_relative() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch("date.insert", serde_json::json!({ "format": "relative" }))
        .unwrap();

    let key = date_node(&editor);
    let Some(NodeData::Date(data)) = editor.doc().data(key).cloned() else {
        panic!("expected date");
    };
    let long = format_date(&data.date, DateFormat::Long, "en-US");
    assert!(editor.html().contains(&format!("data-format=\"relative\" data-locale=\"en-US\">{long}</time>")));

    let live = editor.render_html(&mut NoopEmbedLoader);
    assert!(live.contains(">today</time>"));
    assert!(live.contains("contenteditable=\"false\""));
}

#[test]
fn hydrate_reads_attributes_or_text() {
    let editor = Editor::from_html(
        "<p>on <time datetime=\"2024-03-15\" data-format=\"iso\">whatever</time> and <time>2024-01-05</time></p>",
        EditorConfig::default(),
    )
    .unwrap();

    assert_eq!(
        editor.html(),
        "<p>on <time datetime=\"2024-03-15\" data-format=\"iso\" data-locale=\"en-US\">2024-03-15</time> and \
         <time datetime=\"2024-01-05\" data-format=\"medium\" data-locale=\"en-US\">Jan 5, 2024</time></p>"
    );
}

#[test]
fn update_of_non_date_is_not_handled() {
    let mut editor = Editor::from_html("<p>x</p>", EditorConfig::default()).unwrap();
    let outcome = editor
        .dispatch("date.update", serde_json::json!({ "format": "iso" }))
        .unwrap();
    assert_eq!(outcome, CommandOutcome::NotHandled);

    let err = editor
        .dispatch("date.insert", serde_json::json!({ "format": "sometimes" }))
        .unwrap_err();
    assert!(err.to_string().contains("date.insert"));
}
