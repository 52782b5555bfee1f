use richfield_core::{Editor, EditorConfig, NodeKey, NodeKind, Point, Selection, TableGrid};

fn texts(editor: &Editor) -> Vec<NodeKey> {
    editor.doc().text_nodes(editor.doc().root())
}

fn caret_in(editor: &mut Editor, text: NodeKey) {
    editor.set_selection(Selection::collapsed(Point::new(text, 0)));
}

#[test]
fn formats_are_reported_only_when_shared() {
    let mut editor = Editor::from_html("<p><strong>ab</strong>cd</p>", EditorConfig::default()).unwrap();
    let keys = texts(&editor);
    let [bold, plain] = keys[..] else {
        panic!("expected two runs");
    };

    editor.set_selection(Selection::range(Point::new(bold, 0), Point::new(bold, 2)));
    assert_eq!(editor.toolbar_state().formats, vec!["bold".to_string()]);

    editor.set_selection(Selection::range(Point::new(bold, 0), Point::new(plain, 2)));
    assert!(editor.toolbar_state().formats.is_empty());

    editor.set_selection(Selection::range(Point::new(bold, 0), Point::new(plain, 0)));
    assert_eq!(editor.toolbar_state().formats, vec!["bold".to_string()]);
}

#[test]
fn block_type_follows_the_caret() {
    let mut editor = Editor::from_html(
        "<h3>x</h3><ol><li>y</li></ol><blockquote>z</blockquote><p>w</p>",
        EditorConfig::default(),
    )
    .unwrap();
    let keys = texts(&editor);

    let mut seen = Vec::new();
    for text in keys {
        caret_in(&mut editor, text);
        seen.push(editor.toolbar_state().block_type.unwrap());
    }

    assert_eq!(seen, vec!["h3", "number", "quote", "paragraph"]);
}

#[test]
fn table_flags_track_the_cell_selection() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch(
            "table.insert",
            serde_json::json!({ "rows": 2, "columns": 2, "includeHeaders": false }),
        )
        .unwrap();
    let table = editor.doc().children(editor.doc().root())[0];
    let grid = TableGrid::build(editor.doc(), table).unwrap();
    let (first, second) = (grid.cell_at(0, 0).unwrap(), grid.cell_at(0, 1).unwrap());

    let state = editor.toolbar_state();
    assert!(state.in_table);
    assert!(!state.can_merge_cells);
    assert!(!state.can_unmerge_cell);

    editor.set_selection(Selection::Table {
        table,
        anchor: first,
        focus: second,
    });
    assert!(editor.toolbar_state().can_merge_cells);

    let after = *texts(&editor).last().unwrap();
    assert_eq!(editor.doc().nearest(after, NodeKind::TableCell), None);
    caret_in(&mut editor, after);
    assert!(!editor.toolbar_state().in_table);
}

#[test]
fn palette_and_font_size_come_from_config() {
    let config = EditorConfig::from_json(
        r##"{ "colors": ["#111111", "#222222"], "fontSize": { "min": 10, "max": 40, "default": 18 } }"##,
    )
    .unwrap();
    let editor = Editor::from_html("<p>x</p>", config).unwrap();

    let state = editor.toolbar_state();
    assert_eq!(state.palette, vec!["#111111".to_string(), "#222222".to_string()]);
    assert_eq!(state.font_size, 18);
    assert!(state.font_family.is_none());
}

#[test]
fn history_flags_refresh_after_commits() {
    let mut editor = Editor::new(EditorConfig::default());
    let before = editor.toolbar_state();
    assert!(!before.can_undo && !before.can_redo);

    editor
        .dispatch("text.insert", serde_json::json!({ "text": "a" }))
        .unwrap();
    assert!(editor.toolbar_state().can_undo);

    editor.undo().unwrap();
    let state = editor.toolbar_state();
    assert!(!state.can_undo);
    assert!(state.can_redo);
}

#[test]
fn state_serializes_in_camel_case() {
    let editor = Editor::from_html("<p>x</p>", EditorConfig::default()).unwrap();
    let json = serde_json::to_value(editor.toolbar_state()).unwrap();
    assert_eq!(json["blockType"], "paragraph");
    assert_eq!(json["inTable"], false);
    assert_eq!(json["fontSize"], 15);
}
