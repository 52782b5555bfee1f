use richfield_core::{
    CommandOutcome, Dimension, Editor, EditorConfig, ImageAlignment, NodeData, NodeKey, NodeKind,
};

fn find_image(editor: &Editor) -> NodeKey {
    editor
        .doc()
        .keys()
        .into_iter()
        .find(|key| editor.doc().kind(*key) == Some(NodeKind::Image))
        .unwrap()
}

#[test]
fn insert_image_at_caret() {
    let mut editor = Editor::new(EditorConfig::default());

    let outcome = editor
        .dispatch(
            "image.insert",
            serde_json::json!({
                "src": "/uploads/a.png",
                "alt": "A",
                "width": 320,
                "alignment": "center"
            }),
        )
        .unwrap();

    assert_eq!(outcome, CommandOutcome::Handled);
    assert_eq!(
        editor.html(),
        "<p><img src=\"/uploads/a.png\" alt=\"A\" width=\"320\" data-alignment=\"center\" loading=\"lazy\"></p>"
    );
    let image = find_image(&editor);
    assert!(matches!(
        editor.doc().data(image),
        Some(NodeData::Image(data)) if data.width == Dimension::Px(320) && data.height == Dimension::Inherit
    ));
    assert!(editor.can_undo());
}

#[test]
fn disallowed_sources_are_a_no_op() {
    let mut editor = Editor::new(EditorConfig::default());

    for src in ["javascript:alert(1)", "data:image/png;base64,AAA", "//cdn.example/a.png", ""] {
        let outcome = editor
            .dispatch("image.insert", serde_json::json!({ "src": src }))
            .unwrap();
        assert_eq!(outcome, CommandOutcome::NotHandled, "{src}");
    }
    assert_eq!(editor.html(), "<p></p>");
    assert!(!editor.can_undo());
}

#[test]
fn update_changes_fields_and_link() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch("image.insert", serde_json::json!({ "src": "https://x.io/a.png" }))
        .unwrap();
    let image = find_image(&editor);

    editor
        .dispatch(
            "image.update",
            serde_json::json!({
                "key": image,
                "altText": "Cat",
                "cssClasses": "rounded bad\"class shadow",
                "alignment": "full",
                "linkUrl": "https://x.io",
                "linkTarget": "_blank",
                "loading": "eager"
            }),
        )
        .unwrap();

    assert_eq!(
        editor.html(),
        "<p><a href=\"https://x.io\" target=\"_blank\" rel=\"noopener noreferrer\">\
         <img src=\"https://x.io/a.png\" alt=\"Cat\" class=\"rounded shadow\" data-alignment=\"full\" loading=\"eager\"></a></p>"
    );

    editor
        .dispatch("image.update", serde_json::json!({ "key": image, "linkUrl": "" }))
        .unwrap();
    assert!(!editor.html().contains("<a"));

    let rejected = editor
        .dispatch("image.update", serde_json::json!({ "key": image, "src": "javascript:x" }))
        .unwrap();
    assert_eq!(rejected, CommandOutcome::NotHandled);
    assert!(matches!(
        editor.doc().data(image),
        Some(NodeData::Image(data)) if data.src == "https://x.io/a.png" && data.alignment == ImageAlignment::Full
    ));
}

#[test]
fn update_of_non_image_is_not_handled() {
    let mut editor = Editor::from_html("<p>text</p>", EditorConfig::default()).unwrap();
    let outcome = editor
        .dispatch("image.update", serde_json::json!({ "width": 10 }))
        .unwrap();
    assert_eq!(outcome, CommandOutcome::NotHandled);
}

#[test]
fn linked_images_import_as_one_node() {
    let editor = Editor::from_html(
        "<p><a href=\"https://x.io\" target=\"_blank\"><img src=\"https://x.io/a.png\" alt=\"x\" width=\"auto\"></a></p>",
        EditorConfig::default(),
    )
    .unwrap();

    assert_eq!(
        editor.html(),
        "<p><a href=\"https://x.io\" target=\"_blank\" rel=\"noopener noreferrer\">\
         <img src=\"https://x.io/a.png\" alt=\"x\" data-alignment=\"none\" loading=\"lazy\"></a></p>"
    );
    let image = find_image(&editor);
    assert!(editor.doc().nearest(image, NodeKind::Link).is_none());
    assert!(matches!(
        editor.doc().data(image),
        Some(NodeData::Image(data)) if data.link_url.as_deref() == Some("https://x.io")
    ));
}

#[test]
fn images_with_unsafe_sources_are_dropped_on_import() {
    let editor = Editor::from_html(
        "<p>a<img src=\"javascript:alert(1)\">b</p>",
        EditorConfig::default(),
    )
    .unwrap();
    assert_eq!(editor.html(), "<p>ab</p>");
}
