use richfield_core::{Editor, EditorConfig, EditorError, PluginRegistry, RichfieldValue, sanitize};

/// One of every node type, written the way the editor exports it.
fn every_node_html() -> String {
    [
        "<h1>Title</h1>",
        "<p style=\"text-align: center;\">a <strong>b</strong> \
         <a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">c</a><br>d</p>",
        "<blockquote>q</blockquote>",
        "<ul><li>one</li><li>two</li></ul>",
        "<ol start=\"3\"><li>three</li></ol>",
        "<hr>",
        "<p><img src=\"/a.png\" alt=\"A\" data-alignment=\"none\" loading=\"lazy\"></p>",
        "<table><tbody><tr><th data-header-state=\"row\"><p>h</p></th></tr>\
         <tr><td><p>c</p></td></tr></tbody></table>",
        "<div class=\"rf-layout\" data-columns=\"2\" style=\"grid-template-columns: 1fr 1fr;\">\
         <div class=\"rf-layout-item\"><p>l</p></div><div class=\"rf-layout-item\"><p>r</p></div></div>",
        "<iframe src=\"https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ\" \
         width=\"560\" height=\"315\" data-youtube-id=\"dQw4w9WgXcQ\" data-alignment=\"center\" \
         frameborder=\"0\" allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture\" \
         allowfullscreen=\"true\"></iframe>",
        "<blockquote class=\"twitter-tweet\" data-tweet-id=\"20\" data-width=\"550\" data-alignment=\"center\">\
         <a href=\"https://twitter.com/i/status/20\">https://twitter.com/i/status/20</a></blockquote>",
        "<details class=\"rf-collapsible\" open=\"\"><summary class=\"rf-collapsible-title\">More</summary>\
         <div class=\"rf-collapsible-content\"><p>hidden</p></div></details>",
        "<p>on <time datetime=\"2024-01-05\" data-format=\"medium\" data-locale=\"en-US\">Jan 5, 2024</time></p>",
    ]
    .concat()
}

#[test]
fn exported_html_hydrates_to_the_same_html() {
    let html = every_node_html();
    let editor = Editor::from_html(&html, EditorConfig::default()).unwrap();
    assert_eq!(editor.html(), html);

    let again = Editor::from_html(editor.html(), EditorConfig::default()).unwrap();
    assert_eq!(again.html(), html);
}

#[test]
fn exported_html_is_already_sanitized() {
    let editor = Editor::from_html(&every_node_html(), EditorConfig::default()).unwrap();
    assert_eq!(sanitize(editor.html()), editor.html());
}

#[test]
fn json_snapshots_keep_html_and_keys() {
    let editor = Editor::from_html(&every_node_html(), EditorConfig::default()).unwrap();
    let value = editor.to_value();
    assert_eq!(value.schema, "richfield");
    assert_eq!(value.version, 1);

    let mut restored = Editor::new(EditorConfig::default());
    restored.load_value(value.clone()).unwrap();
    assert_eq!(restored.html(), editor.html());
    assert_eq!(restored.to_value(), value);
    assert_eq!(restored.doc().keys(), editor.doc().keys());

    let json = value.to_json_pretty().unwrap();
    let mut from_text = Editor::new(EditorConfig::default());
    from_text.load_json(&json).unwrap();
    assert_eq!(from_text.html(), editor.html());
}

#[test]
fn json_uses_type_tags() {
    let editor = Editor::from_html("<p><strong>x</strong></p>", EditorConfig::default()).unwrap();
    let json = serde_json::to_value(editor.to_value()).unwrap();

    let paragraph = &json["root"]["children"][0];
    assert_eq!(paragraph["type"], "paragraph");
    assert_eq!(paragraph["children"][0]["type"], "extended-text");
    assert_eq!(paragraph["children"][0]["text"], "x");
}

#[test]
fn unknown_node_types_are_rejected() {
    let mut editor = Editor::from_html("<p>keep</p>", EditorConfig::default()).unwrap();
    let json = serde_json::json!({
        "schema": "richfield",
        "version": 1,
        "root": { "type": "root", "children": [{ "type": "poll" }] }
    });

    let err = editor.load_json(&json.to_string()).unwrap_err();

    assert!(matches!(err, EditorError::UnknownNodeType(ref name) if name == "poll"));
    assert_eq!(editor.html(), "<p>keep</p>");
}

#[test]
fn unregistered_node_types_are_rejected() {
    let source = Editor::from_html(
        "<p><time datetime=\"2024-01-05\">x</time></p>",
        EditorConfig::default(),
    )
    .unwrap();
    let mut core_only = Editor::with_registry(PluginRegistry::core(), EditorConfig::default());

    let err = core_only.load_value(source.to_value()).unwrap_err();

    assert!(matches!(err, EditorError::UnknownNodeType(ref name) if name == "date"));
}

#[test]
fn newer_schema_versions_are_refused() {
    let mut editor = Editor::new(EditorConfig::default());
    let value: RichfieldValue = serde_json::from_value(serde_json::json!({
        "schema": "richfield",
        "version": 2,
        "root": { "type": "root" }
    }))
    .unwrap();

    let err = editor.load_value(value).unwrap_err();

    assert!(matches!(err, EditorError::UnsupportedSchema { version: 2, .. }));
}

#[test]
fn scripts_never_survive_hydration() {
    let editor = Editor::from_html(
        "<p onclick=\"x()\">hi<script>alert(1)</script></p><style>p{}</style><!-- c -->",
        EditorConfig::default(),
    )
    .unwrap();
    assert_eq!(editor.html(), "<p>hi</p>");
}
