use richfield_core::{
    CommandOutcome, Editor, EditorConfig, EmbedLoader, EmbedRequest, EmbedState, NodeKey,
    NodeKind,
};

#[derive(Default)]
struct RecordingLoader {
    requests: Vec<EmbedRequest>,
}

impl EmbedLoader for RecordingLoader {
    fn request(&mut self, request: EmbedRequest) {
        self.requests.push(request);
    }
}

fn find(editor: &Editor, kind: NodeKind) -> NodeKey {
    editor
        .doc()
        .keys()
        .into_iter()
        .find(|key| editor.doc().kind(*key) == Some(kind))
        .unwrap()
}

const YOUTUBE_HTML: &str = "<iframe src=\"https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ\" \
     width=\"560\" height=\"315\" data-youtube-id=\"dQw4w9WgXcQ\" data-alignment=\"center\" \
     frameborder=\"0\" allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture\" \
     allowfullscreen=\"true\"></iframe>";

#[test]
fn youtube_insert_accepts_any_url_form() {
    for url in [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ",
        "dQw4w9WgXcQ",
    ] {
        let mut editor = Editor::new(EditorConfig::default());
        let outcome = editor
            .dispatch("embed.youtube", serde_json::json!({ "url": url }))
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Handled, "{url}");
        assert_eq!(editor.html(), format!("{YOUTUBE_HTML}<p></p>"));
    }
}

#[test]
fn youtube_width_and_alignment_are_applied() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch(
            "embed.youtube",
            serde_json::json!({ "url": "dQw4w9WgXcQ", "width": 320, "alignment": "right" }),
        )
        .unwrap();
    let html = editor.html();
    assert!(html.contains("width=\"320\" height=\"180\""));
    assert!(html.contains("data-alignment=\"right\""));
}

#[test]
fn urls_without_an_id_are_not_handled() {
    let mut editor = Editor::new(EditorConfig::default());
    for (command, url) in [
        ("embed.youtube", "https://vimeo.com/1234"),
        ("embed.tweet", "https://example.com/status/abc"),
        ("embed.tweet", "https://box.com/a/status/123"),
    ] {
        let outcome = editor.dispatch(command, serde_json::json!(url)).unwrap();
        assert_eq!(outcome, CommandOutcome::NotHandled, "{command}");
    }
    assert_eq!(editor.html(), "<p></p>");
}

#[test]
fn tweet_exports_blockquote_with_status_link() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch(
            "embed.tweet",
            serde_json::json!({ "url": "https://x.com/jack/status/20?s=46" }),
        )
        .unwrap();

    assert_eq!(
        editor.html(),
        "<blockquote class=\"twitter-tweet\" data-tweet-id=\"20\" data-width=\"550\" data-alignment=\"center\">\
         <a href=\"https://twitter.com/i/status/20\">https://twitter.com/i/status/20</a></blockquote><p></p>"
    );
}

#[test]
fn embeds_hydrate_from_their_html() {
    let tweet = "<blockquote class=\"twitter-tweet\" data-tweet-id=\"20\" data-width=\"400\" data-alignment=\"left\">\
                 <a href=\"https://twitter.com/i/status/20\">https://twitter.com/i/status/20</a></blockquote>";
    let html = format!("{YOUTUBE_HTML}{tweet}<blockquote>plain quote</blockquote>");

    let editor = Editor::from_html(&html, EditorConfig::default()).unwrap();

    assert_eq!(editor.html(), html);
    let root = editor.doc().root();
    let kinds: Vec<_> = editor
        .doc()
        .children(root)
        .iter()
        .filter_map(|key| editor.doc().kind(*key))
        .collect();
    assert_eq!(kinds, vec![NodeKind::YouTube, NodeKind::Tweet, NodeKind::Quote]);
}

#[test]
fn iframes_from_other_hosts_are_dropped() {
    let editor = Editor::from_html(
        "<p>a</p><iframe src=\"https://evil.example/embed/dQw4w9WgXcQ\"></iframe>",
        EditorConfig::default(),
    )
    .unwrap();
    assert_eq!(editor.html(), "<p>a</p>");
}

#[test]
fn live_render_waits_for_the_host_to_load_embeds() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch("embed.youtube", serde_json::json!("dQw4w9WgXcQ"))
        .unwrap();
    let video = find(&editor, NodeKind::YouTube);
    let mut loader = RecordingLoader::default();

    let pending = editor.render_html(&mut loader);
    assert!(pending.contains("data-embed-state=\"pending\""));
    assert!(!pending.contains("<iframe"));
    assert_eq!(loader.requests.len(), 1);
    assert_eq!(loader.requests[0].key, video);
    assert_eq!(
        loader.requests[0].url,
        "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ"
    );
    assert_eq!(editor.embed_state(video), Some(&EmbedState::Pending));

    editor.resolve_embed(video, Ok(()));
    let loaded = editor.render_html(&mut loader);
    assert!(loaded.contains("<iframe"));
    assert!(loaded.contains(&format!("data-key=\"{}\"", video.get())));
    assert_eq!(loader.requests.len(), 1);
}

#[test]
fn failed_embeds_render_a_fallback_link() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch("embed.tweet", serde_json::json!("20"))
        .unwrap();
    let tweet = find(&editor, NodeKind::Tweet);
    let mut loader = RecordingLoader::default();
    editor.render_html(&mut loader);

    editor.resolve_embed(tweet, Err("blocked".to_string()));

    assert_eq!(
        editor.embed_state(tweet),
        Some(&EmbedState::Failed("blocked".to_string()))
    );
    let html = editor.render_html(&mut loader);
    assert!(html.contains("data-embed-state=\"failed\""));
    assert!(html.contains("Could not load embed: blocked"));
    assert!(html.contains("href=\"https://twitter.com/i/status/20\""));
    assert_eq!(editor.html().matches("twitter-tweet").count(), 1);
}

#[test]
fn removed_embeds_forget_their_load_state() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch("embed.youtube", serde_json::json!("dQw4w9WgXcQ"))
        .unwrap();
    let video = find(&editor, NodeKind::YouTube);
    editor.render_html(&mut RecordingLoader::default());
    assert!(editor.embed_state(video).is_some());

    editor.set_html("<p>gone</p>").unwrap();

    assert!(editor.embed_state(video).is_none());
}

#[test]
fn oversized_embed_widths_are_capped() {
    let mut editor = Editor::new(EditorConfig::default());
    editor
        .dispatch(
            "embed.youtube",
            serde_json::json!({ "url": "dQw4w9WgXcQ", "width": 4_000_000_000u32 }),
        )
        .unwrap();
    assert!(editor.html().contains("width=\"4096\" height=\"2304\""));

    let editor = Editor::from_html(
        "<iframe src=\"https://www.youtube.com/embed/dQw4w9WgXcQ\" width=\"4000000000\"></iframe>",
        EditorConfig::default(),
    )
    .unwrap();
    assert!(editor.html().contains("width=\"4096\" height=\"2304\""));
}
