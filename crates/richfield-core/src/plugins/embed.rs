use richfield_html::Element;
use serde::Deserialize;

use super::args;
use crate::document::NodeTree;
use crate::error::CommandError;
use crate::nodes::{EmbedAlignment, MAX_EMBED_WIDTH, NodeData, NodeKind, TweetData, YouTubeData};
use crate::plugin::{
    CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher, NodeRole, NodeSpec,
};
use crate::txn::Txn;

pub(crate) struct EmbedPlugin;

fn youtube(el: &Element) -> Option<DomConversion> {
    YouTubeData::from_element(el).map(|data| DomConversion::leaf(NodeData::YouTube(data)))
}

fn tweet(el: &Element) -> Option<DomConversion> {
    if !el.has_class("twitter-tweet") {
        return None;
    }
    TweetData::from_element(el).map(|data| DomConversion::leaf(NodeData::Tweet(data)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmbedArgs {
    url: String,
    width: Option<u32>,
    alignment: Option<EmbedAlignment>,
}

fn insert_embed(
    txn: &mut Txn<'_>,
    command: &'static str,
    payload: &serde_json::Value,
    make: fn(&str, Option<u32>, Option<EmbedAlignment>) -> Option<NodeData>,
) -> Result<CommandOutcome, CommandError> {
    let args: EmbedArgs = match payload {
        serde_json::Value::String(url) => EmbedArgs {
            url: url.clone(),
            ..EmbedArgs::default()
        },
        _ => args(command, payload)?,
    };
    let width = args.width.filter(|w| *w > 0).map(|w| w.min(MAX_EMBED_WIDTH));
    let Some(data) = make(&args.url, width, args.alignment) else {
        tracing::debug!(command, url = %args.url, "no embed id in url");
        return Ok(CommandOutcome::NotHandled);
    };
    txn.insert_block(NodeTree::leaf(data))?;
    Ok(CommandOutcome::Handled)
}

impl EditorPlugin for EmbedPlugin {
    fn id(&self) -> &'static str {
        "embed"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::void(NodeKind::YouTube, NodeRole::Block),
            NodeSpec::void(NodeKind::Tweet, NodeRole::Block),
        ]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![
            ImportMatcher::new("iframe", 0, youtube),
            ImportMatcher::new("blockquote", 2, tweet),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("embed.youtube", "YouTube video", |txn, payload| {
                insert_embed(txn, "embed.youtube", payload, |url, width, alignment| {
                    let mut data = YouTubeData::from_url(url)?;
                    data.width = width.unwrap_or(data.width);
                    data.alignment = alignment.unwrap_or(data.alignment);
                    Some(NodeData::YouTube(data))
                })
            })
            .description("Embed a YouTube video from a watch, share or embed url.")
            .keywords(["youtube", "video", "embed"])
            .toolbar_item("youtube")
            .args_example(serde_json::json!({ "url": "https://youtu.be/dQw4w9WgXcQ" })),
            CommandSpec::new("embed.tweet", "Tweet", |txn, payload| {
                insert_embed(txn, "embed.tweet", payload, |url, width, alignment| {
                    let mut data = TweetData::from_url(url)?;
                    data.width = width.unwrap_or(data.width);
                    data.alignment = alignment.unwrap_or(data.alignment);
                    Some(NodeData::Tweet(data))
                })
            })
            .description("Embed a tweet from its status url.")
            .keywords(["tweet", "twitter", "x", "embed"])
            .toolbar_item("tweet")
            .args_example(serde_json::json!({ "url": "https://x.com/jack/status/20" })),
        ]
    }
}
