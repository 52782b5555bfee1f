use richfield_html::{DomNode, Element, sanitize_image_src};
use serde::Deserialize;

use super::args;
use crate::document::{NodeKey, NodeTree};
use crate::nodes::{Dimension, ImageAlignment, ImageData, ImageLoading, NodeData, NodeKind};
use crate::plugin::{
    CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher, NodeRole, NodeSpec,
};

pub(crate) struct ImagePlugin;

fn image(el: &Element) -> Option<DomConversion> {
    ImageData::from_element(el, None).map(|data| DomConversion::leaf(NodeData::Image(data)))
}

/// `<a><img></a>` is a linked image rather than a link around an image.
fn linked_image(el: &Element) -> Option<DomConversion> {
    let has_text = el.children.iter().any(|child| match child {
        DomNode::Text(text) => !text.trim().is_empty(),
        _ => false,
    });
    let mut elements = el.element_children();
    let img = elements.next().filter(|child| child.tag == "img")?;
    if elements.next().is_some() || has_text {
        return None;
    }
    ImageData::from_element(img, Some(el)).map(|data| DomConversion::leaf(NodeData::Image(data)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ImageArgs {
    key: Option<NodeKey>,
    src: Option<String>,
    #[serde(alias = "alt")]
    alt_text: Option<String>,
    width: Option<Dimension>,
    height: Option<Dimension>,
    css_classes: Option<String>,
    alignment: Option<ImageAlignment>,
    /// An empty string removes the link.
    link_url: Option<String>,
    link_target: Option<String>,
    loading: Option<ImageLoading>,
}

impl ImageArgs {
    /// Applies every field present. Returns `false` when a new src is rejected.
    fn apply(&self, data: &mut ImageData) -> bool {
        if let Some(src) = &self.src {
            let src = sanitize_image_src(src);
            if src.is_empty() {
                return false;
            }
            data.src = src;
        }
        if let Some(alt) = &self.alt_text {
            data.alt_text = alt.clone();
        }
        if let Some(width) = self.width {
            data.width = width;
        }
        if let Some(height) = self.height {
            data.height = height;
        }
        if let Some(classes) = &self.css_classes {
            data.set_css_classes(classes);
        }
        if let Some(alignment) = self.alignment {
            data.alignment = alignment;
        }
        if let Some(url) = &self.link_url {
            let url = Some(url.as_str()).filter(|u| !u.trim().is_empty());
            data.set_link(url, self.link_target.as_deref());
        }
        if let Some(loading) = self.loading {
            data.loading = loading;
        }
        true
    }
}

impl EditorPlugin for ImagePlugin {
    fn id(&self) -> &'static str {
        "image"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::void(NodeKind::Image, NodeRole::Inline)]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![
            ImportMatcher::new("img", 0, image),
            ImportMatcher::new("a", 1, linked_image),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("image.insert", "Insert image", |txn, payload| {
                let args: ImageArgs = args("image.insert", payload)?;
                let src = args.src.as_deref().unwrap_or("");
                let Some(mut data) = ImageData::new(src, args.alt_text.clone().unwrap_or_default())
                else {
                    tracing::debug!(src, "image src rejected, insert dropped");
                    return Ok(CommandOutcome::NotHandled);
                };
                args.apply(&mut data);
                txn.insert_inline(NodeTree::leaf(NodeData::Image(data)))?;
                Ok(CommandOutcome::Handled)
            })
            .description("Insert an image at the caret. Disallowed sources make this a no-op.")
            .keywords(["image", "picture", "photo", "img"])
            .toolbar_item("image")
            .args_example(serde_json::json!({
                "src": "/uploads/photo.png",
                "altText": "A photo",
                "alignment": "center"
            })),
            CommandSpec::new("image.update", "Update image", |txn, payload| {
                let args: ImageArgs = args("image.update", payload)?;
                let Some(key) = args.key.or_else(|| txn.selection().focus_key()) else {
                    return Ok(CommandOutcome::NotHandled);
                };
                let Some(NodeData::Image(mut data)) = txn.doc().data(key).cloned() else {
                    return Ok(CommandOutcome::NotHandled);
                };
                if !args.apply(&mut data) {
                    return Ok(CommandOutcome::NotHandled);
                }
                txn.set_data(key, NodeData::Image(data))?;
                Ok(CommandOutcome::Handled)
            })
            .description("Change fields of an existing image.")
            .keywords(["image", "edit", "resize", "alt"])
            .toolbar_item("image")
            .args_example(serde_json::json!({ "key": 4, "width": 320 })),
        ]
    }
}
