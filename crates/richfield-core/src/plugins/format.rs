use once_cell::sync::Lazy;
use regex::Regex;
use richfield_html::{Element, StyleMap};
use serde::Deserialize;

use super::args;
use crate::error::CommandError;
use crate::nodes::{NodeData, TextFormat, formats_from_style};
use crate::plugin::{CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher};
use crate::toolbar::font_size_at;
use crate::txn::Txn;

static SAFE_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#[0-9a-fA-F]{3,8}|(rgb|rgba|hsl|hsla)\([0-9\s.,%deg]+\)|[a-zA-Z]{3,20})$")
        .expect("invalid color regex")
});

pub(crate) fn is_safe_color(color: &str) -> bool {
    SAFE_COLOR.is_match(color.trim())
}

pub(crate) struct FormatPlugin;

fn mark(format: TextFormat) -> impl Fn(&mut NodeData) + 'static {
    move |data| {
        if let NodeData::Text(text) = data {
            text.set_format(format, true);
        }
    }
}

fn styled_span(el: &Element) -> Option<DomConversion> {
    let style = StyleMap::parse(el.attr("style").unwrap_or(""));
    if style.is_empty() {
        return Some(DomConversion::pass_through());
    }
    let formats = formats_from_style(&style);
    Some(DomConversion::pass_through().for_child(move |data| {
        if let NodeData::Text(text) = data {
            for format in &formats {
                text.set_format(*format, true);
            }
            text.merge_style_missing(&style);
        }
    }))
}

/// Toggles `format` on the selection: added unless every selected run already has it.
fn toggle(txn: &mut Txn<'_>, format: TextFormat) -> Result<CommandOutcome, CommandError> {
    let targets = txn.text_targets()?;
    if targets.is_empty() {
        return Ok(CommandOutcome::NotHandled);
    }
    let all_set = targets
        .iter()
        .all(|key| txn.doc().text(*key).is_some_and(|t| t.has_format(format)));
    for key in targets {
        txn.writable_text(key)?.set_format(format, !all_set);
    }
    Ok(CommandOutcome::Handled)
}

fn set_style(
    txn: &mut Txn<'_>,
    prop: &str,
    value: Option<&str>,
) -> Result<CommandOutcome, CommandError> {
    let targets = txn.text_targets()?;
    if targets.is_empty() {
        return Ok(CommandOutcome::NotHandled);
    }
    for key in targets {
        txn.writable_text(key)?.set_style_property(prop, value);
    }
    Ok(CommandOutcome::Handled)
}

/// Font size of the focused run in px, or the configured default.
fn current_font_size(txn: &Txn<'_>) -> u32 {
    font_size_at(txn.doc(), txn.focus_point(), txn.config())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FontSizeArgs {
    size: Option<i64>,
    delta: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FontFamilyArgs {
    family: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ColorArgs {
    color: Option<String>,
}

fn color_command(
    id: &'static str,
    label: &'static str,
    prop: &'static str,
    item: &'static str,
) -> CommandSpec {
    CommandSpec::new(id, label, move |txn, payload| {
        let ColorArgs { color } = args(id, payload)?;
        match color.as_deref().map(str::trim) {
            Some("") | None => set_style(txn, prop, None),
            Some(color) if !is_safe_color(color) => {
                tracing::debug!(command = id, color, "rejected color");
                Ok(CommandOutcome::NotHandled)
            }
            Some(color) => set_style(txn, prop, Some(color)),
        }
    })
    .toolbar_item(item)
    .args_example(serde_json::json!({ "color": "#e03131" }))
}

impl EditorPlugin for FormatPlugin {
    fn id(&self) -> &'static str {
        "format"
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![
            ImportMatcher::new("strong", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Bold)))
            }),
            ImportMatcher::new("b", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Bold)))
            }),
            ImportMatcher::new("em", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Italic)))
            }),
            ImportMatcher::new("i", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Italic)))
            }),
            ImportMatcher::new("s", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Strikethrough)))
            }),
            ImportMatcher::new("strike", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Strikethrough)))
            }),
            ImportMatcher::new("del", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Strikethrough)))
            }),
            ImportMatcher::new("u", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Underline)))
            }),
            ImportMatcher::new("ins", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Underline)))
            }),
            ImportMatcher::new("code", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Code)))
            }),
            ImportMatcher::new("sub", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Subscript)))
            }),
            ImportMatcher::new("sup", 0, |_| {
                Some(DomConversion::pass_through().for_child(mark(TextFormat::Superscript)))
            }),
            ImportMatcher::new("span", 0, styled_span),
            ImportMatcher::new("pre", 0, |_| {
                Some(
                    DomConversion::node(NodeData::paragraph())
                        .preformatted()
                        .for_child(mark(TextFormat::Code)),
                )
            }),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let mut commands: Vec<CommandSpec> = TextFormat::ALL
            .into_iter()
            .map(|format| {
                let id = format!("format.{}", format.name());
                CommandSpec::new(id, format!("Toggle {}", format.name()), move |txn, _payload| {
                    toggle(txn, format)
                })
                .description(format!("Toggle {} on the selection or caret.", format.name()))
                .keywords([format.name(), "format", "mark"])
                .toolbar_item(format.name())
            })
            .collect();

        commands.extend([
            CommandSpec::new("format.font_size", "Font size", |txn, payload| {
                let FontSizeArgs { size, delta } = args("format.font_size", payload)?;
                let requested = match (size, delta) {
                    (Some(size), _) => size,
                    (None, Some(delta)) => i64::from(current_font_size(txn)) + delta,
                    (None, None) => {
                        return Err(CommandError::invalid_payload(
                            "format.font_size",
                            "expected `size` or `delta`",
                        ));
                    }
                };
                let size = txn.config().clamp_font_size(requested);
                set_style(txn, "font-size", Some(&format!("{size}px")))
            })
            .description("Set or step the font size, clamped to the configured range.")
            .keywords(["font", "size"])
            .toolbar_item("fontSize")
            .args_example(serde_json::json!({ "delta": 1 })),
            CommandSpec::new("format.font_family", "Font family", |txn, payload| {
                let FontFamilyArgs { family } = args("format.font_family", payload)?;
                match family {
                    None => set_style(txn, "font-family", None),
                    Some(family) => {
                        let allowed = txn
                            .config()
                            .font_families
                            .iter()
                            .any(|f| f.eq_ignore_ascii_case(&family));
                        if !allowed {
                            tracing::debug!(family = %family, "font family not in allow-list");
                            return Ok(CommandOutcome::NotHandled);
                        }
                        set_style(txn, "font-family", Some(&family))
                    }
                }
            })
            .description("Set the font family from the configured allow-list.")
            .keywords(["font", "family", "typeface"])
            .toolbar_item("fontFamily")
            .args_example(serde_json::json!({ "family": "Georgia" })),
            color_command("format.text_color", "Text color", "color", "fontColor"),
            color_command(
                "format.background_color",
                "Background color",
                "background-color",
                "bgColor",
            ),
            CommandSpec::new("format.clear", "Clear formatting", |txn, _payload| {
                let targets = txn.text_targets()?;
                if targets.is_empty() {
                    return Ok(CommandOutcome::NotHandled);
                }
                for key in targets {
                    let text = txn.writable_text(key)?;
                    text.format = 0;
                    text.style.clear();
                }
                Ok(CommandOutcome::Handled)
            })
            .description("Remove every format and inline style from the selection.")
            .keywords(["clear", "reset", "format"])
            .toolbar_item("clearFormatting"),
        ]);
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_checked() {
        assert!(is_safe_color("#fff"));
        assert!(is_safe_color("rgb(1, 2, 3)"));
        assert!(is_safe_color("red"));
        assert!(!is_safe_color("url(x)"));
        assert!(!is_safe_color("red; background: blue"));
    }
}
