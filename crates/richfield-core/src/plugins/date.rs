use serde::Deserialize;

use super::args;
use crate::document::{NodeKey, NodeTree};
use crate::nodes::{DateData, DateFormat, NodeData, NodeKind};
use crate::plugin::{
    CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher, NodeRole, NodeSpec,
};

pub(crate) struct DatePlugin;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DateArgs {
    key: Option<NodeKey>,
    date: Option<String>,
    format: Option<DateFormat>,
    locale: Option<String>,
}

impl EditorPlugin for DatePlugin {
    fn id(&self) -> &'static str {
        "date"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::void(NodeKind::Date, NodeRole::Inline)]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![ImportMatcher::new("time", 0, |el| {
            Some(DomConversion::leaf(NodeData::Date(DateData::from_element(el))))
        })]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("date.insert", "Insert date", |txn, payload| {
                let args: DateArgs = args("date.insert", payload)?;
                let format = args.format.unwrap_or_default();
                let data = match args.date.filter(|d| !d.trim().is_empty()) {
                    Some(date) => DateData::new(date.trim(), format, args.locale.as_deref()),
                    None => DateData::today(format, args.locale.as_deref()),
                };
                txn.insert_inline(NodeTree::leaf(NodeData::Date(data)))?;
                Ok(CommandOutcome::Handled)
            })
            .description("Insert a date at the caret, today unless one is given.")
            .keywords(["date", "today", "time", "calendar"])
            .toolbar_item("date")
            .args_example(serde_json::json!({ "date": "2024-03-15", "format": "long" })),
            CommandSpec::new("date.update", "Update date", |txn, payload| {
                let args: DateArgs = args("date.update", payload)?;
                let Some(key) = args.key.or_else(|| txn.selection().focus_key()) else {
                    return Ok(CommandOutcome::NotHandled);
                };
                let NodeData::Date(data) = txn.writable(key)? else {
                    return Ok(CommandOutcome::NotHandled);
                };
                if let Some(date) = args.date {
                    data.date = date.trim().to_string();
                }
                if let Some(format) = args.format {
                    data.format = format;
                }
                if let Some(locale) = args.locale.filter(|l| !l.trim().is_empty()) {
                    data.locale = locale.trim().to_string();
                }
                Ok(CommandOutcome::Handled)
            })
            .description("Change the date, format or locale of a date node.")
            .keywords(["date", "edit", "format"])
            .toolbar_item("date")
            .args_example(serde_json::json!({ "key": 7, "format": "relative" })),
        ]
    }
}
