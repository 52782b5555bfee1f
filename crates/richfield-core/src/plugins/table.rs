use richfield_html::Element;
use serde::Deserialize;
use serde_json::Value;

use super::args;
use crate::document::{Document, NodeKey, NodeTree};
use crate::error::{ApplyError, CommandError};
use crate::nodes::{
    NodeData, NodeKind, TABLE_ALIGNMENT, TABLE_BORDER_STYLE, TABLE_CELL_PADDING, TABLE_LAYOUT,
    TABLE_WIDTH, TableCellData, TableData,
};
use crate::ops::Op;
use crate::plugin::{
    ChildConstraint, CommandOutcome, CommandSpec, DomConversion, EditorPlugin, ImportMatcher,
    NodeSpec, NormalizePass, PluginRegistry,
};
use crate::selection::Selection;
use crate::table_geometry::{self, TableGrid, table_tree};
use crate::txn::Txn;

const DEFAULT_TABLE_SIZE: usize = 3;

pub(crate) struct TablePlugin;

fn table(el: &Element) -> Option<DomConversion> {
    Some(DomConversion::node(NodeData::Table(TableData::from_element(el))))
}

fn cell(el: &Element) -> Option<DomConversion> {
    Some(DomConversion::node(NodeData::TableCell(TableCellData::from_element(el))))
}

fn empty_cell() -> NodeTree {
    NodeTree::new(
        NodeData::TableCell(TableCellData::default()),
        vec![NodeTree::paragraph("")],
    )
}

/// Tables have at least one row, spans stay inside the grid and every row
/// covers the full grid width.
struct TableShape;

impl TableShape {
    fn repair(doc: &Document, table: NodeKey) -> Vec<Op> {
        if doc.children(table).is_empty() {
            return vec![Op::insert(
                table,
                0,
                NodeTree::new(NodeData::TableRow, vec![empty_cell()]),
            )];
        }
        let Some(grid) = TableGrid::build(doc, table) else {
            return Vec::new();
        };

        let mut ops = Vec::new();
        for (key, pos) in grid.cells() {
            let Some(data) = doc.data(*key).and_then(NodeData::as_table_cell) else {
                continue;
            };
            let (row_span, col_span) = (pos.row_span as u32, pos.col_span as u32);
            if data.row_span != row_span || data.col_span != col_span {
                ops.push(Op::SetData {
                    key: *key,
                    data: NodeData::TableCell(TableCellData {
                        row_span,
                        col_span,
                        ..data.clone()
                    }),
                });
            }
        }
        for (r, row) in grid.rows().iter().enumerate() {
            let missing = grid.width().saturating_sub(grid.occupied(r));
            let len = doc.children(*row).len();
            for i in 0..missing {
                ops.push(Op::insert(*row, len + i, empty_cell()));
            }
        }
        ops
    }
}

impl NormalizePass for TableShape {
    fn id(&self) -> &'static str {
        "table.shape"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        doc.keys()
            .into_iter()
            .filter(|key| doc.kind(*key) == Some(NodeKind::Table))
            .flat_map(|key| Self::repair(doc, key))
            .collect()
    }
}

/// Accepts positive numbers and numeric strings. Anything else gets the default.
fn coerce_count(value: &Value, default: usize) -> usize {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => (n.trunc() as i64).max(1) as usize,
        _ => default,
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InsertTableArgs {
    rows: Value,
    columns: Value,
    include_headers: bool,
    #[serde(flatten)]
    style: TableStyleArgs,
}

impl Default for InsertTableArgs {
    fn default() -> Self {
        Self {
            rows: Value::Null,
            columns: Value::Null,
            include_headers: true,
            style: TableStyleArgs::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TableStyleArgs {
    border_style: Option<String>,
    cell_padding: Option<String>,
    layout: Option<String>,
    width: Option<String>,
    alignment: Option<String>,
}

impl TableStyleArgs {
    /// Applies each property present; an empty string clears it. Returns `false`
    /// when any value was rejected.
    fn apply(&self, data: &mut TableData) -> bool {
        let props = [
            (TABLE_BORDER_STYLE, &self.border_style),
            (TABLE_CELL_PADDING, &self.cell_padding),
            (TABLE_LAYOUT, &self.layout),
            (TABLE_WIDTH, &self.width),
            (TABLE_ALIGNMENT, &self.alignment),
        ];
        let mut ok = true;
        for (prop, value) in props {
            let Some(value) = value else {
                continue;
            };
            let value = Some(value.as_str()).filter(|v| !v.trim().is_empty());
            if !data.set_style_value(prop, value) {
                tracing::debug!(prop, ?value, "rejected table style");
                ok = false;
            }
        }
        ok
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct InsertAtArgs {
    after: bool,
}

impl Default for InsertAtArgs {
    fn default() -> Self {
        Self { after: true }
    }
}

/// The cell commands act on: the table selection's focus or the caret's cell.
fn current_cell(txn: &Txn<'_>) -> Option<NodeKey> {
    match txn.selection() {
        Selection::Table { focus, .. } => Some(*focus),
        _ => txn.selected_cells().first().copied(),
    }
}

fn current_table(txn: &Txn<'_>) -> Option<NodeKey> {
    match txn.selection() {
        Selection::Table { table, .. } => Some(*table),
        Selection::Node { keys }
            if keys.len() == 1 && txn.doc().kind(keys[0]) == Some(NodeKind::Table) =>
        {
            Some(keys[0])
        }
        _ => current_cell(txn).and_then(|cell| txn.doc().nearest(cell, NodeKind::Table)),
    }
}

fn with_cell(
    txn: &mut Txn<'_>,
    f: impl FnOnce(&mut Txn<'_>, NodeKey) -> Result<bool, ApplyError>,
) -> Result<CommandOutcome, CommandError> {
    let Some(cell) = current_cell(txn) else {
        return Ok(CommandOutcome::NotHandled);
    };
    Ok(f(txn, cell)?.into())
}

impl EditorPlugin for TablePlugin {
    fn id(&self) -> &'static str {
        "table"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::block(NodeKind::Table, ChildConstraint::Kinds(&[NodeKind::TableRow])),
            NodeSpec::block(NodeKind::TableRow, ChildConstraint::Kinds(&[NodeKind::TableCell])),
            NodeSpec::block(NodeKind::TableCell, ChildConstraint::BlockOnly),
        ]
    }

    fn import_matchers(&self) -> Vec<ImportMatcher> {
        vec![
            ImportMatcher::new("table", 0, table),
            ImportMatcher::new("tr", 0, |_| Some(DomConversion::node(NodeData::TableRow))),
            ImportMatcher::new("td", 0, cell),
            ImportMatcher::new("th", 0, cell),
            ImportMatcher::new("colgroup", 0, |_| {
                Some(DomConversion::pass_through().skip_children())
            }),
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(TableShape)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("table.insert", "Insert table", |txn, payload| {
                let args: InsertTableArgs = args("table.insert", payload)?;
                let rows = coerce_count(&args.rows, DEFAULT_TABLE_SIZE);
                let columns = coerce_count(&args.columns, DEFAULT_TABLE_SIZE);
                let mut data = TableData::default();
                args.style.apply(&mut data);
                txn.insert_block(table_tree(data, rows, columns, args.include_headers))?;
                Ok(CommandOutcome::Handled)
            })
            .description("Insert a table with the caret in its first cell.")
            .keywords(["table", "grid", "rows", "columns"])
            .toolbar_item("table")
            .args_example(serde_json::json!({
                "rows": 3,
                "columns": 4,
                "includeHeaders": true,
                "borderStyle": "dashed"
            })),
            CommandSpec::new("table.merge_cells", "Merge cells", |txn, _payload| {
                let cells = txn.selected_cells();
                if cells.len() < 2 {
                    return Ok(CommandOutcome::NotHandled);
                }
                Ok(table_geometry::merge_cells(txn, &cells)?.into())
            })
            .description("Merge the selected rectangle of cells into its top-left cell.")
            .keywords(["table", "merge", "cells", "span"])
            .toolbar_item("table"),
            CommandSpec::new("table.unmerge_cell", "Unmerge cell", |txn, _payload| {
                let cell = match txn.selection() {
                    Selection::Table { anchor, .. } => Some(*anchor),
                    _ => current_cell(txn),
                };
                let Some(cell) = cell else {
                    return Ok(CommandOutcome::NotHandled);
                };
                Ok(table_geometry::unmerge_cell(txn, cell)?.into())
            })
            .description("Split a spanning cell back into single cells.")
            .keywords(["table", "unmerge", "split", "cells"])
            .toolbar_item("table"),
            CommandSpec::new("table.insert_row", "Insert row", |txn, payload| {
                let InsertAtArgs { after } = args("table.insert_row", payload)?;
                with_cell(txn, |txn, cell| table_geometry::insert_row(txn, cell, after))
            })
            .description("Insert a row above or below the current cell.")
            .keywords(["table", "row", "insert"])
            .toolbar_item("table")
            .args_example(serde_json::json!({ "after": false })),
            CommandSpec::new("table.insert_column", "Insert column", |txn, payload| {
                let InsertAtArgs { after } = args("table.insert_column", payload)?;
                with_cell(txn, |txn, cell| table_geometry::insert_column(txn, cell, after))
            })
            .description("Insert a column left or right of the current cell.")
            .keywords(["table", "column", "insert"])
            .toolbar_item("table")
            .args_example(serde_json::json!({ "after": true })),
            CommandSpec::new("table.delete_row", "Delete row", |txn, _payload| {
                with_cell(txn, table_geometry::delete_rows)
            })
            .description("Delete the rows the current cell spans.")
            .keywords(["table", "row", "delete", "remove"])
            .toolbar_item("table"),
            CommandSpec::new("table.delete_column", "Delete column", |txn, _payload| {
                with_cell(txn, table_geometry::delete_columns)
            })
            .description("Delete the columns the current cell spans.")
            .keywords(["table", "column", "delete", "remove"])
            .toolbar_item("table"),
            CommandSpec::new("table.delete", "Delete table", |txn, _payload| {
                let Some(table) = current_table(txn) else {
                    return Ok(CommandOutcome::NotHandled);
                };
                txn.remove(table)?;
                Ok(CommandOutcome::Handled)
            })
            .description("Remove the current table.")
            .keywords(["table", "delete", "remove"])
            .toolbar_item("table"),
            CommandSpec::new("table.set_style", "Table style", |txn, payload| {
                let style: TableStyleArgs = args("table.set_style", payload)?;
                let Some(table) = current_table(txn) else {
                    return Ok(CommandOutcome::NotHandled);
                };
                let NodeData::Table(data) = txn.writable(table)? else {
                    return Ok(CommandOutcome::NotHandled);
                };
                Ok(style.apply(data).into())
            })
            .description("Set border style, cell padding, layout, width or alignment of the table.")
            .keywords(["table", "style", "border", "width", "padding"])
            .toolbar_item("table")
            .args_example(serde_json::json!({ "borderStyle": "dotted", "width": "100%" })),
            CommandSpec::new("table.toggle_header_row", "Header row", |txn, _payload| {
                let Some(table) = current_table(txn) else {
                    return Ok(CommandOutcome::NotHandled);
                };
                Ok(table_geometry::toggle_header_row(txn, table)?.into())
            })
            .description("Toggle the first row between header and body cells.")
            .keywords(["table", "header", "row"])
            .toolbar_item("table"),
        ]
    }
}
