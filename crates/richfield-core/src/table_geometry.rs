//! Span-aware table grid. Nothing here is cached: the grid is rebuilt from the
//! table's rows and cells whenever it is needed.

use std::collections::HashSet;

use crate::document::{Document, NodeKey, NodeTree};
use crate::error::ApplyError;
use crate::nodes::{
    HeaderState, MAX_COL_SPAN, MAX_ROW_SPAN, NodeData, NodeKind, TableCellData, TableData,
};
use crate::selection::{Point, Selection};
use crate::txn::Txn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
}

impl CellPosition {
    pub fn last_row(&self) -> usize {
        self.row + self.row_span - 1
    }

    pub fn last_col(&self) -> usize {
        self.col + self.col_span - 1
    }
}

/// Inclusive bounds of a rectangle of grid slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub min_row: usize,
    pub max_row: usize,
    pub min_col: usize,
    pub max_col: usize,
}

impl CellRect {
    pub fn height(&self) -> usize {
        self.max_row - self.min_row + 1
    }

    pub fn width(&self) -> usize {
        self.max_col - self.min_col + 1
    }

    fn include(&mut self, pos: &CellPosition) -> bool {
        let before = *self;
        self.min_row = self.min_row.min(pos.row);
        self.max_row = self.max_row.max(pos.last_row());
        self.min_col = self.min_col.min(pos.col);
        self.max_col = self.max_col.max(pos.last_col());
        before != *self
    }
}

#[derive(Debug, Clone)]
pub struct TableGrid {
    table: NodeKey,
    rows: Vec<NodeKey>,
    slots: Vec<Vec<Option<NodeKey>>>,
    cells: Vec<(NodeKey, CellPosition)>,
}

impl TableGrid {
    /// Places cells the way HTML tables do: each cell takes the first free slot of its row.
    /// Row spans reaching past the last row are clamped, as are spans over the browser limits.
    pub fn build(doc: &Document, table: NodeKey) -> Option<Self> {
        if doc.kind(table) != Some(NodeKind::Table) {
            return None;
        }
        let rows: Vec<NodeKey> = doc
            .children(table)
            .iter()
            .copied()
            .filter(|row| doc.kind(*row) == Some(NodeKind::TableRow))
            .collect();
        let mut slots: Vec<Vec<Option<NodeKey>>> = vec![Vec::new(); rows.len()];
        let mut cells = Vec::new();

        for (r, row) in rows.iter().enumerate() {
            let mut col = 0;
            for cell in doc.children(*row) {
                let Some(data) = doc.data(*cell).and_then(NodeData::as_table_cell) else {
                    continue;
                };
                while slots[r].get(col).is_some_and(Option::is_some) {
                    col += 1;
                }
                let row_span = (data.row_span.clamp(1, MAX_ROW_SPAN) as usize).min(rows.len() - r);
                let col_span = data.col_span.clamp(1, MAX_COL_SPAN) as usize;
                for slot_row in &mut slots[r..r + row_span] {
                    if slot_row.len() < col + col_span {
                        slot_row.resize(col + col_span, None);
                    }
                    for slot in &mut slot_row[col..col + col_span] {
                        *slot = Some(*cell);
                    }
                }
                cells.push((
                    *cell,
                    CellPosition {
                        row: r,
                        col,
                        row_span,
                        col_span,
                    },
                ));
                col += col_span;
            }
        }

        Some(Self {
            table,
            rows,
            slots,
            cells,
        })
    }

    pub fn table(&self) -> NodeKey {
        self.table
    }

    pub fn rows(&self) -> &[NodeKey] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Columns of the widest row.
    pub fn width(&self) -> usize {
        self.slots.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cells in document order with their grid positions.
    pub fn cells(&self) -> &[(NodeKey, CellPosition)] {
        &self.cells
    }

    pub fn position(&self, cell: NodeKey) -> Option<CellPosition> {
        self.cells
            .iter()
            .find(|(key, _)| *key == cell)
            .map(|(_, pos)| *pos)
    }

    /// Slots of `row` covered by some cell, including spans from rows above.
    pub fn occupied(&self, row: usize) -> usize {
        self.slots
            .get(row)
            .map(|slots| slots.iter().filter(|slot| slot.is_some()).count())
            .unwrap_or(0)
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Option<NodeKey> {
        self.slots.get(row)?.get(col).copied().flatten()
    }

    /// Number of cells in `row` that start left of `col`: the child index for a cell placed at `col`.
    pub fn insertion_index(&self, row: usize, col: usize) -> usize {
        self.cells
            .iter()
            .filter(|(_, pos)| pos.row == row && pos.col < col)
            .count()
    }

    /// Bounding box of the given cells, spans included.
    pub fn bbox(&self, cells: &[NodeKey]) -> Option<CellRect> {
        let mut positions = cells.iter().filter_map(|cell| self.position(*cell));
        let first = positions.next()?;
        let mut rect = CellRect {
            min_row: first.row,
            max_row: first.last_row(),
            min_col: first.col,
            max_col: first.last_col(),
        };
        for pos in positions {
            rect.include(&pos);
        }
        Some(rect)
    }

    /// Grows `rect` until no cell straddles its edge.
    pub fn expand(&self, mut rect: CellRect) -> CellRect {
        loop {
            let mut grew = false;
            for (_, pos) in &self.cells {
                let overlaps = pos.row <= rect.max_row
                    && pos.last_row() >= rect.min_row
                    && pos.col <= rect.max_col
                    && pos.last_col() >= rect.min_col;
                if overlaps {
                    grew |= rect.include(pos);
                }
            }
            if !grew {
                return rect;
            }
        }
    }

    pub fn cells_in_rect(&self, rect: CellRect) -> Vec<NodeKey> {
        self.cells
            .iter()
            .filter(|(_, pos)| {
                pos.row <= rect.max_row
                    && pos.last_row() >= rect.min_row
                    && pos.col <= rect.max_col
                    && pos.last_col() >= rect.min_col
            })
            .map(|(key, _)| *key)
            .collect()
    }

    /// The rectangle spanned by two corner cells, widened over any straddling spans.
    pub fn cells_between(&self, anchor: NodeKey, focus: NodeKey) -> Vec<NodeKey> {
        self.bbox(&[anchor, focus])
            .map(|rect| self.cells_in_rect(self.expand(rect)))
            .unwrap_or_default()
    }

    /// The merge rectangle when `cells` exactly tile their bounding box.
    pub fn mergeable_rect(&self, cells: &[NodeKey]) -> Option<CellRect> {
        let selected: HashSet<NodeKey> = cells.iter().copied().collect();
        if selected.len() < 2 || selected.iter().any(|cell| self.position(*cell).is_none()) {
            return None;
        }
        let rect = self.bbox(cells)?;
        for row in rect.min_row..=rect.max_row {
            for col in rect.min_col..=rect.max_col {
                match self.cell_at(row, col) {
                    Some(cell) if selected.contains(&cell) => {}
                    _ => return None,
                }
            }
        }
        Some(rect)
    }
}

fn empty_cell() -> NodeTree {
    empty_cell_with(HeaderState::None)
}

fn empty_cell_with(header: HeaderState) -> NodeTree {
    NodeTree::new(
        NodeData::TableCell(TableCellData::header(header)),
        vec![NodeTree::paragraph("")],
    )
}

/// A paragraph holding nothing but empty text.
pub(crate) fn is_empty_block(doc: &Document, key: NodeKey) -> bool {
    doc.kind(key) == Some(NodeKind::Paragraph)
        && doc
            .children(key)
            .iter()
            .all(|child| doc.text(*child).is_some_and(|t| t.text.is_empty()))
}

fn grid_for(txn: &Txn<'_>, cell: NodeKey) -> Option<TableGrid> {
    let table = txn.doc().nearest(cell, NodeKind::Table)?;
    TableGrid::build(txn.doc(), table)
}

fn set_spans(txn: &mut Txn<'_>, cell: NodeKey, rows: usize, cols: usize) -> Result<(), ApplyError> {
    let data = txn
        .writable(cell)?
        .as_table_cell_mut()
        .ok_or(ApplyError::MissingNode(cell))?;
    data.row_span = rows.max(1) as u32;
    data.col_span = cols.max(1) as u32;
    Ok(())
}

/// Merges cells that exactly tile a rectangle into its top-left cell.
/// Returns `false` without mutating when fewer than two cells are given or they
/// do not form a rectangle of one table.
pub fn merge_cells(txn: &mut Txn<'_>, cells: &[NodeKey]) -> Result<bool, ApplyError> {
    let Some(first) = cells.first() else {
        return Ok(false);
    };
    let Some(grid) = grid_for(txn, *first) else {
        return Ok(false);
    };
    let Some(rect) = grid.mergeable_rect(cells) else {
        return Ok(false);
    };
    let Some(target) = grid.cell_at(rect.min_row, rect.min_col) else {
        return Ok(false);
    };

    let absorbed: Vec<NodeKey> = grid
        .cells()
        .iter()
        .map(|(key, _)| *key)
        .filter(|key| *key != target && cells.contains(key))
        .collect();
    for cell in absorbed {
        for child in txn.doc().children(cell).to_vec() {
            if !is_empty_block(txn.doc(), child) {
                let index = txn.doc().children(target).len();
                txn.move_to(child, target, index)?;
            }
        }
        txn.remove(cell)?;
    }

    let children = txn.doc().children(target).to_vec();
    if children.len() > 1 {
        let mut kept = children.len();
        for child in children {
            if kept > 1 && is_empty_block(txn.doc(), child) {
                txn.remove(child)?;
                kept -= 1;
            }
        }
    }
    set_spans(txn, target, rect.height(), rect.width())?;
    tracing::debug!(
        cell = %target,
        rows = rect.height(),
        cols = rect.width(),
        "merged table cells"
    );

    if let Some(text) = txn.doc().last_text(target) {
        let end = txn.doc().text(text).map(|t| t.text.len()).unwrap_or(0);
        txn.set_selection(Selection::collapsed(Point::new(text, end)));
    }
    Ok(true)
}

/// Resets a spanning cell to 1x1 and recreates the cells it covered.
pub fn unmerge_cell(txn: &mut Txn<'_>, cell: NodeKey) -> Result<bool, ApplyError> {
    let Some(grid) = grid_for(txn, cell) else {
        return Ok(false);
    };
    let Some(pos) = grid.position(cell) else {
        return Ok(false);
    };
    if pos.row_span == 1 && pos.col_span == 1 {
        return Ok(false);
    }
    let header = txn
        .doc()
        .data(cell)
        .and_then(NodeData::as_table_cell)
        .map(|c| c.header)
        .unwrap_or_default();

    set_spans(txn, cell, 1, 1)?;
    for row in pos.row..=pos.last_row() {
        let row_key = grid.rows()[row];
        let mut inserted = 0;
        for col in pos.col..=pos.last_col() {
            if row == pos.row && col == pos.col {
                continue;
            }
            let state = HeaderState::from_axes(
                header.has_row() && row == pos.row,
                header.has_column() && col == pos.col,
            );
            let index = grid.insertion_index(row, col) + inserted;
            txn.insert(row_key, index, empty_cell_with(state))?;
            inserted += 1;
        }
    }
    tracing::debug!(cell = %cell, rows = pos.row_span, cols = pos.col_span, "unmerged table cell");
    Ok(true)
}

/// Inserts a row above or below the rows covered by `cell`. Cells spanning the
/// insertion boundary grow instead of receiving a new neighbour.
pub fn insert_row(txn: &mut Txn<'_>, cell: NodeKey, after: bool) -> Result<bool, ApplyError> {
    let Some(grid) = grid_for(txn, cell) else {
        return Ok(false);
    };
    let Some(pos) = grid.position(cell) else {
        return Ok(false);
    };
    let at = if after { pos.last_row() + 1 } else { pos.row };

    let mut grown: HashSet<NodeKey> = HashSet::new();
    let mut new_cells = Vec::new();
    for col in 0..grid.width() {
        if let Some(straddling) = grid.cell_at(at, col) {
            let starts_above = grid.position(straddling).is_some_and(|p| p.row < at);
            if starts_above {
                if grown.insert(straddling) {
                    let p = grid.position(straddling).map(|p| (p.row_span, p.col_span));
                    if let Some((rows, cols)) = p {
                        set_spans(txn, straddling, rows + 1, cols)?;
                    }
                }
                continue;
            }
        }
        let column_header = at
            .checked_sub(1)
            .and_then(|above| grid.cell_at(above, col))
            .and_then(|key| txn.doc().data(key).and_then(NodeData::as_table_cell))
            .is_some_and(|c| c.header.has_column());
        new_cells.push(empty_cell_with(HeaderState::from_axes(false, column_header)));
    }
    txn.insert(grid.table(), at, NodeTree::new(NodeData::TableRow, new_cells))?;
    Ok(true)
}

/// Inserts a column left or right of the columns covered by `cell`.
pub fn insert_column(txn: &mut Txn<'_>, cell: NodeKey, after: bool) -> Result<bool, ApplyError> {
    let Some(grid) = grid_for(txn, cell) else {
        return Ok(false);
    };
    let Some(pos) = grid.position(cell) else {
        return Ok(false);
    };
    let at = if after { pos.last_col() + 1 } else { pos.col };

    let mut grown: HashSet<NodeKey> = HashSet::new();
    for (row, row_key) in grid.rows().iter().enumerate() {
        if let Some(straddling) = grid.cell_at(row, at) {
            if let Some(p) = grid.position(straddling).filter(|p| p.col < at) {
                if grown.insert(straddling) {
                    set_spans(txn, straddling, p.row_span, p.col_span + 1)?;
                }
                continue;
            }
        }
        let row_header = grid
            .cell_at(row, at.saturating_sub(1))
            .and_then(|key| txn.doc().data(key).and_then(NodeData::as_table_cell))
            .is_some_and(|c| c.header.has_row());
        let index = grid.insertion_index(row, at);
        txn.insert(*row_key, index, empty_cell_with(HeaderState::from_axes(row_header, false)))?;
    }
    Ok(true)
}

/// Deletes the rows covered by `cell`. Cells reaching below the deleted rows
/// move down; cells reaching into them from above shrink.
pub fn delete_rows(txn: &mut Txn<'_>, cell: NodeKey) -> Result<bool, ApplyError> {
    let Some(grid) = grid_for(txn, cell) else {
        return Ok(false);
    };
    let Some(pos) = grid.position(cell) else {
        return Ok(false);
    };
    let (first, last) = (pos.row, pos.last_row());
    if first == 0 && last + 1 >= grid.height() {
        txn.remove(grid.table())?;
        return Ok(true);
    }

    let mut moved: Vec<(NodeKey, CellPosition)> = Vec::new();
    for (key, p) in grid.cells() {
        let overlap_start = p.row.max(first);
        let overlap_end = p.last_row().min(last);
        if overlap_start > overlap_end {
            continue;
        }
        let overlap = overlap_end - overlap_start + 1;
        if p.row < first {
            set_spans(txn, *key, p.row_span - overlap, p.col_span)?;
        } else if p.last_row() > last {
            moved.push((*key, *p));
        }
    }

    moved.sort_by_key(|(_, p)| p.col);
    let below = last + 1;
    if let Some(row_key) = grid.rows().get(below).copied() {
        for (placed, (key, p)) in moved.into_iter().enumerate() {
            let index = grid.insertion_index(below, p.col) + placed;
            txn.move_to(key, row_key, index)?;
            set_spans(txn, key, p.last_row() - last, p.col_span)?;
        }
    }
    for row_key in &grid.rows()[first..=last] {
        txn.remove(*row_key)?;
    }
    Ok(true)
}

/// Deletes the columns covered by `cell`. Spanning cells that keep at least one column shrink.
pub fn delete_columns(txn: &mut Txn<'_>, cell: NodeKey) -> Result<bool, ApplyError> {
    let Some(grid) = grid_for(txn, cell) else {
        return Ok(false);
    };
    let Some(pos) = grid.position(cell) else {
        return Ok(false);
    };
    let (first, last) = (pos.col, pos.last_col());
    if first == 0 && last + 1 >= grid.width() {
        txn.remove(grid.table())?;
        return Ok(true);
    }

    for (key, p) in grid.cells() {
        let overlap_start = p.col.max(first);
        let overlap_end = p.last_col().min(last);
        if overlap_start > overlap_end {
            continue;
        }
        let overlap = overlap_end - overlap_start + 1;
        if overlap >= p.col_span {
            txn.remove(*key)?;
        } else {
            set_spans(txn, *key, p.row_span, p.col_span - overlap)?;
        }
    }
    for row_key in grid.rows() {
        if txn.doc().children(*row_key).is_empty() {
            txn.remove(*row_key)?;
        }
    }
    Ok(true)
}

/// Toggles the row header axis on every cell of the first row.
pub fn toggle_header_row(txn: &mut Txn<'_>, table: NodeKey) -> Result<bool, ApplyError> {
    let Some(grid) = TableGrid::build(txn.doc(), table) else {
        return Ok(false);
    };
    let first_row: Vec<NodeKey> = grid
        .cells()
        .iter()
        .filter(|(_, p)| p.row == 0)
        .map(|(key, _)| *key)
        .collect();
    if first_row.is_empty() {
        return Ok(false);
    }
    let all_headers = first_row.iter().all(|key| {
        txn.doc()
            .data(*key)
            .and_then(NodeData::as_table_cell)
            .is_some_and(|c| c.header.has_row())
    });
    for key in first_row {
        let data = txn
            .writable(key)?
            .as_table_cell_mut()
            .ok_or(ApplyError::MissingNode(key))?;
        data.header = HeaderState::from_axes(!all_headers, data.header.has_column());
    }
    Ok(true)
}

/// A table of `rows` x `columns` empty cells.
pub fn table_tree(
    table: TableData,
    rows: usize,
    columns: usize,
    header_row: bool,
) -> NodeTree {
    let rows = (0..rows.max(1))
        .map(|r| {
            let cells = (0..columns.max(1))
                .map(|_| {
                    if header_row && r == 0 {
                        empty_cell_with(HeaderState::Row)
                    } else {
                        empty_cell()
                    }
                })
                .collect();
            NodeTree::new(NodeData::TableRow, cells)
        })
        .collect();
    NodeTree::new(NodeData::Table(table), rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_doc(spans: &[&[(u32, u32)]]) -> (Document, NodeKey) {
        let rows = spans
            .iter()
            .map(|row| {
                let cells = row
                    .iter()
                    .map(|(rs, cs)| {
                        NodeTree::new(
                            NodeData::TableCell(TableCellData {
                                row_span: *rs,
                                col_span: *cs,
                                ..TableCellData::default()
                            }),
                            vec![NodeTree::paragraph("")],
                        )
                    })
                    .collect();
                NodeTree::new(NodeData::TableRow, cells)
            })
            .collect();
        let mut doc = Document::new();
        let table = doc
            .insert_tree(
                doc.root(),
                0,
                NodeTree::new(NodeData::Table(Default::default()), rows),
            )
            .unwrap();
        (doc, table)
    }

    #[test]
    fn row_spans_push_later_cells_right() {
        let (doc, table) = table_doc(&[&[(2, 1), (1, 1), (1, 1)], &[(1, 1), (1, 1)]]);
        let grid = TableGrid::build(&doc, table).unwrap();
        assert_eq!(grid.width(), 3);
        let second_row_first = doc.children(grid.rows()[1])[0];
        assert_eq!(grid.position(second_row_first).unwrap().col, 1);
        assert_eq!(grid.cell_at(1, 0), grid.cell_at(0, 0));
    }

    #[test]
    fn row_spans_past_the_end_are_clamped() {
        let (doc, table) = table_doc(&[&[(5, 1), (1, 1)]]);
        let grid = TableGrid::build(&doc, table).unwrap();
        let (_, pos) = grid.cells()[0];
        assert_eq!(pos.row_span, 1);
    }

    #[test]
    fn l_shaped_selection_is_not_mergeable() {
        let (doc, table) = table_doc(&[&[(1, 1), (1, 1)], &[(1, 1), (1, 1)]]);
        let grid = TableGrid::build(&doc, table).unwrap();
        let cells: Vec<NodeKey> = grid.cells().iter().map(|(k, _)| *k).collect();
        assert!(grid.mergeable_rect(&cells[..3]).is_none());
        assert_eq!(
            grid.mergeable_rect(&cells).map(|r| (r.height(), r.width())),
            Some((2, 2))
        );
    }

    #[test]
    fn corner_selection_expands_over_spans() {
        let (doc, table) = table_doc(&[&[(1, 2), (1, 1)], &[(1, 1), (1, 1), (1, 1)]]);
        let grid = TableGrid::build(&doc, table).unwrap();
        let wide = grid.cell_at(0, 0).unwrap();
        let below_right = grid.cell_at(1, 1).unwrap();
        let cells = grid.cells_between(below_right, below_right);
        assert_eq!(cells, vec![below_right]);
        let cells = grid.cells_between(wide, grid.cell_at(1, 0).unwrap());
        assert_eq!(cells.len(), 3);
    }
}
