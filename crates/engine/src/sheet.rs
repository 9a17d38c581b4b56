//! The sparse cell table, its logical bounds, and structural edits.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellStyle};
use crate::error::{EngineError, Result};

/// Sparse cell storage: row index -> column index -> cell.
/// Absence of an entry is an implicit empty cell.
pub type Grid = FxHashMap<usize, FxHashMap<usize, Cell>>;

pub const DEFAULT_ROW_COUNT: usize = 100;
pub const DEFAULT_COL_COUNT: usize = 26;

/// Logical sheet bounds plus presentational size overrides.
///
/// `row_count`/`col_count` bound every addressable index. The height and
/// width maps carry per-row/per-column overrides for the renderer; they take
/// no part in evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub row_count: usize,
    pub col_count: usize,
    #[serde(default)]
    pub row_heights: FxHashMap<usize, f32>,
    #[serde(default)]
    pub col_widths: FxHashMap<usize, f32>,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            row_count: DEFAULT_ROW_COUNT,
            col_count: DEFAULT_COL_COUNT,
            row_heights: FxHashMap::default(),
            col_widths: FxHashMap::default(),
        }
    }
}

/// One sheet: the sparse grid paired with its dimensions.
///
/// These primitives only move data around; the snapshot/recalculate flow
/// around them lives in [`crate::spreadsheet::Spreadsheet`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub cells: Grid,
    pub dims: Dimensions,
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_COUNT, DEFAULT_COL_COUNT)
    }
}

impl Sheet {
    pub fn new(row_count: usize, col_count: usize) -> Self {
        Self {
            cells: Grid::default(),
            dims: Dimensions {
                row_count,
                col_count,
                ..Default::default()
            },
        }
    }

    /// Borrow a stored cell, if present.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&row)?.get(&col)
    }

    /// The stored cell or the empty default; never fails.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cell(row, col).cloned().unwrap_or_default()
    }

    pub fn check_row(&self, row: usize) -> Result<()> {
        if row < self.dims.row_count {
            Ok(())
        } else {
            Err(EngineError::RowOutOfBounds(row))
        }
    }

    pub fn check_col(&self, col: usize) -> Result<()> {
        if col < self.dims.col_count {
            Ok(())
        } else {
            Err(EngineError::ColOutOfBounds(col))
        }
    }

    pub fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        self.check_row(row)?;
        self.check_col(col)
    }

    /// Store a cell, pruning entries that carry no content so the sparse
    /// map never accumulates empty placeholders.
    pub fn write(&mut self, row: usize, col: usize, cell: Cell) {
        if cell.is_empty() {
            self.clear(row, col);
            return;
        }
        self.cells.entry(row).or_default().insert(col, cell);
    }

    /// Reset a cell to empty: value, formula, and style all dropped.
    pub fn clear(&mut self, row: usize, col: usize) {
        if let Some(row_map) = self.cells.get_mut(&row) {
            row_map.remove(&col);
            if row_map.is_empty() {
                self.cells.remove(&row);
            }
        }
    }

    /// Merge a style patch into a cell, creating the cell if absent.
    /// Value and formula are untouched.
    pub fn merge_style(&mut self, row: usize, col: usize, patch: &CellStyle) {
        let cell = self.cells.entry(row).or_default().entry(col).or_default();
        cell.style.get_or_insert_with(CellStyle::default).merge(patch);
    }

    /// Iterate over all populated cells, in arbitrary order.
    pub fn cells_iter(&self) -> impl Iterator<Item = ((usize, usize), &Cell)> {
        self.cells
            .iter()
            .flat_map(|(row, cols)| cols.iter().map(move |(col, cell)| ((*row, *col), cell)))
    }

    // =========================================================================
    // Structural edits
    //
    // Rows and columns move as whole cells (value, formula, and style
    // together). Bounds are validated by the caller; these shifts themselves
    // accept any index.
    // =========================================================================

    /// Insert one empty row after `after_row`, shifting later rows down and
    /// growing the row count.
    pub fn insert_row(&mut self, after_row: usize) {
        // Collect the rows to move, remove them, reinsert shifted
        let rows: Vec<usize> = self.cells.keys().copied().filter(|r| *r > after_row).collect();
        let mut moved = Vec::with_capacity(rows.len());
        for r in rows {
            if let Some(cols) = self.cells.remove(&r) {
                moved.push((r + 1, cols));
            }
        }
        for (row, cols) in moved {
            self.cells.insert(row, cols);
        }

        shift_overrides_down(&mut self.dims.row_heights, after_row + 1);
        self.dims.row_count += 1;
    }

    /// Delete `row`, shifting later rows up and shrinking the row count.
    pub fn delete_row(&mut self, row: usize) {
        self.cells.remove(&row);

        let rows: Vec<usize> = self.cells.keys().copied().filter(|r| *r > row).collect();
        let mut moved = Vec::with_capacity(rows.len());
        for r in rows {
            if let Some(cols) = self.cells.remove(&r) {
                moved.push((r - 1, cols));
            }
        }
        for (r, cols) in moved {
            self.cells.insert(r, cols);
        }

        self.dims.row_heights.remove(&row);
        shift_overrides_up(&mut self.dims.row_heights, row);
        self.dims.row_count -= 1;
    }

    /// Insert one empty column after `after_col`, applied per populated row.
    pub fn insert_column(&mut self, after_col: usize) {
        for cols in self.cells.values_mut() {
            let shifted: Vec<usize> = cols.keys().copied().filter(|c| *c > after_col).collect();
            let mut moved = Vec::with_capacity(shifted.len());
            for c in shifted {
                if let Some(cell) = cols.remove(&c) {
                    moved.push((c + 1, cell));
                }
            }
            for (c, cell) in moved {
                cols.insert(c, cell);
            }
        }

        shift_overrides_down(&mut self.dims.col_widths, after_col + 1);
        self.dims.col_count += 1;
    }

    /// Delete `col` from every populated row, shifting later columns left.
    pub fn delete_column(&mut self, col: usize) {
        let mut emptied = Vec::new();
        for (row, cols) in self.cells.iter_mut() {
            cols.remove(&col);

            let shifted: Vec<usize> = cols.keys().copied().filter(|c| *c > col).collect();
            let mut moved = Vec::with_capacity(shifted.len());
            for c in shifted {
                if let Some(cell) = cols.remove(&c) {
                    moved.push((c - 1, cell));
                }
            }
            for (c, cell) in moved {
                cols.insert(c, cell);
            }

            if cols.is_empty() {
                emptied.push(*row);
            }
        }
        for row in emptied {
            self.cells.remove(&row);
        }

        self.dims.col_widths.remove(&col);
        shift_overrides_up(&mut self.dims.col_widths, col);
        self.dims.col_count -= 1;
    }
}

/// Shift size overrides at or beyond `from` one slot toward higher indices.
fn shift_overrides_down(overrides: &mut FxHashMap<usize, f32>, from: usize) {
    let moved: Vec<(usize, f32)> = overrides
        .iter()
        .filter(|(i, _)| **i >= from)
        .map(|(i, v)| (*i, *v))
        .collect();
    for (i, _) in &moved {
        overrides.remove(i);
    }
    for (i, v) in moved {
        overrides.insert(i + 1, v);
    }
}

/// Shift size overrides beyond `from` one slot toward lower indices.
fn shift_overrides_up(overrides: &mut FxHashMap<usize, f32>, from: usize) {
    let moved: Vec<(usize, f32)> = overrides
        .iter()
        .filter(|(i, _)| **i > from)
        .map(|(i, v)| (*i, *v))
        .collect();
    for (i, _) in &moved {
        overrides.remove(i);
    }
    for (i, v) in moved {
        overrides.insert(i - 1, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    fn text_cell(s: &str) -> Cell {
        Cell {
            value: CellValue::Text(s.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_get_returns_default_for_absent() {
        let sheet = Sheet::default();
        assert_eq!(sheet.get(5, 5), Cell::default());
        assert!(sheet.cell(5, 5).is_none());
    }

    #[test]
    fn test_write_and_clear() {
        let mut sheet = Sheet::default();
        sheet.write(1, 2, text_cell("x"));
        assert_eq!(sheet.get(1, 2).value, CellValue::Text("x".into()));

        sheet.clear(1, 2);
        assert!(sheet.cells.is_empty());
    }

    #[test]
    fn test_write_prunes_empty_cells() {
        let mut sheet = Sheet::default();
        sheet.write(0, 0, text_cell("x"));
        sheet.write(0, 0, Cell::default());
        assert!(sheet.cells.is_empty());
    }

    #[test]
    fn test_merge_style_creates_cell() {
        let mut sheet = Sheet::default();
        sheet.merge_style(
            2,
            3,
            &CellStyle {
                bold: Some(true),
                ..Default::default()
            },
        );
        let cell = sheet.get(2, 3);
        assert_eq!(cell.value, CellValue::Empty);
        assert_eq!(cell.style.unwrap().bold, Some(true));
    }

    #[test]
    fn test_insert_row_shifts_down() {
        let mut sheet = Sheet::default();
        sheet.write(0, 0, text_cell("a"));
        sheet.write(2, 0, text_cell("c"));
        sheet.dims.row_heights.insert(2, 40.0);

        sheet.insert_row(0);

        assert_eq!(sheet.dims.row_count, DEFAULT_ROW_COUNT + 1);
        assert_eq!(sheet.get(0, 0).value, CellValue::Text("a".into()));
        assert!(sheet.cell(1, 0).is_none()); // the new empty row
        assert!(sheet.cell(2, 0).is_none());
        assert_eq!(sheet.get(3, 0).value, CellValue::Text("c".into()));
        assert_eq!(sheet.dims.row_heights.get(&3), Some(&40.0));
    }

    #[test]
    fn test_delete_row_shifts_up() {
        let mut sheet = Sheet::default();
        sheet.write(0, 0, text_cell("a"));
        sheet.write(1, 0, text_cell("b"));
        sheet.write(2, 0, text_cell("c"));

        sheet.delete_row(1);

        assert_eq!(sheet.dims.row_count, DEFAULT_ROW_COUNT - 1);
        assert_eq!(sheet.get(0, 0).value, CellValue::Text("a".into()));
        assert_eq!(sheet.get(1, 0).value, CellValue::Text("c".into()));
        assert!(sheet.cell(2, 0).is_none());
    }

    #[test]
    fn test_insert_then_delete_row_is_identity() {
        let mut sheet = Sheet::default();
        sheet.write(0, 0, text_cell("a"));
        sheet.write(1, 1, text_cell("b"));
        sheet.write(5, 3, text_cell("f"));
        let before = sheet.clone();

        sheet.insert_row(1);
        sheet.delete_row(2);

        assert_eq!(sheet, before);
    }

    #[test]
    fn test_insert_column_shifts_right() {
        let mut sheet = Sheet::default();
        sheet.write(0, 0, text_cell("a"));
        sheet.write(0, 1, text_cell("b"));
        sheet.write(3, 1, text_cell("x"));

        sheet.insert_column(0);

        assert_eq!(sheet.dims.col_count, DEFAULT_COL_COUNT + 1);
        assert_eq!(sheet.get(0, 0).value, CellValue::Text("a".into()));
        assert!(sheet.cell(0, 1).is_none());
        assert_eq!(sheet.get(0, 2).value, CellValue::Text("b".into()));
        assert_eq!(sheet.get(3, 2).value, CellValue::Text("x".into()));
    }

    #[test]
    fn test_delete_column_shifts_left() {
        let mut sheet = Sheet::default();
        sheet.write(0, 0, text_cell("a"));
        sheet.write(0, 1, text_cell("b"));
        sheet.write(0, 2, text_cell("c"));
        sheet.dims.col_widths.insert(2, 120.0);

        sheet.delete_column(1);

        assert_eq!(sheet.dims.col_count, DEFAULT_COL_COUNT - 1);
        assert_eq!(sheet.get(0, 0).value, CellValue::Text("a".into()));
        assert_eq!(sheet.get(0, 1).value, CellValue::Text("c".into()));
        assert!(sheet.cell(0, 2).is_none());
        assert_eq!(sheet.dims.col_widths.get(&1), Some(&120.0));
    }

    #[test]
    fn test_delete_column_drops_emptied_rows() {
        let mut sheet = Sheet::default();
        sheet.write(4, 2, text_cell("only"));

        sheet.delete_column(2);

        assert!(sheet.cells.is_empty());
    }

    #[test]
    fn test_structural_edit_moves_whole_cell() {
        let mut sheet = Sheet::default();
        let cell = Cell {
            value: CellValue::Number(1.0),
            formula: Some("=A1".to_string()),
            style: Some(CellStyle {
                bold: Some(true),
                ..Default::default()
            }),
        };
        sheet.write(2, 0, cell.clone());

        sheet.insert_row(0);

        assert_eq!(sheet.get(3, 0), cell);
    }
}
