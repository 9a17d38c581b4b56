//! The engine facade: one sheet plus history, selection, and clipboard.
//!
//! Every value-mutating operation follows the same path: validate, record a
//! history snapshot, apply the mutation, run a full recalculation pass, then
//! return. Style and sizing edits skip recalculation (presentation never
//! affects evaluation); selection changes skip history. Execution is
//! single-threaded and synchronous throughout; a multi-threaded host must
//! serialize its calls into one owner.

use crate::cell::{Cell, CellStyle, CellValue};
use crate::clipboard::{ClipOp, ClipboardBuffer};
use crate::error::{EngineError, Result};
use crate::formula::functions::FunctionRegistry;
use crate::history::History;
use crate::recalc::{self, RecalcReport};
use crate::selection::Selection;
use crate::sheet::{Dimensions, Sheet};

pub struct Spreadsheet {
    sheet: Sheet,
    history: History,
    clipboard: Option<ClipboardBuffer>,
    selection: Option<Selection>,
    active_cell: Option<(usize, usize)>,
    functions: FunctionRegistry,
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Spreadsheet {
    pub fn new() -> Self {
        Self::with_sheet(Sheet::default())
    }

    /// Wrap an existing sheet (for example one loaded from disk) and bring
    /// its formula values up to date with a full recalculation pass.
    pub fn with_sheet(sheet: Sheet) -> Self {
        let mut spreadsheet = Self {
            sheet,
            history: History::new(),
            clipboard: None,
            selection: None,
            active_cell: None,
            functions: FunctionRegistry::default(),
        };
        spreadsheet.recalculate();
        spreadsheet
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn dims(&self) -> &Dimensions {
        &self.sheet.dims
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    /// Re-evaluate every formula cell against the current grid.
    pub fn recalculate(&mut self) -> RecalcReport {
        recalc::recalculate(&mut self.sheet, &self.functions)
    }

    fn snapshot(&mut self) {
        self.history.record(self.sheet.clone());
    }

    // =========================================================================
    // Cell operations
    // =========================================================================

    /// The stored cell or the empty default; never fails.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.sheet.get(row, col)
    }

    /// Write a value and optional formula, preserving any existing style.
    /// When a `=`-prefixed formula is present the recalculation pass that
    /// follows overwrites `value` with the evaluator's result.
    pub fn set_value(
        &mut self,
        row: usize,
        col: usize,
        value: CellValue,
        formula: Option<String>,
    ) -> Result<()> {
        self.sheet.check_bounds(row, col)?;
        self.snapshot();

        let mut cell = self.sheet.get(row, col);
        cell.value = value;
        cell.formula = formula;
        self.sheet.write(row, col, cell);

        self.recalculate();
        Ok(())
    }

    /// Classify raw editor input and write it: `=...` is a formula, a full
    /// numeric parse is a number, anything else is text.
    pub fn set_input(&mut self, row: usize, col: usize, input: &str) -> Result<()> {
        let parsed = Cell::from_input(input);
        self.set_value(row, col, parsed.value, parsed.formula)
    }

    /// Merge a style patch into a cell. Recorded in history, but never
    /// triggers recalculation.
    pub fn set_style(&mut self, row: usize, col: usize, patch: &CellStyle) -> Result<()> {
        self.sheet.check_bounds(row, col)?;
        self.snapshot();
        self.sheet.merge_style(row, col, patch);
        Ok(())
    }

    // =========================================================================
    // Dimension operations
    // =========================================================================

    /// Override a row's display height. Presentational only: no history, no
    /// recalculation.
    pub fn set_row_height(&mut self, row: usize, height: f32) -> Result<()> {
        self.sheet.check_row(row)?;
        self.sheet.dims.row_heights.insert(row, height);
        Ok(())
    }

    /// Override a column's display width. Presentational only.
    pub fn set_col_width(&mut self, col: usize, width: f32) -> Result<()> {
        self.sheet.check_col(col)?;
        self.sheet.dims.col_widths.insert(col, width);
        Ok(())
    }

    pub fn insert_row(&mut self, after_row: usize) -> Result<()> {
        self.sheet.check_row(after_row)?;
        self.snapshot();
        self.sheet.insert_row(after_row);
        self.recalculate();
        Ok(())
    }

    pub fn delete_row(&mut self, row: usize) -> Result<()> {
        self.sheet.check_row(row)?;
        if self.sheet.dims.row_count == 1 {
            return Err(EngineError::WouldEmptySheet);
        }
        self.snapshot();
        self.sheet.delete_row(row);
        self.recalculate();
        Ok(())
    }

    pub fn insert_column(&mut self, after_col: usize) -> Result<()> {
        self.sheet.check_col(after_col)?;
        self.snapshot();
        self.sheet.insert_column(after_col);
        self.recalculate();
        Ok(())
    }

    pub fn delete_column(&mut self, col: usize) -> Result<()> {
        self.sheet.check_col(col)?;
        if self.sheet.dims.col_count == 1 {
            return Err(EngineError::WouldEmptySheet);
        }
        self.snapshot();
        self.sheet.delete_column(col);
        self.recalculate();
        Ok(())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Set the selection rectangle. The active cell follows the selection's
    /// own anchor, falling back to its start corner.
    pub fn set_selection(&mut self, selection: Selection) {
        self.active_cell = Some(selection.active.unwrap_or(selection.start));
        self.selection = Some(selection);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Make (row, col) the active cell and collapse the selection to it.
    pub fn set_active_cell(&mut self, row: usize, col: usize) {
        self.active_cell = Some((row, col));
        self.selection = Some(Selection::cell(row, col));
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn active_cell(&self) -> Option<(usize, usize)> {
        self.active_cell
    }

    // =========================================================================
    // Clipboard
    // =========================================================================

    /// Capture the current selection into the clipboard buffer.
    pub fn copy(&mut self) -> Result<()> {
        let selection = self.selection.ok_or(EngineError::NoSelection)?;
        self.clipboard = Some(ClipboardBuffer::capture(
            &self.sheet.cells,
            selection,
            ClipOp::Copy,
        ));
        Ok(())
    }

    /// Capture the current selection, then clear every cell in it: value,
    /// formula, and style are all dropped.
    pub fn cut(&mut self) -> Result<()> {
        let selection = self.selection.ok_or(EngineError::NoSelection)?;
        let buffer = ClipboardBuffer::capture(&self.sheet.cells, selection, ClipOp::Cut);

        self.snapshot();
        for (row, col) in selection.normalized().cells() {
            self.sheet.clear(row, col);
        }
        self.clipboard = Some(buffer);

        self.recalculate();
        Ok(())
    }

    /// Write the buffered cells at the active cell, offset for offset,
    /// overwriting whatever is there. The buffer stays put, so a paste can
    /// be repeated.
    pub fn paste(&mut self) -> Result<()> {
        let buffer = self.clipboard.as_ref().ok_or(EngineError::EmptyClipboard)?;
        let (active_row, active_col) = self.active_cell.ok_or(EngineError::NoActiveCell)?;

        let last_row = active_row + buffer.rows - 1;
        let last_col = active_col + buffer.cols - 1;
        self.sheet.check_row(last_row)?;
        self.sheet.check_col(last_col)?;

        let cells = buffer.cells.clone();
        self.snapshot();
        for (row_offset, cols) in cells {
            for (col_offset, cell) in cols {
                self.sheet
                    .write(active_row + row_offset, active_col + col_offset, cell);
            }
        }

        self.recalculate();
        Ok(())
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Restore the previous snapshot. Returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.sheet) {
            Some(snapshot) => {
                self.sheet = snapshot;
                true
            }
            None => false,
        }
    }

    /// Reapply the most recently undone snapshot. Returns false when there
    /// is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.sheet) {
            Some(snapshot) => {
                self.sheet = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellError;
    use crate::sheet::{DEFAULT_COL_COUNT, DEFAULT_ROW_COUNT};

    #[test]
    fn test_set_value_then_undo_restores_exactly() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "keep").unwrap();
        let before = sheet.sheet().clone();

        sheet.set_input(1, 1, "new").unwrap();
        assert!(sheet.undo());

        assert_eq!(*sheet.sheet(), before);
    }

    #[test]
    fn test_redo_restores_post_mutation_state() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "5").unwrap();
        let after = sheet.sheet().clone();

        assert!(sheet.undo());
        assert!(sheet.redo());
        assert_eq!(*sheet.sheet(), after);
    }

    #[test]
    fn test_mutation_clears_redo() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "5").unwrap();
        sheet.undo();
        assert!(sheet.can_redo());

        sheet.set_input(0, 1, "other").unwrap();
        assert!(!sheet.can_redo());
        assert!(!sheet.redo());
    }

    #[test]
    fn test_undo_restores_dimensions() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(2, 0, "x").unwrap();
        let before = sheet.sheet().clone();

        sheet.delete_row(0).unwrap();
        assert_eq!(sheet.dims().row_count, DEFAULT_ROW_COUNT - 1);

        sheet.undo();
        assert_eq!(*sheet.sheet(), before);
        assert_eq!(sheet.dims().row_count, DEFAULT_ROW_COUNT);
    }

    #[test]
    fn test_end_to_end_recalculation() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "5").unwrap();
        sheet.set_input(1, 0, "10").unwrap();
        sheet.set_input(2, 0, "=SUM(A1:A2)").unwrap();
        assert_eq!(sheet.get(2, 0).value, CellValue::Number(15.0));

        sheet.set_input(0, 0, "7").unwrap();
        assert_eq!(sheet.get(2, 0).value, CellValue::Number(17.0));
    }

    #[test]
    fn test_set_value_preserves_style() {
        let mut sheet = Spreadsheet::new();
        sheet
            .set_style(
                0,
                0,
                &CellStyle {
                    bold: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        sheet.set_input(0, 0, "42").unwrap();

        let cell = sheet.get(0, 0);
        assert_eq!(cell.value, CellValue::Number(42.0));
        assert_eq!(cell.style.unwrap().bold, Some(true));
    }

    #[test]
    fn test_set_style_keeps_value_and_formula() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "=SUM(A2:A3)").unwrap();
        let value_before = sheet.get(0, 0).value.clone();

        sheet
            .set_style(
                0,
                0,
                &CellStyle {
                    italic: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let cell = sheet.get(0, 0);
        assert_eq!(cell.value, value_before);
        assert_eq!(cell.formula.as_deref(), Some("=SUM(A2:A3)"));
    }

    #[test]
    fn test_copy_paste_at_origin_is_identity() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "a").unwrap();
        sheet.set_input(0, 1, "b").unwrap();
        sheet.set_input(1, 0, "1").unwrap();
        let before = sheet.sheet().clone();

        sheet.set_selection(Selection::range((0, 0), (1, 1)));
        sheet.copy().unwrap();
        sheet.set_active_cell(0, 0);
        sheet.paste().unwrap();

        assert_eq!(*sheet.sheet(), before);
    }

    #[test]
    fn test_cut_clears_then_paste_restores() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "a").unwrap();
        sheet
            .set_style(
                0,
                0,
                &CellStyle {
                    bold: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        sheet.set_input(1, 1, "b").unwrap();
        let before_cells = sheet.sheet().cells.clone();

        sheet.set_selection(Selection::range((0, 0), (1, 1)));
        sheet.cut().unwrap();

        // Source rectangle is fully cleared, style included
        assert_eq!(sheet.get(0, 0), Cell::default());
        assert_eq!(sheet.get(1, 1), Cell::default());

        sheet.set_active_cell(0, 0);
        sheet.paste().unwrap();
        assert_eq!(sheet.sheet().cells, before_cells);
    }

    #[test]
    fn test_paste_is_repeatable() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "x").unwrap();

        sheet.set_selection(Selection::cell(0, 0));
        sheet.copy().unwrap();

        sheet.set_active_cell(3, 3);
        sheet.paste().unwrap();
        sheet.set_active_cell(5, 5);
        sheet.paste().unwrap();

        assert_eq!(sheet.get(3, 3).value, CellValue::Text("x".into()));
        assert_eq!(sheet.get(5, 5).value, CellValue::Text("x".into()));
    }

    #[test]
    fn test_paste_overwrites_without_merging() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(5, 5, "old").unwrap();

        sheet.set_selection(Selection::range((0, 0), (0, 0)));
        sheet.copy().unwrap();
        sheet.set_active_cell(5, 5);
        sheet.paste().unwrap();

        // The buffered empty cell replaces the old content
        assert_eq!(sheet.get(5, 5), Cell::default());
    }

    #[test]
    fn test_clipboard_errors() {
        let mut sheet = Spreadsheet::new();
        assert_eq!(sheet.copy(), Err(EngineError::NoSelection));
        assert_eq!(sheet.cut(), Err(EngineError::NoSelection));
        assert_eq!(sheet.paste(), Err(EngineError::EmptyClipboard));

        sheet.set_selection(Selection::cell(0, 0));
        sheet.copy().unwrap();
        sheet.clear_selection();
        sheet.active_cell = None;
        assert_eq!(sheet.paste(), Err(EngineError::NoActiveCell));
    }

    #[test]
    fn test_paste_rejects_overflow() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "x").unwrap();
        sheet.set_selection(Selection::range((0, 0), (2, 0)));
        sheet.copy().unwrap();

        sheet.set_active_cell(DEFAULT_ROW_COUNT - 1, 0);
        let before = sheet.sheet().clone();
        assert!(matches!(
            sheet.paste(),
            Err(EngineError::RowOutOfBounds(_))
        ));
        assert_eq!(*sheet.sheet(), before);
    }

    #[test]
    fn test_bounds_errors_leave_sheet_unchanged() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "x").unwrap();
        let before = sheet.sheet().clone();
        let undo_available = sheet.can_undo();

        assert_eq!(
            sheet.set_input(DEFAULT_ROW_COUNT, 0, "y"),
            Err(EngineError::RowOutOfBounds(DEFAULT_ROW_COUNT))
        );
        assert_eq!(
            sheet.set_input(0, DEFAULT_COL_COUNT, "y"),
            Err(EngineError::ColOutOfBounds(DEFAULT_COL_COUNT))
        );
        assert_eq!(
            sheet.insert_row(DEFAULT_ROW_COUNT),
            Err(EngineError::RowOutOfBounds(DEFAULT_ROW_COUNT))
        );
        assert_eq!(
            sheet.delete_column(DEFAULT_COL_COUNT),
            Err(EngineError::ColOutOfBounds(DEFAULT_COL_COUNT))
        );

        assert_eq!(*sheet.sheet(), before);
        assert_eq!(sheet.can_undo(), undo_available);
    }

    #[test]
    fn test_cannot_delete_last_row_or_column() {
        let mut sheet = Spreadsheet::with_sheet(Sheet::new(1, 1));
        assert_eq!(sheet.delete_row(0), Err(EngineError::WouldEmptySheet));
        assert_eq!(sheet.delete_column(0), Err(EngineError::WouldEmptySheet));
    }

    #[test]
    fn test_insert_then_delete_row_restores_grid() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "a").unwrap();
        sheet.set_input(3, 2, "b").unwrap();
        let before = sheet.sheet().clone();

        sheet.insert_row(1).unwrap();
        sheet.delete_row(2).unwrap();

        assert_eq!(*sheet.sheet(), before);
    }

    #[test]
    fn test_structural_edit_updates_dependents() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "5").unwrap();
        sheet.set_input(1, 0, "10").unwrap();
        sheet.set_input(4, 0, "=SUM(A1:A3)").unwrap();
        assert_eq!(sheet.get(4, 0).value, CellValue::Number(15.0));

        // Cutting the inputs re-runs recalculation for the dependent
        sheet.set_selection(Selection::range((0, 0), (1, 0)));
        sheet.cut().unwrap();
        assert_eq!(sheet.get(4, 0).value, CellValue::Number(0.0));
    }

    #[test]
    fn test_unknown_function_lands_in_cell() {
        let mut sheet = Spreadsheet::new();
        sheet.set_input(0, 0, "=WAT(A2)").unwrap();
        assert_eq!(
            sheet.get(0, 0).value,
            CellValue::Error(CellError::Name("WAT".into()))
        );
    }

    #[test]
    fn test_row_height_and_col_width_overrides() {
        let mut sheet = Spreadsheet::new();
        sheet.set_row_height(3, 44.0).unwrap();
        sheet.set_col_width(2, 140.0).unwrap();
        assert_eq!(sheet.dims().row_heights.get(&3), Some(&44.0));
        assert_eq!(sheet.dims().col_widths.get(&2), Some(&140.0));
        assert!(sheet.set_row_height(DEFAULT_ROW_COUNT, 10.0).is_err());
    }

    #[test]
    fn test_selection_tracks_active_cell() {
        let mut sheet = Spreadsheet::new();
        sheet.set_selection(Selection::range((2, 2), (4, 4)));
        assert_eq!(sheet.active_cell(), Some((2, 2)));

        sheet.set_active_cell(7, 1);
        assert_eq!(sheet.active_cell(), Some((7, 1)));
        assert_eq!(sheet.selection().unwrap().start, (7, 1));
    }
}
