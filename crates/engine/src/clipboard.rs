//! Copy/cut/paste buffer.

use rustc_hash::FxHashMap;

use crate::selection::Selection;
use crate::sheet::Grid;

/// Which operation captured the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOp {
    Copy,
    Cut,
}

/// A captured sub-grid rebased to a (0, 0) origin.
///
/// Coordinates are offsets from the captured rectangle's top-left corner,
/// never absolute sheet coordinates. The buffer is dense: every position in
/// the rectangle is present, empty cells included, so a paste overwrites
/// the full target rectangle. Paste never consumes the buffer; it is only
/// replaced wholesale by the next copy or cut.
#[derive(Debug, Clone)]
pub struct ClipboardBuffer {
    pub cells: Grid,
    pub rows: usize,
    pub cols: usize,
    pub source: Selection,
    pub op: ClipOp,
}

impl ClipboardBuffer {
    /// Capture every cell of the selection's normalized rectangle.
    pub fn capture(grid: &Grid, selection: Selection, op: ClipOp) -> Self {
        let rect = selection.normalized();

        let mut cells = Grid::default();
        for row in rect.min_row..=rect.max_row {
            let mut row_map = FxHashMap::default();
            for col in rect.min_col..=rect.max_col {
                let cell = grid
                    .get(&row)
                    .and_then(|r| r.get(&col))
                    .cloned()
                    .unwrap_or_default();
                row_map.insert(col - rect.min_col, cell);
            }
            cells.insert(row - rect.min_row, row_map);
        }

        Self {
            cells,
            rows: rect.rows(),
            cols: rect.cols(),
            source: selection,
            op,
        }
    }
}
