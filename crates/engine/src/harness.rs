//! Test helpers for building populated grids and sheets.

use crate::cell::Cell;
use crate::sheet::{Grid, Sheet};

/// Build a grid from rows of raw editor inputs anchored at (0, 0).
/// Empty strings leave the position unpopulated.
pub fn grid_from_rows(rows: &[&[&str]]) -> Grid {
    let mut grid = Grid::default();
    for (row, inputs) in rows.iter().enumerate() {
        for (col, input) in inputs.iter().enumerate() {
            let cell = Cell::from_input(input);
            if !cell.is_empty() {
                grid.entry(row).or_default().insert(col, cell);
            }
        }
    }
    grid
}

/// Build a sheet with default dimensions around [`grid_from_rows`].
/// Formula cells are written but not evaluated; run a recalculation pass
/// (or wrap in a `Spreadsheet`) to fill their values.
pub fn sheet_from_rows(rows: &[&[&str]]) -> Sheet {
    Sheet {
        cells: grid_from_rows(rows),
        dims: Default::default(),
    }
}
