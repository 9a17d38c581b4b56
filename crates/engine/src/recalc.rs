//! Full-sheet recalculation.
//!
//! The pass is a full rescan, not a dependency-ordered recompute: every
//! formula-bearing cell is re-evaluated against the grid's current contents
//! in arbitrary visitation order. A formula that reads a forward dependency
//! may see that cell's pre-pass value, so chains of formulas settle across
//! repeated passes rather than within one.

use log::debug;

use crate::cell::CellValue;
use crate::formula::eval;
use crate::formula::functions::FunctionRegistry;
use crate::sheet::Sheet;

/// Report from one recalculation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecalcReport {
    /// Number of formula cells that were re-evaluated.
    pub cells_recomputed: usize,
    /// How many of those produced an error value.
    pub errors: usize,
}

impl RecalcReport {
    /// One-line log entry, e.g. `[recalc/full] 628 cells  errors=0`.
    pub fn log_line(&self) -> String {
        format!(
            "[recalc/full] {} cells  errors={}",
            self.cells_recomputed, self.errors
        )
    }
}

/// Re-evaluate every populated cell holding a `=`-prefixed formula and
/// overwrite its value in place.
///
/// Per-cell failures become that cell's value without aborting the rest of
/// the pass.
pub fn recalculate(sheet: &mut Sheet, registry: &FunctionRegistry) -> RecalcReport {
    let targets: Vec<(usize, usize)> = sheet
        .cells_iter()
        .filter_map(|(pos, cell)| match cell.formula.as_deref() {
            Some(f) if f.starts_with('=') => Some(pos),
            _ => None,
        })
        .collect();

    let mut report = RecalcReport::default();
    for (row, col) in targets {
        let Some(source) = sheet.cell(row, col).and_then(|c| c.formula.clone()) else {
            continue;
        };

        let value = eval::evaluate(&source[1..], &sheet.cells, registry);
        report.cells_recomputed += 1;
        if matches!(value, CellValue::Error(_)) {
            report.errors += 1;
        }

        if let Some(cell) = sheet.cells.get_mut(&row).and_then(|r| r.get_mut(&col)) {
            cell.value = value;
        }
    }

    debug!("{}", report.log_line());
    report
}
