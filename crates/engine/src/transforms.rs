//! Pure range transforms: find-and-replace and duplicate removal.
//!
//! Both operate on a grid value and hand back a new grid. They never touch
//! history and are independent of the live store; applying a result is the
//! caller's decision.

use regex::RegexBuilder;
use rustc_hash::FxHashSet;

use crate::cell::CellValue;
use crate::error::EngineError;
use crate::selection::Rect;
use crate::sheet::Grid;

/// Substitute every match of `find` (a regex pattern) inside each
/// text-valued cell of `rect`. Numeric, empty, and error-valued cells are
/// left untouched.
pub fn find_and_replace(
    grid: &Grid,
    rect: Rect,
    find: &str,
    replace: &str,
    match_case: bool,
) -> Result<Grid, EngineError> {
    let pattern = RegexBuilder::new(find)
        .case_insensitive(!match_case)
        .build()
        .map_err(|e| EngineError::Pattern(e.to_string()))?;

    let mut result = grid.clone();
    for row in rect.min_row..=rect.max_row {
        let Some(row_map) = result.get_mut(&row) else {
            continue;
        };
        for col in rect.min_col..=rect.max_col {
            let Some(cell) = row_map.get_mut(&col) else {
                continue;
            };
            if let CellValue::Text(text) = &cell.value {
                let replaced = pattern.replace_all(text, replace);
                if replaced != *text {
                    cell.value = CellValue::Text(replaced.into_owned());
                }
            }
        }
    }
    Ok(result)
}

/// Drop rows whose string-coerced values across the rect's column span
/// duplicate an earlier row's. The first occurrence in row order is kept;
/// rows below a removed duplicate shift up within the rect's row span.
pub fn remove_duplicates(grid: &Grid, rect: Rect) -> Grid {
    let mut result = grid.clone();

    // Key each populated row by its column-span values; rows with no
    // entries never participate.
    let mut seen = FxHashSet::default();
    let mut duplicates = Vec::new();
    for row in rect.min_row..=rect.max_row {
        let Some(row_map) = result.get(&row) else {
            continue;
        };
        let key = (rect.min_col..=rect.max_col)
            .map(|col| {
                row_map
                    .get(&col)
                    .map(|cell| cell.value.to_text())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join("|");
        if !seen.insert(key) {
            duplicates.push(row);
        }
    }

    // Compact bottom-up so the remaining recorded indices stay valid
    let mut end_row = rect.max_row;
    for &row in duplicates.iter().rev() {
        for r in row..end_row {
            let next = result.get(&(r + 1)).filter(|m| !m.is_empty()).cloned();
            match next {
                Some(m) => {
                    result.insert(r, m);
                }
                None => {
                    result.remove(&r);
                }
            }
        }
        result.remove(&end_row);
        end_row -= 1;
    }

    result
}
