// Built-in spreadsheet functions and the registry that dispatches them.
//
// Every entry follows the same contract: raw argument strings plus the grid
// in, a single value out. Arguments are references ("A1"), ranges
// ("A1:B3"), or literals already stripped of their quotes by the evaluator.

use rustc_hash::FxHashMap;

use crate::cell::{CellError, CellValue};
use crate::refs;
use crate::selection::Rect;
use crate::sheet::Grid;

/// Contract for table entries.
pub type FunctionHandler = fn(&[String], &Grid) -> CellValue;

/// Mapping from uppercase function name to handler.
///
/// Pre-seeded with the built-ins; open for extension through [`register`]
/// as long as new entries keep the same contract.
///
/// [`register`]: FunctionRegistry::register
pub struct FunctionRegistry {
    entries: FxHashMap<String, FunctionHandler>,
}

impl FunctionRegistry {
    /// An empty registry with no entries at all.
    pub fn empty() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, name: &str, handler: FunctionHandler) {
        self.entries.insert(name.to_ascii_uppercase(), handler);
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<FunctionHandler> {
        self.entries.get(&name.to_ascii_uppercase()).copied()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        // Aggregation
        registry.register("SUM", sum);
        registry.register("AVERAGE", average);
        registry.register("MAX", max);
        registry.register("MIN", min);
        registry.register("COUNT", count);
        // Text
        registry.register("TRIM", trim);
        registry.register("UPPER", upper);
        registry.register("LOWER", lower);
        registry
    }
}

/// Resolve one raw argument into the cell values it denotes.
///
/// A `start:end` range collects the values of the populated cells inside
/// the normalized rectangle; corners that do not parse yield nothing. A
/// single reference yields the referenced cell's stored value (Empty when
/// the cell is absent), or the #REF! error value when it does not parse.
fn resolve_arg(arg: &str, grid: &Grid) -> Vec<CellValue> {
    if arg.contains(':') {
        let mut corners = arg.split(':');
        let start = corners.next().unwrap_or("");
        let end = corners.next().unwrap_or("");
        let (Some(a), Some(b)) = (refs::parse_reference(start), refs::parse_reference(end)) else {
            return Vec::new();
        };

        let rect = Rect::from_corners(a, b);
        let mut values = Vec::new();
        for row in rect.min_row..=rect.max_row {
            let Some(row_map) = grid.get(&row) else {
                continue;
            };
            for col in rect.min_col..=rect.max_col {
                if let Some(cell) = row_map.get(&col) {
                    values.push(cell.value.clone());
                }
            }
        }
        values
    } else {
        match refs::parse_reference(arg) {
            Some((row, col)) => {
                let value = grid
                    .get(&row)
                    .and_then(|r| r.get(&col))
                    .map(|c| c.value.clone())
                    .unwrap_or_default();
                vec![value]
            }
            None => vec![CellValue::Error(CellError::Ref)],
        }
    }
}

/// Every number-coercible value across all arguments, in argument order.
/// Non-coercible text, empty cells, and error values are silently skipped.
fn numeric_values(args: &[String], grid: &Grid) -> Vec<f64> {
    let mut numbers = Vec::new();
    for arg in args {
        for value in resolve_arg(arg, grid) {
            if let Some(n) = value.to_number() {
                numbers.push(n);
            }
        }
    }
    numbers
}

/// First resolved value of the first argument; a range collapses to its
/// first element.
fn first_value(args: &[String], grid: &Grid) -> CellValue {
    let Some(first) = args.first() else {
        return CellValue::Text(String::new());
    };
    resolve_arg(first, grid).into_iter().next().unwrap_or_default()
}

pub fn sum(args: &[String], grid: &Grid) -> CellValue {
    CellValue::Number(numeric_values(args, grid).iter().sum())
}

pub fn average(args: &[String], grid: &Grid) -> CellValue {
    let numbers = numeric_values(args, grid);
    if numbers.is_empty() {
        return CellValue::Number(0.0);
    }
    CellValue::Number(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

/// MAX over no qualifying values is 0 rather than an error, matching what
/// SUM and COUNT produce over empty input.
pub fn max(args: &[String], grid: &Grid) -> CellValue {
    let result = numeric_values(args, grid)
        .into_iter()
        .fold(None, |acc: Option<f64>, n| Some(acc.map_or(n, |m| m.max(n))));
    CellValue::Number(result.unwrap_or(0.0))
}

pub fn min(args: &[String], grid: &Grid) -> CellValue {
    let result = numeric_values(args, grid)
        .into_iter()
        .fold(None, |acc: Option<f64>, n| Some(acc.map_or(n, |m| m.min(n))));
    CellValue::Number(result.unwrap_or(0.0))
}

pub fn count(args: &[String], grid: &Grid) -> CellValue {
    CellValue::Number(numeric_values(args, grid).len() as f64)
}

pub fn trim(args: &[String], grid: &Grid) -> CellValue {
    CellValue::Text(first_value(args, grid).to_text().trim().to_string())
}

pub fn upper(args: &[String], grid: &Grid) -> CellValue {
    CellValue::Text(first_value(args, grid).to_text().to_uppercase())
}

pub fn lower(args: &[String], grid: &Grid) -> CellValue {
    CellValue::Text(first_value(args, grid).to_text().to_lowercase())
}
