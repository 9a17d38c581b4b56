// Formula evaluator - resolves formula text (leading '=' already stripped)
// into a value. Tried in order: function call, cell reference, literal.

use crate::cell::{CellError, CellValue};
use crate::refs;
use crate::sheet::Grid;

use super::functions::FunctionRegistry;

/// Evaluate formula text against the grid's current contents.
///
/// Never raises to the caller: every failure mode becomes an in-cell error
/// value. Dependencies are read as already-stored values, never evaluated
/// recursively, so a chain of formulas settles only across repeated
/// recalculation passes.
pub fn evaluate(src: &str, grid: &Grid, registry: &FunctionRegistry) -> CellValue {
    // Function call: NAME(ARGLIST)
    if let Some((name, args_text)) = match_call(src) {
        let name = name.to_ascii_uppercase();
        let args = split_args(args_text);
        return match registry.get(&name) {
            Some(handler) => handler(&args, grid),
            None => CellValue::Error(CellError::Name(name)),
        };
    }

    // Bare cell reference
    if let Some((row, col)) = refs::parse_reference(src) {
        return grid
            .get(&row)
            .and_then(|r| r.get(&col))
            .map(|c| c.value.clone())
            .unwrap_or_default();
    }

    // Literal: a full numeric parse wins, otherwise the text unchanged
    if let Ok(num) = src.trim().parse::<f64>() {
        return CellValue::Number(num);
    }
    CellValue::Text(src.to_string())
}

/// Match `NAME(ARGLIST)`: NAME is `[A-Za-z_][A-Za-z_0-9]*`, the opening
/// parenthesis must immediately follow it, and the closing parenthesis must
/// be the final character. Returns the name and the raw argument list text.
fn match_call(src: &str) -> Option<(&str, &str)> {
    let bytes = src.as_bytes();
    let first = *bytes.first()?;
    if !first.is_ascii_alphabetic() && first != b'_' {
        return None;
    }

    let name_end = bytes
        .iter()
        .position(|&b| !b.is_ascii_alphanumeric() && b != b'_')
        .unwrap_or(bytes.len());
    if bytes.get(name_end) != Some(&b'(') || bytes.last() != Some(&b')') {
        return None;
    }

    Some((&src[..name_end], &src[name_end + 1..src.len() - 1]))
}

/// Split an argument list on commas that sit outside double-quoted
/// segments. A quote toggles the in-string state unless immediately
/// preceded by a backslash; the backslash itself stays in the argument
/// text. Arguments are whitespace-trimmed, and a surrounding matching pair
/// of double quotes is stripped to yield a string literal.
fn split_args(text: &str) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut inside_quotes = false;
    let mut prev = '\0';

    for c in text.chars() {
        if c == '"' && prev != '\\' {
            inside_quotes = !inside_quotes;
            current.push(c);
        } else if c == ',' && !inside_quotes {
            args.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
        prev = c;
    }
    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }

    args.into_iter()
        .map(|arg| {
            if arg.len() >= 2 && arg.starts_with('"') && arg.ends_with('"') {
                arg[1..arg.len() - 1].to_string()
            } else {
                arg
            }
        })
        .collect()
}
