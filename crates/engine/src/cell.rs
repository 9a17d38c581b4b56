use serde::{Deserialize, Serialize};

/// In-cell evaluation error codes.
///
/// Evaluation failures are values, not exceptions: they land in the cell
/// that computed them and the rest of the recalculation pass continues.
#[derive(Debug, Clone, PartialEq)]
pub enum CellError {
    /// A reference that could not be parsed.
    Ref,
    /// Unknown function name, carrying the offending (uppercased) name.
    Name(String),
    /// Any other evaluation failure.
    Eval,
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellError::Ref => write!(f, "#REF!"),
            CellError::Name(name) => write!(f, "#NAME? (Unknown function: {})", name),
            CellError::Eval => write!(f, "#ERROR!"),
        }
    }
}

/// A cell's authored or computed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Error(CellError),
}

impl CellValue {
    /// Numeric view of the value: numbers pass through, text qualifies if it
    /// parses fully as a decimal number after trimming. Everything else
    /// (empty cells, errors, non-numeric text) yields `None`.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// User-visible text of the value. Whole numbers print without a
    /// fractional part.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Error(e) => e.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// Persisted scalar shape of a value: null, number, or string.
/// Error values round-trip through their display text; the recalculation
/// pass after load regenerates them for formula cells.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Null,
    Number(f64),
    Text(String),
}

impl Serialize for CellValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_unit(),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Error(e) => serializer.serialize_str(&e.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawValue::deserialize(deserializer)? {
            RawValue::Null => CellValue::Empty,
            RawValue::Number(n) => CellValue::Number(n),
            RawValue::Text(s) => CellValue::Text(s),
        })
    }
}

/// Horizontal text alignment. Carried for the renderer, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Presentational cell attributes.
///
/// The engine carries these verbatim through every mutation and never reads
/// them; only the fields a patch actually sets are overlaid on merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CellStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
}

impl CellStyle {
    /// Overlay the set fields of `patch` onto this style.
    pub fn merge(&mut self, patch: &CellStyle) {
        if patch.bold.is_some() {
            self.bold = patch.bold;
        }
        if patch.italic.is_some() {
            self.italic = patch.italic;
        }
        if patch.font_size.is_some() {
            self.font_size = patch.font_size;
        }
        if patch.color.is_some() {
            self.color = patch.color.clone();
        }
        if patch.background_color.is_some() {
            self.background_color = patch.background_color.clone();
        }
        if patch.text_align.is_some() {
            self.text_align = patch.text_align;
        }
    }
}

/// One addressable slot: a value, optional formula source, optional style.
///
/// A cell that carries a formula holds the evaluator's result as of the most
/// recent recalculation pass that covered it; formula text is stored as
/// authored, leading `=` included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify raw editor input: `=...` becomes a formula cell (its value
    /// is filled in by the next recalculation pass), a full numeric parse
    /// becomes a number, anything else is text.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Cell::default();
        }

        if trimmed.starts_with('=') {
            return Cell {
                value: CellValue::Empty,
                formula: Some(trimmed.to_string()),
                style: None,
            };
        }

        if let Ok(num) = trimmed.parse::<f64>() {
            return Cell {
                value: CellValue::Number(num),
                formula: None,
                style: None,
            };
        }

        Cell {
            value: CellValue::Text(trimmed.to_string()),
            formula: None,
            style: None,
        }
    }

    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// True when the cell carries no content at all and can be dropped from
    /// the sparse store.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.formula.is_none() && self.style.is_none()
    }
}
