//! Engine operation errors.
//!
//! Evaluation failures never show up here: they become in-cell error values
//! and recalculation carries on. These are the structural and argument
//! failures that reject an operation outright, leaving the sheet unchanged.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("row {0} is outside the sheet bounds")]
    RowOutOfBounds(usize),

    #[error("column {0} is outside the sheet bounds")]
    ColOutOfBounds(usize),

    #[error("cannot delete the only remaining row or column")]
    WouldEmptySheet,

    #[error("no selection")]
    NoSelection,

    #[error("no active cell")]
    NoActiveCell,

    #[error("clipboard is empty")]
    EmptyClipboard,

    #[error("invalid search pattern: {0}")]
    Pattern(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
