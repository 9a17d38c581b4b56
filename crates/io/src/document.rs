// JSON document format: { grid, dimensions }
//
// The grid serializes as a mapping from row index to a mapping from column
// index to cell (serde_json writes the integer keys as strings); dimensions
// carry the logical counts and the presentational size overrides. Formula
// results are not re-derivable from stored values alone, so loading always
// ends with a full recalculation pass.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tabulon_engine::sheet::{Dimensions, Grid, Sheet};
use tabulon_engine::spreadsheet::Spreadsheet;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed document: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    grid: &'a Grid,
    dimensions: &'a Dimensions,
}

#[derive(Deserialize)]
struct Document {
    grid: Grid,
    dimensions: Dimensions,
}

/// Write the sheet as a pretty-printed JSON document.
pub fn save(sheet: &Sheet, path: &Path) -> Result<(), IoError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    let doc = DocumentRef {
        grid: &sheet.cells,
        dimensions: &sheet.dims,
    };
    serde_json::to_writer_pretty(writer, &doc)?;

    Ok(())
}

/// Load a document into a ready spreadsheet. The wrapping constructor runs
/// the post-load recalculation pass.
pub fn load(path: &Path) -> Result<Spreadsheet, IoError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let doc: Document = serde_json::from_reader(reader)?;
    let sheet = Sheet {
        cells: doc.grid,
        dims: doc.dimensions,
    };

    Ok(Spreadsheet::with_sheet(sheet))
}
