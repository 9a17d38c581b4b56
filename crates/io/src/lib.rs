// Document I/O - the JSON persisted format

pub mod document;

pub use document::{load, save, IoError};
