//! # Metalgen I/O
//!
//! Rule decks (JSON), GDS-II output, and layout JSON files.

pub mod deck;
pub mod gds;

use std::fs;
use std::path::Path;

use metalgen_core::Layout;
use thiserror::Error;

pub use deck::{Benchmark, DeckError, RuleDeck};
pub use gds::{write_gds, GdsError, GdsWriter};

#[derive(Error, Debug)]
pub enum LayoutFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed layout JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write a layout, its rules and candidate set included, as pretty JSON.
pub fn write_layout_json(layout: &Layout, path: &Path) -> Result<(), LayoutFileError> {
    fs::write(path, layout.to_json()?)?;
    log::debug!("{}: wrote layout JSON to {}", layout.name, path.display());
    Ok(())
}

/// Read a layout back. Its embedded rules are revalidated.
pub fn read_layout_json(path: &Path) -> Result<Layout, LayoutFileError> {
    let json = fs::read_to_string(path)?;
    Ok(Layout::from_json(&json)?)
}
