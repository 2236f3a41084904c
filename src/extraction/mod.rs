//! # Table Discovery
//!
//! Finds embedded UPD tables in a [`Grid`](crate::spreadsheet::Grid) and turns
//! them into canonical rows:
//!
//! 1. [`segmenter`] locates header rows and the data range below each of them.
//! 2. [`scanner`] scrapes seller and shipment metadata from free text on the sheet.
//! 3. [`extractor`] slices every segment into a [`Table`](crate::dataset::Table)
//!    restricted to the header vocabulary, with the metadata attached.
//! 4. [`canonicalizer`] derives the normalised identifier and reorders the
//!    columns to the canonical schema.
pub mod canonicalizer;
pub mod extractor;
pub mod scanner;
pub mod segmenter;

pub use canonicalizer::Canonicalizer;
pub use extractor::extract;
pub use scanner::{scan, MarkerMatch, MetadataResolver, Resolution, SheetMetadata};
pub use segmenter::{segment, TableSegment};

use thiserror::Error;

/// A segment that cannot be turned into a table. Only that segment is skipped.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Rows {start}..={end} are outside of the sheet ({height} rows)")]
    SegmentOutOfRange { start: usize, end: usize, height: usize },

    #[error("Header row {row} has no recognised column")]
    NoRecognizedColumns { row: usize },
}
