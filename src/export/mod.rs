//! Spreadsheet export of the final dataset.
pub mod xlsx;

pub use xlsx::export_table;
