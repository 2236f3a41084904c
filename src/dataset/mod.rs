//! # Tabular Data
//!
//! The [`Table`] model shared by extraction, accumulation and enrichment,
//! with its CSV codec, the persistent [`Accumulator`] and the reference joins.
pub mod accumulator;
pub mod column;
pub mod csv;
pub mod join;
pub mod reference;
pub mod table;

pub use accumulator::Accumulator;
pub use column::ColumnRef;
pub use table::Table;
