//! # UPD Merge
//!
//! Finds UPD line-item tables embedded in spreadsheets of unknown layout,
//! normalises them to one canonical column schema and merges them into a
//! single dataset, optionally enriched from reference files.
//!
//! ## Features
//!
//! - **Multi-format input**: Excel (`.xls`, `.xlsx`, `.xlsm`, `.xlsb`, `.xla`, `.xlam`)
//!   and OpenDocument (`.ods`) workbooks, every sheet scanned
//! - **Table discovery**: header rows are recognised by a label signature, tables
//!   end at the next header or the first blank row
//! - **Metadata scraping**: seller, tax id and shipment document are read from
//!   free text on the sheet, with strict, loose and override markers
//! - **Canonical output**: every row carries the same columns in the same order,
//!   with a normalised document identifier
//! - **Enrichment**: dictionary lookup, placeholder replacement and left joins
//!   against CSV or spreadsheet reference files
//! - **Resumable output**: the CSV is rewritten atomically after every table and
//!   picked up again by the next run
//!
//! ## Usage
//!
//! ```no_run
//! use upd_merge::config::Config;
//! use upd_merge::pipeline::Pipeline;
//!
//! let config = Config::load(None)?;
//! let summary = Pipeline::new(&config)?.run()?;
//! println!("{}", summary);
//! # Ok::<(), upd_merge::error::UpdError>(())
//! ```
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod extraction;
pub mod logging;
pub mod pipeline;
pub mod spreadsheet;

mod helpers;
