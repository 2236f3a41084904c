//! # Sheet Loader
//!
//! Opens a workbook in any of the supported container formats and renders
//! every worksheet as a [`Grid`]. Legacy binary (.xls) and zipped XML (.xlsx)
//! files both end up as the same abstraction, so nothing downstream needs to
//! know which format a document came in.
pub(crate) mod cell;
pub mod grid;

pub use grid::Grid;

use calamine::{open_workbook, Ods, OdsError, Reader, Xls, XlsError, Xlsb, XlsbError, Xlsx, XlsxError};
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Custom error types for spreadsheet operations.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Error in Excel 2007+ format (.xlsx, .xlsm, .xlam)
    #[error("Invalid xlsx file format: {0}")]
    InvalidXlsxFileFormat(#[from] XlsxError),

    /// Error in Excel Binary format (.xlsb)
    #[error("Invalid xlsb file format: {0}")]
    InvalidXlsbFileFormat(#[from] XlsbError),

    /// Error in legacy Excel format (.xls, .xla)
    #[error("Invalid xls file format: {0}")]
    InvalidXlsFileFormat(#[from] XlsError),

    /// Error in OpenDocument format (.ods)
    #[error("Invalid ods file format: {0}")]
    InvalidOdsFileFormat(#[from] OdsError),

    /// Unsupported or unrecognized file format
    #[error("Cannot detect file format for '{name}'")]
    InvalidFileFormat { name: String },

    /// Requested sheet not found or spreadsheet is empty
    #[error("Sheet '{name}' not found in '{file}'")]
    SheetNotFound { file: String, name: String },
}

/// Type alias for buffered file reader
pub type FileReader = BufReader<File>;

/// Wrapper enum for different spreadsheet format readers.
pub enum Spreadsheet {
    /// Excel 2007+ format reader (.xlsx, .xlsm, .xlam)
    Xlsx(Xlsx<FileReader>),
    /// Excel Binary format reader (.xlsb)
    Xlsb(Xlsb<FileReader>),
    /// Legacy Excel format reader (.xls, .xla)
    Xls(Xls<FileReader>),
    /// OpenDocument format reader (.ods)
    Ods(Ods<FileReader>),
}

/// Returns true if the path has an extension the loader can open.
pub fn is_supported(path: &Path) -> bool {
    matches!(
        extension(path).as_deref(),
        Some("xlsx" | "xlsm" | "xlam" | "xlsb" | "xls" | "xla" | "ods")
    )
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
}

impl Spreadsheet {
    /// Opens a spreadsheet file and returns the appropriate reader.
    ///
    /// The format is detected from the file extension (case-insensitive).
    pub fn open<P>(path: P) -> Result<Spreadsheet, SpreadsheetError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        match extension(path).as_deref() {
            Some("xlsx" | "xlsm" | "xlam") => Ok(Self::Xlsx(open_workbook(path)?)),
            Some("xlsb") => Ok(Self::Xlsb(open_workbook(path)?)),
            Some("xls" | "xla") => Ok(Self::Xls(open_workbook(path)?)),
            Some("ods") => Ok(Self::Ods(open_workbook(path)?)),
            _ => Err(SpreadsheetError::InvalidFileFormat {
                name: path.to_string_lossy().to_string(),
            }),
        }
    }

    /// Returns the names of all sheets in the spreadsheet.
    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            Self::Xlsx(xlsx) => xlsx.sheet_names(),
            Self::Xlsb(xlsb) => xlsb.sheet_names(),
            Self::Xls(xls) => xls.sheet_names(),
            Self::Ods(ods) => ods.sheet_names(),
        }
    }

    /// Reads one sheet into a grid.
    pub fn open_sheet(&mut self, source: &str, sheet_name: &str) -> Result<Grid, SpreadsheetError> {
        let range = match self {
            Self::Xlsx(xlsx) => xlsx.worksheet_range(sheet_name)?,
            Self::Xlsb(xlsb) => xlsb.worksheet_range(sheet_name)?,
            Self::Xls(xls) => xls.worksheet_range(sheet_name)?,
            Self::Ods(ods) => ods.worksheet_range(sheet_name)?,
        };
        Ok(Grid::from_range(source, sheet_name, &range))
    }

    /// Reads the named sheet, or the first one when no name is given.
    pub fn open_sheet_or_first(
        &mut self,
        source: &str,
        sheet_name: Option<&str>,
    ) -> Result<Grid, SpreadsheetError> {
        let name = match sheet_name {
            Some(name) => name.to_owned(),
            None => self.sheet_names().into_iter().next().ok_or_else(|| {
                SpreadsheetError::SheetNotFound {
                    file: source.to_owned(),
                    name: "#1".to_owned(),
                }
            })?,
        };
        if !self.sheet_names().contains(&name) {
            return Err(SpreadsheetError::SheetNotFound {
                file: source.to_owned(),
                name,
            });
        }
        self.open_sheet(source, &name)
    }
}

/// Loads every sheet of a workbook, in workbook order.
pub fn load_grids(path: &Path) -> Result<Vec<Grid>, SpreadsheetError> {
    let source = path.to_string_lossy().to_string();
    let mut spreadsheet = Spreadsheet::open(path)?;
    let mut grids = Vec::new();
    for name in spreadsheet.sheet_names() {
        let grid = spreadsheet.open_sheet(&source, &name)?;
        debug!("Loaded sheet '{}' of '{}': {} x {}", name, source, grid.height(), grid.width());
        grids.push(grid);
    }
    Ok(grids)
}
