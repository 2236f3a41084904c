use thiserror::Error;

/// Main error type for the UPD merge pipeline.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum UpdError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    GlobError(#[from] glob::GlobError),

    // Third-party library errors
    #[error("{0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    RegexError(#[from] regex::Error),

    // Internal module errors
    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    ExtractionError(#[from] crate::extraction::ExtractionError),

    #[error("{0}")]
    JoinError(#[from] crate::dataset::join::JoinError),
}

impl UpdError {
    /// Whether the error is a setup problem that must stop the whole run
    /// rather than skip a single file or table.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::ConfigError(_) | Self::JoinError(_) | Self::RegexError(_) => true,
            Self::WithContextError(_)
            | Self::IoError(_)
            | Self::PatternError(_)
            | Self::GlobError(_)
            | Self::CsvError(_)
            | Self::ZipError(_)
            | Self::XmlError(_)
            | Self::SpreadsheetError(_)
            | Self::ExtractionError(_) => false,
        }
    }
}

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, UpdError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| {
            if e.is_fatal() {
                e
            } else {
                UpdError::WithContextError(format!("{}: {}", message, e))
            }
        })
    }
}
