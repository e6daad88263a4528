use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a report run.
///
/// Every stage fails fast: the first error aborts the run and nothing is
/// written to the output path.
#[derive(Debug, Error)]
pub enum Error {
    /// The input file is missing, unreadable, or not well-formed.
    #[error("cannot read {}: {reason}", .path.display())]
    FileAccess { path: PathBuf, reason: String },

    /// The input file extension is not `.csv`, `.xlsx` or `.xls`.
    #[error("unsupported file format: {extension:?}")]
    UnsupportedFormat { extension: String },

    /// A mapped column is absent from the input header.
    #[error("needed column is absent in the file: '{column}'")]
    MissingColumn { column: String },

    #[error("cannot parse {value:?} as a date")]
    DateParse { value: String },

    /// `row` counts data rows from 1, not including the header.
    #[error("column '{column}', row {row}: {value:?} is not a number")]
    InvalidNumericValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("cannot write report to {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unexpected error: {0}")]
    Internal(String),
}

/// The category of an [`Error`], without its details.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    FileAccess,
    UnsupportedFormat,
    MissingColumn,
    DateParse,
    InvalidNumericValue,
    Write,
    Configuration,
    Internal,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileAccess { .. } => ErrorKind::FileAccess,
            Error::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Error::MissingColumn { .. } => ErrorKind::MissingColumn,
            Error::DateParse { .. } => ErrorKind::DateParse,
            Error::InvalidNumericValue { .. } => ErrorKind::InvalidNumericValue,
            Error::Write { .. } => ErrorKind::Write,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn file_access(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::FileAccess {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
