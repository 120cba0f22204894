use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source file not found: {0:?}")]
    SourceMissing(PathBuf),
    #[error("workbook error: {0}")]
    Workbook(String),
    #[error("sheet {sheet:?} could not be read: {reason}")]
    InvalidSheet { sheet: String, reason: String },
    #[error("no eligible sheet with rows in {0:?}")]
    EmptyCorpus(PathBuf),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures a single search request can report back to its caller.
///
/// None of these touch the published record set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("records are still loading, try again shortly")]
    NotReady,
    #[error("search term is empty")]
    EmptyTerm,
    #[error("'{0}' is not a column of the ledger")]
    UnknownField(String),
}
