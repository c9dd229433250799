//! The module contains the errors the engine can report.
//!
//! - [`FilterError`] is returned to the UI boundary when a selection cannot be
//!   committed.
//! - [`FetchError`] is recorded on a [`DataCollectionStore`] when its source
//!   fails. It never propagates past the store.
//!
//!  [`DataCollectionStore`]: crate::DataCollectionStore
use chrono::NaiveDate;
use thiserror::Error;

/// Rejected filter mutations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("custom range needs both a start and an end date")]
    IncompleteRange,
    #[error("custom range starts after it ends ({from} > {to})")]
    InvertedRange { from: NaiveDate, to: NaiveDate },
    #[error("invalid date \"{0}\", expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("unknown filter label \"{0}\"")]
    UnknownLabel(String),
}

/// Transport failures as seen by a data collection.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("access denied")]
    Forbidden,
    #[error("resource not found")]
    NotFound,
    #[error("server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("server unreachable: {0}")]
    Network(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
}
