// src/error.rs
use thiserror::Error;

/// Failures of the HTTP seam itself (connect, timeout, body read).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError(e.to_string())
    }
}

/// Errors raised while discovering and resolving archive links.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("month {month} / year {year} out of range (month 1-12, year 21-23)")]
    InvalidRange { month: u32, year: u32 },

    #[error("no data is published for {month:02}/{year}")]
    NoDataForPeriod { month: u32, year: u32 },

    #[error("no archive link resolved for {month:02}/{year}")]
    NotFound { month: u32, year: u32 },

    #[error("index page {url} unavailable: {reason}")]
    UpstreamUnavailable { url: String, reason: String },
}

/// Errors raised while downloading an archive and extracting its CSV payload.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("{archive} is not a valid ZIP archive")]
    CorruptArchive {
        archive: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("no CSV file found in {archive}")]
    PayloadMissing { archive: String },

    #[error("CSV payload of {archive} is empty")]
    EmptyPayload { archive: String },
}

/// Errors raised while turning CSV text into a [`crate::UsageTable`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("CSV parse error at record {record}: {reason}")]
    Parse { record: u64, reason: String },

    #[error("expected column `{column}` is missing")]
    Schema { column: String },

    #[error("CSV payload contains no rows")]
    EmptyPayload,

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Errors raised while building a [`crate::BiciMad`] dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl From<LinkError> for DatasetError {
    fn from(e: LinkError) -> Self {
        DatasetError::Fetch(FetchError::Link(e))
    }
}
