//! Error types for the harvesting pipeline.
//!
//! Errors are split along the boundaries where they are handled:
//! - [`ConfigError`]: fatal for the invocation (bad conference name)
//! - [`HandlerError`]: a listing could not be produced; that conference/year is skipped
//! - [`DownloadError`]: one item failed; it becomes a failed outcome and never propagates

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported conference '{0}'")]
    UnsupportedConference(String),
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed listing response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no {what} found on {url}")]
    MissingSection { what: &'static str, url: String },

    #[error("{conference} {year} is not available from this source")]
    UnsupportedYear { conference: String, year: u16 },
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty response body")]
    Empty,

    #[error("response is not a PDF (starts with {0:?})")]
    NotPdf(String),
}
