//! Errors raised while fetching the CSV datasets.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error fetching {url}: status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{resource} is not valid UTF-8")]
    Encoding { resource: String },

    #[error("malformed CSV in {resource}: {source}")]
    Csv {
        resource: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid data source URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}
