use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Errors raised while submitting or running a fetch
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid request header {name:?}")]
    InvalidHeader { name: String },

    #[error("Http request failed: {0}")]
    Connect(#[from] reqwest::Error),

    #[error("Server responded with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: Url },

    #[error("Cannot create destination {path:?}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Reading response body failed: {0}")]
    Read(#[source] io::Error),

    #[error("Writing destination file failed: {0}")]
    Write(#[source] io::Error),

    #[error("Fetch worker stopped unexpectedly: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
