use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: StatusCode },
    #[error("Expected file, but found {0}")]
    ContentTypeMismatch(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("RAWG API key is not configured")]
    MissingApiKey,
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
