//! Metadata-source plumbing for a game-library manager: a cookie-aware,
//! redirect-following web downloader, a paginated RAWG API client and the
//! helpers that map RAWG data onto library metadata.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod services;

pub use error::{Error, Result};
pub use infrastructure::{
    Cookie, CookieJar, DownloadStringOptions, DownloadStringResponse, RawgApiClient,
    WebDownloader, WriteOutcome,
};
