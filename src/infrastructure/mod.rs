mod clients;
pub mod scrapers;
pub mod web;

pub use clients::rawg::{RawgApiClient, WriteOutcome, DEFAULT_MAX_PAGES, RAWG_API_BASE};
pub use web::{
    Cookie, CookieJar, DownloadStringOptions, DownloadStringResponse, WebDownloader,
};
