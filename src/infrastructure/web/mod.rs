mod cookies;
mod downloader;
mod filename;

pub use cookies::{Cookie, CookieJar};
pub use downloader::{
    DownloadStringOptions, DownloadStringResponse, JsCookieExtractor, ProgressCallback,
    RedirectUrlExtractor, WebDownloader, CHUNK_SIZE,
};
