use super::cookies::{Cookie, CookieJar};
use super::filename::file_name_for;
use crate::config::DownloaderSettings;
use crate::error::{Error, Result};
use futures_util::StreamExt;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE, LOCATION, REFERER,
    SET_COOKIE, USER_AGENT,
};
use reqwest::{redirect, Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, trace, warn};
use url::Url;

/// Size of the pieces a file download is written in. Cancellation and progress
/// are observed once per piece.
pub const CHUNK_SIZE: usize = 8192;

/// Finds a redirect target inside a response: `(current url, body) -> target`.
pub type RedirectUrlExtractor<'a> = dyn Fn(&str, &str) -> Option<String> + Send + Sync + 'a;
/// Finds cookies set by client-side script inside a response body.
pub type JsCookieExtractor<'a> = dyn Fn(&str) -> Vec<Cookie> + Send + Sync + 'a;
/// Receives `(bytes written so far, total bytes if known)`.
pub type ProgressCallback<'a> = dyn Fn(u64, Option<u64>) + Send + Sync + 'a;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadStringResponse {
    pub response_url: String,
    pub response_content: String,
    pub status_code: StatusCode,
}

/// Per-call knobs for [`WebDownloader::download_string`].
pub struct DownloadStringOptions<'a> {
    pub redirect_url_extractor: Option<&'a RedirectUrlExtractor<'a>>,
    pub js_cookie_extractor: Option<&'a JsCookieExtractor<'a>>,
    pub referer: Option<String>,
    pub custom_headers: Vec<(String, String)>,
    pub throw_on_error_status: bool,
}

impl Default for DownloadStringOptions<'_> {
    fn default() -> Self {
        Self {
            redirect_url_extractor: None,
            js_cookie_extractor: None,
            referer: None,
            custom_headers: Vec::new(),
            throw_on_error_status: true,
        }
    }
}

impl<'a> DownloadStringOptions<'a> {
    pub fn redirect_url_extractor(mut self, extractor: &'a RedirectUrlExtractor<'a>) -> Self {
        self.redirect_url_extractor = Some(extractor);
        self
    }

    pub fn js_cookie_extractor(mut self, extractor: &'a JsCookieExtractor<'a>) -> Self {
        self.js_cookie_extractor = Some(extractor);
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Treat 4xx/5xx responses like any other response instead of failing.
    pub fn allow_error_status(mut self) -> Self {
        self.throw_on_error_status = false;
        self
    }
}

/// A download session. Cookies from every response are kept and sent along
/// with later requests made through the same instance.
pub struct WebDownloader {
    client: Client,
    cookies: CookieJar,
    max_redirect_depth: u32,
    user_agent: Option<String>,
    accept: Option<String>,
}

impl WebDownloader {
    pub fn new(settings: &DownloaderSettings) -> Result<Self> {
        // Redirects are walked by hand so intermediate Set-Cookie headers survive.
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            cookies: CookieJar::new(),
            max_redirect_depth: settings.max_redirect_depth,
            user_agent: settings.user_agent.clone(),
            accept: settings.accept.clone(),
        })
    }

    pub fn max_redirect_depth(&self) -> u32 {
        self.max_redirect_depth
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    pub fn set_user_agent(&mut self, user_agent: Option<String>) {
        self.user_agent = user_agent;
    }

    pub fn set_accept(&mut self, accept: Option<String>) {
        self.accept = accept;
    }

    /// Downloads `url` as text, following 301/302 responses and any redirect the
    /// optional extractor finds in the body.
    ///
    /// At most `max_redirect_depth` redirects are followed: a chain of exactly
    /// that many hops succeeds, one more returns `Ok(None)`.
    pub async fn download_string(
        &mut self,
        url: &str,
        options: &DownloadStringOptions<'_>,
    ) -> Result<Option<DownloadStringResponse>> {
        let mut current = Url::parse(url)?;
        let mut referer = options.referer.clone();
        let mut depth: u32 = 0;

        loop {
            debug!(url = %current, depth, "Downloading string");
            let response = self
                .send(&current, referer.as_deref(), &options.custom_headers, true)
                .await?;

            let status = response.status();
            if is_error_status(status) && options.throw_on_error_status {
                return Err(Error::HttpStatus {
                    url: current.to_string(),
                    status,
                });
            }

            self.store_response_cookies(&response);
            let response_url = response.url().to_string();
            let location = redirect_location(&response, &current)?;
            let content = response.text().await?;
            trace!(url = %response_url, status = %status, "{content}");

            if let Some(extract) = options.js_cookie_extractor {
                self.cookies.merge(extract(&content), &current);
            }

            let target = match (location, options.redirect_url_extractor) {
                (Some(location), _) => Some(location),
                (None, Some(extract)) => extract(current.as_str(), &content)
                    .map(|target| current.join(target.trim()))
                    .transpose()?,
                (None, None) => None,
            };

            let Some(target) = target else {
                return Ok(Some(DownloadStringResponse {
                    response_url,
                    response_content: content,
                    status_code: status,
                }));
            };

            if depth >= self.max_redirect_depth {
                warn!(
                    url,
                    max_depth = self.max_redirect_depth,
                    "Redirect depth exceeded, giving up"
                );
                return Ok(None);
            }

            debug!(from = %current, to = %target, "Following redirect");
            referer = Some(current.to_string());
            current = target;
            depth += 1;
        }
    }

    /// Streams a file into `target_folder`.
    ///
    /// `cancel` is checked before every chunk is written; once set, the partial
    /// file is removed and `Ok(None)` is returned. The request itself cannot be
    /// interrupted.
    pub async fn download_file(
        &mut self,
        url: &str,
        target_folder: impl AsRef<Path>,
        cancel: &AtomicBool,
        progress: Option<&ProgressCallback<'_>>,
    ) -> Result<Option<PathBuf>> {
        let url = Url::parse(url)?;
        let response = self.send(&url, None, &[], false).await?;

        let status = response.status();
        if is_error_status(status) {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        self.store_response_cookies(&response);

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_file(&content_type) {
            return Err(Error::ContentTypeMismatch(content_type));
        }

        let target = target_folder
            .as_ref()
            .join(file_name_for(response.headers(), response.url()));
        let total = response.content_length();
        info!(url = %url, path = %target.display(), total, "Downloading file");

        let mut file = File::create(&target).await?;
        match stream_to_file(&mut file, response, cancel, progress, total).await {
            Ok(true) => {
                file.flush().await?;
                Ok(Some(target))
            }
            Ok(false) => {
                drop(file);
                tokio::fs::remove_file(&target).await?;
                info!(path = %target.display(), "Download cancelled, partial file removed");
                Ok(None)
            }
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(&target).await {
                    warn!(path = %target.display(), error = %remove_err, "Could not remove partial file");
                }
                Err(e)
            }
        }
    }

    async fn send(
        &self,
        url: &Url,
        referer: Option<&str>,
        custom_headers: &[(String, String)],
        send_accept: bool,
    ) -> Result<Response> {
        let mut request = self.client.get(url.clone());

        if let Some(user_agent) = &self.user_agent {
            request = request.header(USER_AGENT, user_agent);
        }
        if send_accept {
            if let Some(accept) = &self.accept {
                request = request.header(ACCEPT, accept);
            }
        }
        if let Some(cookies) = self.cookies.header_for(url) {
            request = request.header(COOKIE, cookies);
        }
        if let Some(referer) = referer.filter(|r| !r.is_empty()) {
            request = request.header(REFERER, referer);
        }
        if !custom_headers.is_empty() {
            request = request.headers(header_map(custom_headers)?);
        }

        Ok(request.send().await?)
    }

    fn store_response_cookies(&mut self, response: &Response) {
        for value in response.headers().get_all(SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                self.cookies.store_set_cookie(raw, response.url());
            }
        }
    }
}

fn is_error_status(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

fn is_file(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("application")
}

fn redirect_location(response: &Response, current: &Url) -> Result<Option<Url>> {
    if !matches!(
        response.status(),
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND
    ) {
        return Ok(None);
    }

    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|l| !l.is_empty());

    Ok(location.map(|l| current.join(l)).transpose()?)
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Returns `false` when the download was cancelled.
async fn stream_to_file(
    file: &mut File,
    response: Response,
    cancel: &AtomicBool,
    progress: Option<&ProgressCallback<'_>>,
    total: Option<u64>,
) -> Result<bool> {
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for piece in chunk.chunks(CHUNK_SIZE) {
            if cancel.load(Ordering::SeqCst) {
                return Ok(false);
            }

            file.write_all(piece).await?;
            written += piece.len() as u64;

            if let Some(report) = progress {
                report(written, total);
            }
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_content_types() {
        assert!(is_file("application/octet-stream"));
        assert!(is_file("Application/zip; charset=binary"));
        assert!(!is_file("text/html; charset=utf-8"));
        assert!(!is_file(""));
    }

    #[test]
    fn invalid_custom_header_is_rejected() {
        let headers = vec![("bad header".to_string(), "v".to_string())];
        assert!(matches!(header_map(&headers), Err(Error::InvalidHeader(_))));

        let ok = vec![("X-Requested-With".to_string(), "XMLHttpRequest".to_string())];
        assert_eq!(header_map(&ok).unwrap().len(), 1);
    }

    #[test]
    fn default_options_fail_on_error_status() {
        let options = DownloadStringOptions::default();
        assert!(options.throw_on_error_status);
        assert!(!options.allow_error_status().throw_on_error_status);
    }
}
