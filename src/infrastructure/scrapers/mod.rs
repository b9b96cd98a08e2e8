//! Ready-made extractors for [`WebDownloader::download_string`] targets that
//! redirect or set cookies from inside the page instead of through headers.
//!
//! [`WebDownloader::download_string`]: crate::infrastructure::WebDownloader::download_string

pub(crate) mod meta_refresh;
pub(crate) mod script;

pub use meta_refresh::meta_refresh_redirect;
pub use script::{script_cookies, script_location_redirect};

/// Meta refresh first, then script assignments to `window.location`.
pub fn content_redirect(url: &str, body: &str) -> Option<String> {
    meta_refresh_redirect(url, body).or_else(|| script_location_redirect(url, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_refresh_wins_over_script() {
        let body = r#"<html><head>
            <meta http-equiv="refresh" content="0; url=/meta">
            <script>window.location = "/script";</script>
        </head></html>"#;
        assert_eq!(
            content_redirect("https://a.example/", body).as_deref(),
            Some("/meta")
        );
    }

    #[test]
    fn plain_page_has_no_redirect() {
        assert_eq!(content_redirect("https://a.example/", "<p>hello</p>"), None);
    }
}
