use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[http-equiv]").expect("static selector"));
static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^\s*\d*\s*[;,]?\s*url\s*=\s*['"]?([^'"]+)['"]?\s*$"#).unwrap());

/// Target of a `<meta http-equiv="refresh" content="N; url=...">` tag.
pub fn meta_refresh_redirect(_url: &str, body: &str) -> Option<String> {
    let document = Html::parse_document(body);

    document
        .select(&META_SELECTOR)
        .filter(|el| {
            el.value()
                .attr("http-equiv")
                .is_some_and(|v| v.eq_ignore_ascii_case("refresh"))
        })
        .filter_map(|el| el.value().attr("content"))
        .find_map(|content| {
            URL_REGEX
                .captures(content)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|target| !target.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_refresh_target() {
        let body = r#"<html><head><META HTTP-EQUIV="Refresh" CONTENT="5; URL='https://b.example/next'"></head></html>"#;
        assert_eq!(
            meta_refresh_redirect("https://a.example/", body).as_deref(),
            Some("https://b.example/next")
        );
    }

    #[test]
    fn ignores_refresh_without_url() {
        let body = r#"<meta http-equiv="refresh" content="30">"#;
        assert_eq!(meta_refresh_redirect("https://a.example/", body), None);
    }

    #[test]
    fn ignores_other_http_equiv() {
        let body = r#"<meta http-equiv="content-type" content="text/html; url=/nope">"#;
        assert_eq!(meta_refresh_redirect("https://a.example/", body), None);
    }
}
