use crate::infrastructure::web::Cookie;
use once_cell::sync::Lazy;
use regex::Regex;

static LOCATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:window\.|document\.|top\.)?location(?:\.href)?\s*=\s*['"]([^'"]+)['"]|location\.(?:replace|assign)\(\s*['"]([^'"]+)['"]\s*\)"#,
    )
    .unwrap()
});

static COOKIE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"document\.cookie\s*=\s*['"]([^'"]+)['"]"#).unwrap());

/// Target of the first `location = "..."`, `location.href = "..."` or
/// `location.replace("...")` in the page.
pub fn script_location_redirect(_url: &str, body: &str) -> Option<String> {
    LOCATION_REGEX.captures(body).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    })
}

/// Cookies assigned through `document.cookie = "name=value; path=/..."`.
///
/// Domain is left empty unless the assignment names one; the downloader scopes
/// such cookies to the page's host.
pub fn script_cookies(body: &str) -> Vec<Cookie> {
    COOKIE_REGEX
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| parse_assignment(m.as_str()))
        .collect()
}

fn parse_assignment(assignment: &str) -> Option<Cookie> {
    let mut parts = assignment.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie::new(name, value.trim(), "", "");
    for attribute in parts {
        if let Some((key, val)) = attribute.split_once('=') {
            match key.trim().to_ascii_lowercase().as_str() {
                "domain" => cookie.domain = val.trim().trim_start_matches('.').to_string(),
                "path" => cookie.path = val.trim().to_string(),
                _ => {}
            }
        }
    }
    Some(cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_location_assignments() {
        let body = r#"<script>setTimeout(function(){ window.location.href = "/checked"; }, 0);</script>"#;
        assert_eq!(
            script_location_redirect("https://a.example/", body).as_deref(),
            Some("/checked")
        );

        let replace = r#"<script>location.replace('https://b.example/')</script>"#;
        assert_eq!(
            script_location_redirect("https://a.example/", replace).as_deref(),
            Some("https://b.example/")
        );
    }

    #[test]
    fn collects_cookie_assignments() {
        let body = r#"<script>
            document.cookie = "age_check=1; path=/";
            document.cookie = 'lang=en; domain=.store.example; path=/games';
        </script>"#;

        let cookies = script_cookies(body);
        assert_eq!(
            cookies,
            vec![
                Cookie::new("age_check", "1", "", "/"),
                Cookie::new("lang", "en", "store.example", "/games"),
            ]
        );
    }

    #[test]
    fn no_cookies_in_plain_page() {
        assert!(script_cookies("<p>document.cookie</p>").is_empty());
    }
}
