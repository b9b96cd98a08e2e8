use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use tracing::debug;
use url::Url;

const FALLBACK_NAME: &str = "download";

/// Picks the name for a downloaded file: `Content-Disposition` first, then the
/// last segment of the response URL.
pub(crate) fn file_name_for(headers: &HeaderMap, response_url: &Url) -> String {
    let from_header = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_disposition);

    if let Some(name) = from_header {
        return sanitize_file_name(&name);
    }

    let segment = response_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty());

    match segment {
        Some(last) => {
            let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
                debug!(segment = %last, error = %e, "Could not decode URL segment");
                last.into()
            });
            sanitize_file_name(&decoded)
        }
        None => FALLBACK_NAME.to_string(),
    }
}

/// Extracts the file name from a `Content-Disposition` value.
///
/// `filename*=` (RFC 5987, percent-encoded) wins over plain `filename=`.
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    let params = split_params(header)
        .into_iter()
        .skip(1)
        .filter_map(|p| p.split_once('='));

    let mut plain = None;
    for (key, value) in params {
        let value = unquote(value.trim());
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                if let Some((_, encoded)) = value.split_once("''") {
                    if let Ok(decoded) = urlencoding::decode(encoded) {
                        if !decoded.is_empty() {
                            return Some(decoded.into_owned());
                        }
                    }
                }
            }
            "filename" if !value.is_empty() => plain = Some(value),
            _ => {}
        }
    }

    plain
}

/// Splits on `;` outside quoted strings.
fn split_params(header: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in header.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&header[start..]);
    params
}

/// Strips surrounding quotes and resolves `\x` escapes of a quoted string.
fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

/// Makes a name safe to join onto a target folder.
pub(crate) fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn content_disposition_quoted_and_unquoted() {
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="setup.exe""#),
            Some("setup.exe".to_string())
        );
        assert_eq!(
            parse_content_disposition("attachment; filename=setup.exe; size=10"),
            Some("setup.exe".to_string())
        );
    }

    #[test]
    fn content_disposition_prefers_extended_name() {
        let header = r#"attachment; filename="fallback.zip"; filename*=UTF-8''game%20v1.zip"#;
        assert_eq!(
            parse_content_disposition(header),
            Some("game v1.zip".to_string())
        );
    }

    #[test]
    fn content_disposition_keeps_separators_inside_quotes() {
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="a;b.zip"; size=3"#),
            Some("a;b.zip".to_string())
        );
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="say \"hi\".txt""#),
            Some(r#"say "hi".txt"#.to_string())
        );
    }

    #[test]
    fn content_disposition_without_name() {
        assert_eq!(parse_content_disposition("attachment"), None);
        assert_eq!(parse_content_disposition("inline; filename="), None);
    }

    #[test]
    fn file_name_falls_back_to_url_segment() {
        let url = Url::parse("https://cdn.example.com/files/My%20Game.zip?sig=1").unwrap();
        assert_eq!(file_name_for(&HeaderMap::new(), &url), "My Game.zip");

        let root = Url::parse("https://cdn.example.com/").unwrap();
        assert_eq!(file_name_for(&HeaderMap::new(), &root), "download");
    }

    #[test]
    fn file_name_from_header_is_sanitized() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static(r#"attachment; filename="../../etc/passwd""#),
        );
        let url = Url::parse("https://cdn.example.com/x.bin").unwrap();
        assert_eq!(file_name_for(&headers, &url), ".._.._etc_passwd");
    }

    #[test]
    fn dot_only_names_are_replaced() {
        assert_eq!(sanitize_file_name(".."), "download");
        assert_eq!(sanitize_file_name("  "), "download");
    }
}
