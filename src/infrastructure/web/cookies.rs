use cookie_store::CookieStore;
use tracing::debug;
use url::Url;

type RawCookie<'c> = cookie::Cookie<'c>;

/// A single HTTP cookie. Two cookies are the same cookie when name, domain and
/// path all match; the value is just the payload.
///
/// An empty domain or path means "not specified": the cookie is scoped to the
/// host and default path of the URL it is stored for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl Cookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
        }
    }

    fn to_raw(&self) -> RawCookie<'static> {
        let mut raw = RawCookie::new(self.name.clone(), self.value.clone());
        if !self.domain.is_empty() {
            raw.set_domain(self.domain.clone());
        }
        if !self.path.is_empty() {
            raw.set_path(self.path.clone());
        }
        raw
    }
}

impl From<&cookie_store::Cookie<'_>> for Cookie {
    fn from(stored: &cookie_store::Cookie<'_>) -> Self {
        Cookie::new(
            stored.name(),
            stored.value(),
            String::from(&stored.domain),
            String::from(&stored.path),
        )
    }
}

/// Cookies accumulated over the lifetime of a download session.
///
/// Storage follows RFC 6265: a `Domain` that does not cover the responding
/// host is rejected, and cookies past `Max-Age`/`Expires` are dropped.
#[derive(Debug, Default)]
pub struct CookieJar {
    store: CookieStore,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a `Set-Cookie` header value received from `origin`. Returns
    /// `false` when the header is malformed or the cookie is rejected.
    pub fn store_set_cookie(&mut self, header: &str, origin: &Url) -> bool {
        match RawCookie::parse(header) {
            Ok(raw) => self.insert_raw(&raw, origin),
            Err(e) => {
                debug!(header, error = %e, "Ignoring malformed Set-Cookie");
                false
            }
        }
    }

    /// Adds a cookie as if `origin` had set it, replacing the value of an
    /// existing cookie with the same identity.
    pub fn insert(&mut self, cookie: Cookie, origin: &Url) -> bool {
        self.insert_raw(&cookie.to_raw(), origin)
    }

    pub fn merge(&mut self, cookies: impl IntoIterator<Item = Cookie>, origin: &Url) {
        for cookie in cookies {
            self.insert(cookie, origin);
        }
    }

    fn insert_raw(&mut self, raw: &RawCookie<'_>, origin: &Url) -> bool {
        match self.store.insert_raw(raw, origin) {
            Ok(_) => true,
            Err(e) => {
                debug!(name = raw.name(), origin = %origin, error = %e, "Cookie rejected");
                false
            }
        }
    }

    pub fn get(&self, name: &str, domain: &str, path: &str) -> Option<Cookie> {
        self.store.get(domain, path, name).map(Cookie::from)
    }

    /// First cookie with the given name, regardless of domain and path.
    pub fn find(&self, name: &str) -> Option<Cookie> {
        self.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = Cookie> + '_ {
        self.store.iter_unexpired().map(Cookie::from)
    }

    pub fn len(&self) -> usize {
        self.store.iter_unexpired().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value for a `Cookie` request header targeting `url`, if any cookie applies.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let pairs: Vec<String> = self
            .store
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn sorted_pairs(header: Option<String>) -> Vec<String> {
        let mut pairs: Vec<String> = header
            .unwrap_or_default()
            .split("; ")
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn set_cookie_defaults_to_origin() {
        let mut jar = CookieJar::new();
        assert!(jar.store_set_cookie("s=1; HttpOnly", &url("http://a.example/x")));
        assert_eq!(
            jar.get("s", "a.example", "/"),
            Some(Cookie::new("s", "1", "a.example", "/"))
        );

        assert!(jar.store_set_cookie("sid=abc", &url("https://shop.example.com/account/login")));
        let nested = jar.find("sid").unwrap();
        assert_eq!(nested.domain, "shop.example.com");
        assert_eq!(nested.path, "/account");
    }

    #[test]
    fn set_cookie_reads_domain_and_path() {
        let mut jar = CookieJar::new();
        assert!(jar.store_set_cookie(
            "token=xyz; Domain=.example.com; Path=/api; Secure",
            &url("https://www.example.com/"),
        ));

        let cookie = jar.find("token").unwrap();
        assert_eq!(cookie.domain, "example.com");
        assert_eq!(cookie.path, "/api");
        assert_eq!(cookie.value, "xyz");
    }

    #[test]
    fn set_cookie_rejects_garbage() {
        let mut jar = CookieJar::new();
        assert!(!jar.store_set_cookie("novalue", &url("http://a.example/")));
        assert!(jar.is_empty());
    }

    #[test]
    fn domain_outside_origin_is_rejected() {
        let mut jar = CookieJar::new();
        let origin = url("http://127.0.0.1:8080/login");

        assert!(!jar.store_set_cookie("session=stolen; Domain=bank.example", &origin));
        assert!(!jar.insert(Cookie::new("session", "stolen", "bank.example", "/"), &origin));

        assert!(jar.is_empty());
        assert_eq!(jar.header_for(&url("https://bank.example/")), None);
    }

    #[test]
    fn max_age_zero_deletes_cookie() {
        let mut jar = CookieJar::new();
        let server = url("http://a.example/");
        jar.store_set_cookie("sid=abc", &url("http://a.example/login"));
        assert_eq!(jar.header_for(&server), Some("sid=abc".to_string()));

        jar.store_set_cookie("sid=; Max-Age=0", &url("http://a.example/logout"));
        assert_eq!(jar.header_for(&server), None);
        assert!(jar.find("sid").is_none());
    }

    #[test]
    fn past_expiry_is_not_stored() {
        let mut jar = CookieJar::new();
        jar.store_set_cookie(
            "old=1; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            &url("http://a.example/"),
        );
        assert!(jar.is_empty());
    }

    #[test]
    fn merging_same_identity_keeps_latest_value() {
        let origin = url("http://a.example/");
        let mut jar = CookieJar::new();
        jar.insert(Cookie::new("s", "1", "", "/"), &origin);
        jar.insert(Cookie::new("s", "2", "", "/"), &origin);
        jar.insert(Cookie::new("s", "2", "", "/"), &origin);

        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("s", "a.example", "/").unwrap().value, "2");
    }

    #[test]
    fn merge_is_order_independent_for_distinct_identities() {
        let origin = url("http://h.example/");
        let first = vec![Cookie::new("a", "1", "", "/"), Cookie::new("b", "1", "", "/")];
        let second = vec![Cookie::new("b", "1", "", "/"), Cookie::new("a", "1", "", "/")];

        let mut left = CookieJar::new();
        left.merge(first, &origin);
        let mut right = CookieJar::new();
        right.merge(second, &origin);

        assert_eq!(left.len(), right.len());
        for cookie in left.iter() {
            assert_eq!(
                right.get(&cookie.name, &cookie.domain, &cookie.path),
                Some(cookie)
            );
        }
    }

    #[test]
    fn different_path_is_a_different_cookie() {
        let origin = url("http://a.example/");
        let mut jar = CookieJar::new();
        jar.insert(Cookie::new("s", "1", "", "/"), &origin);
        jar.insert(Cookie::new("s", "2", "", "/b"), &origin);
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn header_only_includes_matching_cookies() {
        let mut jar = CookieJar::new();
        jar.merge(
            [
                Cookie::new("root", "1", "example.com", "/"),
                Cookie::new("api", "2", "example.com", "/api"),
            ],
            &url("https://www.example.com/"),
        );
        jar.insert(
            Cookie::new("other", "3", "", "/"),
            &url("https://other.org/"),
        );

        assert_eq!(
            sorted_pairs(jar.header_for(&url("https://www.example.com/api/games"))),
            ["api=2", "root=1"]
        );
        assert_eq!(
            jar.header_for(&url("https://example.com/apiary")),
            Some("root=1".to_string())
        );
        assert_eq!(jar.header_for(&url("https://notexample.com/")), None);
    }
}
