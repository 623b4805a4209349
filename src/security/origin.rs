//! Cross-site form submission guard.
//!
//! Browsers attach `Origin` to cross-origin POSTs (and `Referer` in most
//! other cases). A public form post is accepted only when one of them
//! names an allowed site.

use axum::http::{header, HeaderMap};
use url::Url;

/// Canonical `scheme://host[:port]` for an http(s) URL or bare origin.
/// Default ports are elided and everything is lower-cased.
pub fn normalize_origin(value: &str) -> Option<String> {
    let url = Url::parse(value.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Result of inspecting a request's origin headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginCheck {
    Allowed,
    /// Neither header present and `require_origin` is false.
    Absent,
    /// Headers missing while required.
    Missing,
    /// Header present but not on the allow-list (or unparseable).
    Blocked(String),
}

impl OriginCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, OriginCheck::Allowed | OriginCheck::Absent)
    }
}

/// Allow-list of normalized origins.
#[derive(Debug, Clone)]
pub struct OriginVerifier {
    allowed: Vec<String>,
    require_origin: bool,
}

impl OriginVerifier {
    pub fn new<I, S>(allowed: I, require_origin: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed
            .into_iter()
            .filter_map(|o| normalize_origin(o.as_ref()))
            .collect();
        Self {
            allowed,
            require_origin,
        }
    }

    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        normalize_origin(origin)
            .map(|o| self.allowed.iter().any(|a| *a == o))
            .unwrap_or(false)
    }

    /// Inspect `Origin`, falling back to the origin part of `Referer`.
    pub fn check(&self, headers: &HeaderMap) -> OriginCheck {
        let claimed = headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty() && *v != "null")
            .or_else(|| {
                headers
                    .get(header::REFERER)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.is_empty())
            });

        match claimed {
            Some(value) if self.is_allowed_origin(value) => OriginCheck::Allowed,
            Some(value) => OriginCheck::Blocked(value.to_string()),
            None if self.require_origin => OriginCheck::Missing,
            None => OriginCheck::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn verifier() -> OriginVerifier {
        OriginVerifier::new(["https://Example.com", "http://localhost:3000"], true)
    }

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_normalize_origin() {
        assert_eq!(normalize_origin("https://EXAMPLE.com/"), Some("https://example.com".into()));
        assert_eq!(normalize_origin("https://example.com:443"), Some("https://example.com".into()));
        assert_eq!(normalize_origin("http://localhost:3000/contact?x=1"), Some("http://localhost:3000".into()));
        assert_eq!(normalize_origin("javascript:alert(1)"), None);
        assert_eq!(normalize_origin("not a url"), None);
    }

    #[test]
    fn test_origin_header_allowed() {
        let v = verifier();
        assert_eq!(v.check(&headers(&[(header::ORIGIN, "https://example.com")])), OriginCheck::Allowed);
    }

    #[test]
    fn test_referer_fallback() {
        let v = verifier();
        let h = headers(&[(header::REFERER, "http://localhost:3000/contact")]);
        assert_eq!(v.check(&h), OriginCheck::Allowed);
    }

    #[test]
    fn test_lookalike_host_blocked() {
        let v = verifier();
        for evil in ["https://example.com.evil.io", "https://evil-example.com", "http://example.com"] {
            let check = v.check(&headers(&[(header::ORIGIN, evil)]));
            assert_eq!(check, OriginCheck::Blocked(evil.to_string()), "{evil}");
            assert!(!check.is_allowed());
        }
    }

    #[test]
    fn test_origin_takes_precedence_over_referer() {
        let v = verifier();
        let h = headers(&[
            (header::ORIGIN, "https://evil.io"),
            (header::REFERER, "https://example.com/contact"),
        ]);
        assert!(!v.check(&h).is_allowed());
    }

    #[test]
    fn test_missing_headers() {
        assert_eq!(verifier().check(&HeaderMap::new()), OriginCheck::Missing);

        let lenient = OriginVerifier::new(["https://example.com"], false);
        assert_eq!(lenient.check(&HeaderMap::new()), OriginCheck::Absent);
        assert!(lenient.check(&HeaderMap::new()).is_allowed());
    }
}
