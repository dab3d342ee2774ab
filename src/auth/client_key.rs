use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use std::convert::Infallible;
use std::fmt;

pub const FORWARDED_FOR: &str = "x-forwarded-for";
pub const REAL_IP: &str = "x-real-ip";
pub const CONNECTING_IP: &str = "cf-connecting-ip";

/// Key shared by every caller whose address could not be resolved.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Best-effort caller identity taken from forwarded-address headers.
///
/// Used for rate-limit bucketing and ownership comparison only. Headers are
/// client controlled, so this is never an authentication credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Resolve from header values in precedence order: forwarded-for (first
    /// comma-separated entry, trimmed), real-ip, connecting-ip, else `"unknown"`.
    /// Empty header values count as absent. Purely textual; nothing is parsed
    /// as an IP address.
    pub fn resolve(
        forwarded_for: Option<&str>,
        real_ip: Option<&str>,
        connecting_ip: Option<&str>,
    ) -> Self {
        fn present(v: Option<&str>) -> Option<&str> {
            v.filter(|s| !s.is_empty())
        }

        if let Some(forwarded) = present(forwarded_for) {
            let first = forwarded.split(',').next().unwrap_or(forwarded);
            return Self::new(first.trim());
        }
        if let Some(real) = present(real_ip) {
            return Self::new(real);
        }
        if let Some(connecting) = present(connecting_ip) {
            return Self::new(connecting);
        }
        Self::new(UNKNOWN_CLIENT)
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        Self::resolve(get(FORWARDED_FOR), get(REAL_IP), get(CONNECTING_IP))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_CLIENT
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_first_entry_trimmed() {
        let key = ClientKey::resolve(Some("  203.0.113.7 , 10.0.0.1, 10.0.0.2"), Some("198.51.100.1"), None);
        assert_eq!(key.as_str(), "203.0.113.7");
    }

    #[test]
    fn precedence_falls_through_in_order() {
        assert_eq!(ClientKey::resolve(None, Some("1.1.1.1"), Some("2.2.2.2")).as_str(), "1.1.1.1");
        assert_eq!(ClientKey::resolve(None, None, Some("2.2.2.2")).as_str(), "2.2.2.2");
        assert_eq!(ClientKey::resolve(Some(""), None, Some("2.2.2.2")).as_str(), "2.2.2.2");
    }

    #[test]
    fn missing_headers_share_unknown_bucket() {
        let key = ClientKey::resolve(None, None, None);
        assert_eq!(key.as_str(), UNKNOWN_CLIENT);
        assert!(key.is_unknown());
    }

    #[test]
    fn values_are_not_validated() {
        assert_eq!(ClientKey::resolve(None, Some("not-an-ip"), None).as_str(), "not-an-ip");
        assert_eq!(ClientKey::resolve(None, Some(" spaced "), None).as_str(), " spaced ");
    }

    #[test]
    fn reads_from_header_map() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTING_IP, HeaderValue::from_static("9.9.9.9"));
        headers.insert(REAL_IP, HeaderValue::from_static("8.8.8.8"));
        assert_eq!(ClientKey::from_headers(&headers).as_str(), "8.8.8.8");

        headers.insert(FORWARDED_FOR, HeaderValue::from_static("7.7.7.7, 6.6.6.6"));
        assert_eq!(ClientKey::from_headers(&headers).as_str(), "7.7.7.7");
    }
}
