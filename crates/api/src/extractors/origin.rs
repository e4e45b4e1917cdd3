//! The server origin as seen by the client.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::HOST, request::Parts},
};

/// `scheme://host[:port]` of the inbound request, honoring reverse-proxy
/// headers (`X-Forwarded-Proto`, `X-Forwarded-Host`).
///
/// Holds `None` when the request carries no host at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin(pub Option<String>);

impl RequestOrigin {
    /// Derive the origin from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let host = first_value(headers, "x-forwarded-host").or_else(|| first_value(headers, HOST.as_str()));
        let scheme = first_value(headers, "x-forwarded-proto").unwrap_or("http");

        Self(host.map(|host| format!("{scheme}://{host}")))
    }

    /// The origin, if known.
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// First comma-separated value of a header, trimmed.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<S> FromRequestParts<S> for RequestOrigin
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
    use rstest::rstest;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[rstest]
    #[case(&[("host", "localhost:8000")], Some("http://localhost:8000"))]
    #[case(
        &[("host", "10.0.0.5:8000"), ("x-forwarded-host", "pinboard.example.com"), ("x-forwarded-proto", "https")],
        Some("https://pinboard.example.com")
    )]
    #[case(
        &[("host", "internal"), ("x-forwarded-proto", "https, http")],
        Some("https://internal")
    )]
    #[case(&[("x-forwarded-host", "a.example.com, b.example.com")], Some("http://a.example.com"))]
    #[case(&[], None)]
    fn test_origin_from_headers(
        #[case] pairs: &[(&'static str, &'static str)],
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(RequestOrigin::from_headers(&headers(pairs)).as_deref(), expected);
    }
}
