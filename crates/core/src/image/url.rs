//! Derivation of the public `image_url` field.
//!
//! The URL is computed on every read and never stored, so moving the proxy
//! route or switching backends needs no data migration.

use pinboard_shared::UrlMode;

/// Path of the image proxy route, relative to the server origin.
pub const PROXY_PATH: &str = "/api/s3-image/";

/// Builds `image_url` values for image rows.
#[derive(Debug, Clone, Default)]
pub struct ImageUrlBuilder {
    mode: UrlMode,
    public_url: Option<String>,
    direct_base: Option<String>,
}

impl ImageUrlBuilder {
    /// Proxy URLs, relative unless a request origin is supplied.
    #[must_use]
    pub fn proxy() -> Self {
        Self::default()
    }

    /// Create a builder.
    ///
    /// `public_url` is the origin used when no request context exists.
    /// `direct_base` is the bucket's public base, used only in direct mode.
    #[must_use]
    pub fn new(mode: UrlMode, public_url: Option<String>, direct_base: Option<String>) -> Self {
        Self {
            mode,
            public_url: public_url.map(|url| url.trim_end_matches('/').to_string()),
            direct_base: direct_base.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    /// The URL for `storage_key`, or `None` when the row has no file.
    ///
    /// `origin` is the requesting client's view of the server
    /// (`scheme://host[:port]`), when known.
    #[must_use]
    pub fn image_url(&self, storage_key: &str, origin: Option<&str>) -> Option<String> {
        let key = storage_key.trim_start_matches('/');
        if key.is_empty() {
            return None;
        }

        if let (UrlMode::Direct, Some(base)) = (self.mode, self.direct_base.as_deref()) {
            return Some(format!("{base}/{key}"));
        }

        let origin = origin
            .map(|o| o.trim_end_matches('/'))
            .or(self.public_url.as_deref())
            .unwrap_or("");
        Some(format!("{origin}{PROXY_PATH}{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_relative_without_context() {
        let urls = ImageUrlBuilder::proxy();
        assert_eq!(
            urls.image_url("images/a.png", None).as_deref(),
            Some("/api/s3-image/images/a.png")
        );
    }

    #[test]
    fn test_request_origin_wins() {
        let urls = ImageUrlBuilder::new(
            UrlMode::Proxy,
            Some("https://pinboard.example.com/".to_string()),
            None,
        );
        assert_eq!(
            urls.image_url("images/a.png", Some("http://localhost:8000"))
                .as_deref(),
            Some("http://localhost:8000/api/s3-image/images/a.png")
        );
        assert_eq!(
            urls.image_url("images/a.png", None).as_deref(),
            Some("https://pinboard.example.com/api/s3-image/images/a.png")
        );
    }

    #[test]
    fn test_empty_key_has_no_url() {
        let urls = ImageUrlBuilder::proxy();
        assert_eq!(urls.image_url("", Some("http://h")), None);
    }

    #[test]
    fn test_direct_mode() {
        let urls = ImageUrlBuilder::new(
            UrlMode::Direct,
            None,
            Some("https://cdn.example.com".to_string()),
        );
        assert_eq!(
            urls.image_url("images/a.png", Some("http://h")).as_deref(),
            Some("https://cdn.example.com/images/a.png")
        );

        // No public bucket URL (filesystem backend): fall back to the proxy.
        let urls = ImageUrlBuilder::new(UrlMode::Direct, None, None);
        assert_eq!(
            urls.image_url("images/a.png", None).as_deref(),
            Some("/api/s3-image/images/a.png")
        );
    }

    proptest! {
        #[test]
        fn prop_proxy_urls_never_expose_backend(
            key in "[a-z0-9_./-]{0,40}",
            host in proptest::option::of("[a-z]{1,10}"),
        ) {
            let urls = ImageUrlBuilder::new(
                UrlMode::Proxy,
                None,
                Some("http://localhost:4566/bucket".to_string()),
            );
            let origin = host.map(|h| format!("http://{h}"));
            match urls.image_url(&key, origin.as_deref()) {
                None => prop_assert!(key.trim_start_matches('/').is_empty()),
                Some(url) => {
                    let path = match &origin {
                        Some(o) => url.strip_prefix(o.as_str()).map(str::to_string),
                        None => Some(url.clone()),
                    };
                    prop_assert!(path.is_some_and(|p| p.starts_with(PROXY_PATH)));
                    prop_assert!(!url.starts_with("http://localhost:4566/bucket"));
                }
            }
        }
    }
}
