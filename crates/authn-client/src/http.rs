//! Shared HTTP plumbing for the issuer's private endpoints
//!
//! Both the JWKS fetcher and the admin client resolve paths against the
//! private base URL. The base is normalised to end with `/` before
//! resolution so that `https://host/authn` + `jwks` yields
//! `https://host/authn/jwks` rather than `https://host/jwks`.

use std::time::Duration;

use url::Url;

use crate::error::{AuthnError, Result};

/// Per-request timeout for every call to the issuer
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client bound to the issuer's private base URL
#[derive(Debug, Clone)]
pub struct BackChannel {
    client: reqwest::Client,
    base_url: Url,
}

impl BackChannel {
    /// Create a back-channel for `base`
    ///
    /// # Errors
    ///
    /// Returns [`AuthnError::Config`] if `base` is not an absolute URL or the
    /// HTTP client cannot be built.
    pub fn new(base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("authn-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuthnError::Config(format!("Failed to create HTTP client: {e}")))?;

        Self::with_client(base, client)
    }

    /// Create a back-channel that reuses an existing `reqwest::Client`
    ///
    /// # Errors
    ///
    /// Returns [`AuthnError::Config`] if `base` is not an absolute URL.
    pub fn with_client(base: &str, client: reqwest::Client) -> Result<Self> {
        let base_url = normalize_base(base)?;
        Ok(Self { client, base_url })
    }

    /// The slash-terminated base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL
    pub fn absolute_url(&self, path: &str) -> String {
        match self.base_url.join(path) {
            Ok(url) => url.to_string(),
            // join only fails on inputs that cannot be a relative reference;
            // the paths used here are fixed or percent-encoded
            Err(_) => format!("{}{}", self.base_url, path),
        }
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

fn normalize_base(base: &str) -> Result<Url> {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    Url::parse(&base).map_err(|e| AuthnError::Config(format!("base URL '{base}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        let cases = [
            ("https://authn.keratin.tech", "path", "https://authn.keratin.tech/path"),
            ("https://authn.keratin.tech/", "path", "https://authn.keratin.tech/path"),
            ("https://keratin.tech/authn", "path", "https://keratin.tech/authn/path"),
            ("https://keratin.tech/authn/", "path", "https://keratin.tech/authn/path"),
            ("http://test.com", "accounts/1/lock", "http://test.com/accounts/1/lock"),
        ];

        for (base, path, expected) in cases {
            let channel = BackChannel::new(base).unwrap();
            assert_eq!(channel.absolute_url(path), expected, "base = {base}");
        }
    }

    #[test]
    fn test_base_url_is_slash_terminated() {
        let channel = BackChannel::new("https://keratin.tech/authn").unwrap();
        assert_eq!(channel.base_url().as_str(), "https://keratin.tech/authn/");
    }

    #[test]
    fn test_relative_base_rejected() {
        assert!(matches!(
            BackChannel::new("authn.keratin.tech"),
            Err(AuthnError::Config(_))
        ));
    }
}
