//! JWKS (JSON Web Key Set) fetching
//!
//! [`JwksFetcher`] performs one GET against `{private_base_url}/jwks` per
//! call and returns the keys matching the requested key ID. It keeps no
//! state besides its HTTP client and performs no retries; caching belongs
//! to [`KeychainCache`](super::KeychainCache).

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use tracing::{debug, error, info};

use super::{KeyProvider, keys_with_id};
use crate::error::{AuthnError, Result};
use crate::http::BackChannel;

/// Remote key provider reading the issuer's JWKS endpoint
#[derive(Debug, Clone)]
pub struct JwksFetcher {
    /// HTTP client (5 second request timeout)
    http_client: reqwest::Client,
    /// Absolute JWKS endpoint URL
    jwks_uri: String,
}

impl JwksFetcher {
    /// Create a fetcher for the JWKS endpoint under `channel`'s base URL
    pub fn new(channel: &BackChannel) -> Self {
        Self {
            http_client: channel.client().clone(),
            jwks_uri: channel.absolute_url("jwks"),
        }
    }

    /// Get the JWKS endpoint URI
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    /// Fetch and decode the whole key set
    ///
    /// # Errors
    ///
    /// - [`AuthnError::Transport`] if the endpoint is unreachable or times out
    /// - [`AuthnError::Keyset`] on a non-2xx status or an undecodable body
    pub async fn fetch(&self) -> Result<JwkSet> {
        info!(jwks_uri = %self.jwks_uri, "Fetching JWKS from endpoint");

        let response = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| {
                error!(jwks_uri = %self.jwks_uri, error = %e, "Failed to fetch JWKS");
                AuthnError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                jwks_uri = %self.jwks_uri,
                status = %status,
                "JWKS endpoint returned error status"
            );
            return Err(AuthnError::Keyset(format!(
                "received {} from {}",
                status.as_u16(),
                self.jwks_uri
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            error!(jwks_uri = %self.jwks_uri, error = %e, "Failed to read JWKS body");
            AuthnError::Transport(e)
        })?;

        let jwks: JwkSet = serde_json::from_slice(&body).map_err(|e| {
            error!(jwks_uri = %self.jwks_uri, error = %e, "Failed to parse JWKS JSON");
            AuthnError::Keyset(format!("invalid JWKS document from {}: {e}", self.jwks_uri))
        })?;

        debug!(
            jwks_uri = %self.jwks_uri,
            key_count = jwks.keys.len(),
            "Successfully fetched JWKS"
        );

        Ok(jwks)
    }
}

#[async_trait]
impl KeyProvider for JwksFetcher {
    async fn key(&self, kid: &str) -> Result<Vec<Jwk>> {
        let jwks = self.fetch().await?;
        let keys = keys_with_id(&jwks, kid);
        if keys.is_empty() {
            debug!(jwks_uri = %self.jwks_uri, key_id = kid, "Key ID not found in JWKS");
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(base: &str) -> JwksFetcher {
        JwksFetcher::new(&BackChannel::new(base).unwrap())
    }

    #[test]
    fn test_jwks_uri_resolution() {
        assert_eq!(
            fetcher_for("https://keratin.tech/authn").jwks_uri(),
            "https://keratin.tech/authn/jwks"
        );
        assert_eq!(
            fetcher_for("https://authn.keratin.tech/").jwks_uri(),
            "https://authn.keratin.tech/jwks"
        );
    }

    #[tokio::test]
    async fn test_key_returns_matching_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keys": [
                    {"kty": "oct", "kid": "kid1", "k": "c2VjcmV0"},
                    {"kty": "oct", "kid": "kid2", "k": "c2VjcmV0"}
                ]
            })))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server.uri());

        let keys = fetcher.key("kid2").await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].common.key_id.as_deref(), Some("kid2"));

        // Unknown key IDs are an empty answer, not an error
        assert!(fetcher.key("kid3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_names_status_and_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server.uri());
        let err = fetcher.key("kid1").await.unwrap_err();

        match err {
            AuthnError::Keyset(msg) => {
                assert!(msg.contains("503"), "{msg}");
                assert!(msg.contains(fetcher.jwks_uri()), "{msg}");
            }
            other => panic!("expected keyset error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_document_is_keyset_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = fetcher_for(&server.uri()).key("kid1").await.unwrap_err();
        assert!(matches!(err, AuthnError::Keyset(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept connections
        let err = fetcher_for("http://127.0.0.1:9").key("kid1").await.unwrap_err();
        assert!(matches!(err, AuthnError::Transport(_)));
        assert!(err.is_transport());
    }
}
