//! Common test utilities for integration tests
//!
//! A wiremock-backed issuer that publishes a JWKS, RSA test keys exported as
//! JWKs, and helpers for minting and tampering with identity tokens.

#![allow(dead_code)]

use authn_client::AuthnConfig;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use once_cell::sync::Lazy;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use serde_json::{Value, json};
use std::time::{SystemTime, UNIX_EPOCH};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Issuer every test token claims to come from
pub const ISSUER: &str = "https://authn.example.com";
/// Audience every test client expects
pub const AUDIENCE: &str = "app.example.com";

/// Key published in the mock JWKS
pub static DEFAULT_KEY: Lazy<TestKey> = Lazy::new(|| TestKey::generate("defaultKey"));
/// Key the mock JWKS never publishes
pub static UNKNOWN_KEY: Lazy<TestKey> = Lazy::new(|| TestKey::generate("unknownKey"));

/// RSA test key pair
pub struct TestKey {
    pub kid: String,
    pub private_pem: Vec<u8>,
    pub public_pem: Vec<u8>,
    pub jwk: Value,
}

impl TestKey {
    /// Generate a 2048-bit RSA key pair
    pub fn generate(kid: &str) -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key");
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("Failed to encode private key")
            .as_bytes()
            .to_vec();
        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .expect("Failed to encode public key")
            .into_bytes();

        let jwk = json!({
            "kty": "RSA",
            "use": "sig",
            "kid": kid,
            "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        });

        Self {
            kid: kid.to_string(),
            private_pem,
            public_pem,
            jwk,
        }
    }

    /// Sign `claims` with RS256 under this key's `kid`
    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        let key = EncodingKey::from_rsa_pem(&self.private_pem).expect("Invalid RSA key");
        encode(&header, claims, &key).expect("Failed to encode test JWT")
    }
}

/// Issuer whose private endpoints are served by wiremock
pub struct MockIssuer {
    pub server: MockServer,
}

impl MockIssuer {
    /// Start an issuer publishing `keys` at `/jwks`
    pub async fn start(keys: &[&TestKey]) -> Self {
        let server = MockServer::start().await;
        let jwks = json!({ "keys": keys.iter().map(|k| k.jwk.clone()).collect::<Vec<_>>() });
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Start an issuer whose `/jwks` answers with `status`
    pub async fn failing(status: u16) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Client configuration pointing at this issuer's private endpoints
    pub fn config(&self) -> AuthnConfig {
        AuthnConfig::new(ISSUER, AUDIENCE).with_private_base_url(self.server.uri())
    }

    /// Number of JWKS requests served so far
    pub async fn jwks_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/jwks")
            .count()
    }
}

/// Claims of a token that passes every check
pub fn valid_claims(sub: &str) -> Value {
    let now = current_timestamp() as i64;
    json!({
        "iss": ISSUER,
        "aud": [AUDIENCE],
        "sub": sub,
        "exp": now + 3600,
        "iat": now - 60,
    })
}

/// Replace the header segment of `token`
pub fn swap_header(token: &str, header: &Value) -> String {
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    parts[0] = encode_segment(header);
    parts.join(".")
}

/// Replace the payload segment of `token`, keeping the original signature
pub fn swap_payload(token: &str, claims: &Value) -> String {
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    parts[1] = encode_segment(claims);
    parts.join(".")
}

/// Sign `claims` with HS256, using `secret` as the HMAC key
pub fn sign_hs256(kid: &str, claims: &Value, secret: &[u8]) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &EncodingKey::from_secret(secret)).expect("Failed to encode test JWT")
}

fn encode_segment(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).expect("serializable"))
}

/// Get current Unix timestamp
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}
