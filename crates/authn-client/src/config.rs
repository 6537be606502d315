//! Client configuration
//!
//! Values are supplied once at construction and frozen afterwards. The
//! password is held as a [`SecretString`] so it never shows up in `Debug`
//! output or logs.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AuthnError, Result};

/// Keychain TTL used when none is configured, in minutes
pub const DEFAULT_KEYCHAIN_TTL: u64 = 60;

/// Configuration for [`AuthnClient`](crate::AuthnClient)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnConfig {
    /// Base URL of the issuer; also the expected `iss` claim
    pub issuer: String,
    /// Overrides the base URL for private endpoints (JWKS and admin calls)
    #[serde(default)]
    pub private_base_url: Option<String>,
    /// Host of the application; the expected `aud` claim
    pub audience: String,
    /// HTTP Basic username for the private endpoints
    #[serde(default)]
    pub username: String,
    /// HTTP Basic password for the private endpoints
    #[serde(
        default = "empty_secret",
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub password: SecretString,
    /// Minutes a fetched key stays in the keychain
    #[serde(default = "default_keychain_ttl")]
    pub keychain_ttl: u64,
}

// Custom serialization for SecretString
fn serialize_secret<S>(secret: &SecretString, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

// Custom deserialization for SecretString
fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    Ok(SecretString::new(s))
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_keychain_ttl() -> u64 {
    DEFAULT_KEYCHAIN_TTL
}

impl AuthnConfig {
    /// Start a configuration for `issuer` and `audience` with defaults elsewhere
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            private_base_url: None,
            audience: audience.into(),
            username: String::new(),
            password: empty_secret(),
            keychain_ttl: DEFAULT_KEYCHAIN_TTL,
        }
    }

    /// Route private endpoints through a different base URL
    pub fn with_private_base_url(mut self, url: impl Into<String>) -> Self {
        self.private_base_url = Some(url.into());
        self
    }

    /// Set the HTTP Basic credentials for private endpoints
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = SecretString::new(password.into());
        self
    }

    /// Set the keychain TTL in minutes
    pub fn with_keychain_ttl(mut self, minutes: u64) -> Self {
        self.keychain_ttl = minutes;
        self
    }

    /// Effective base URL for private endpoints
    pub fn private_base_url(&self) -> &str {
        match self.private_base_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => &self.issuer,
        }
    }

    /// Keychain TTL as a duration; zero means "not set"
    pub fn keychain_ttl(&self) -> Duration {
        let minutes = if self.keychain_ttl == 0 {
            DEFAULT_KEYCHAIN_TTL
        } else {
            self.keychain_ttl
        };
        Duration::from_secs(minutes.saturating_mul(60))
    }

    /// Check that the configuration can produce a working client
    ///
    /// # Errors
    ///
    /// Returns [`AuthnError::Config`] when the issuer or private base URL is
    /// not an absolute URL, or the audience is empty.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.issuer)
            .map_err(|e| AuthnError::Config(format!("issuer '{}': {e}", self.issuer)))?;
        Url::parse(self.private_base_url()).map_err(|e| {
            AuthnError::Config(format!(
                "private base URL '{}': {e}",
                self.private_base_url()
            ))
        })?;
        if self.audience.is_empty() {
            return Err(AuthnError::Config("audience must not be empty".to_string()));
        }
        Ok(())
    }
}
