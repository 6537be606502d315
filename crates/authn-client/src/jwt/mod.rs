//! Identity-token verification
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   key(kid)   ┌────────────────┐  miss  ┌─────────────┐
//! │  IdTokenVerifier │ ───────────▶ │ KeychainCache  │ ─────▶ │ JwksFetcher │ ──▶ GET {base}/jwks
//! │ parse → key →    │              │ kid → Vec<Jwk> │        └─────────────┘
//! │ verify → claims  │              │ TTL per entry  │
//! └──────────────────┘              └────────────────┘
//! ```
//!
//! Every box on the key path is a [`KeyProvider`], so the cache can wrap the
//! fetcher and tests can hand the verifier a [`StaticKeyProvider`].
//!
//! # Modules
//!
//! - `jws` - compact / JSON JWS parsing
//! - `jwks` - remote keyset fetcher
//! - `keychain` - TTL cache over any key provider
//! - `claims` - verified claim set
//! - `verifier` - the verification pipeline

pub mod claims;
pub mod jwks;
pub mod jws;
pub mod keychain;
pub mod verifier;

pub use claims::{Audience, Claims, NumericDate};
pub use jwks::JwksFetcher;
pub use keychain::KeychainCache;
pub use verifier::IdTokenVerifier;

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};

use crate::error::Result;

/// Resolves a key ID to the JSON Web Keys published under it
///
/// An empty list is a normal answer meaning "no such key"; errors are
/// reserved for failures to find out.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Keys published under `kid`, in publication order
    async fn key(&self, kid: &str) -> Result<Vec<Jwk>>;
}

/// Key provider backed by a fixed, in-memory key set
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    keys: JwkSet,
}

impl StaticKeyProvider {
    /// Serve keys from `keys`
    pub fn new(keys: JwkSet) -> Self {
        Self { keys }
    }

    /// Serve a single key
    pub fn single(key: Jwk) -> Self {
        Self::new(JwkSet { keys: vec![key] })
    }
}

impl Default for StaticKeyProvider {
    fn default() -> Self {
        Self::new(JwkSet { keys: Vec::new() })
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    async fn key(&self, kid: &str) -> Result<Vec<Jwk>> {
        Ok(keys_with_id(&self.keys, kid))
    }
}

/// All keys in `set` whose `kid` equals `kid`, preserving order
pub(crate) fn keys_with_id(set: &JwkSet, kid: &str) -> Vec<Jwk> {
    set.keys
        .iter()
        .filter(|jwk| jwk.common.key_id.as_deref() == Some(kid))
        .cloned()
        .collect()
}
