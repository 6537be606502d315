//! Client facade
//!
//! [`AuthnClient`] wires the pieces together:
//!
//! ```text
//! AuthnConfig ─▶ BackChannel ─┬─▶ JwksFetcher ─▶ KeychainCache ─▶ IdTokenVerifier
//!                             └─▶ AdminClient
//! ```
//!
//! Share one client per issuer; it is `Send + Sync` and every method takes
//! `&self`.

use std::sync::Arc;

use tracing::debug;

use crate::admin::AdminClient;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthnConfig;
use crate::error::Result;
use crate::http::BackChannel;
use crate::jwt::{Claims, IdTokenVerifier, JwksFetcher, KeyProvider, KeychainCache};

/// Verifies identity tokens and talks to the issuer's admin API
#[derive(Debug)]
pub struct AuthnClient {
    config: AuthnConfig,
    keychain: Arc<KeychainCache>,
    verifier: IdTokenVerifier,
    admin: AdminClient,
}

impl AuthnClient {
    /// Create a client that fetches signing keys from the issuer
    ///
    /// # Errors
    ///
    /// Returns [`AuthnError::Config`](crate::AuthnError::Config) if the
    /// configuration does not validate.
    pub fn new(config: AuthnConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`new`](Self::new) with an explicit time source for key expiry
    /// and claim validation
    ///
    /// # Errors
    ///
    /// Returns [`AuthnError::Config`](crate::AuthnError::Config) if the
    /// configuration does not validate.
    pub fn with_clock(config: AuthnConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let channel = BackChannel::new(config.private_base_url())?;
        let fetcher: Arc<dyn KeyProvider> = Arc::new(JwksFetcher::new(&channel));
        Self::assemble(config, channel, fetcher, clock)
    }

    /// Create a client that resolves signing keys through `keys` instead of
    /// the issuer's JWKS endpoint
    ///
    /// Lookups are still cached for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns [`AuthnError::Config`](crate::AuthnError::Config) if the
    /// configuration does not validate.
    pub fn with_key_provider(config: AuthnConfig, keys: Arc<dyn KeyProvider>) -> Result<Self> {
        config.validate()?;
        let channel = BackChannel::new(config.private_base_url())?;
        Self::assemble(config, channel, keys, Arc::new(SystemClock))
    }

    fn assemble(
        config: AuthnConfig,
        channel: BackChannel,
        keys: Arc<dyn KeyProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let keychain = Arc::new(KeychainCache::with_clock(
            config.keychain_ttl(),
            keys,
            clock.clone(),
        ));
        let verifier = IdTokenVerifier::new(&config, keychain.clone())?.with_clock(clock);
        let admin = AdminClient::new(channel, config.username.clone(), config.password.clone());

        debug!(
            issuer = %config.issuer,
            audience = %config.audience,
            private_base_url = %config.private_base_url(),
            keychain_ttl_secs = config.keychain_ttl().as_secs(),
            "Created authn client"
        );

        Ok(Self {
            config,
            keychain,
            verifier,
            admin,
        })
    }

    /// Verify `token` and return the account ID it was issued for
    ///
    /// # Errors
    ///
    /// See [`IdTokenVerifier::verified_claims`].
    pub async fn subject_from(&self, token: &str) -> Result<String> {
        self.verified_claims(token).await.map(|claims| claims.sub)
    }

    /// Verify `token` and return all of its claims
    ///
    /// # Errors
    ///
    /// See [`IdTokenVerifier::verified_claims`].
    pub async fn verified_claims(&self, token: &str) -> Result<Claims> {
        self.verifier.verified_claims(token).await
    }

    /// Admin back-channel
    pub fn admin(&self) -> &AdminClient {
        &self.admin
    }

    /// Key cache shared by every verification
    pub fn keychain(&self) -> &KeychainCache {
        &self.keychain
    }

    /// Configuration the client was built from
    pub fn config(&self) -> &AuthnConfig {
        &self.config
    }
}
