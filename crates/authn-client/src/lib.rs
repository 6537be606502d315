//! # authn-client
//!
//! Client for a hosted authn issuer: verifies the identity tokens it signs
//! and calls its private admin API.
//!
//! ## Architecture
//!
//! - [`config`] - `AuthnConfig`, frozen at construction
//! - [`jwt`] - the verification pipeline
//!   - `jwks` - fetches the issuer's key set
//!   - `keychain` - TTL cache of key ID → keys
//!   - `verifier` - parse, key lookup, signature and claim checks
//! - [`admin`] - HTTP Basic-authenticated account management
//! - [`client`] - `AuthnClient`, the facade over both
//! - [`global`] - optional process-wide `AuthnClient`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use authn_client::{AuthnClient, AuthnConfig};
//!
//! # tokio_test::block_on(async {
//! let config = AuthnConfig::new("https://authn.example.com", "app.example.com")
//!     .with_private_base_url("http://authn:3000")
//!     .with_credentials("admin", "secret");
//! let client = AuthnClient::new(config)?;
//!
//! let account_id = client.subject_from("eyJhbGciOiJSUzI1NiIs...").await?;
//! let account = client.admin().get_account(&account_id).await?;
//! println!("{} is locked: {}", account.username, account.locked);
//! # Ok::<(), authn_client::AuthnError>(())
//! # });
//! ```
//!
//! ## Errors
//!
//! Verification failures are reported as distinct [`AuthnError`] variants, so
//! a bad signature ([`AuthnError::CryptoFailure`]) can be told apart from an
//! expired token ([`AuthnError::Expired`]) or a misconfigured issuer
//! ([`AuthnError::InvalidIssuer`]).
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.

pub mod admin;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod global;
pub mod http;
pub mod jwt;

#[doc(inline)]
pub use admin::{Account, AdminClient, ErrorResponse, FieldError};
#[doc(inline)]
pub use client::AuthnClient;
pub use clock::{Clock, ManualClock, SystemClock};
#[doc(inline)]
pub use config::{AuthnConfig, DEFAULT_KEYCHAIN_TTL};
pub use error::{AuthnError, Result};
pub use global::{global, init_with_config, subject_from, try_global};
pub use jwt::{
    Audience, Claims, IdTokenVerifier, JwksFetcher, KeyProvider, KeychainCache, NumericDate,
    StaticKeyProvider,
};
