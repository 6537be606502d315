//! Admin back-channel
//!
//! Account management calls against the issuer's private endpoints,
//! authenticated with HTTP Basic credentials. Every call resolves its path
//! against the private base URL and shares the client's 5 second timeout.
//!
//! | Operation | Method | Path |
//! |---|---|---|
//! | [`AdminClient::get_account`] | GET | `accounts/{id}` |
//! | [`AdminClient::update`] | PATCH | `accounts/{id}` |
//! | [`AdminClient::lock_account`] | PATCH | `accounts/{id}/lock` |
//! | [`AdminClient::unlock_account`] | PATCH | `accounts/{id}/unlock` |
//! | [`AdminClient::archive_account`] | DELETE | `accounts/{id}` |
//! | [`AdminClient::import_account`] | POST | `accounts/import` |
//! | [`AdminClient::expire_password`] | PATCH | `accounts/{id}/expire_password` |
//! | [`AdminClient::service_stats`] | GET | `stats` |
//! | [`AdminClient::server_stats`] | GET | `metrics` |
//!
//! A non-2xx answer with an `{"errors": [...]}` body becomes
//! [`AuthnError::Api`](crate::AuthnError::Api); any other non-2xx answer
//! becomes [`AuthnError::Status`](crate::AuthnError::Status).

mod client;
mod types;

pub use client::AdminClient;
pub use types::{Account, ErrorResponse, FieldError};
