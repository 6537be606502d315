//! Process-wide client
//!
//! Opt-in convenience for hosts that would rather not thread an
//! [`AuthnClient`] through their code. Initialise once at startup with
//! [`init_with_config`]; afterwards [`subject_from`] and [`global`] read it
//! without locking. Prefer passing an `AuthnClient` explicitly where you can.

use once_cell::sync::OnceCell;
use tracing::info;

use crate::client::AuthnClient;
use crate::config::AuthnConfig;
use crate::error::{AuthnError, Result};

static GLOBAL_CLIENT: OnceCell<AuthnClient> = OnceCell::new();

/// Build the process-wide client from `config`
///
/// # Errors
///
/// Returns [`AuthnError::Config`] if the configuration does not validate or a
/// global client was already initialised.
pub fn init_with_config(config: AuthnConfig) -> Result<()> {
    let client = AuthnClient::new(config)?;
    let issuer = client.config().issuer.clone();
    GLOBAL_CLIENT
        .set(client)
        .map_err(|_| AuthnError::Config("global client is already initialized".to_string()))?;
    info!(issuer = %issuer, "Initialized global authn client");
    Ok(())
}

/// The process-wide client, if initialised
pub fn try_global() -> Option<&'static AuthnClient> {
    GLOBAL_CLIENT.get()
}

/// The process-wide client
///
/// # Panics
///
/// Panics if [`init_with_config`] has not completed successfully. Using the
/// global client before initialising it is a programming error.
pub fn global() -> &'static AuthnClient {
    match GLOBAL_CLIENT.get() {
        Some(client) => client,
        None => panic!("authn client is not initialized; call init_with_config first"),
    }
}

/// Verify `token` with the process-wide client and return its subject
///
/// # Errors
///
/// See [`AuthnClient::subject_from`].
///
/// # Panics
///
/// Panics if [`init_with_config`] has not completed successfully.
pub async fn subject_from(token: &str) -> Result<String> {
    global().subject_from(token).await
}
