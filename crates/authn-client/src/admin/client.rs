//! HTTP Basic-authenticated client for the issuer's admin endpoints

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::types::{Account, ErrorResponse, ImportedAccount, ResultEnvelope};
use crate::error::{AuthnError, Result};
use crate::http::BackChannel;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Admin back-channel client
#[derive(Clone)]
pub struct AdminClient {
    channel: BackChannel,
    username: String,
    password: SecretString,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.channel.base_url().as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminClient {
    /// Create a client authenticating as `username` / `password`
    pub fn new(channel: BackChannel, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            channel,
            username: username.into(),
            password,
        }
    }

    /// Fetch an account
    ///
    /// # Errors
    ///
    /// [`AuthnError::Transport`] on network failures or an undecodable body;
    /// [`AuthnError::Api`] or [`AuthnError::Status`] on a non-2xx response.
    pub async fn get_account(&self, id: &str) -> Result<Account> {
        let response = self.do_with_auth(Method::GET, &account_path(id, ""), None).await?;
        let envelope: ResultEnvelope<Account> = response.json().await?;
        Ok(envelope.result)
    }

    /// Change an account's username
    ///
    /// # Errors
    ///
    /// See [`get_account`](Self::get_account).
    pub async fn update(&self, id: &str, username: &str) -> Result<()> {
        let form = [("username", username)];
        self.do_with_auth(Method::PATCH, &account_path(id, ""), Some(form.as_slice()))
            .await
            .map(drop)
    }

    /// Lock an account
    ///
    /// # Errors
    ///
    /// See [`get_account`](Self::get_account).
    pub async fn lock_account(&self, id: &str) -> Result<()> {
        self.do_with_auth(Method::PATCH, &account_path(id, "/lock"), None)
            .await
            .map(drop)
    }

    /// Unlock an account
    ///
    /// # Errors
    ///
    /// See [`get_account`](Self::get_account).
    pub async fn unlock_account(&self, id: &str) -> Result<()> {
        self.do_with_auth(Method::PATCH, &account_path(id, "/unlock"), None)
            .await
            .map(drop)
    }

    /// Archive (soft-delete) an account
    ///
    /// # Errors
    ///
    /// See [`get_account`](Self::get_account).
    pub async fn archive_account(&self, id: &str) -> Result<()> {
        self.do_with_auth(Method::DELETE, &account_path(id, ""), None)
            .await
            .map(drop)
    }

    /// Import an account from another system and return its new ID
    ///
    /// # Errors
    ///
    /// See [`get_account`](Self::get_account).
    pub async fn import_account(&self, username: &str, password: &str, locked: bool) -> Result<i64> {
        let locked = locked.to_string();
        let form = [
            ("username", username),
            ("password", password),
            ("locked", locked.as_str()),
        ];
        let response = self
            .do_with_auth(Method::POST, "accounts/import", Some(form.as_slice()))
            .await?;
        let envelope: ResultEnvelope<ImportedAccount> = response.json().await?;
        Ok(envelope.result.id)
    }

    /// Expire an account's sessions and require a password change
    ///
    /// # Errors
    ///
    /// See [`get_account`](Self::get_account).
    pub async fn expire_password(&self, id: &str) -> Result<()> {
        self.do_with_auth(Method::PATCH, &account_path(id, "/expire_password"), None)
            .await
            .map(drop)
    }

    /// Raw response of the `stats` endpoint
    ///
    /// # Errors
    ///
    /// See [`get_account`](Self::get_account).
    pub async fn service_stats(&self) -> Result<Response> {
        self.do_with_auth(Method::GET, "stats", None).await
    }

    /// Raw response of the `metrics` endpoint
    ///
    /// # Errors
    ///
    /// See [`get_account`](Self::get_account).
    pub async fn server_stats(&self) -> Result<Response> {
        self.do_with_auth(Method::GET, "metrics", None).await
    }

    async fn do_with_auth(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<Response> {
        let url = self.channel.absolute_url(path);
        debug!(method = %method, url = %url, "Calling admin endpoint");

        let writes_body = matches!(method, Method::POST | Method::PATCH | Method::PUT);
        let mut request = self
            .channel
            .client()
            .request(method, &url)
            .basic_auth(&self.username, Some(self.password.expose_secret()));
        request = match form {
            Some(form) => request.form(form),
            None if writes_body => request.header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE)),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status = status.as_u16();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status, url = %url, error = %e, "Failed to read admin error body");
                Default::default()
            }
        };
        let err = match serde_json::from_slice::<ErrorResponse>(&body) {
            Ok(mut parsed) => {
                parsed.status = status;
                parsed.url = url;
                AuthnError::Api(parsed)
            }
            Err(_) => AuthnError::Status { status, url },
        };
        warn!(error = %err, "Admin endpoint returned error status");
        Err(err)
    }
}

/// `accounts/{id}{suffix}` with `id` percent-encoded
fn account_path(id: &str, suffix: &str) -> String {
    format!("accounts/{}{suffix}", urlencoding::encode(id))
}
