//! Wire types of the admin API

use std::fmt;

use serde::{Deserialize, Serialize};

/// An account as reported by the issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub id: i64,
    /// Login name
    pub username: String,
    /// Whether the account is locked
    #[serde(default)]
    pub locked: bool,
    /// Whether the account is archived
    #[serde(default)]
    pub deleted: bool,
}

/// `{"result": ...}` envelope around successful reads
#[derive(Debug, Deserialize)]
pub(crate) struct ResultEnvelope<T> {
    pub(crate) result: T,
}

/// Body of a successful import
#[derive(Debug, Deserialize)]
pub(crate) struct ImportedAccount {
    pub(crate) id: i64,
}

/// One field-level problem reported by the issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending field
    pub field: String,
    /// Error code, e.g. `TAKEN` or `FORMAT_INVALID`
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Structured error returned by an admin endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    pub status: u16,
    /// Absolute URL that was requested
    #[serde(skip)]
    pub url: String,
    /// Field-level errors from the body
    pub errors: Vec<FieldError>,
}

impl ErrorResponse {
    /// Whether any error concerns `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Message of the first error for `field`
    pub fn field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "received {} from {}", self.status, self.url)?;
        for (i, error) in self.errors.iter().enumerate() {
            f.write_str(if i == 0 { ". Errors in " } else { "; " })?;
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorResponse {}
