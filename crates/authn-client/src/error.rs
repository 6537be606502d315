//! Error types for token verification and the admin back-channel

use thiserror::Error;

use crate::admin::ErrorResponse;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AuthnError>;

/// Everything that can go wrong while verifying an identity token or talking
/// to the issuer's private endpoints.
///
/// Verification failures are distinct variants so callers can tell a bad
/// signature apart from an expired token or a misconfigured issuer.
#[derive(Debug, Error)]
pub enum AuthnError {
    /// Configuration could not be turned into a working client
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Token is not a valid JWS
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Token carries zero or several signatures
    #[error("unsupported token structure: {0}")]
    UnsupportedStructure(String),

    /// Network failure talking to the issuer
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JWKS endpoint answered with a non-2xx status or an unreadable document
    #[error("keyset error: {0}")]
    Keyset(String),

    /// No published key matches the token's `kid`
    #[error("no key found for token")]
    NoKey,

    /// Signature did not verify against the selected key
    #[error("cryptographic failure: {0}")]
    CryptoFailure(String),

    /// Verified payload is not a usable claim set
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    /// `iss` does not name the configured issuer
    #[error("invalid issuer claim (iss)")]
    InvalidIssuer,

    /// `aud` does not contain the configured audience
    #[error("invalid audience claim (aud)")]
    InvalidAudience,

    /// `exp` has passed
    #[error("token is expired (exp)")]
    Expired,

    /// `nbf` or `iat` lies in the future
    #[error("token not valid yet (nbf/iat)")]
    NotYetValid,

    /// Admin endpoint answered with a non-2xx status and no structured body
    #[error("received {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Absolute URL that was requested
        url: String,
    },

    /// Admin endpoint answered with a structured error body
    #[error(transparent)]
    Api(#[from] ErrorResponse),
}

impl AuthnError {
    /// Whether the failure happened on the wire rather than in the token
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Keyset(_) | Self::Status { .. })
    }

    /// Whether the token verified but one of its standard claims was rejected
    pub fn is_claims_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIssuer | Self::InvalidAudience | Self::Expired | Self::NotYetValid
        )
    }
}
