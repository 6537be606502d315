//! Identity-token verification
//!
//! [`IdTokenVerifier::verified_claims`] runs four stages and stops at the
//! first failure:
//!
//! 1. **Parse** the token and require exactly one signature header.
//! 2. **Look up** the signing key by `kid`. The first key published under
//!    that ID is used; there is no fallback to a second key.
//! 3. **Verify** the signature with the header's algorithm, which must be one
//!    the key supports. An HMAC token presented against an RSA key is
//!    rejected here instead of using the public key as a shared secret.
//! 4. **Validate** issuer, audience and time claims.
//!
//! Time checks use `jsonwebtoken`'s default leeway and an injectable
//! [`Clock`], so expiry can be tested without sleeping.

use std::str::FromStr;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::claims::Claims;
use super::{KeyProvider, jws};
use crate::clock::{Clock, SystemClock};
use crate::config::AuthnConfig;
use crate::error::{AuthnError, Result};

const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];
const HMAC_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Verifies identity tokens issued by one issuer for one audience
pub struct IdTokenVerifier {
    /// Expected `iss`
    issuer: Url,
    /// Audience that must appear in `aud`
    audience: String,
    keys: Arc<dyn KeyProvider>,
    clock: Arc<dyn Clock>,
    /// Clock skew tolerance in seconds
    leeway: u64,
}

impl std::fmt::Debug for IdTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdTokenVerifier")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl IdTokenVerifier {
    /// Create a verifier for `config`'s issuer and audience that resolves
    /// signing keys through `keys`
    ///
    /// # Errors
    ///
    /// Returns [`AuthnError::Config`] if the issuer is not an absolute URL.
    pub fn new(config: &AuthnConfig, keys: Arc<dyn KeyProvider>) -> Result<Self> {
        let issuer = Url::parse(&config.issuer).map_err(|e| {
            AuthnError::Config(format!("issuer '{}' is not a valid URL: {e}", config.issuer))
        })?;

        Ok(Self {
            issuer,
            audience: config.audience.clone(),
            keys,
            clock: Arc::new(SystemClock),
            leeway: Validation::default().leeway,
        })
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Expected issuer
    pub fn expected_issuer(&self) -> &Url {
        &self.issuer
    }

    /// Expected audience
    pub fn expected_audience(&self) -> &str {
        &self.audience
    }

    /// Verify `token` and return its claims
    ///
    /// # Errors
    ///
    /// - [`AuthnError::Malformed`] / [`AuthnError::UnsupportedStructure`] if
    ///   the token cannot be parsed
    /// - [`AuthnError::Transport`] / [`AuthnError::Keyset`] if keys could not
    ///   be fetched
    /// - [`AuthnError::NoKey`] if no key matches the token's `kid`
    /// - [`AuthnError::CryptoFailure`] if the signature does not verify
    /// - [`AuthnError::InvalidClaims`] if the payload is not a claim set
    /// - [`AuthnError::InvalidIssuer`], [`AuthnError::InvalidAudience`],
    ///   [`AuthnError::Expired`], [`AuthnError::NotYetValid`] for rejected claims
    pub async fn verified_claims(&self, token: &str) -> Result<Claims> {
        let parsed = jws::parse(token).inspect_err(|e| {
            debug!(error = %e, "Failed to parse identity token");
        })?;
        let header = parsed.header();

        let Some(kid) = header.kid.as_deref() else {
            warn!("Identity token has no kid");
            return Err(AuthnError::NoKey);
        };

        let keys = self.keys.key(kid).await?;
        let Some(jwk) = keys.first() else {
            warn!(key_id = kid, "No key found for identity token");
            return Err(AuthnError::NoKey);
        };

        let payload = self.verify_signature(parsed.compact(), &header.alg, jwk).inspect_err(|e| {
            warn!(key_id = kid, algorithm = %header.alg, error = %e, "Identity token signature rejected");
        })?;

        let claims: Claims = serde_json::from_value(payload)
            .map_err(|e| AuthnError::InvalidClaims(e.to_string()))?;

        self.validate_claims(&claims).inspect_err(|e| {
            warn!(key_id = kid, subject = %claims.sub, error = %e, "Identity token claims rejected");
        })?;

        debug!(key_id = kid, subject = %claims.sub, "Identity token verified");
        Ok(claims)
    }

    fn verify_signature(&self, compact: &str, alg: &str, jwk: &Jwk) -> Result<Value> {
        let algorithm = Algorithm::from_str(alg)
            .map_err(|_| AuthnError::CryptoFailure(format!("unsupported algorithm '{alg}'")))?;

        if !allowed_algorithms(jwk).contains(&algorithm) {
            return Err(AuthnError::CryptoFailure(format!(
                "algorithm {algorithm:?} is not allowed for this key"
            )));
        }

        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| AuthnError::CryptoFailure(format!("unusable key: {e}")))?;

        let mut validation = Validation::new(algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        decode::<Value>(compact, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                    AuthnError::Malformed(e.to_string())
                }
                _ => AuthnError::CryptoFailure(e.to_string()),
            })
    }

    fn validate_claims(&self, claims: &Claims) -> Result<()> {
        if !issuer_matches(&self.issuer, &claims.iss) {
            return Err(AuthnError::InvalidIssuer);
        }

        if !claims.aud.contains(&self.audience) {
            return Err(AuthnError::InvalidAudience);
        }

        let now = self
            .clock
            .now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        let leeway = self.leeway as i64;

        if claims.exp.timestamp() < now - leeway {
            return Err(AuthnError::Expired);
        }
        if claims.nbf.is_some_and(|nbf| nbf.timestamp() > now + leeway) {
            return Err(AuthnError::NotYetValid);
        }
        if claims.iat.is_some_and(|iat| iat.timestamp() > now + leeway) {
            return Err(AuthnError::NotYetValid);
        }

        Ok(())
    }
}

/// Algorithms a key may verify: its declared `alg`, else every algorithm of
/// its key type
fn allowed_algorithms(jwk: &Jwk) -> Vec<Algorithm> {
    if let Some(declared) = &jwk.common.key_algorithm {
        // KeyAlgorithm and Algorithm share their JOSE names
        return serde_json::to_value(declared)
            .ok()
            .and_then(|v| v.as_str().and_then(|s| Algorithm::from_str(s).ok()))
            .into_iter()
            .collect();
    }

    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => RSA_ALGORITHMS.to_vec(),
        AlgorithmParameters::EllipticCurve(params) => match params.curve {
            EllipticCurve::P256 => vec![Algorithm::ES256],
            EllipticCurve::P384 => vec![Algorithm::ES384],
            _ => Vec::new(),
        },
        AlgorithmParameters::OctetKeyPair(_) => vec![Algorithm::EdDSA],
        AlgorithmParameters::OctetKey(_) => HMAC_ALGORITHMS.to_vec(),
    }
}

/// Compare issuers as URLs; one trailing slash on the path is not significant
///
/// An `iss` that does not parse as a URL never matches.
fn issuer_matches(expected: &Url, actual: &str) -> bool {
    let Ok(actual) = Url::parse(actual) else {
        return false;
    };
    without_trailing_slash(expected) == without_trailing_slash(&actual)
}

fn without_trailing_slash(url: &Url) -> &str {
    let url = url.as_str();
    url.strip_suffix('/').unwrap_or(url)
}
