//! JWS parsing
//!
//! Accepts the compact serialisation (`header.payload.signature`) and both
//! JSON serialisations. JSON input is reduced to its single signature and
//! re-expressed in compact form so the signature check has one code path.
//!
//! Nothing here checks a signature; a [`ParsedJws`] only says that the token
//! is well-formed and carries exactly one signature header.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AuthnError, Result};

/// The header members the verifier needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwsHeader {
    /// Declared signing algorithm, verbatim
    pub alg: String,
    /// Key ID, if the token names one
    pub kid: Option<String>,
}

/// A well-formed, single-signature JWS
#[derive(Debug, Clone)]
pub struct ParsedJws {
    header: JwsHeader,
    compact: String,
}

impl ParsedJws {
    /// Header of the only signature
    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    /// Compact serialisation of the token
    pub fn compact(&self) -> &str {
        &self.compact
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

/// One entry of the general serialisation, or the flattened top level
#[derive(Deserialize)]
struct JsonSignature {
    #[serde(default)]
    protected: Option<String>,
    #[serde(default)]
    header: Option<Value>,
    signature: Option<String>,
}

#[derive(Deserialize)]
struct JsonJws {
    payload: String,
    #[serde(default)]
    signatures: Option<Vec<JsonSignature>>,
    #[serde(flatten)]
    flattened: JsonSignature,
}

/// Parse `token` and require exactly one signature header
///
/// # Errors
///
/// - [`AuthnError::Malformed`] for a wrong segment count, invalid base64url,
///   or a header that is not a JSON object with a string `alg`
/// - [`AuthnError::UnsupportedStructure`] when a JSON serialisation carries
///   zero or several signatures
pub fn parse(token: &str) -> Result<ParsedJws> {
    let token = token.trim();
    if token.starts_with('{') {
        parse_json(token)
    } else {
        parse_compact(token)
    }
}

fn parse_compact(token: &str) -> Result<ParsedJws> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = parts.as_slice() else {
        return Err(AuthnError::Malformed(
            "compact JWS format must have three parts".to_string(),
        ));
    };

    let header = decode_header(header, None)?;
    decode_segment("payload", payload)?;
    decode_segment("signature", signature)?;

    Ok(ParsedJws {
        header,
        compact: token.to_string(),
    })
}

fn parse_json(token: &str) -> Result<ParsedJws> {
    let jws: JsonJws = serde_json::from_str(token)
        .map_err(|e| AuthnError::Malformed(format!("invalid JWS JSON serialisation: {e}")))?;

    let entry = match jws.signatures {
        Some(mut signatures) => {
            if signatures.len() != 1 {
                return Err(AuthnError::UnsupportedStructure(format!(
                    "expected exactly one signature, found {}",
                    signatures.len()
                )));
            }
            if jws.flattened.signature.is_some() || jws.flattened.protected.is_some() {
                return Err(AuthnError::Malformed(
                    "general JWS must not carry top-level signature members".to_string(),
                ));
            }
            signatures.remove(0)
        }
        None if jws.flattened.signature.is_some() => jws.flattened,
        None => {
            return Err(AuthnError::UnsupportedStructure(
                "expected exactly one signature, found 0".to_string(),
            ));
        }
    };

    let protected = entry
        .protected
        .ok_or_else(|| AuthnError::Malformed("missing protected header".to_string()))?;
    let signature = entry
        .signature
        .ok_or_else(|| AuthnError::Malformed("missing signature".to_string()))?;

    let header = decode_header(&protected, entry.header.as_ref())?;
    decode_segment("payload", &jws.payload)?;
    decode_segment("signature", &signature)?;

    Ok(ParsedJws {
        header,
        compact: format!("{protected}.{}.{signature}", jws.payload),
    })
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthnError::Malformed(format!("invalid base64url in {name}: {e}")))
}

fn decode_header(segment: &str, unprotected: Option<&Value>) -> Result<JwsHeader> {
    let bytes = decode_segment("header", segment)?;
    let raw: RawHeader = serde_json::from_slice(&bytes)
        .map_err(|e| AuthnError::Malformed(format!("invalid header: {e}")))?;

    // kid may travel in the unprotected header of a JSON serialisation
    let kid = raw.kid.or_else(|| {
        unprotected
            .and_then(|h| h.get("kid"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    Ok(JwsHeader { alg: raw.alg, kid })
}
