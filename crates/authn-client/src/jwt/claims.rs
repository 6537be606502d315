//! Claim set of a verified identity token

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Seconds since the Unix epoch, as carried by `exp`, `iat`, `nbf`
///
/// Issuers may send fractional seconds; they are truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NumericDate(pub i64);

impl NumericDate {
    /// Seconds since the epoch
    pub fn timestamp(self) -> i64 {
        self.0
    }

    /// As a UTC date-time, if representable
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }
}

impl From<i64> for NumericDate {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

impl<'de> Deserialize<'de> for NumericDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(secs) => Ok(Self(secs)),
            Raw::Float(secs) if secs.is_finite() => Ok(Self(secs.trunc() as i64)),
            Raw::Float(_) => Err(serde::de::Error::custom("NumericDate must be finite")),
        }
    }
}

/// The `aud` claim: one audience or several
///
/// A single audience is serialised as a bare string, several as an array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audience(pub Vec<String>);

impl Audience {
    /// Whether `audience` is one of the token's audiences
    pub fn contains(&self, audience: &str) -> bool {
        self.0.iter().any(|a| a == audience)
    }

    /// Every audience, in token order
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether the token named no audience at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Audience {
    fn from(audience: &str) -> Self {
        Self(vec![audience.to_string()])
    }
}

impl From<Vec<String>> for Audience {
    fn from(audiences: Vec<String>) -> Self {
        Self(audiences)
    }
}

impl Serialize for Audience {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => serializer.serialize_str(single),
            many => many.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            Some(OneOrMany::One(audience)) => Self(vec![audience]),
            Some(OneOrMany::Many(audiences)) => Self(audiences),
            None => Self::default(),
        })
    }
}

/// Claims carried by an identity token
///
/// Only ever handed to callers after the signature and the standard claims
/// have been checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Subject: the account ID
    pub sub: String,
    /// Audience
    #[serde(default, skip_serializing_if = "Audience::is_empty")]
    pub aud: Audience,
    /// Expiration time
    pub exp: NumericDate,
    /// Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<NumericDate>,
    /// Not before
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<NumericDate>,
    /// When the user last authenticated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<NumericDate>,
    /// Session ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Token ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Any other members
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Claims {
    /// Subject (`sub`)
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Look up a non-standard claim
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audience_from_string_or_array() {
        let single: Audience = serde_json::from_value(json!("app.example.com")).unwrap();
        assert_eq!(single, Audience::from("app.example.com"));

        let many: Audience = serde_json::from_value(json!(["a.example", "app.example.com"])).unwrap();
        assert!(many.contains("app.example.com"));
        assert!(!many.contains("b.example"));

        let null: Audience = serde_json::from_value(Value::Null).unwrap();
        assert!(null.is_empty());

        assert!(serde_json::from_value::<Audience>(json!(42)).is_err());
    }

    #[test]
    fn test_audience_serializes_single_as_string() {
        assert_eq!(
            serde_json::to_value(Audience::from("app.example.com")).unwrap(),
            json!("app.example.com")
        );
        assert_eq!(
            serde_json::to_value(Audience(vec!["a".into(), "b".into()])).unwrap(),
            json!(["a", "b"])
        );
    }

    #[test]
    fn test_numeric_date_accepts_float() {
        let date: NumericDate = serde_json::from_value(json!(1_700_000_000.75)).unwrap();
        assert_eq!(date, NumericDate(1_700_000_000));
        assert_eq!(
            date.to_datetime().unwrap().to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
        assert!(serde_json::from_value::<NumericDate>(json!("soon")).is_err());
    }

    #[test]
    fn test_claims_deserialize() {
        let claims: Claims = serde_json::from_value(json!({
            "iss": "https://authn.example.com",
            "sub": "42",
            "aud": "app.example.com",
            "exp": 1_700_003_600,
            "iat": 1_700_000_000,
            "auth_time": 1_700_000_000,
            "sid": "session",
            "roles": ["admin"]
        }))
        .unwrap();

        assert_eq!(claims.subject(), "42");
        assert!(claims.aud.contains("app.example.com"));
        assert_eq!(claims.exp.timestamp(), 1_700_003_600);
        assert_eq!(claims.iat, Some(NumericDate(1_700_000_000)));
        assert_eq!(claims.nbf, None);
        assert_eq!(claims.sid.as_deref(), Some("session"));
        assert_eq!(claims.get("roles"), Some(&json!(["admin"])));
        assert!(!claims.extra.contains_key("sub"));
    }

    #[test]
    fn test_claims_require_sub_and_exp() {
        assert!(serde_json::from_value::<Claims>(json!({"exp": 1})).is_err());
        assert!(serde_json::from_value::<Claims>(json!({"sub": "42"})).is_err());

        let minimal: Claims = serde_json::from_value(json!({"sub": "42", "exp": 1})).unwrap();
        assert!(minimal.iss.is_empty());
        assert!(minimal.aud.is_empty());
    }
}
