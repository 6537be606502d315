//! Property tests for subject, audience and issuer handling

mod common;

use authn_client::{AuthnClient, AuthnConfig, AuthnError, StaticKeyProvider};
use common::{AUDIENCE, DEFAULT_KEY, ISSUER, valid_claims};
use jsonwebtoken::jwk::Jwk;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn client_for(issuer: &str) -> AuthnClient {
    let jwk: Jwk = serde_json::from_value(DEFAULT_KEY.jwk.clone()).unwrap();
    AuthnClient::with_key_provider(
        AuthnConfig::new(issuer, AUDIENCE),
        Arc::new(StaticKeyProvider::single(jwk)),
    )
    .unwrap()
}

fn verify(client: &AuthnClient, claims: &serde_json::Value) -> Result<String, AuthnError> {
    let token = DEFAULT_KEY.sign(claims);
    tokio_test::block_on(client.subject_from(&token))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_subject_round_trips(sub in "[a-zA-Z0-9_@.-]{1,40}") {
        let client = client_for(ISSUER);
        prop_assert_eq!(verify(&client, &valid_claims(&sub)).unwrap(), sub);
    }

    #[test]
    fn prop_audience_containment(
        others in prop::collection::vec("[a-z]{1,10}\\.example\\.org", 0..4),
        position in 0usize..4,
        as_string in any::<bool>(),
    ) {
        let client = client_for(ISSUER);

        let mut with_ours = others.clone();
        with_ours.insert(position.min(others.len()), AUDIENCE.to_string());
        let mut claims = valid_claims("42");
        claims["aud"] = if as_string && others.is_empty() {
            json!(AUDIENCE)
        } else {
            json!(with_ours)
        };
        prop_assert!(verify(&client, &claims).is_ok());

        claims["aud"] = json!(others);
        prop_assert!(matches!(verify(&client, &claims), Err(AuthnError::InvalidAudience)));
    }

    #[test]
    fn prop_issuer_trailing_slash_equivalence(
        host in "[a-z]{1,12}\\.example",
        segments in prop::collection::vec("[a-z]{1,8}", 0..3),
        configured_slash in any::<bool>(),
        token_slash in any::<bool>(),
    ) {
        let base = format!("https://{host}/{}", segments.join("/"));
        let base = base.trim_end_matches('/');
        let configured = if configured_slash { format!("{base}/") } else { base.to_string() };
        let presented = if token_slash { format!("{base}/") } else { base.to_string() };

        let client = client_for(&configured);
        let mut claims = valid_claims("42");
        claims["iss"] = json!(presented);
        prop_assert!(verify(&client, &claims).is_ok());

        claims["iss"] = json!(format!("https://other-{host}"));
        prop_assert!(matches!(verify(&client, &claims), Err(AuthnError::InvalidIssuer)));
    }
}
