//! Test fixtures: fixed RSA keys, JWKS documents and token signing helpers.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

pub const ISSUER: &str = "https://idp.test/realms/demo";
pub const AUDIENCE: &str = "demo-api";
pub const KID: &str = "primary-2026";

const PRIMARY_PEM: &str = include_str!("../../../testdata/rs256_primary.pem");
const FOREIGN_PEM: &str = include_str!("../../../testdata/rs256_foreign.pem");

// modulus of rs256_primary.pem, base64url without padding
const PRIMARY_N: &str = "vBCtryQVI-eoj1BHHNhB5dWZuOTX6f-96MY6jZRRD0JOPDUr2A2W1pEQ1FVWO1luEM2rENqZtPfTSuDAbqn44aGWFJJk5Vi3otJXyrXfevEA2hQX7jmYq80IJb1POQDLA1qVq50qFFVy4X8ml1Nsj10XKB2aIUkrSaDkIHxD-UvovBCA3uOTEhKfAZQGiZdyETgoLi5ZeibDeNOQXoyKbzrODe2pJ2EqZucT9bXDElCKuyH8sFOcfNmQL3WJlLXsMUIIC21p5WoesiziBZOUJNr2ME_rE6CPfNHA6iHSbLJ03AChdShxQgKDMmJlc0Rd67nhi6Z3C3n5DnCDTHrwbw";

pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Public JWK for the primary key under `kid`.
pub fn primary_jwk(kid: &str) -> Value {
    json!({
        "kty": "RSA",
        "use": "sig",
        "alg": "RS256",
        "kid": kid,
        "n": PRIMARY_N,
        "e": "AQAB"
    })
}

/// JWKS publishing the primary key under each of `kids`.
pub fn jwks(kids: &[&str]) -> Value {
    json!({ "keys": kids.iter().map(|kid| primary_jwk(kid)).collect::<Vec<_>>() })
}

/// Claims accepted by a verifier configured with `ISSUER` / `AUDIENCE`.
pub fn claims() -> Value {
    let now = now();
    json!({
        "sub": "user-123",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "iat": now,
        "exp": now + 300,
        "azp": "demo-spa",
        "preferred_username": "alice",
        "email": "alice@example.com",
        "scope": "openid read write",
        "resource_access": {
            "demo-api": {"roles": ["read"]},
            "reports-api": {"roles": ["write"]}
        }
    })
}

/// `claims()` with the given top-level fields replaced.
pub fn claims_with(overrides: Value) -> Value {
    let mut base = claims();
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in overrides {
            base.insert(k.clone(), v.clone());
        }
    }
    base
}

fn sign_with(pem: &str, kid: Option<&str>, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_owned);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("test rsa pem");
    jsonwebtoken::encode(&header, claims, &key).expect("sign test token")
}

pub fn sign(kid: &str, claims: &Value) -> String {
    sign_with(PRIMARY_PEM, Some(kid), claims)
}

pub fn sign_without_kid(claims: &Value) -> String {
    sign_with(PRIMARY_PEM, None, claims)
}

/// Signed with a key that is not published in any test JWKS.
pub fn sign_foreign(kid: &str, claims: &Value) -> String {
    sign_with(FOREIGN_PEM, Some(kid), claims)
}

/// HMAC-signed token, used to exercise algorithm confusion.
pub fn sign_hs256(kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_owned());
    let key = EncodingKey::from_secret(PRIMARY_N.as_bytes());
    jsonwebtoken::encode(&header, claims, &key).expect("sign hs256 token")
}

/// Unsigned token with `alg: none`.
pub fn unsigned(kid: &str, claims: &Value) -> String {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    let header = json!({"alg": "none", "typ": "JWT", "kid": kid});
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}
