use std::sync::Arc;

use axum::http::{HeaderMap, header};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{Algorithm, Validation};
use serde::Deserialize;

use crate::services::auth::{claims::Claims, error::AuthError, jwks::KeySource};

/// The only accepted JOSE `alg`.
const ALLOWED_ALG: &str = "RS256";

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively (RFC 7235). Absent header, other
/// schemes and empty tokens are all `MissingToken`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

// Unverified header fields. Read before any key lookup so that the
// algorithm can be rejected without touching the key source.
#[derive(Debug, Deserialize)]
struct RawHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTimes {
    #[serde(default)]
    exp: Option<i64>,
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::MalformedToken("segment is not base64url"))?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken("segment is not JSON"))
}

/// RS256 access-token verifier.
///
/// Configuration (issuer, audience, leeway) is fixed at construction.
pub struct TokenVerifier {
    keys: Arc<dyn KeySource>,
    validation: Validation,
    leeway_seconds: i64,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("keys", &self.keys.describe())
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(keys: Arc<dyn KeySource>, issuer: &str, audience: &str, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_nbf = true;
        validation.leeway = leeway_seconds;

        Self {
            keys,
            validation,
            leeway_seconds: i64::try_from(leeway_seconds).unwrap_or(i64::MAX),
        }
    }

    pub fn key_source(&self) -> &dyn KeySource {
        self.keys.as_ref()
    }

    /// Verify signature and standard claims, then return the typed claims.
    ///
    /// Order:
    /// 1. structure + `alg` (must be RS256, no key lookup otherwise)
    /// 2. `kid` present
    /// 3. unverified `exp` (an expired token never reaches the key source)
    /// 4. key resolution, signature, `iss` / `aud` / `exp` / `nbf`
    /// 5. `iat` not in the future
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(_sig), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedToken("expected three segments"));
        };

        let header: RawHeader = decode_segment(header)?;
        if header.alg != ALLOWED_ALG {
            return Err(AuthError::InvalidSignature("unsupported signing algorithm"));
        }

        let kid = header
            .kid
            .filter(|k| !k.is_empty())
            .ok_or(AuthError::MalformedToken("missing kid"))?;

        let now = Utc::now().timestamp();
        let times: RawTimes = decode_segment(payload)?;
        if let Some(exp) = times.exp
            && exp.saturating_add(self.leeway_seconds) < now
        {
            return Err(AuthError::Expired);
        }

        let key = self.keys.resolve(&kid).await?;
        let data = jsonwebtoken::decode::<Claims>(token, &key, &self.validation)?;
        let claims = data.claims;

        if let Some(iat) = claims.iat
            && iat > now.saturating_add(self.leeway_seconds)
        {
            return Err(AuthError::NotYetValid);
        }

        Ok(claims)
    }
}
