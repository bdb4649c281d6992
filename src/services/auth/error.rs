/*
 * Responsibility
 * - Failure kinds of token verification and key resolution
 * - Each kind carries a stable machine-readable code (used in error bodies and logs)
 * - HTTP mapping lives in crate::error, not here
 */
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("missing or malformed Authorization header")]
    MissingToken,

    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    #[error("invalid signature: {0}")]
    InvalidSignature(&'static str),

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("issuer mismatch")]
    IssuerMismatch,

    #[error("audience mismatch")]
    AudienceMismatch,

    #[error("no signing key for kid {kid:?}")]
    KeyNotFound { kid: String },

    #[error("signing key source unavailable: {0}")]
    KeySourceUnavailable(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MissingToken",
            Self::MalformedToken(_) => "MalformedToken",
            Self::InvalidSignature(_) => "InvalidSignature",
            Self::Expired => "Expired",
            Self::NotYetValid => "NotYetValid",
            Self::IssuerMismatch => "IssuerMismatch",
            Self::AudienceMismatch => "AudienceMismatch",
            Self::KeyNotFound { .. } => "KeyNotFound",
            Self::KeySourceUnavailable(_) => "KeySourceUnavailable",
        }
    }

    /// Message safe to return to the client.
    ///
    /// `KeySourceUnavailable` keeps its upstream detail in logs only.
    pub fn public_message(&self) -> String {
        match self {
            Self::KeySourceUnavailable(_) => "signing keys are temporarily unavailable".into(),
            other => other.to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature("signature does not verify"),
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::InvalidSignature("unsupported signing algorithm")
            }
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidIssuer => Self::IssuerMismatch,
            ErrorKind::InvalidAudience => Self::AudienceMismatch,
            ErrorKind::MissingRequiredClaim(_) => Self::MalformedToken("missing required claim"),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::InvalidSignature("signing key is not usable")
            }
            _ => Self::MalformedToken("token could not be decoded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::{Error as JwtError, ErrorKind};

    #[test]
    fn codes_are_distinct_per_kind() {
        let all = [
            AuthError::MissingToken,
            AuthError::MalformedToken("x"),
            AuthError::InvalidSignature("x"),
            AuthError::Expired,
            AuthError::NotYetValid,
            AuthError::IssuerMismatch,
            AuthError::AudienceMismatch,
            AuthError::KeyNotFound { kid: "k".into() },
            AuthError::KeySourceUnavailable("down".into()),
        ];
        let codes: std::collections::HashSet<_> = all.iter().map(AuthError::code).collect();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn jwt_error_kinds_map_to_taxonomy() {
        let expired: AuthError = JwtError::from(ErrorKind::ExpiredSignature).into();
        assert_eq!(expired.code(), "Expired");

        let iss: AuthError = JwtError::from(ErrorKind::InvalidIssuer).into();
        assert_eq!(iss.code(), "IssuerMismatch");

        let aud: AuthError = JwtError::from(ErrorKind::InvalidAudience).into();
        assert_eq!(aud.code(), "AudienceMismatch");

        let sig: AuthError = JwtError::from(ErrorKind::InvalidSignature).into();
        assert_eq!(sig.code(), "InvalidSignature");
    }

    #[test]
    fn upstream_detail_is_not_public() {
        let err = AuthError::KeySourceUnavailable("connect to 10.0.0.3:443 refused".into());
        assert!(!err.public_message().contains("10.0.0.3"));
    }
}
