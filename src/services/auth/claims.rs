/*
 * Responsibility
 * - Typed view of a verified access token payload
 * - Optional provider-specific fields (Auth0 scope/permissions, Keycloak realm/resource roles)
 * - Defined fallback order for identity fields instead of ad hoc lookups in handlers
 */
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::One(s) => s == value,
            Self::Many(v) => v.iter().any(|s| s == value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleSet {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims of a verified access token.
///
/// Only constructed by `TokenVerifier` after signature, issuer, audience and
/// time checks have passed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: Audience,
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    // space-delimited (RFC 8693 / Auth0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    // Auth0 RBAC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    // Keycloak
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RoleSet>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_access: BTreeMap<String, RoleSet>,
}

impl Claims {
    /// `azp`, then `client_id`.
    pub fn client_id(&self) -> Option<&str> {
        self.azp.as_deref().or(self.client_id.as_deref())
    }

    /// `preferred_username`, then `email`, then `sub`.
    pub fn username(&self) -> &str {
        self.preferred_username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.sub)
    }

    pub fn scopes(&self) -> BTreeSet<String> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_owned)
            .collect()
    }

    pub fn realm_roles(&self) -> &[String] {
        self.realm_access
            .as_ref()
            .map(|r| r.roles.as_slice())
            .unwrap_or_default()
    }

    pub fn resource_roles(&self, namespace: &str) -> &[String] {
        self.resource_access
            .get(namespace)
            .map(|r| r.roles.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> Claims {
        serde_json::from_value(v).expect("claims")
    }

    #[test]
    fn audience_accepts_string_or_array() {
        let one = parse(json!({"sub": "u", "iss": "i", "aud": "api", "exp": 1}));
        assert!(one.aud.contains("api"));

        let many = parse(json!({"sub": "u", "iss": "i", "aud": ["account", "api"], "exp": 1}));
        assert!(many.aud.contains("api"));
        assert!(!many.aud.contains("other"));
    }

    #[test]
    fn identity_fallbacks() {
        let c = parse(json!({
            "sub": "user-1", "iss": "i", "aud": "a", "exp": 1,
            "client_id": "cli", "email": "u@example.com"
        }));
        assert_eq!(c.client_id(), Some("cli"));
        assert_eq!(c.username(), "u@example.com");

        let c = parse(json!({
            "sub": "user-1", "iss": "i", "aud": "a", "exp": 1,
            "azp": "spa", "client_id": "cli", "preferred_username": "alice"
        }));
        assert_eq!(c.client_id(), Some("spa"));
        assert_eq!(c.username(), "alice");

        let bare = parse(json!({"sub": "user-1", "iss": "i", "aud": "a", "exp": 1}));
        assert_eq!(bare.username(), "user-1");
        assert_eq!(bare.client_id(), None);
    }

    #[test]
    fn scope_split_ignores_extra_whitespace() {
        let c = parse(json!({
            "sub": "u", "iss": "i", "aud": "a", "exp": 1,
            "scope": "  read   write "
        }));
        let scopes: Vec<_> = c.scopes().into_iter().collect();
        assert_eq!(scopes, ["read", "write"]);
    }

    #[test]
    fn role_maps_default_to_empty() {
        let c = parse(json!({
            "sub": "u", "iss": "i", "aud": "a", "exp": 1,
            "resource_access": {"demo-api": {"roles": ["write"]}}
        }));
        assert_eq!(c.resource_roles("demo-api"), ["write"]);
        assert!(c.resource_roles("missing").is_empty());
        assert!(c.realm_roles().is_empty());
    }
}
