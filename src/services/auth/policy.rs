//! Authorization predicate: route requirement vs. what the token grants.
//!
//! Everything here is pure. The gate middleware resolves the granted set from
//! verified `Claims` through the configured `Strategy`, then calls `authorize`.
//!
//! Matching is "at least one of": a route declaring `{read, admin}` admits a
//! token granting only `read`.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::services::auth::claims::Claims;

/// Where granted permissions are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Space-delimited `scope` claim.
    Scope,
    /// Union of `resource_access.<ns>.roles` across `namespaces`,
    /// plus `realm_access.roles` when `include_realm_roles` is set.
    Roles {
        namespaces: Vec<String>,
        include_realm_roles: bool,
    },
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scope => "scope",
            Self::Roles { .. } => "roles",
        }
    }

    pub fn granted(&self, claims: &Claims) -> BTreeSet<String> {
        match self {
            Self::Scope => claims.scopes(),
            Self::Roles {
                namespaces,
                include_realm_roles,
            } => {
                let mut granted: BTreeSet<String> = namespaces
                    .iter()
                    .flat_map(|ns| claims.resource_roles(ns))
                    .cloned()
                    .collect();
                if *include_realm_roles {
                    granted.extend(claims.realm_roles().iter().cloned());
                }
                granted
            }
        }
    }
}

/// Acceptable scopes/roles for one route. Built once when the router is assembled.
#[derive(Debug, Clone)]
pub struct Requirement {
    // None: any verified token is enough
    any_of: Option<Arc<BTreeSet<String>>>,
}

impl Requirement {
    pub fn any_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            any_of: Some(Arc::new(values.into_iter().map(Into::into).collect())),
        }
    }

    pub fn authenticated() -> Self {
        Self { any_of: None }
    }

    pub fn required(&self) -> Option<&BTreeSet<String>> {
        self.any_of.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("insufficient permission: requires one of {required:?}, token grants {actual:?}")]
pub struct Denied {
    pub required: BTreeSet<String>,
    pub actual: BTreeSet<String>,
}

pub fn authorize(requirement: &Requirement, granted: &BTreeSet<String>) -> Result<(), Denied> {
    let Some(required) = requirement.required() else {
        return Ok(());
    };

    if required.intersection(granted).next().is_some() {
        Ok(())
    } else {
        Err(Denied {
            required: required.clone(),
            actual: granted.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn claims(v: serde_json::Value) -> Claims {
        let mut base = json!({"sub": "u", "iss": "i", "aud": "a", "exp": 1});
        if let (Some(base), Some(extra)) = (base.as_object_mut(), v.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(base).expect("claims")
    }

    #[test]
    fn scope_admits_on_intersection() {
        let c = claims(json!({"scope": "read write"}));
        let granted = Strategy::Scope.granted(&c);

        assert!(authorize(&Requirement::any_of(["read"]), &granted).is_ok());
    }

    #[test]
    fn scope_denies_and_reports_both_sets() {
        let c = claims(json!({"scope": "read write"}));
        let granted = Strategy::Scope.granted(&c);

        let denied = authorize(&Requirement::any_of(["admin"]), &granted).unwrap_err();
        assert_eq!(denied.required, set(&["admin"]));
        assert_eq!(denied.actual, set(&["read", "write"]));
    }

    #[test]
    fn any_of_not_all_of() {
        let granted = set(&["read"]);
        assert!(authorize(&Requirement::any_of(["read", "admin"]), &granted).is_ok());
    }

    #[test]
    fn missing_scope_claim_grants_nothing() {
        let c = claims(json!({}));
        let granted = Strategy::Scope.granted(&c);
        assert!(granted.is_empty());
        assert!(authorize(&Requirement::any_of(["read"]), &granted).is_err());
    }

    #[test]
    fn roles_union_across_namespaces() {
        let c = claims(json!({
            "resource_access": {
                "orders-api": {"roles": ["write"]},
                "catalog-api": {"roles": ["read"]},
                "unrelated": {"roles": ["admin"]}
            }
        }));
        let strategy = Strategy::Roles {
            namespaces: vec!["orders-api".into(), "catalog-api".into()],
            include_realm_roles: false,
        };
        let granted = strategy.granted(&c);

        assert_eq!(granted, set(&["read", "write"]));
        assert!(authorize(&Requirement::any_of(["read"]), &granted).is_ok());
        assert!(authorize(&Requirement::any_of(["admin"]), &granted).is_err());
    }

    #[test]
    fn realm_roles_only_when_enabled() {
        let c = claims(json!({"realm_access": {"roles": ["read"]}}));

        let without = Strategy::Roles {
            namespaces: vec!["demo".into()],
            include_realm_roles: false,
        };
        assert!(without.granted(&c).is_empty());

        let with = Strategy::Roles {
            namespaces: vec!["demo".into()],
            include_realm_roles: true,
        };
        assert_eq!(with.granted(&c), set(&["read"]));
    }

    #[test]
    fn authenticated_requirement_admits_empty_grant() {
        assert!(authorize(&Requirement::authenticated(), &BTreeSet::new()).is_ok());
    }

    #[test]
    fn empty_requirement_set_never_admits() {
        let r = Requirement::any_of(Vec::<String>::new());
        assert!(authorize(&r, &set(&["read"])).is_err());
    }
}
