/*
 * Responsibility
 * - Read settings from the environment (.env supported) once at startup
 * - Derive issuer / JWKS URL from the identity provider settings
 * - Validate values (missing or invalid -> startup fails)
 * - The resulting Config is immutable and shared by reference
 */
#[cfg(test)]
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::{Host, Url};

use crate::services::auth::policy::Strategy;

const MAX_JWKS_FETCH_TIMEOUT_MS: u64 = 10_000;
const MIN_JWKS_FETCH_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProvider {
    Auth0,
    Keycloak,
}

impl AuthProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auth0 => "auth0",
            Self::Keycloak => "keycloak",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where verification keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySourceConfig {
    Remote {
        jwks_url: Url,
        cache_ttl: Duration,
        fetch_timeout: Duration,
        // minimum gap between two JWKS fetches triggered by unknown kids
        refresh_cooldown: Duration,
    },
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub provider: AuthProvider,
    pub issuer: String,
    pub audience: String,
    pub leeway_seconds: u64,
    pub keys: KeySourceConfig,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,

    pub auth: AuthConfig,

    // Both paths set; whether the files exist is checked at startup.
    pub tls: Option<TlsConfig>,
}

/// Environment-like key lookup.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T: std::str::FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid(key)),
            None => Ok(default),
        }
    }

    fn flag(&self, key: &'static str) -> Result<bool, ConfigError> {
        match self.get(key).map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("0" | "false" | "no" | "off") => Ok(false),
            Some("1" | "true" | "yes" | "on") => Ok(true),
            Some(_) => Err(ConfigError::Invalid(key)),
        }
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

// http is only tolerated for loopback hosts (local IdP / tests).
fn validate_jwks_url(raw: &str, key: &'static str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::Invalid(key))?;

    let loopback = match url.host() {
        Some(Host::Domain(d)) => d == "localhost",
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };

    match url.scheme() {
        "https" => Ok(url),
        "http" if loopback => Ok(url),
        _ => Err(ConfigError::Invalid(key)),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[cfg(test)]
    pub fn from_map(map: &HashMap<&str, &str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(lookup);

        let port: u16 = vars.parsed("PORT", 3000)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(vars.get("APP_ENV"));
        let cors_allowed_origins = vars.list("CORS_ALLOWED_ORIGINS");

        let request_timeout = Duration::from_secs(vars.parsed("REQUEST_TIMEOUT_SECONDS", 30)?);
        let request_body_limit_bytes = vars.parsed("REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;

        let auth = Self::auth_from(&vars)?;

        let tls = match (vars.get("TLS_CERT_PATH"), vars.get("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (Some(_), None) => return Err(ConfigError::Missing("TLS_KEY_PATH")),
            (None, Some(_)) => return Err(ConfigError::Missing("TLS_CERT_PATH")),
            (None, None) => None,
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout,
            request_body_limit_bytes,
            auth,
            tls,
        })
    }

    fn auth_from<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<AuthConfig, ConfigError> {
        if let Some(alg) = vars.get("AUTH_ALGORITHM")
            && alg != "RS256"
        {
            return Err(ConfigError::Invalid("AUTH_ALGORITHM"));
        }

        let provider = match vars
            .required("AUTH_PROVIDER")?
            .to_ascii_lowercase()
            .as_str()
        {
            "auth0" => AuthProvider::Auth0,
            "keycloak" => AuthProvider::Keycloak,
            _ => return Err(ConfigError::Invalid("AUTH_PROVIDER")),
        };

        // Provider defaults: issuer, audience, JWKS location, strategy.
        let (issuer, audience, jwks_url, jwks_key, strategy) = match provider {
            AuthProvider::Auth0 => {
                let domain = vars.required("AUTH0_DOMAIN")?;
                let domain = domain
                    .trim_start_matches("https://")
                    .trim_end_matches('/')
                    .to_string();
                let audience = vars.required("AUTH0_AUDIENCE")?;
                (
                    format!("https://{domain}/"),
                    audience,
                    format!("https://{domain}/.well-known/jwks.json"),
                    "AUTH0_DOMAIN",
                    Strategy::Scope,
                )
            }
            AuthProvider::Keycloak => {
                let base = vars.required("KEYCLOAK_URL")?;
                let realm = vars.required("KEYCLOAK_REALM")?;
                let audience = vars.required("KEYCLOAK_AUDIENCE")?;

                let issuer = format!("{}/realms/{}", base.trim_end_matches('/'), realm);
                let jwks_url = format!("{issuer}/protocol/openid-connect/certs");

                let mut namespaces = vars.list("KEYCLOAK_ROLE_NAMESPACES");
                if namespaces.is_empty() {
                    namespaces.push(audience.clone());
                }
                let strategy = Strategy::Roles {
                    namespaces,
                    include_realm_roles: vars.flag("KEYCLOAK_INCLUDE_REALM_ROLES")?,
                };
                (issuer, audience, jwks_url, "KEYCLOAK_URL", strategy)
            }
        };

        let issuer = vars.get("AUTH_ISSUER").unwrap_or(issuer);

        let strategy = match vars.get("AUTH_STRATEGY").map(|s| s.to_ascii_lowercase()).as_deref() {
            None => strategy,
            Some("scope") => Strategy::Scope,
            Some("roles") => match strategy {
                roles @ Strategy::Roles { .. } => roles,
                Strategy::Scope => {
                    let mut namespaces = vars.list("KEYCLOAK_ROLE_NAMESPACES");
                    if namespaces.is_empty() {
                        namespaces.push(audience.clone());
                    }
                    Strategy::Roles {
                        namespaces,
                        include_realm_roles: vars.flag("KEYCLOAK_INCLUDE_REALM_ROLES")?,
                    }
                }
            },
            Some(_) => return Err(ConfigError::Invalid("AUTH_STRATEGY")),
        };

        let keys = match vars.get("AUTH_JWKS_FILE") {
            Some(path) => KeySourceConfig::File(path.into()),
            None => {
                let (raw, key) = match vars.get("AUTH_JWKS_URL") {
                    Some(url) => (url, "AUTH_JWKS_URL"),
                    None => (jwks_url, jwks_key),
                };
                let timeout_ms = vars
                    .parsed("JWKS_FETCH_TIMEOUT_MS", 3_000u64)?
                    .clamp(MIN_JWKS_FETCH_TIMEOUT_MS, MAX_JWKS_FETCH_TIMEOUT_MS);

                KeySourceConfig::Remote {
                    jwks_url: validate_jwks_url(&raw, key)?,
                    cache_ttl: Duration::from_secs(vars.parsed("JWKS_CACHE_TTL_SECONDS", 600)?),
                    fetch_timeout: Duration::from_millis(timeout_ms),
                    refresh_cooldown: Duration::from_secs(
                        vars.parsed("JWKS_REFRESH_COOLDOWN_SECONDS", 5)?,
                    ),
                }
            }
        };

        Ok(AuthConfig {
            provider,
            issuer,
            audience,
            leeway_seconds: vars.parsed("AUTH_LEEWAY_SECONDS", 60)?,
            keys,
            strategy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keycloak() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("AUTH_PROVIDER", "keycloak"),
            ("KEYCLOAK_URL", "https://sso.example.com/"),
            ("KEYCLOAK_REALM", "demo"),
            ("KEYCLOAK_AUDIENCE", "demo-api"),
        ])
    }

    fn auth0() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("AUTH_PROVIDER", "auth0"),
            ("AUTH0_DOMAIN", "tenant.eu.auth0.com"),
            ("AUTH0_AUDIENCE", "https://api.example.com"),
        ])
    }

    fn remote_url(config: &Config) -> String {
        match &config.auth.keys {
            KeySourceConfig::Remote { jwks_url, .. } => jwks_url.to_string(),
            other => panic!("expected remote keys, got {other:?}"),
        }
    }

    #[test]
    fn keycloak_defaults() {
        let config = Config::from_map(&keycloak()).expect("config");

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.auth.provider, AuthProvider::Keycloak);
        assert_eq!(config.auth.issuer, "https://sso.example.com/realms/demo");
        assert_eq!(
            remote_url(&config),
            "https://sso.example.com/realms/demo/protocol/openid-connect/certs"
        );
        assert_eq!(
            config.auth.strategy,
            Strategy::Roles {
                namespaces: vec!["demo-api".into()],
                include_realm_roles: false,
            }
        );
        assert!(config.tls.is_none());
    }

    #[test]
    fn keycloak_role_namespaces() {
        let mut vars = keycloak();
        vars.insert("KEYCLOAK_ROLE_NAMESPACES", "orders-api, catalog-api");
        vars.insert("KEYCLOAK_INCLUDE_REALM_ROLES", "true");

        let config = Config::from_map(&vars).expect("config");
        assert_eq!(
            config.auth.strategy,
            Strategy::Roles {
                namespaces: vec!["orders-api".into(), "catalog-api".into()],
                include_realm_roles: true,
            }
        );
    }

    #[test]
    fn auth0_defaults() {
        let config = Config::from_map(&auth0()).expect("config");

        assert_eq!(config.auth.issuer, "https://tenant.eu.auth0.com/");
        assert_eq!(config.auth.audience, "https://api.example.com");
        assert_eq!(
            remote_url(&config),
            "https://tenant.eu.auth0.com/.well-known/jwks.json"
        );
        assert_eq!(config.auth.strategy, Strategy::Scope);
    }

    #[test]
    fn missing_and_invalid_values() {
        let mut vars = auth0();
        vars.remove("AUTH0_AUDIENCE");
        assert_eq!(
            Config::from_map(&vars).unwrap_err(),
            ConfigError::Missing("AUTH0_AUDIENCE")
        );

        let mut vars = auth0();
        vars.insert("AUTH_PROVIDER", "okta");
        assert_eq!(
            Config::from_map(&vars).unwrap_err(),
            ConfigError::Invalid("AUTH_PROVIDER")
        );

        let mut vars = auth0();
        vars.insert("AUTH_ALGORITHM", "HS256");
        assert_eq!(
            Config::from_map(&vars).unwrap_err(),
            ConfigError::Invalid("AUTH_ALGORITHM")
        );

        let mut vars = auth0();
        vars.insert("PORT", "http");
        assert_eq!(Config::from_map(&vars).unwrap_err(), ConfigError::Invalid("PORT"));
    }

    #[test]
    fn jwks_url_must_be_https_unless_loopback() {
        let mut vars = keycloak();
        vars.insert("AUTH_JWKS_URL", "http://sso.example.com/certs");
        assert_eq!(
            Config::from_map(&vars).unwrap_err(),
            ConfigError::Invalid("AUTH_JWKS_URL")
        );

        vars.insert("AUTH_JWKS_URL", "http://127.0.0.1:8080/certs");
        assert!(Config::from_map(&vars).is_ok());

        vars.insert("AUTH_JWKS_URL", "http://localhost:8080/certs");
        assert!(Config::from_map(&vars).is_ok());
    }

    #[test]
    fn fetch_timeout_is_bounded() {
        let mut vars = auth0();
        vars.insert("JWKS_FETCH_TIMEOUT_MS", "600000");
        let config = Config::from_map(&vars).expect("config");

        match config.auth.keys {
            KeySourceConfig::Remote { fetch_timeout, .. } => {
                assert_eq!(fetch_timeout, Duration::from_millis(MAX_JWKS_FETCH_TIMEOUT_MS));
            }
            other => panic!("expected remote keys, got {other:?}"),
        }
    }

    #[test]
    fn overrides() {
        let mut vars = auth0();
        vars.insert("AUTH_ISSUER", "https://login.example.com/");
        vars.insert("AUTH_STRATEGY", "roles");
        vars.insert("KEYCLOAK_ROLE_NAMESPACES", "api");
        vars.insert("AUTH_JWKS_FILE", "/etc/bearer-gate/jwks.json");
        vars.insert("TLS_CERT_PATH", "certs/server.crt");
        vars.insert("TLS_KEY_PATH", "certs/server.key");

        let config = Config::from_map(&vars).expect("config");
        assert_eq!(config.auth.issuer, "https://login.example.com/");
        assert_eq!(config.auth.strategy.name(), "roles");
        assert_eq!(
            config.auth.keys,
            KeySourceConfig::File("/etc/bearer-gate/jwks.json".into())
        );
        assert!(config.tls.is_some());
    }

    #[test]
    fn roles_strategy_on_auth0_defaults_to_the_audience_namespace() {
        let mut vars = auth0();
        vars.insert("AUTH_STRATEGY", "roles");

        let config = Config::from_map(&vars).expect("config");
        assert_eq!(
            config.auth.strategy,
            Strategy::Roles {
                namespaces: vec!["https://api.example.com".to_string()],
                include_realm_roles: false,
            }
        );
    }

    #[test]
    fn half_configured_tls_is_rejected() {
        let mut cert_only = keycloak();
        cert_only.insert("TLS_CERT_PATH", "certs/server.crt");
        assert_eq!(
            Config::from_map(&cert_only).unwrap_err(),
            ConfigError::Missing("TLS_KEY_PATH")
        );

        let mut key_only = keycloak();
        key_only.insert("TLS_KEY_PATH", "certs/server.key");
        assert_eq!(
            Config::from_map(&key_only).unwrap_err(),
            ConfigError::Missing("TLS_CERT_PATH")
        );
    }

    #[test]
    fn refresh_cooldown_is_configurable() {
        let mut vars = keycloak();
        vars.insert("JWKS_REFRESH_COOLDOWN_SECONDS", "30");
        let config = Config::from_map(&vars).expect("config");

        match config.auth.keys {
            KeySourceConfig::Remote {
                refresh_cooldown, ..
            } => assert_eq!(refresh_cooldown, Duration::from_secs(30)),
            other => panic!("expected remote keys, got {other:?}"),
        }
    }
}
