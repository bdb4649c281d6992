//! Signing key resolution (`kid` -> RS256 public key).
//!
//! Two sources implement `KeySource`:
//! - `JwksKeyResolver`: fetches the provider's JWKS over HTTPS and caches keys
//!   per `kid` for a bounded TTL. An unknown `kid` triggers a refetch, so
//!   rotated keys are picked up without waiting for the TTL. Refetches are
//!   spaced by a cooldown: inside it, a `kid` the last fetch did not publish
//!   is `KeyNotFound` without touching the network.
//! - `StaticKeySet`: keys loaded once from a local JWKS document (no network).
//!
//! Concurrent misses for the same `kid` share one fetch (`try_get_with`).
//! Failed lookups are never cached, and an abandoned fetch leaves the cache
//! untouched.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::{
    DecodingKey,
    jwk::{AlgorithmParameters, Jwk, KeyAlgorithm, PublicKeyUse},
};
use moka::future::Cache;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::services::auth::error::AuthError;

const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

#[async_trait]
pub trait KeySource: Send + Sync {
    /// Short human-readable origin of the keys (for logs).
    fn describe(&self) -> String;

    async fn resolve(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError>;
}

// Entries are parsed one by one so a single unsupported key does not
// invalidate the whole set.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    #[serde(default)]
    keys: Vec<serde_json::Value>,
}

/// Usable RS256 verification keys of a JWKS document, by `kid`.
///
/// Skips keys that are not RSA, are marked for encryption, declare another
/// algorithm, or lack a `kid`.
fn rs256_keys(doc: JwksDocument) -> Vec<(String, DecodingKey)> {
    doc.keys
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<Jwk>(raw).ok())
        .filter_map(|jwk| {
            let kid = jwk.common.key_id.clone().filter(|k| !k.is_empty())?;

            if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
                return None;
            }
            if !matches!(jwk.common.key_algorithm, None | Some(KeyAlgorithm::RS256)) {
                return None;
            }
            let AlgorithmParameters::RSA(rsa) = &jwk.algorithm else {
                return None;
            };

            match DecodingKey::from_rsa_components(&rsa.n, &rsa.e) {
                Ok(key) => Some((kid, key)),
                Err(err) => {
                    warn!(kid = %kid, error = %err, "skipping unusable RSA key in JWKS");
                    None
                }
            }
        })
        .collect()
}

/// Remote JWKS with a per-`kid` TTL cache.
///
/// Key material is not printable via Debug.
pub struct JwksKeyResolver {
    jwks_url: Url,
    http: reqwest::Client,
    cache: Cache<String, Arc<DecodingKey>>,
    refresh_cooldown: Duration,
    // Held across a fetch, so refreshes for different kids never overlap.
    last_refresh: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for JwksKeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksKeyResolver")
            .field("jwks_url", &self.jwks_url.as_str())
            .field("cached_keys", &self.cache.entry_count())
            .finish()
    }
}

impl JwksKeyResolver {
    /// `fetch_timeout` bounds the whole request (connect, headers and body).
    pub fn new(
        jwks_url: Url,
        cache_ttl: Duration,
        fetch_timeout: Duration,
        refresh_cooldown: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .connect_timeout(fetch_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(DEFAULT_CACHE_CAPACITY)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            jwks_url,
            http,
            cache,
            refresh_cooldown,
            last_refresh: Mutex::new(None),
        })
    }

    async fn fetch_document(&self) -> Result<JwksDocument, AuthError> {
        info!(jwks_url = %self.jwks_url, "fetching JWKS");

        let response = self
            .http
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| {
                warn!(jwks_url = %self.jwks_url, timeout = e.is_timeout(), error = %e, "JWKS request failed");
                AuthError::KeySourceUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(jwks_url = %self.jwks_url, %status, "JWKS endpoint returned error status");
            return Err(AuthError::KeySourceUnavailable(format!(
                "JWKS endpoint returned status {status}"
            )));
        }

        response.json::<JwksDocument>().await.map_err(|e| {
            warn!(jwks_url = %self.jwks_url, error = %e, "JWKS response is not a key set");
            AuthError::KeySourceUnavailable(format!("invalid JWKS document: {e}"))
        })
    }

    /// Fetch the full set, cache every usable key, return the one for `kid`.
    ///
    /// Inside the cooldown only keys cached by the previous fetch are served.
    async fn refresh(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        let mut last_refresh = self.last_refresh.lock().await;

        if let Some(at) = *last_refresh
            && at.elapsed() < self.refresh_cooldown
        {
            // a concurrent refresh may have published it while we waited
            if let Some(key) = self.cache.get(kid).await {
                return Ok(key);
            }
            debug!(kid = %kid, "unknown kid inside JWKS refresh cooldown");
            return Err(AuthError::KeyNotFound {
                kid: kid.to_owned(),
            });
        }

        let keys = rs256_keys(self.fetch_document().await?);
        *last_refresh = Some(Instant::now());
        debug!(count = keys.len(), "JWKS usable keys");

        let mut wanted = None;
        for (id, key) in keys {
            let key = Arc::new(key);
            if id == kid {
                wanted = Some(key);
            } else {
                self.cache.insert(id, key).await;
            }
        }

        wanted.ok_or_else(|| {
            warn!(kid = %kid, "kid not present in JWKS after refresh");
            AuthError::KeyNotFound {
                kid: kid.to_owned(),
            }
        })
    }
}

#[async_trait]
impl KeySource for JwksKeyResolver {
    fn describe(&self) -> String {
        self.jwks_url.to_string()
    }

    async fn resolve(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        self.cache
            .try_get_with(kid.to_owned(), self.refresh(kid))
            .await
            .map_err(Arc::unwrap_or_clone)
    }
}

/// Keys from a local JWKS document. Never touches the network.
pub struct StaticKeySet {
    origin: String,
    keys: HashMap<String, Arc<DecodingKey>>,
}

impl StaticKeySet {
    pub fn from_jwks_json(origin: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        let doc: JwksDocument = serde_json::from_str(json)?;
        let keys = rs256_keys(doc)
            .into_iter()
            .map(|(kid, key)| (kid, Arc::new(key)))
            .collect();

        Ok(Self {
            origin: origin.into(),
            keys,
        })
    }
}

#[async_trait]
impl KeySource for StaticKeySet {
    fn describe(&self) -> String {
        format!("{} ({} keys)", self.origin, self.keys.len())
    }

    async fn resolve(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        self.keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::KeyNotFound {
                kid: kid.to_owned(),
            })
    }
}
