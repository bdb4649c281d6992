/// Factory: build the `TokenVerifier` (and its key source) from application `Config`.
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{AuthConfig, KeySourceConfig};
use crate::services::auth::{
    TokenVerifier,
    jwks::{JwksKeyResolver, KeySource, StaticKeySet},
};

pub fn build_verifier(auth: &AuthConfig) -> Result<Arc<TokenVerifier>> {
    let keys: Arc<dyn KeySource> = match &auth.keys {
        KeySourceConfig::Remote {
            jwks_url,
            cache_ttl,
            fetch_timeout,
            refresh_cooldown,
        } => Arc::new(
            JwksKeyResolver::new(
                jwks_url.clone(),
                *cache_ttl,
                *fetch_timeout,
                *refresh_cooldown,
            )
            .context("failed to build JWKS http client")?,
        ),
        KeySourceConfig::File(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read JWKS file {}", path.display()))?;
            let set = StaticKeySet::from_jwks_json(path.display().to_string(), &json)
                .with_context(|| format!("invalid JWKS file {}", path.display()))?;
            Arc::new(set)
        }
    };

    Ok(Arc::new(TokenVerifier::new(
        keys,
        &auth.issuer,
        &auth.audience,
        auth.leeway_seconds,
    )))
}
