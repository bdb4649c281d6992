/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 *   - verifier: signature / claims checks, owns the key source
 *   - strategy: where granted scopes or roles are read from
 * - Cheap to Clone (everything behind Arc)
 */
use std::sync::Arc;

use crate::services::auth::{Strategy, TokenVerifier};

#[derive(Clone, Debug)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub strategy: Arc<Strategy>,
}

impl AppState {
    pub fn new(verifier: Arc<TokenVerifier>, strategy: Strategy) -> Self {
        Self {
            verifier,
            strategy: Arc::new(strategy),
        }
    }
}
