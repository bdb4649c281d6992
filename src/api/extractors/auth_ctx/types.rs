/*
 * Responsibility
 * - The "verified caller" type handlers see
 * - The access gate builds it after verification + authorization and stores it
 *   in request extensions
 */
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::services::auth::Claims;

/// Context attached to a request that passed the access gate.
///
/// - `claims`: the full verified claim set
/// - `granted`: scopes or roles resolved through the configured strategy
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub claims: Arc<Claims>,
    pub granted: BTreeSet<String>,
}

impl AuthCtx {
    pub fn new(claims: Claims, granted: BTreeSet<String>) -> Self {
        Self {
            claims: Arc::new(claims),
            granted,
        }
    }
}
