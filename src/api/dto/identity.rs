/*
 * Responsibility
 * - Identity echo shared by every protected response
 */
use std::collections::BTreeSet;

use serde::Serialize;

use crate::api::extractors::AuthCtx;

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub sub: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub granted: BTreeSet<String>,
}

impl From<&AuthCtx> for IdentityResponse {
    fn from(ctx: &AuthCtx) -> Self {
        let claims = &ctx.claims;
        Self {
            sub: claims.sub.clone(),
            username: claims.username().to_string(),
            email: claims.email.clone(),
            name: claims.name.clone(),
            client_id: claims.client_id().map(str::to_owned),
            granted: ctx.granted.clone(),
        }
    }
}
