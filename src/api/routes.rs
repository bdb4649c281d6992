/*
 * Responsibility
 * - URL structure of the service
 * - Which scope/role each protected route needs (gate per method)
 * - 404 for unknown paths and unsupported methods, ahead of any auth
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{
    api::handlers::{
        fallback::not_found,
        health::health,
        profile::{get_profile, update_profile},
        resources::{create_resource, list_resources, update_resource},
        token_info::token_info,
    },
    middleware::auth::gate,
    services::auth::Requirement,
    state::AppState,
};

const READ: &str = "read";
const WRITE: &str = "write";

pub fn routes(state: &AppState) -> Router<AppState> {
    let read = || Requirement::any_of([READ]);
    let write = || Requirement::any_of([WRITE]);

    let api = Router::new()
        .route("/api/resources", gate(get(list_resources), state, read()))
        .route("/api/resources", gate(post(create_resource), state, write()))
        .route("/api/resources/{id}", gate(put(update_resource), state, write()))
        .route("/api/profile", gate(get(get_profile), state, read()))
        .route("/api/profile", gate(put(update_profile), state, write()))
        .route(
            "/api/token-info",
            gate(get(token_info), state, Requirement::authenticated()),
        );

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .method_not_allowed_fallback(not_found)
        .fallback(not_found)
}
