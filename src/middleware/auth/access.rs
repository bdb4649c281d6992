//! Access gate: bearer token → verified claims → granted set → route requirement.
//!
//! Applied per route with `route_layer`, so paths and methods that match no
//! handler fall through to the 404 fallback without touching credentials.
//!
//! On success `AuthCtx` is inserted into request extensions; handlers read it
//! through `AuthCtxExtractor`. On failure the request never reaches the handler.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{Requirement, policy, verifier};
use crate::state::AppState;

#[derive(Clone)]
struct Gate {
    state: AppState,
    requirement: Requirement,
}

/// Protect every handler of `route` with `requirement`.
///
/// ```ignore
/// .route("/resources", gate(get(list_resources), &state, Requirement::any_of(["read"])))
/// ```
pub fn gate(
    route: MethodRouter<AppState>,
    state: &AppState,
    requirement: Requirement,
) -> MethodRouter<AppState> {
    let gate = Gate {
        state: state.clone(),
        requirement,
    };
    route.route_layer(middleware::from_fn_with_state(gate, access_middleware))
}

async fn access_middleware(
    State(gate): State<Gate>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = match verifier::bearer_token(req.headers()) {
        Ok(token) => token,
        Err(err) => {
            tracing::debug!(
                method = %req.method(),
                path = %req.uri().path(),
                "request without bearer token"
            );
            return Err(err.into());
        }
    };

    let claims = match gate.state.verifier.verify(token).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                code = err.code(),
                error = %err,
                method = %req.method(),
                path = %req.uri().path(),
                "access token verification failed"
            );
            return Err(err.into());
        }
    };

    let granted = gate.state.strategy.granted(&claims);
    if let Err(denied) = policy::authorize(&gate.requirement, &granted) {
        tracing::warn!(
            sub = %claims.sub,
            required = ?denied.required,
            actual = ?denied.actual,
            path = %req.uri().path(),
            "insufficient permission"
        );
        return Err(denied.into());
    }

    tracing::debug!(sub = %claims.sub, granted = ?granted, "access granted");

    // middleware → extractor
    req.extensions_mut().insert(AuthCtx::new(claims, granted));

    Ok(next.run(req).await)
}
