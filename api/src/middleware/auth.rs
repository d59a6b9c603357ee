use axum::{
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use common::auth::bearer_token;

use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// Authentication middleware: scheduler internals are for superusers only
#[tracing::instrument(skip(state, req, next))]
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ErrorResponse> {
    if !state.config.auth.enabled {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = bearer_token(auth_header).map_err(|e| {
        tracing::warn!(path = %req.uri().path(), "Missing or malformed authorization header");
        ErrorResponse::from(e)
    })?;

    let claims = state
        .jwt
        .authorize_superuser(token, req.uri().path())
        .map_err(|e| {
            tracing::warn!(path = %req.uri().path(), error = %e, "Task info access denied");
            ErrorResponse::from(e)
        })?;

    tracing::info!(
        user_id = %claims.sub,
        username = %claims.username,
        method = %req.method(),
        path = %req.uri().path(),
        "Task info access"
    );

    // Insert claims into request extensions for use by handlers
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
