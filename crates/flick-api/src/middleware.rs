use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::auth::{SESSION_COOKIE, verify_token};
use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

/// Resolve the session token from the session cookie or an
/// `Authorization: Bearer` header and attach the `Principal` to the request.
/// Requests without a valid session, or whose user no longer exists, stop
/// here with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(&req).ok_or(ApiError::Unauthenticated)?;
    let principal = verify_token(&state.session, &token)?;

    let user_id = principal.user_id;
    if run_blocking(&state, move |db| db.get_user(user_id)).await?.is_none() {
        warn!("Session token for unknown user {}", user_id);
        return Err(ApiError::Unauthenticated);
    }

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

fn session_token(req: &Request) -> Option<String> {
    let jar = CookieJar::from_headers(req.headers());
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}
