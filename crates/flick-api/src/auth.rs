use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use tracing::{info, warn};

use flick_types::api::{Claims, Principal, ProviderInfo, SessionResponse};
use flick_types::models::User;

use crate::error::ApiError;
use crate::oauth::{Provider, ProviderConfig};
use crate::state::{AppState, SessionSettings, run_blocking};

pub const SESSION_COOKIE: &str = "flick_session";
const STATE_COOKIE: &str = "flick_oauth_state";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /api/auth/providers
pub async fn providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    let providers = state
        .oauth
        .providers
        .iter()
        .map(|p| ProviderInfo {
            id: p.provider.id().to_string(),
            name: p.provider.display_name().to_string(),
            signin_url: format!("/api/auth/signin/{}", p.provider.id()),
        })
        .collect();
    Json(providers)
}

/// GET /api/auth/signin/{provider}: redirect to the provider's consent page.
pub async fn signin(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let config = enabled_provider(&state, &provider)?;
    let redirect_uri = state.oauth.callback_url(config.provider);

    let (url, csrf) = config
        .authorize_url(&redirect_uri)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let state_cookie = Cookie::build((STATE_COOKIE, csrf.secret().clone()))
        .path("/api/auth")
        .http_only(true)
        .secure(state.session.secure_cookies)
        .same_site(SameSite::Lax);

    Ok((jar.add(state_cookie), Redirect::to(&url)))
}

/// GET /api/auth/callback/{provider}
///
/// Verifies the CSRF state, lets the provider exchange the code, binds the
/// provider account to a local user and sets the session cookie.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let config = enabled_provider(&state, &provider)?;

    if let Some(error) = query.error {
        warn!("{} sign-in denied: {}", config.provider, error);
        return Err(ApiError::validation(format!("sign-in failed: {}", error)));
    }

    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    match (expected.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => return Err(ApiError::validation("invalid sign-in state")),
    }

    let code = query
        .code
        .ok_or_else(|| ApiError::validation("missing authorization code"))?;

    let redirect_uri = state.oauth.callback_url(config.provider);
    let access_token = config
        .exchange_code(&state.http, &redirect_uri, code)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let profile = config
        .fetch_profile(&state.http, &access_token)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = run_blocking(&state, move |db| db.upsert_user_for_account(&profile)).await?;
    let token = issue_token(&state.session, &user)?;
    info!("User {} signed in via {}", user.id, config.provider);

    let jar = jar
        .remove(Cookie::build(STATE_COOKIE).path("/api/auth"))
        .add(session_cookie(&state.session, token));

    Ok((jar, Redirect::to(&state.oauth.login_redirect)))
}

/// POST /api/auth/signout
pub async fn signout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

/// GET /api/auth/session: profile of the current principal.
pub async fn session(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = principal.user_id;
    let user = run_blocking(&state, move |db| db.get_user(user_id))
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    Ok(Json(SessionResponse {
        user_id: user.id,
        name: user.name,
        email: user.email,
        image: user.image,
    }))
}

fn enabled_provider<'a>(state: &'a AppState, provider: &str) -> Result<&'a ProviderConfig, ApiError> {
    provider
        .parse::<Provider>()
        .ok()
        .and_then(|p| state.oauth.provider(p))
        .ok_or_else(|| ApiError::NotFound(format!("provider '{}'", provider)))
}

fn session_cookie(settings: &SessionSettings, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(settings.secure_cookies)
        .same_site(SameSite::Lax)
        .build()
}

/// Sign a session token whose subject is the local user id.
pub fn issue_token(settings: &SessionSettings, user: &User) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user.id,
        name: user.name.clone(),
        exp: (chrono::Utc::now() + settings.ttl).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign session token: {}", e)))
}

pub fn verify_token(settings: &SessionSettings, token: &str) -> Result<Principal, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthenticated)?;

    Ok(data.claims.into())
}
