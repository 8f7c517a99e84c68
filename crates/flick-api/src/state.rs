use std::sync::Arc;

use flick_catalog::TmdbClient;
use flick_db::Database;
use tracing::error;

use crate::error::ApiError;
use crate::oauth::OAuthSettings;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub catalog: TmdbClient,
    pub session: SessionSettings,
    pub oauth: OAuthSettings,
    /// Client for provider token and profile calls. Redirects are disabled.
    pub http: reqwest::Client,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub secret: String,
    pub ttl: chrono::Duration,
    /// Mark cookies `Secure`; on when the public URL is https.
    pub secure_cookies: bool,
}

/// Run a blocking database call off the async runtime.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
        .map_err(ApiError::Storage)
}
