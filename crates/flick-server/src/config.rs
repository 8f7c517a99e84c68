use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use flick_api::oauth::{OAuthSettings, Provider, ProviderConfig};
use flick_catalog::CatalogConfig;

/// Session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "dev-secret-change-me", "secret"];

#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub session_days: i64,
    pub catalog: CatalogConfig,
    pub oauth: OAuthSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let session_secret = var("FLICK_SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("FLICK_SESSION_SECRET is unset or still a placeholder");
        }

        let api_key = var("TMDB_API_KEY").context("TMDB_API_KEY must be set")?;
        let mut catalog = CatalogConfig::new(api_key);
        if let Some(base_url) = var("TMDB_BASE_URL") {
            catalog.base_url = base_url;
        }
        if let Some(language) = var("TMDB_LANGUAGE") {
            catalog.language = language;
        }

        let port = var("FLICK_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("FLICK_PORT must be a port number")?;
        let session_days = var("FLICK_SESSION_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("FLICK_SESSION_DAYS must be a whole number of days")?;

        let mut providers = Vec::new();
        for (provider, id_key, secret_key) in [
            (Provider::GitHub, "GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
            (Provider::Google, "GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
        ] {
            match (var(id_key), var(secret_key)) {
                (Some(id), Some(secret)) => providers.push(ProviderConfig::new(provider, id, secret)),
                (None, None) => {}
                _ => bail!("{} and {} must be set together", id_key, secret_key),
            }
        }

        Ok(Self {
            host: var("FLICK_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: var("FLICK_DB_PATH").unwrap_or_else(|| "flick.db".into()).into(),
            session_secret,
            session_days,
            catalog,
            oauth: OAuthSettings {
                public_url: var("FLICK_PUBLIC_URL").unwrap_or_else(|| "http://localhost:3000".into()),
                login_redirect: var("FLICK_LOGIN_REDIRECT").unwrap_or_else(|| "/".into()),
                providers,
            },
        })
    }
}
