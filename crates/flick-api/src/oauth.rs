//! Identity provider glue. The `oauth2` crate runs the authorization-code
//! exchange; this module only knows each provider's endpoints and how to turn
//! its profile payload into a [`ProviderProfile`].

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use flick_db::models::ProviderProfile;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

/// Client with the authorization and token endpoints configured.
type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GitHub,
    Google,
}

impl Provider {
    pub fn id(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Google => "google",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::Google => "Google",
        }
    }

    fn scopes(&self) -> &'static [&'static str] {
        match self {
            Self::GitHub => &["read:user", "user:email"],
            Self::Google => &["openid", "email", "profile"],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "github" => Ok(Self::GitHub),
            "google" => Ok(Self::Google),
            other => Err(anyhow!("unknown provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl ProviderEndpoints {
    pub fn for_provider(provider: Provider) -> Self {
        match provider {
            Provider::GitHub => Self {
                authorize: "https://github.com/login/oauth/authorize".into(),
                token: "https://github.com/login/oauth/access_token".into(),
                userinfo: "https://api.github.com/user".into(),
            },
            Provider::Google => Self {
                authorize: "https://accounts.google.com/o/oauth2/v2/auth".into(),
                token: "https://oauth2.googleapis.com/token".into(),
                userinfo: "https://openidconnect.googleapis.com/v1/userinfo".into(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub client_id: String,
    pub client_secret: String,
    pub endpoints: ProviderEndpoints,
}

impl ProviderConfig {
    pub fn new(provider: Provider, client_id: String, client_secret: String) -> Self {
        Self {
            provider,
            client_id,
            client_secret,
            endpoints: ProviderEndpoints::for_provider(provider),
        }
    }

    fn client(&self, redirect_uri: &str) -> Result<ConfiguredClient> {
        Ok(BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(self.endpoints.authorize.clone())?)
            .set_token_uri(TokenUrl::new(self.endpoints.token.clone())?)
            .set_redirect_uri(RedirectUrl::new(redirect_uri.to_string())?))
    }

    /// Provider authorization URL plus the CSRF state that must come back on
    /// the callback.
    pub fn authorize_url(&self, redirect_uri: &str) -> Result<(String, CsrfToken)> {
        let client = self.client(redirect_uri)?;

        let (url, csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.provider.scopes().iter().map(|s| Scope::new(s.to_string())))
            .url();

        Ok((url.to_string(), csrf))
    }

    /// Trade the authorization code for an access token.
    pub async fn exchange_code(
        &self,
        http: &reqwest::Client,
        redirect_uri: &str,
        code: String,
    ) -> Result<String> {
        let client = self.client(redirect_uri)?;

        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(http)
            .await
            .map_err(|e| anyhow!("{} token exchange failed: {}", self.provider, e))?;

        Ok(token.access_token().secret().clone())
    }

    pub async fn fetch_profile(
        &self,
        http: &reqwest::Client,
        access_token: &str,
    ) -> Result<ProviderProfile> {
        let resp = http
            .get(&self.endpoints.userinfo)
            .bearer_auth(access_token)
            .header(USER_AGENT, "flick")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("{} profile request failed", self.provider))?
            .error_for_status()
            .with_context(|| format!("{} profile request rejected", self.provider))?;

        let profile = match self.provider {
            Provider::GitHub => {
                let user: GitHubUser = resp.json().await?;
                ProviderProfile {
                    provider: self.provider.id().to_string(),
                    account_id: user.id.to_string(),
                    name: user.name.or(Some(user.login)),
                    email: user.email,
                    image: user.avatar_url,
                }
            }
            Provider::Google => {
                let user: GoogleUser = resp.json().await?;
                ProviderProfile {
                    provider: self.provider.id().to_string(),
                    account_id: user.sub,
                    name: user.name,
                    email: user.email,
                    image: user.picture,
                }
            }
        };

        debug!("Fetched {} profile for account {}", self.provider, profile.account_id);
        Ok(profile)
    }
}

#[derive(Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct GoogleUser {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OAuthSettings {
    /// Externally visible origin, used to build callback URLs.
    pub public_url: String,
    /// Where the browser lands after a successful sign-in.
    pub login_redirect: String,
    pub providers: Vec<ProviderConfig>,
}

impl OAuthSettings {
    pub fn provider(&self, provider: Provider) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.provider == provider)
    }

    pub fn callback_url(&self, provider: Provider) -> String {
        format!(
            "{}/api/auth/callback/{}",
            self.public_url.trim_end_matches('/'),
            provider.id()
        )
    }
}
