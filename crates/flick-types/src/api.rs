use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MediaType, WatchStatus};

// -- Session --

/// Session token claims. `sub` is the local user id resolved from the
/// provider account at sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: usize,
}

/// The caller behind a verified session. Every data-touching operation takes
/// one of these explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub name: Option<String>,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub signin_url: String,
}

// -- Media state --

/// Catalog ids arrive as strings from query strings and as numbers from
/// clients that pass TMDB payloads straight through.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MediaIdInput {
    Text(String),
    Number(u64),
}

impl MediaIdInput {
    /// Canonical stored form, `None` when blank.
    pub fn normalized(&self) -> Option<String> {
        match self {
            Self::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Self::Number(n) => Some(n.to_string()),
        }
    }
}

/// Body of `POST /api/media`. Required fields are optional here so that a
/// missing one is reported as a validation failure rather than a decode error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertMediaRequest {
    pub media_id: Option<MediaIdInput>,
    pub media_type: Option<MediaType>,
    pub title: Option<String>,
    pub poster_url: Option<String>,
    pub status: Option<WatchStatus>,
    pub is_liked: Option<bool>,
    pub is_watchlisted: Option<bool>,
    pub rating: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaQuery {
    pub media_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LibraryQuery {
    pub status: Option<WatchStatus>,
    pub liked: Option<bool>,
    pub watchlisted: Option<bool>,
}

// -- Catalog --

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailsQuery {
    #[serde(default)]
    pub credits: bool,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
