//! Database row types and write inputs. Rows map directly to SQLite columns;
//! conversion into `flick-types` models happens here so callers never see
//! raw text columns.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use flick_types::models::{MediaItem, MediaType, User, WatchStatus};

pub struct UserRow {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub created_at: String,
}

impl UserRow {
    pub fn into_model(self) -> Result<User> {
        Ok(User {
            id: self.id.parse().with_context(|| format!("corrupt user id '{}'", self.id))?,
            name: self.name,
            email: self.email,
            image: self.image,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub struct MediaItemRow {
    pub id: String,
    pub user_id: String,
    pub media_id: String,
    pub media_type: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub status: Option<String>,
    pub is_liked: bool,
    pub is_watchlisted: bool,
    pub rating: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl MediaItemRow {
    pub fn into_model(self) -> Result<MediaItem> {
        let id = self
            .id
            .parse()
            .with_context(|| format!("corrupt media item id '{}'", self.id))?;
        let user_id = self
            .user_id
            .parse()
            .with_context(|| format!("corrupt user_id '{}' on media item '{}'", self.user_id, self.id))?;
        let media_type: MediaType = self.media_type.parse()?;
        let status = self
            .status
            .as_deref()
            .map(str::parse::<WatchStatus>)
            .transpose()?;

        Ok(MediaItem {
            id,
            user_id,
            media_id: self.media_id,
            media_type,
            title: self.title,
            poster_url: self.poster_url,
            status,
            is_liked: self.is_liked,
            is_watchlisted: self.is_watchlisted,
            rating: self.rating,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Validated input for a media-state write. Optional fields left `None`
/// are stored as unset; the flags default to `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItemWrite {
    pub media_id: String,
    pub media_type: MediaType,
    pub title: String,
    pub poster_url: Option<String>,
    pub status: Option<WatchStatus>,
    pub is_liked: bool,
    pub is_watchlisted: bool,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct MediaItemFilter {
    pub status: Option<WatchStatus>,
    pub liked: Option<bool>,
    pub watchlisted: Option<bool>,
}

/// Profile handed back by an identity provider after sign-in.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub provider: String,
    pub account_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// Timestamps are stored as RFC 3339 UTC with fixed millisecond precision so
/// that text ordering matches time ordering.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite's datetime('now') has no zone suffix
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}
