use crate::Database;
use crate::models::{
    MediaItemFilter, MediaItemRow, MediaItemWrite, ProviderProfile, UserRow, format_timestamp,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use flick_types::api::Principal;
use flick_types::models::{MediaItem, User};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};
use tracing::{debug, info};
use uuid::Uuid;

const MEDIA_ITEM_COLUMNS: &str = "id, user_id, media_id, media_type, title, poster_url, status, \
     is_liked, is_watchlisted, rating, created_at, updated_at";

impl Database {
    // -- Users --

    /// Resolve a provider account to a local user, creating both on first
    /// sign-in. Known accounts get their profile fields refreshed.
    pub fn upsert_user_for_account(&self, profile: &ProviderProfile) -> Result<User> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let now = format_timestamp(Utc::now());

            let existing: Option<String> = tx
                .query_row(
                    "SELECT user_id FROM accounts WHERE provider = ?1 AND provider_account_id = ?2",
                    params![profile.provider, profile.account_id],
                    |row| row.get(0),
                )
                .optional()?;

            let user_id = match existing {
                Some(user_id) => {
                    tx.execute(
                        "UPDATE users SET
                            name = COALESCE(?2, name),
                            email = COALESCE(?3, email),
                            image = COALESCE(?4, image)
                         WHERE id = ?1",
                        params![user_id, profile.name, profile.email, profile.image],
                    )?;
                    user_id
                }
                None => {
                    let user_id = Uuid::new_v4().to_string();
                    tx.execute(
                        "INSERT INTO users (id, name, email, image, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![user_id, profile.name, profile.email, profile.image, now],
                    )?;
                    tx.execute(
                        "INSERT INTO accounts (id, user_id, provider, provider_account_id, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![
                            Uuid::new_v4().to_string(),
                            user_id,
                            profile.provider,
                            profile.account_id,
                            now
                        ],
                    )?;
                    info!("Created user {} for {} account", user_id, profile.provider);
                    user_id
                }
            };

            let user = query_user_by_id(&tx, &user_id)?
                .ok_or_else(|| anyhow::anyhow!("User vanished mid-transaction: {}", user_id))?;
            tx.commit()?;
            user.into_model()
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_id(conn, &id.to_string())?.map(UserRow::into_model).transpose())
    }

    // -- Media items --

    /// Create-or-replace the caller's state for one catalog item.
    ///
    /// Atomic by way of `ON CONFLICT(user_id, media_id)`: concurrent first
    /// writes for the same pair resolve to a single row. On conflict every
    /// mutable column is overwritten with the supplied values; `media_type`
    /// and `created_at` keep their original values.
    pub fn upsert_media_item(
        &self,
        principal: &Principal,
        write: &MediaItemWrite,
        now: DateTime<Utc>,
    ) -> Result<MediaItem> {
        let row = self.with_conn_mut(|conn| upsert_media_item_row(conn, principal, write, now))?;

        debug!(
            "Upserted media item {} ({}) for user {}",
            write.media_id, write.media_type, principal.user_id
        );
        row.into_model()
    }

    pub fn get_media_item(&self, principal: &Principal, media_id: &str) -> Result<Option<MediaItem>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MEDIA_ITEM_COLUMNS} FROM media_items WHERE user_id = ?1 AND media_id = ?2"
            );
            conn.query_row(&sql, params![principal.user_id.to_string(), media_id], media_item_row)
                .optional()?
                .map(MediaItemRow::into_model)
                .transpose()
        })
    }

    /// All of the caller's items, most recently updated first.
    pub fn list_media_items(
        &self,
        principal: &Principal,
        filter: &MediaItemFilter,
    ) -> Result<Vec<MediaItem>> {
        self.with_conn(|conn| query_media_items(conn, principal, filter))
    }
}

fn upsert_media_item_row(
    conn: &Connection,
    principal: &Principal,
    write: &MediaItemWrite,
    now: DateTime<Utc>,
) -> Result<MediaItemRow> {
    let sql = format!(
        "INSERT INTO media_items ({MEDIA_ITEM_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
         ON CONFLICT(user_id, media_id) DO UPDATE SET
            title = excluded.title,
            poster_url = excluded.poster_url,
            status = excluded.status,
            is_liked = excluded.is_liked,
            is_watchlisted = excluded.is_watchlisted,
            rating = excluded.rating,
            updated_at = excluded.updated_at
         RETURNING {MEDIA_ITEM_COLUMNS}"
    );

    let row = conn.query_row(
        &sql,
        params![
            Uuid::new_v4().to_string(),
            principal.user_id.to_string(),
            write.media_id,
            write.media_type.as_str(),
            write.title,
            write.poster_url,
            write.status.map(|s| s.as_str()),
            write.is_liked,
            write.is_watchlisted,
            write.rating,
            format_timestamp(now),
        ],
        media_item_row,
    )?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, name, email, image, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                image: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_media_items(
    conn: &Connection,
    principal: &Principal,
    filter: &MediaItemFilter,
) -> Result<Vec<MediaItem>> {
    let mut sql = format!("SELECT {MEDIA_ITEM_COLUMNS} FROM media_items WHERE user_id = ?1");
    let mut values = vec![Value::Text(principal.user_id.to_string())];

    if let Some(status) = filter.status {
        values.push(Value::Text(status.as_str().to_string()));
        sql.push_str(&format!(" AND status = ?{}", values.len()));
    }
    if let Some(liked) = filter.liked {
        values.push(Value::Integer(liked.into()));
        sql.push_str(&format!(" AND is_liked = ?{}", values.len()));
    }
    if let Some(watchlisted) = filter.watchlisted {
        values.push(Value::Integer(watchlisted.into()));
        sql.push_str(&format!(" AND is_watchlisted = ?{}", values.len()));
    }
    sql.push_str(" ORDER BY updated_at DESC, created_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), media_item_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(MediaItemRow::into_model).collect()
}

fn media_item_row(row: &Row<'_>) -> rusqlite::Result<MediaItemRow> {
    Ok(MediaItemRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        media_id: row.get(2)?,
        media_type: row.get(3)?,
        title: row.get(4)?,
        poster_url: row.get(5)?,
        status: row.get(6)?,
        is_liked: row.get(7)?,
        is_watchlisted: row.get(8)?,
        rating: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
