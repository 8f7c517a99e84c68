use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, accounts, media_items)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                name        TEXT,
                email       TEXT,
                image       TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE accounts (
                id                   TEXT PRIMARY KEY,
                user_id              TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                provider             TEXT NOT NULL,
                provider_account_id  TEXT NOT NULL,
                created_at           TEXT NOT NULL,
                UNIQUE(provider, provider_account_id)
            );

            CREATE TABLE media_items (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                media_id        TEXT NOT NULL,
                media_type      TEXT NOT NULL CHECK (media_type IN ('movie', 'tv')),
                title           TEXT NOT NULL,
                poster_url      TEXT,
                status          TEXT CHECK (status IN ('PLAN_TO_WATCH', 'WATCHING', 'COMPLETED', 'DROPPED')),
                is_liked        INTEGER NOT NULL DEFAULT 0,
                is_watchlisted  INTEGER NOT NULL DEFAULT 0,
                rating          REAL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                UNIQUE(user_id, media_id)
            );

            CREATE INDEX idx_media_items_user_updated
                ON media_items(user_id, updated_at);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
