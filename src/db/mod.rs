//! Database module for SQLite persistence.
//!
//! SQLite is the document store: one table per collection, responses
//! parented by guest slug, and a singleton row for the wedding config.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use crate::models::{slugify, Attendance};

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    migrate_legacy_rsvp(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at)
        VALUES (1, 1, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guests (
            slug TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            is_family INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // No foreign key to guests: deleting a guest leaves its responses behind.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rsvp_responses (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            guest_slug TEXT NOT NULL,
            name TEXT NOT NULL,
            will_attend TEXT NOT NULL,
            comment TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS config (
            id TEXT PRIMARY KEY,
            schema_version INTEGER NOT NULL,
            body TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_guests_created_at ON guests(created_at);
        CREATE INDEX IF NOT EXISTS idx_rsvp_responses_guest ON rsvp_responses(guest_slug, created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Move responses from the flat `rsvp` table into per-guest rows.
///
/// The flat layout embedded only the respondent's name, so each row is
/// parented under the slug of that name. The legacy table is dropped in the
/// same transaction; returns the number of rows moved.
pub async fn migrate_legacy_rsvp(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let legacy =
        sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'rsvp'")
            .fetch_optional(pool)
            .await?;
    if legacy.is_none() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;

    let rows = sqlx::query("SELECT id, name, will_attend, comment, created_at FROM rsvp ORDER BY created_at")
        .fetch_all(&mut *tx)
        .await?;

    let mut moved = 0;
    for row in &rows {
        let name: String = row.get("name");
        let will_attend: String = row.get("will_attend");
        let comment: Option<String> = row.get("comment");

        sqlx::query(
            "INSERT OR IGNORE INTO rsvp_responses (id, guest_slug, name, will_attend, comment, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(row.get::<String, _>("id"))
        .bind(slugify(&name))
        .bind(&name)
        .bind(Attendance::from_stored(&will_attend).as_str())
        .bind(comment.filter(|c| !c.trim().is_empty()))
        .bind(row.get::<String, _>("created_at"))
        .execute(&mut *tx)
        .await?;
        moved += 1;
    }

    sqlx::query("DROP TABLE rsvp").execute(&mut *tx).await?;
    tx.commit().await?;

    tracing::info!("Migrated {} legacy RSVP responses into per-guest rows", moved);
    Ok(moved)
}
