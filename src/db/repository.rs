//! Database repository for guest, RSVP and config operations.
//!
//! Writes are single statements; concurrent writers resolve last-write-wins.

use chrono::{SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    slugify, Attendance, CreateGuestRequest, Dashboard, Guest, GuestSummary, RevisionInfo,
    RsvpResponse, SubmitRsvpRequest, WeddingConfig, CONFIG_SCHEMA_VERSION,
};

/// Key of the singleton config row.
const WEDDING_CONFIG_ID: &str = "wedding";

/// Server-assigned timestamp; microseconds keep rapid writes ordered.
pub fn server_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = server_timestamp();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    // ==================== GUEST OPERATIONS ====================

    /// List all guests, newest first.
    pub async fn list_guests(&self) -> Result<Vec<Guest>, AppError> {
        let rows = sqlx::query(
            "SELECT slug, name, is_family, created_at FROM guests ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| guest_from_row(&row)).collect())
    }

    /// Get a guest by slug.
    pub async fn get_guest(&self, slug: &str) -> Result<Option<Guest>, AppError> {
        let row = sqlx::query("SELECT slug, name, is_family, created_at FROM guests WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(guest_from_row))
    }

    /// Add a guest, overwriting any guest whose name derives the same slug.
    pub async fn add_guest(&self, request: &CreateGuestRequest) -> Result<Guest, AppError> {
        let slug = slugify(&request.name);
        if slug.is_empty() {
            return Err(AppError::Validation("Guest name is required".to_string()));
        }
        let now = server_timestamp();

        sqlx::query(
            r#"INSERT INTO guests (slug, name, is_family, created_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(slug) DO UPDATE SET
                name = excluded.name,
                is_family = excluded.is_family,
                created_at = excluded.created_at"#,
        )
        .bind(&slug)
        .bind(&request.name)
        .bind(request.is_family as i32)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Guest {
            slug,
            name: request.name.clone(),
            is_family: request.is_family,
            created_at: now,
        })
    }

    /// Delete a guest. Responses under the slug are left in place.
    ///
    /// Returns whether a guest was removed.
    pub async fn delete_guest(&self, slug: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM guests WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.increment_revision().await?;
        Ok(true)
    }

    /// Flip the family flag. Returns `None` when the guest does not exist.
    pub async fn toggle_family(&self, slug: &str) -> Result<Option<Guest>, AppError> {
        let result = sqlx::query("UPDATE guests SET is_family = 1 - is_family WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.increment_revision().await?;
        self.get_guest(slug).await
    }

    // ==================== RSVP OPERATIONS ====================

    /// Append a response under a guest's slug.
    pub async fn submit_response(
        &self,
        slug: &str,
        request: &SubmitRsvpRequest,
    ) -> Result<RsvpResponse, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = server_timestamp();
        let comment = request.normalized_comment();

        sqlx::query(
            "INSERT INTO rsvp_responses (id, guest_slug, name, will_attend, comment, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(slug)
        .bind(&request.name)
        .bind(request.will_attend.as_str())
        .bind(&comment)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(RsvpResponse {
            id,
            guest_slug: slug.to_string(),
            name: request.name.clone(),
            will_attend: request.will_attend,
            comment,
            created_at: now,
        })
    }

    /// List the responses recorded under a slug, newest first.
    pub async fn list_responses(&self, slug: &str) -> Result<Vec<RsvpResponse>, AppError> {
        let rows = sqlx::query(
            "SELECT id, guest_slug, name, will_attend, comment, created_at FROM rsvp_responses WHERE guest_slug = ? ORDER BY created_at DESC, seq DESC",
        )
        .bind(slug)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| response_from_row(&row)).collect())
    }

    /// Build the dashboard: the guest list plus one response read per guest.
    ///
    /// A failed response read counts as zero responses for that guest.
    pub async fn load_dashboard(&self) -> Result<Dashboard, AppError> {
        let guests = self.list_guests().await?;
        let mut rows = Vec::with_capacity(guests.len());

        for guest in guests {
            let responses = match self.list_responses(&guest.slug).await {
                Ok(responses) => responses,
                Err(e) => {
                    tracing::warn!("Treating responses of {} as empty: {}", guest.slug, e);
                    Vec::new()
                }
            };
            rows.push(GuestSummary::new(guest, responses));
        }

        Ok(Dashboard::new(rows))
    }

    // ==================== CONFIG OPERATIONS ====================

    /// Read the wedding config, falling back to defaults when none was saved.
    ///
    /// A legacy-shaped record is upgraded and written back once.
    pub async fn get_config(&self) -> Result<WeddingConfig, AppError> {
        let row = sqlx::query("SELECT body FROM config WHERE id = ?")
            .bind(WEDDING_CONFIG_ID)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(WeddingConfig::default());
        };

        let body: String = row.get("body");
        let (config, migrated) = WeddingConfig::from_stored(&body)?;
        if migrated {
            tracing::info!("Upgrading stored wedding config to schema {}", CONFIG_SCHEMA_VERSION);
            self.write_config(&config).await?;
        }

        Ok(config)
    }

    /// Replace the whole wedding config.
    pub async fn set_config(&self, config: &WeddingConfig) -> Result<WeddingConfig, AppError> {
        let mut config = config.clone();
        config.schema_version = CONFIG_SCHEMA_VERSION;
        self.write_config(&config).await?;
        self.increment_revision().await?;
        Ok(config)
    }

    async fn write_config(&self, config: &WeddingConfig) -> Result<(), AppError> {
        let body = serde_json::to_string(config)
            .map_err(|e| AppError::Internal(format!("Failed to encode config: {}", e)))?;

        sqlx::query(
            r#"INSERT INTO config (id, schema_version, body, updated_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                schema_version = excluded.schema_version,
                body = excluded.body,
                updated_at = excluded.updated_at"#,
        )
        .bind(WEDDING_CONFIG_ID)
        .bind(config.schema_version)
        .bind(&body)
        .bind(server_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a raw config body as-is. Used to seed legacy records.
    #[cfg(test)]
    pub async fn put_raw_config(&self, body: &str) -> Result<(), AppError> {
        sqlx::query("INSERT OR REPLACE INTO config (id, schema_version, body, updated_at) VALUES (?, 1, ?, ?)")
            .bind(WEDDING_CONFIG_ID)
            .bind(body)
            .bind(server_timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// Helper functions for row conversion

fn guest_from_row(row: &sqlx::sqlite::SqliteRow) -> Guest {
    let is_family: i32 = row.get("is_family");
    Guest {
        slug: row.get("slug"),
        name: row.get("name"),
        is_family: is_family != 0,
        created_at: row.get("created_at"),
    }
}

fn response_from_row(row: &sqlx::sqlite::SqliteRow) -> RsvpResponse {
    let will_attend: String = row.get("will_attend");
    RsvpResponse {
        id: row.get("id"),
        guest_slug: row.get("guest_slug"),
        name: row.get("name"),
        will_attend: Attendance::from_stored(&will_attend),
        comment: row.get("comment"),
        created_at: row.get("created_at"),
    }
}
