//! Wedding config endpoints (admin only).

use axum::{extract::State, Json};

use super::{error, success, ApiResult};
use crate::models::WeddingConfig;
use crate::AppState;

/// GET /api/admin/config - Current config, or the defaults when never saved.
pub async fn get_config(State(state): State<AppState>) -> ApiResult<WeddingConfig> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_config().await {
        Ok(config) => success(config, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/config - Replace the whole config document.
pub async fn put_config(
    State(state): State<AppState>,
    Json(config): Json<WeddingConfig>,
) -> ApiResult<WeddingConfig> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = config.validate() {
        return error(e, revision_id);
    }

    match state.repo.set_config(&config).await {
        Ok(saved) => {
            tracing::info!("Wedding config saved");
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(saved, new_revision)
        }
        Err(e) => {
            tracing::error!("Failed to save wedding config: {}", e);
            error(e, revision_id)
        }
    }
}
