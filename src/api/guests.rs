//! Guest registry endpoints (admin only).

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    invitation_message, invite_link, CreateGuestRequest, Guest, RsvpResponse, ShareMessage,
    ShareQuery,
};
use crate::AppState;

/// GET /api/admin/guests - List all guests, newest first.
pub async fn list_guests(State(state): State<AppState>) -> ApiResult<Vec<Guest>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_guests().await {
        Ok(guests) => success(guests, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/guests/:slug - Get a single guest.
pub async fn get_guest(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Guest> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_guest(&slug).await {
        Ok(Some(guest)) => success(guest, revision_id),
        Ok(None) => error(AppError::guest_not_found(&slug), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/guests - Add a guest (upsert by slug).
pub async fn add_guest(
    State(state): State<AppState>,
    Json(request): Json<CreateGuestRequest>,
) -> ApiResult<Guest> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    // Validate required fields
    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Guest name is required".to_string()),
            revision_id,
        );
    }

    match state.repo.add_guest(&request).await {
        Ok(guest) => {
            tracing::info!("Guest {} added", guest.slug);
            state.live.guests_changed(&state.repo).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(guest, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/admin/guests/:slug - Delete a guest. Its responses are kept.
pub async fn delete_guest(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_guest(&slug).await {
        Ok(removed) => {
            if removed {
                tracing::info!("Guest {} deleted", slug);
                state.live.guests_changed(&state.repo).await;
            } else {
                tracing::debug!("Delete of unknown guest {} ignored", slug);
            }

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/guests/:slug/toggle-family - Flip the family flag.
///
/// Unknown slugs are a no-op and return `null` data.
pub async fn toggle_family(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Option<Guest>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.toggle_family(&slug).await {
        Ok(Some(guest)) => {
            tracing::info!("Guest {} family flag set to {}", slug, guest.is_family);
            state.live.guests_changed(&state.repo).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(Some(guest), new_revision)
        }
        Ok(None) => {
            tracing::debug!("Family toggle of unknown guest {} ignored", slug);
            success(None, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/guests/:slug/responses - Responses recorded for one guest.
pub async fn list_guest_responses(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<RsvpResponse>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_responses(&slug).await {
        Ok(responses) => success(responses, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/guests/:slug/share - Invite link and prewritten message.
pub async fn share_guest(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ShareQuery>,
) -> ApiResult<ShareMessage> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let guest = match state.repo.get_guest(&slug).await {
        Ok(Some(guest)) => guest,
        Ok(None) => return error(AppError::guest_not_found(&slug), revision_id),
        Err(e) => return error(e, revision_id),
    };

    let config = match state.repo.get_config().await {
        Ok(config) => config,
        Err(e) => return error(e, revision_id),
    };

    let link = invite_link(&state.config.public_base_url, &guest.slug);
    let message = invitation_message(query.lang, &guest.name, &config, &link);

    success(
        ShareMessage {
            slug: guest.slug,
            link,
            language: query.lang,
            message,
        },
        revision_id,
    )
}
