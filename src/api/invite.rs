//! Public invitation endpoints.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{slugify, InvitationView, RsvpResponse, SubmitRsvpRequest, WeddingConfig};
use crate::AppState;

/// GET /api/config - Wedding details for every presentational section.
pub async fn get_public_config(State(state): State<AppState>) -> ApiResult<WeddingConfig> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_config().await {
        Ok(config) => success(config, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/invite/:slug - Resolve a guest and assemble their invitation.
pub async fn get_invitation(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<InvitationView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let guest = match state.repo.get_guest(&slug).await {
        Ok(Some(guest)) => guest,
        Ok(None) => return error(AppError::guest_not_found(&slug), revision_id),
        Err(e) => return error(e, revision_id),
    };

    let config = match state.repo.get_config().await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Falling back to default config: {}", e);
            WeddingConfig::default()
        }
    };

    let wishes = state.repo.list_responses(&slug).await.unwrap_or_else(|e| {
        tracing::warn!("Treating wishes of {} as empty: {}", slug, e);
        Vec::new()
    });

    success(
        InvitationView::new(guest, config, wishes, Utc::now()),
        revision_id,
    )
}

/// GET /api/invite/:slug/responses - Guest wishes, newest first.
pub async fn list_responses(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<RsvpResponse>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_responses(&slug).await {
        Ok(responses) => success(responses, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/invite/:slug/responses - Record an RSVP.
///
/// Every submission is a new response; resubmitting does not replace the
/// earlier one.
pub async fn submit_response(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<SubmitRsvpRequest>,
) -> ApiResult<RsvpResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Name is required".to_string()),
            revision_id,
        );
    }

    match state.repo.submit_response(&slug, &request).await {
        Ok(response) => {
            tracing::info!(
                "RSVP recorded for {} ({})",
                slug,
                response.will_attend.as_str()
            );
            state.live.responses_changed(&state.repo, &slug).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(response, new_revision)
        }
        Err(e) => {
            tracing::error!("Failed to record RSVP for {}: {}", slug, e);
            error(e, revision_id)
        }
    }
}

/// Query string of the landing page form.
#[derive(Debug, Deserialize)]
pub struct LandingQuery {
    #[serde(default)]
    pub name: String,
}

/// GET /go?name= - Send a visitor who typed their name to their invitation.
pub async fn landing_redirect(Query(query): Query<LandingQuery>) -> Redirect {
    let slug = slugify(&query.name);
    if slug.is_empty() {
        return Redirect::to("/");
    }
    Redirect::to(&format!("/invite/{}", urlencoding::encode(&slug)))
}
