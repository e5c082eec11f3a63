//! Admin session and dashboard endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};

use super::{error, success, ApiResponse, ApiResult};
use crate::auth::{
    expired_session_cookie, session_cookie, session_token, AdminSession, LoginRequest,
    SessionStatus,
};
use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::{AttendanceStats, Dashboard};
use crate::AppState;

type WithCookie<T> = ([(header::HeaderName, String); 1], ApiResponse<T>);

/// POST /api/admin/login - Sign in the administrator.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<WithCookie<AdminSession>, AppErrorWithRevision> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppErrorWithRevision {
            error: AppError::Validation("Email and password are required".to_string()),
            revision_id,
        });
    }

    let session = state
        .gate
        .login(&request.email, &request.password)
        .await
        .map_err(|error| AppErrorWithRevision { error, revision_id })?;

    let cookie = session_cookie(&session, state.config.session_ttl_hours);
    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::new(session, revision_id),
    ))
}

/// POST /api/admin/logout - End the caller's session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> WithCookie<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Some(token) = session_token(&headers) {
        state.gate.logout(&token).await;
    }

    (
        [(header::SET_COOKIE, expired_session_cookie())],
        ApiResponse::new((), revision_id),
    )
}

/// GET /api/admin/session - Whether the caller is signed in.
pub async fn session_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<SessionStatus> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let token = session_token(&headers);

    success(state.gate.status(token.as_deref()).await, revision_id)
}

/// GET /api/admin/dashboard - Stats plus every guest with their responses.
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<Dashboard> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.load_dashboard().await {
        Ok(dashboard) => success(dashboard, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/stats - Attendance counters only.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<AttendanceStats> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.load_dashboard().await {
        Ok(dashboard) => success(dashboard.stats, revision_id),
        Err(e) => error(e, revision_id),
    }
}
