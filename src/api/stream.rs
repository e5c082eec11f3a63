//! Server-sent event streams backed by the live store.
//!
//! Each stream sends the current snapshot first and then one event per
//! change. A stream ends when the client disconnects or the server shuts down.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
};
use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::errors::AppErrorWithRevision;
use crate::live::Subscription;
use crate::AppState;

fn snapshot_event<T: Serialize>(name: &'static str, snapshot: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(snapshot)
        .unwrap_or_else(|e| {
            tracing::error!("Failed to encode {} snapshot: {}", name, e);
            Event::default().event("error").data("encoding failed")
        })
}

fn sse_stream<T>(
    name: &'static str,
    subscription: Subscription<T>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Serialize + Send + Sync + 'static,
{
    let events = subscription
        .into_stream()
        .map(move |snapshot: Arc<T>| Ok(snapshot_event(name, &*snapshot)));

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// GET /api/admin/guests/stream - Live guest list.
pub async fn stream_guests(State(state): State<AppState>) -> Response {
    sse_stream("guests", state.live.subscribe_guests()).into_response()
}

/// GET /api/admin/dashboard/stream - Live stats and per-guest rows.
pub async fn stream_dashboard(State(state): State<AppState>) -> Response {
    sse_stream("dashboard", state.live.subscribe_dashboard()).into_response()
}

/// GET /api/invite/:slug/responses/stream - Live guest wishes for one slug.
///
/// Unknown guests get a `NOT_FOUND` envelope instead of a stream.
pub async fn stream_responses(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    match state.live.subscribe_responses(&state.repo, &slug).await {
        Ok(subscription) => sse_stream("responses", subscription).into_response(),
        Err(error) => {
            tracing::debug!("Response stream for {} refused: {}", slug, error);
            let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
            AppErrorWithRevision { error, revision_id }.into_response()
        }
    }
}
