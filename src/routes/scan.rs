use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::error::ScannerError;
use crate::scan::{self, ScanView};
use crate::state::SharedState;

/// POST /api/sessions/{id}/scan: hand setup over and start scanning.
pub async fn start(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ScanView>), ScannerError> {
    let session = state.session(&id).await?;
    scan::commit_setup(&session).await?;
    let view = scan::start_from_handoff(&state, &session).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/sessions/{id}/scan
pub async fn status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ScanView>, ScannerError> {
    let session = state.session(&id).await?;
    Ok(Json(scan::snapshot(&session).await?))
}

/// POST /api/sessions/{id}/scan/cancel
pub async fn cancel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ScannerError> {
    let session = state.session(&id).await?;
    let cancelled = scan::cancel(&state, &session).await?;
    Ok(Json(serde_json::json!({
        "cancelled": cancelled,
        "screen": crate::screen::Screen::Setup,
    })))
}

/// GET /api/sessions/{id}/scan/stream: current snapshot, then run events.
pub async fn stream(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, ScannerError> {
    let session = state.session(&id).await?;
    let (rx, initial) = {
        let s = session.read().await;
        let scan = s.scan.as_ref().ok_or(ScannerError::NoActiveScan)?;
        (scan.run.subscribe(), scan.run.snapshot().await)
    };

    let first = serde_json::to_string(&initial).unwrap_or_default();
    let head = tokio_stream::once(Ok::<_, Infallible>(
        Event::default().event("snapshot").data(first),
    ));

    let events = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().event(event.name()).data(data)))
        }
        Err(_) => None,
    });

    Ok(Sse::new(head.chain(events)).keep_alive(KeepAlive::default()))
}
