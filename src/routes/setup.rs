use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use crate::error::ScannerError;
use crate::fixtures;
use crate::log_capture::{LogLevel, LogSource};
use crate::routes::sessions::{session_view, SessionView};
use crate::state::{SharedSession, SharedState};
use crate::store_url::{run_check, ValidationAttempt};

#[derive(Deserialize)]
pub struct UrlUpdate {
    pub url: String,
}

/// PUT /api/sessions/{id}/setup/url
pub async fn set_url(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(update): Json<UrlUpdate>,
) -> Result<Json<SessionView>, ScannerError> {
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    s.setup.edit_url(update.url);
    Ok(Json(session_view(&s)))
}

/// POST /api/sessions/{id}/setup/url/blur: kicks off the simulated check.
pub async fn blur_url(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SessionView>), ScannerError> {
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    let attempt = s.setup.blur_url();
    let view = session_view(&s);
    drop(s);

    match attempt {
        Some(attempt) => {
            tokio::spawn(check_url(state.clone(), session, attempt));
            Ok((StatusCode::ACCEPTED, Json(view)))
        }
        None => Ok((StatusCode::OK, Json(view))),
    }
}

async fn check_url(state: SharedState, session: SharedSession, attempt: ValidationAttempt) {
    let verdict = run_check(&attempt, state.config.timings.url_check_delay).await;

    let notified = session.write().await.setup.resolve_url(&attempt, verdict);
    match notified {
        Some(true) => {
            state
                .logs
                .emit(
                    LogSource::Setup,
                    LogLevel::Success,
                    format!("Store URL verified: {}", attempt.text.trim()),
                )
                .await;
        }
        Some(false) => {
            let reason = verdict.err().map(|r| r.message()).unwrap_or_default();
            state
                .logs
                .emit(LogSource::Setup, LogLevel::Warning, reason)
                .await;
        }
        None => debug!("Discarding stale URL check #{}", attempt.attempt),
    }
}

/// POST /api/sessions/{id}/setup/tests/{test_id}/toggle
pub async fn toggle_test(
    State(state): State<SharedState>,
    Path((id, test_id)): Path<(String, String)>,
) -> Result<Json<SessionView>, ScannerError> {
    if !fixtures::catalog().iter().any(|t| t.id == test_id) {
        return Err(ScannerError::NotFound(format!("diagnostic test '{}'", test_id)));
    }
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    s.setup.toggle_test(&test_id);
    Ok(Json(session_view(&s)))
}

/// POST /api/sessions/{id}/setup/tests/select-all
pub async fn select_all(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ScannerError> {
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    s.setup.select_all(fixtures::catalog());
    Ok(Json(session_view(&s)))
}

/// POST /api/sessions/{id}/setup/tests/clear
pub async fn clear(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ScannerError> {
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    s.setup.clear();
    Ok(Json(session_view(&s)))
}
