use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ScannerError;
use crate::fixtures;
use crate::log_capture::{LogLevel, LogSource};
use crate::scan;
use crate::screen::{Screen, ScreenChrome};
use crate::setup::{DiagnosticTest, StartScanGate};
use crate::state::{SessionState, SharedState};
use crate::store_url::UrlValidationState;

#[derive(Serialize)]
pub struct SessionView {
    pub id: String,
    pub created_at: String,
    pub chrome: ScreenChrome,
    pub setup: SetupView,
    pub has_handoff: bool,
}

#[derive(Serialize)]
pub struct SetupView {
    pub store_url: String,
    pub url_state: UrlValidationState,
    pub url_error: Option<&'static str>,
    pub is_url_valid: bool,
    pub selected_tests: Vec<String>,
    pub gate: StartScanGate,
}

pub fn session_view(s: &SessionState) -> SessionView {
    SessionView {
        id: s.id.clone(),
        created_at: s.created_at.to_rfc3339(),
        chrome: s.screen.chrome(),
        setup: SetupView {
            store_url: s.setup.url().text().to_string(),
            url_state: s.setup.url().state(),
            url_error: s.setup.url().error_message(),
            is_url_valid: s.setup.is_url_valid(),
            selected_tests: s.setup.selected_tests().iter().cloned().collect(),
            gate: s.setup.gate(),
        },
        has_handoff: s.handoff().is_some(),
    }
}

/// GET /api/catalog
pub async fn catalog() -> Json<&'static [DiagnosticTest]> {
    Json(fixtures::catalog())
}

/// POST /api/sessions
pub async fn create(State(state): State<SharedState>) -> impl IntoResponse {
    let (id, session) = state.create_session().await;
    info!("Session {} created", id);
    state
        .logs
        .emit(LogSource::Server, LogLevel::Debug, format!("Session {} created", id))
        .await;
    let view = session_view(&*session.read().await);
    (StatusCode::CREATED, Json(view))
}

/// GET /api/sessions/{id}
pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ScannerError> {
    let session = state.session(&id).await?;
    let view = session_view(&*session.read().await);
    Ok(Json(view))
}

/// DELETE /api/sessions/{id}
pub async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ScannerError> {
    state.remove_session(&id).await?;
    info!("Session {} removed", id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct NavigateRequest {
    pub path: String,
}

/// POST /api/sessions/{id}/navigate
pub async fn navigate(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<NavigateRequest>,
) -> Result<Json<SessionView>, ScannerError> {
    let session = state.session(&id).await?;
    let target = Screen::from_path(&req.path);

    let leaving_scan = {
        let s = session.read().await;
        s.screen == Screen::Scan && target != Screen::Scan
    };
    if leaving_scan {
        scan::leave(&state, &session).await;
    }

    let mut s = session.write().await;
    s.screen = target;
    Ok(Json(session_view(&s)))
}
