use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::log_capture::{LogLevel, LogSource};
use crate::progress::RunStatus;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: SessionsHealth,
    pub scanner: ScannerInfo,
}

#[derive(Serialize)]
pub struct SessionsHealth {
    pub total: usize,
    pub scans_running: usize,
    pub reports_generating: usize,
}

#[derive(Serialize)]
pub struct ScannerInfo {
    pub version: String,
    pub scan_tick_ms: u64,
    pub report_tick_ms: u64,
}

pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(build_health_response(&state).await)
}

pub async fn build_health_response(state: &SharedState) -> HealthResponse {
    let sessions: Vec<_> = state.sessions.read().await.values().cloned().collect();

    let mut scans_running = 0;
    let mut reports_generating = 0;
    for session in &sessions {
        let s = session.read().await;
        if let Some(scan) = &s.scan {
            if scan.run.status().await == RunStatus::Running {
                scans_running += 1;
            }
        }
        if let Some(run) = &s.report.run {
            if run.status().await == RunStatus::Running {
                reports_generating += 1;
            }
        }
    }

    HealthResponse {
        status: "healthy".to_string(),
        sessions: SessionsHealth {
            total: sessions.len(),
            scans_running,
            reports_generating,
        },
        scanner: ScannerInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            scan_tick_ms: state.config.timings.scan_tick.as_millis() as u64,
            report_tick_ms: state.config.timings.report_tick.as_millis() as u64,
        },
    }
}

/// POST /api/shutdown: stop serving once in-flight requests finish.
pub async fn shutdown(State(state): State<SharedState>) -> Json<serde_json::Value> {
    state
        .logs
        .emit(LogSource::Server, LogLevel::Info, "Shutdown requested over HTTP")
        .await;
    let _ = state.shutdown_tx.send(());
    Json(serde_json::json!({ "status": "shutting_down" }))
}
