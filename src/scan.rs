//! Scan screen: turns the setup handoff into a progress run, watches it,
//! and moves the session to the results screen once it finishes.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::SCAN_INITIAL_ESTIMATE_SECS;
use crate::error::ScannerError;
use crate::fixtures;
use crate::handoff::ScanHandoff;
use crate::log_capture::{LogLevel, LogSource};
use crate::progress::{
    spawn_run, DelayedTransition, ProgressEngine, RandomIncrement, RunEvent, RunOptions,
    RunSnapshot,
};
use crate::screen::Screen;
use crate::setup::stages_for;
use crate::state::{ScanState, SharedSession, SharedState};
use crate::store_url::store_host;

#[derive(Debug, Clone, Serialize)]
pub struct ScanView {
    pub run_id: String,
    pub store_url: String,
    pub selected_test_ids: Vec<String>,
    #[serde(flatten)]
    pub snapshot: RunSnapshot,
    pub can_view_results: bool,
    pub redirect_pending: bool,
}

/// Store the setup choices for the scan screen. Fails while the start
/// button would be disabled.
pub async fn commit_setup(session: &SharedSession) -> Result<ScanHandoff, ScannerError> {
    let mut s = session.write().await;
    let now_ms = chrono::Utc::now().timestamp_millis();
    let handoff = match s.setup.handoff(fixtures::catalog(), now_ms) {
        Some(h) => h,
        None => return Err(ScannerError::ScanNotReady(s.setup.gate().label)),
    };
    s.storage
        .write_handoff(&handoff)
        .map_err(|e| ScannerError::Other(format!("Failed to store scan config: {}", e)))?;
    Ok(handoff)
}

/// Start a scan from whatever the session's storage holds.
pub async fn start_from_handoff(
    state: &SharedState,
    session: &SharedSession,
) -> Result<ScanView, ScannerError> {
    let mut s = session.write().await;
    let handoff = s
        .handoff()
        .ok_or_else(|| ScannerError::ScanNotReady("No scan configuration found".to_string()))?;

    let stages = stages_for(fixtures::catalog(), &handoff.selected_test_ids);
    let engine = ProgressEngine::initialize(
        stages,
        RandomIncrement::up_to(state.config.max_increment),
    )
    .map_err(|e| ScannerError::ScanNotReady(e.to_string()))?;

    if let Some(previous) = s.scan.take() {
        debug!("Session {} replacing scan {}", s.id, previous.run.id());
        previous.dispose();
    }

    let run = spawn_run(
        engine,
        RunOptions {
            interval: state.config.timings.scan_tick,
            initial_estimate: std::time::Duration::from_secs(SCAN_INITIAL_ESTIMATE_SECS),
        },
    );
    let events = run.subscribe();
    let run_id = run.id().to_string();
    let host = store_host(&handoff.store_url).unwrap_or_else(|| handoff.store_url.clone());
    let test_count = handoff.selected_test_ids.len();

    s.scan = Some(ScanState {
        run,
        handoff,
        redirect: None,
    });
    s.screen = Screen::Scan;
    let view = scan_view(&s).await?;
    drop(s);

    info!("Scan {} started ({} tests) for {}", run_id, test_count, host);
    state
        .logs
        .emit(
            LogSource::Scan,
            LogLevel::Info,
            format!("Starting diagnostic scan for store: {}", host),
        )
        .await;

    tokio::spawn(watch_scan(
        state.clone(),
        session.clone(),
        run_id,
        events,
    ));

    Ok(view)
}

pub async fn snapshot(session: &SharedSession) -> Result<ScanView, ScannerError> {
    let s = session.read().await;
    scan_view(&s).await
}

async fn scan_view(s: &crate::state::SessionState) -> Result<ScanView, ScannerError> {
    let scan = s.scan.as_ref().ok_or(ScannerError::NoActiveScan)?;
    let snapshot = scan.run.snapshot().await;
    Ok(ScanView {
        run_id: scan.run.id().to_string(),
        store_url: scan.handoff.store_url.clone(),
        selected_test_ids: scan.handoff.selected_test_ids.clone(),
        can_view_results: snapshot.status == crate::progress::RunStatus::Completed,
        redirect_pending: scan.redirect_pending(),
        snapshot,
    })
}

/// Stop the scan, call off a pending redirect and go back to setup.
/// Returns whether the run was still going.
pub async fn cancel(state: &SharedState, session: &SharedSession) -> Result<bool, ScannerError> {
    let mut s = session.write().await;
    let scan = s.scan.as_mut().ok_or(ScannerError::NoActiveScan)?;
    let changed = scan.run.cancel().await;
    if let Some(redirect) = scan.redirect.as_mut() {
        redirect.cancel();
    }
    s.screen = Screen::Setup;
    drop(s);

    if changed {
        state
            .logs
            .emit(LogSource::Scan, LogLevel::Warning, "Diagnostic scan cancelled")
            .await;
    }
    Ok(changed)
}

/// Leaving the scan screen takes the run and its redirect with it.
pub async fn leave(state: &SharedState, session: &SharedSession) {
    let mut s = session.write().await;
    let Some(scan) = s.scan.as_mut() else {
        return;
    };
    let changed = scan.run.cancel().await;
    if let Some(redirect) = scan.redirect.as_mut() {
        redirect.cancel();
    }
    drop(s);

    if changed {
        state
            .logs
            .emit(LogSource::Scan, LogLevel::Warning, "Diagnostic scan cancelled")
            .await;
    }
}

async fn watch_scan(
    state: SharedState,
    session: SharedSession,
    run_id: String,
    mut events: broadcast::Receiver<RunEvent>,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Scan {} watcher lagged by {} events", run_id, n);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            RunEvent::Progress { .. } => {}
            RunEvent::StageCompleted { stage_id, .. } => {
                let name = fixtures::catalog()
                    .iter()
                    .find(|t| t.id == stage_id)
                    .map(|t| t.title.as_str())
                    .unwrap_or(stage_id.as_str());
                state
                    .logs
                    .emit(
                        LogSource::Scan,
                        LogLevel::Info,
                        format!("{} test completed", name),
                    )
                    .await;
            }
            RunEvent::Completed => {
                state
                    .logs
                    .emit(
                        LogSource::Scan,
                        LogLevel::Success,
                        "Diagnostic scan completed",
                    )
                    .await;
                schedule_redirect(&state, &session, &run_id).await;
                break;
            }
            RunEvent::Cancelled => break,
            RunEvent::Failed { reason } => {
                state
                    .logs
                    .emit(
                        LogSource::Scan,
                        LogLevel::Error,
                        format!("Diagnostic scan failed: {}", reason),
                    )
                    .await;
                break;
            }
        }
    }
    debug!("Scan {} watcher exiting", run_id);
}

async fn schedule_redirect(state: &SharedState, session: &SharedSession, run_id: &str) {
    let mut s = session.write().await;
    let Some(scan) = s.scan.as_mut() else {
        return;
    };
    if scan.run.id() != run_id {
        return;
    }

    let target = session.clone();
    let expected_run = run_id.to_string();
    scan.redirect = Some(DelayedTransition::schedule(
        state.config.timings.redirect_delay,
        move || async move {
            let mut s = target.write().await;
            let still_current = s
                .scan
                .as_ref()
                .is_some_and(|scan| scan.run.id() == expected_run);
            if still_current && s.screen == Screen::Scan {
                s.screen = Screen::Results;
                s.results = Default::default();
                debug!("Session {} moved to results", s.id);
            }
        },
    ));
}
