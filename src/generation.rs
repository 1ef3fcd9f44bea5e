//! Report generation: lead submission starts a second progress run whose
//! completion produces the downloadable artifact.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::REPORT_INITIAL_ESTIMATE_SECS;
use crate::error::ScannerError;
use crate::fixtures;
use crate::lead::{LeadForm, LeadFormView, LeadRecord};
use crate::log_capture::{LogLevel, LogSource};
use crate::progress::{
    spawn_run, ProgressEngine, RandomIncrement, RunEvent, RunOptions, RunSnapshot,
};
use crate::report::{Delivery, ReportArtifact, SectionView};
use crate::state::{SessionState, SharedSession, SharedState};

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub sections: Vec<SectionView>,
    pub delivery: Delivery,
    pub lead_form: LeadFormView,
    pub lead: Option<LeadRecord>,
    pub generation: Option<RunSnapshot>,
    pub artifact: Option<ArtifactInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub file_name: String,
    pub media_type: &'static str,
    pub size: usize,
}

pub async fn view(session: &SharedSession) -> ReportView {
    let s = session.read().await;
    report_view(&s).await
}

async fn report_view(s: &SessionState) -> ReportView {
    let generation = match s.report.run.as_ref() {
        Some(run) => Some(run.snapshot().await),
        None => None,
    };
    ReportView {
        sections: s.report.sections.view(),
        delivery: s.report.delivery.clone(),
        lead_form: s.report.lead_form.view(),
        lead: s.report.lead.clone(),
        generation,
        artifact: s.report.artifact.as_ref().map(|a| ArtifactInfo {
            file_name: a.file_name.clone(),
            media_type: a.media_type,
            size: a.bytes.len(),
        }),
    }
}

/// Validate the lead and start generating. A form sent with the request
/// replaces what was typed field by field; without one the typed values are
/// submitted. A run already in progress is replaced.
pub async fn submit(
    state: &SharedState,
    session: &SharedSession,
    form: Option<LeadForm>,
) -> Result<ReportView, ScannerError> {
    let mut s = session.write().await;
    if let Some(form) = form {
        s.report.lead_form.replace(form);
    }
    let lead = s
        .report
        .lead_form
        .submit()
        .map_err(ScannerError::InvalidLead)?;

    if s.report.sections.selected().is_empty() {
        return Err(ScannerError::Validation(
            "Select at least one report section".to_string(),
        ));
    }
    s.report
        .delivery
        .validate()
        .map_err(|msg| ScannerError::Validation(msg.to_string()))?;

    let engine = ProgressEngine::initialize(
        fixtures::report().generation_stages.clone(),
        RandomIncrement::up_to(state.config.max_increment),
    )
    .map_err(|e| ScannerError::Other(e.to_string()))?;

    if let Some(previous) = s.report.run.take() {
        previous.dispose();
    }
    let run = spawn_run(
        engine,
        RunOptions {
            interval: state.config.timings.report_tick,
            initial_estimate: Duration::from_secs(REPORT_INITIAL_ESTIMATE_SECS),
        },
    );
    let events = run.subscribe();
    let run_id = run.id().to_string();

    s.report.lead = Some(lead.clone());
    s.report.artifact = None;
    s.report.run = Some(run);
    let view = report_view(&s).await;
    drop(s);

    info!("Report generation {} started", run_id);
    state
        .logs
        .emit(
            LogSource::Report,
            LogLevel::Info,
            format!(
                "Lead captured for {} {} at {}",
                lead.first_name, lead.last_name, lead.company
            ),
        )
        .await;

    tokio::spawn(watch_generation(
        state.clone(),
        session.clone(),
        run_id,
        events,
    ));
    Ok(view)
}

/// Stop generating and clear the run. Returns whether one was running.
pub async fn cancel(state: &SharedState, session: &SharedSession) -> Result<bool, ScannerError> {
    let mut s = session.write().await;
    let run = s.report.run.take().ok_or(ScannerError::NoActiveReport)?;
    let changed = run.cancel().await;
    run.dispose();
    s.report.artifact = None;
    drop(s);

    if changed {
        state
            .logs
            .emit(LogSource::Report, LogLevel::Warning, "Report generation cancelled")
            .await;
    }
    Ok(changed)
}

pub async fn download(session: &SharedSession) -> Result<ReportArtifact, ScannerError> {
    let s = session.read().await;
    if s.report.run.is_none() && s.report.artifact.is_none() {
        return Err(ScannerError::NoActiveReport);
    }
    s.report.artifact.clone().ok_or(ScannerError::ReportNotReady)
}

async fn watch_generation(
    state: SharedState,
    session: SharedSession,
    run_id: String,
    mut events: broadcast::Receiver<RunEvent>,
) {
    loop {
        match events.recv().await {
            Ok(RunEvent::Completed) => {
                finish(&state, &session, &run_id).await;
                break;
            }
            Ok(RunEvent::Cancelled) => break,
            Ok(RunEvent::Failed { reason }) => {
                state
                    .logs
                    .emit(
                        LogSource::Report,
                        LogLevel::Error,
                        format!("Report generation failed: {}", reason),
                    )
                    .await;
                break;
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Report {} watcher lagged by {} events", run_id, n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("Report {} watcher exiting", run_id);
}

async fn finish(state: &SharedState, session: &SharedSession, run_id: &str) {
    let mut s = session.write().await;
    if s.report.run.as_ref().map(|r| r.id()) != Some(run_id) {
        return;
    }
    let Some(lead) = s.report.lead.clone() else {
        return;
    };

    let store_url = s
        .handoff()
        .map(|h| h.store_url)
        .unwrap_or_else(|| fixtures::dashboard().store.url.clone());
    let generated_at = chrono::Utc::now().timestamp_millis();
    let artifact = ReportArtifact::render(
        &lead,
        &store_url,
        &s.report.sections.selected_sections(),
        generated_at,
    );
    let file_name = artifact.file_name.clone();
    let delivery = s.report.delivery.clone();
    s.report.artifact = Some(artifact);
    drop(s);

    if delivery.method.downloads() {
        state
            .logs
            .emit(
                LogSource::Report,
                LogLevel::Success,
                format!("Report ready for download: {}", file_name),
            )
            .await;
    }
    if let Some(recipient) = delivery.recipient(&lead) {
        state
            .logs
            .emit(
                LogSource::Report,
                LogLevel::Success,
                format!("Report emailed to {}", recipient),
            )
            .await;
    }
    info!("Report generation {} completed: {}", run_id, file_name);
}
