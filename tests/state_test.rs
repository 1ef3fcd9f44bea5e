use std::sync::Arc;
use std::time::Duration;

use klaviyo_health_scanner::config::ScannerConfig;
use klaviyo_health_scanner::error::ScannerError;
use klaviyo_health_scanner::generation;
use klaviyo_health_scanner::lead::LeadForm;
use klaviyo_health_scanner::log_capture::LogSource;
use klaviyo_health_scanner::progress::RunStatus;
use klaviyo_health_scanner::scan;
use klaviyo_health_scanner::screen::Screen;
use klaviyo_health_scanner::state::{spawn_session_sweeper, ScannerState, SharedSession};

#[tokio::test]
async fn test_state_creation() {
    let state = ScannerState::new(ScannerConfig::default());
    assert!(state.sessions.read().await.is_empty());
    assert!(state.logs.history().await.is_empty());
}

#[tokio::test]
async fn test_new_session_defaults() {
    let state = ScannerState::new(ScannerConfig::default());
    let (id, session) = state.create_session().await;

    let s = session.read().await;
    assert_eq!(s.id, id);
    assert_eq!(s.screen, Screen::Setup);
    assert!(s.scan.is_none());
    assert!(s.handoff().is_none());
    assert!(!s.setup.is_url_valid());
    assert!(s.setup.selected_tests().is_empty());

    // Fix checklist opens on the first unfinished high-severity issue
    assert_eq!(s.fixes.selected().unwrap().id, "api-key-invalid");

    // Report starts with the four default sections and no run
    assert_eq!(s.report.sections.selected().len(), 4);
    assert!(s.report.run.is_none());
    assert!(s.report.artifact.is_none());
}

#[tokio::test]
async fn test_session_lookup_and_removal() {
    let state = ScannerState::new(ScannerConfig::default());
    let (id, _) = state.create_session().await;

    assert!(state.session(&id).await.is_ok());
    assert!(matches!(
        state.session("missing").await,
        Err(ScannerError::SessionNotFound(_))
    ));

    state.remove_session(&id).await.unwrap();
    assert!(state.session(&id).await.is_err());
    assert!(state.remove_session(&id).await.is_err());
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let state = ScannerState::new(ScannerConfig::default());
    let (_, a) = state.create_session().await;
    let (_, b) = state.create_session().await;

    a.write().await.results.expanded.toggle("purchase-tracking");
    assert!(a.read().await.results.expanded.is_expanded("purchase-tracking"));
    assert!(!b.read().await.results.expanded.is_expanded("purchase-tracking"));
}

async fn ready_for_scan(session: &SharedSession) {
    let mut s = session.write().await;
    s.setup.edit_url("https://my-shop.myshopify.com");
    let attempt = s.setup.blur_url().unwrap();
    assert_eq!(s.setup.resolve_url(&attempt, Ok(())), Some(true));
    s.setup.toggle_test("gdpr-consent");
}

async fn log_messages(state: &ScannerState, source: LogSource) -> Vec<String> {
    state
        .logs
        .history_for(source)
        .await
        .into_iter()
        .map(|e| e.message)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_failed_scan_is_logged() {
    let state = Arc::new(ScannerState::new(ScannerConfig::default()));
    let (_, session) = state.create_session().await;
    ready_for_scan(&session).await;
    scan::commit_setup(&session).await.unwrap();
    scan::start_from_handoff(&state, &session).await.unwrap();

    let failed = session
        .read()
        .await
        .scan
        .as_ref()
        .unwrap()
        .run
        .fail("store went away")
        .await;
    assert!(failed);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let view = scan::snapshot(&session).await.unwrap();
    assert_eq!(view.snapshot.status, RunStatus::Failed);
    assert!(!view.can_view_results);
    assert!(!view.redirect_pending);
    assert!(log_messages(&state, LogSource::Scan)
        .await
        .iter()
        .any(|m| m == "Diagnostic scan failed: store went away"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_report_is_logged() {
    let state = Arc::new(ScannerState::new(ScannerConfig::default()));
    let (_, session) = state.create_session().await;
    let form = LeadForm {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        company: "Engines Ltd".to_string(),
        role: "Developer".to_string(),
        privacy_consent: true,
        ..Default::default()
    };
    generation::submit(&state, &session, Some(form)).await.unwrap();

    let failed = session
        .read()
        .await
        .report
        .run
        .as_ref()
        .unwrap()
        .fail("renderer crashed")
        .await;
    assert!(failed);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(matches!(
        generation::download(&session).await,
        Err(ScannerError::ReportNotReady)
    ));
    assert!(log_messages(&state, LogSource::Report)
        .await
        .iter()
        .any(|m| m == "Report generation failed: renderer crashed"));
}

#[tokio::test(start_paused = true)]
async fn test_sweep_drops_only_idle_sessions() {
    let state = ScannerState::new(ScannerConfig::default());
    let (idle, _) = state.create_session().await;
    let (busy, _) = state.create_session().await;

    tokio::time::sleep(Duration::from_secs(30 * 60)).await;
    state.session(&busy).await.unwrap();
    tokio::time::sleep(Duration::from_secs(31 * 60)).await;

    let removed = state.sweep_idle(Duration::from_secs(3600)).await;
    assert_eq!(removed, vec![idle.clone()]);
    assert!(state.session(&idle).await.is_err());
    assert!(state.session(&busy).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_sweep_keeps_sessions_with_running_scan() {
    let state = Arc::new(ScannerState::new(ScannerConfig::default()));
    let (id, session) = state.create_session().await;
    ready_for_scan(&session).await;
    scan::commit_setup(&session).await.unwrap();
    scan::start_from_handoff(&state, &session).await.unwrap();

    assert!(state.sweep_idle(Duration::ZERO).await.is_empty());
    scan::cancel(&state, &session).await.unwrap();
    assert_eq!(state.sweep_idle(Duration::ZERO).await, vec![id]);
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_expires_sessions_and_stops_on_shutdown() {
    let config = ScannerConfig {
        session_ttl: Some(Duration::from_secs(10)),
        ..Default::default()
    };
    let state = Arc::new(ScannerState::new(config));
    let (id, _) = state.create_session().await;

    let sweeper = spawn_session_sweeper(state.clone()).unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(state.session(&id).await.is_err());

    state.shutdown_tx.send(()).unwrap();
    sweeper.await.unwrap();
}

#[tokio::test]
async fn test_no_sweeper_without_ttl() {
    let config = ScannerConfig {
        session_ttl: None,
        ..Default::default()
    };
    let state = Arc::new(ScannerState::new(config));
    assert!(spawn_session_sweeper(state).is_none());
}
