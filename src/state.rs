use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant};
use tracing::{debug, info};

use crate::config::{ScannerConfig, SESSION_SWEEP_MIN_INTERVAL_SECS};
use crate::error::ScannerError;
use crate::fixes::FixChecklist;
use crate::fixtures;
use crate::handoff::{ScanHandoff, SessionStorage};
use crate::lead::{LeadFormState, LeadRecord};
use crate::log_capture::{LogLevel, LogSource, LogState};
use crate::progress::{DelayedTransition, RunHandle, RunStatus};
use crate::report::{Delivery, ReportArtifact, SectionSelection};
use crate::results::ResultsView;
use crate::screen::Screen;
use crate::setup::SetupSelection;

pub type SharedState = Arc<ScannerState>;
pub type SharedSession = Arc<RwLock<SessionState>>;

pub struct ScannerState {
    pub config: ScannerConfig,
    pub sessions: RwLock<HashMap<String, SharedSession>>,
    pub logs: LogState,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl ScannerState {
    pub fn new(config: ScannerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            logs: LogState::new(),
            shutdown_tx,
        }
    }

    pub async fn create_session(&self) -> (String, SharedSession) {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(RwLock::new(SessionState::new(id.clone())));
        self.sessions
            .write()
            .await
            .insert(id.clone(), session.clone());
        (id, session)
    }

    /// Look a session up and mark it active.
    pub async fn session(&self, id: &str) -> Result<SharedSession, ScannerError> {
        let session = self
            .sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ScannerError::SessionNotFound(id.to_string()))?;
        session.write().await.last_active = Instant::now();
        Ok(session)
    }

    /// Remove sessions untouched for `ttl` that have nothing running.
    /// Returns the removed ids.
    pub async fn sweep_idle(&self, ttl: Duration) -> Vec<String> {
        let sessions: Vec<_> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, s)| (id.clone(), s.clone()))
            .collect();

        let mut idle = Vec::new();
        for (id, session) in sessions {
            let s = session.read().await;
            if s.last_active.elapsed() >= ttl && !s.has_running_work().await {
                idle.push(id);
            }
        }

        let mut removed = Vec::new();
        for id in idle {
            if self.remove_session(&id).await.is_ok() {
                removed.push(id);
            }
        }
        removed
    }

    /// Drop a session along with its runs and timers.
    pub async fn remove_session(&self, id: &str) -> Result<(), ScannerError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| ScannerError::SessionNotFound(id.to_string()))?;
        let mut session = session.write().await;
        if let Some(scan) = session.scan.take() {
            scan.dispose();
        }
        if let Some(run) = session.report.run.take() {
            run.dispose();
        }
        Ok(())
    }
}

/// Periodically drop idle sessions. `None` when sessions never expire.
pub fn spawn_session_sweeper(state: SharedState) -> Option<JoinHandle<()>> {
    let ttl = state.config.session_ttl?;
    let period = (ttl / 4).max(Duration::from_secs(SESSION_SWEEP_MIN_INTERVAL_SECS));
    Some(tokio::spawn(async move {
        let mut ticker = interval(period);
        let mut shutdown_rx = state.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.recv() => break,
            }
            let removed = state.sweep_idle(ttl).await;
            if !removed.is_empty() {
                info!("Expired {} idle session(s)", removed.len());
                state
                    .logs
                    .emit(
                        LogSource::Server,
                        LogLevel::Debug,
                        format!("Expired idle sessions: {}", removed.join(", ")),
                    )
                    .await;
            }
        }
        debug!("Session sweeper exiting");
    }))
}

/// Everything one visitor has going on.
pub struct SessionState {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: Instant,
    pub screen: Screen,
    pub setup: SetupSelection,
    pub storage: SessionStorage,
    pub scan: Option<ScanState>,
    pub results: ResultsView,
    pub fixes: FixChecklist,
    pub report: ReportState,
}

impl SessionState {
    pub fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            last_active: Instant::now(),
            screen: Screen::Setup,
            setup: SetupSelection::default(),
            storage: SessionStorage::default(),
            scan: None,
            results: ResultsView::default(),
            fixes: FixChecklist::new(fixtures::fix_issues()),
            report: ReportState::new(),
        }
    }

    pub fn handoff(&self) -> Option<ScanHandoff> {
        self.storage.read_handoff()
    }

    /// A scan or report run is still ticking.
    pub async fn has_running_work(&self) -> bool {
        if let Some(scan) = &self.scan {
            if scan.run.status().await == RunStatus::Running {
                return true;
            }
        }
        match &self.report.run {
            Some(run) => run.status().await == RunStatus::Running,
            None => false,
        }
    }
}

pub struct ScanState {
    pub run: RunHandle,
    pub handoff: ScanHandoff,
    /// Pending switch to the results screen, set once the run completes.
    pub redirect: Option<DelayedTransition>,
}

impl ScanState {
    pub fn redirect_pending(&self) -> bool {
        self.redirect.as_ref().is_some_and(DelayedTransition::is_pending)
    }

    pub fn dispose(mut self) {
        if let Some(mut redirect) = self.redirect.take() {
            redirect.cancel();
        }
        self.run.dispose();
    }
}

pub struct ReportState {
    pub sections: SectionSelection,
    pub delivery: Delivery,
    /// What has been typed into the lead form so far.
    pub lead_form: LeadFormState,
    pub lead: Option<LeadRecord>,
    pub run: Option<RunHandle>,
    pub artifact: Option<ReportArtifact>,
}

impl ReportState {
    pub fn new() -> Self {
        Self {
            sections: SectionSelection::new(fixtures::report().sections.clone()),
            delivery: Delivery::default(),
            lead_form: LeadFormState::default(),
            lead: None,
            run: None,
            artifact: None,
        }
    }
}

impl Default for ReportState {
    fn default() -> Self {
        Self::new()
    }
}
