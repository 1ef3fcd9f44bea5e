use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::RUN_EVENT_CHANNEL_SIZE;

use super::engine::{ProgressEngine, TickOutcome};
use super::{RunEvent, RunSnapshot, RunStatus};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub interval: Duration,
    /// Starting value of the remaining-time estimate.
    pub initial_estimate: Duration,
}

/// Owns a background tick task for one [`ProgressEngine`].
///
/// Ticks are applied by a single task, one at a time. The task exits on its
/// own after the last stage completes, on `cancel`/`fail`, or when the handle
/// is dropped (the stop channel closes).
pub struct RunHandle {
    id: String,
    engine: Arc<RwLock<ProgressEngine>>,
    events: broadcast::Sender<RunEvent>,
    stop_tx: watch::Sender<bool>,
    options: RunOptions,
    task: JoinHandle<()>,
}

pub fn spawn_run(engine: ProgressEngine, options: RunOptions) -> RunHandle {
    let id = uuid::Uuid::new_v4().to_string();
    let engine = Arc::new(RwLock::new(engine));
    let (events, _) = broadcast::channel(RUN_EVENT_CHANNEL_SIZE);
    let (stop_tx, stop_rx) = watch::channel(false);

    let task = tokio::spawn(drive(
        id.clone(),
        engine.clone(),
        options.interval,
        stop_rx,
        events.clone(),
    ));

    RunHandle {
        id,
        engine,
        events,
        stop_tx,
        options,
        task,
    }
}

async fn drive(
    run_id: String,
    engine: Arc<RwLock<ProgressEngine>>,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
    events: broadcast::Sender<RunEvent>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    debug!("Run {} stopped", run_id);
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let (outcome, overall_percent) = {
            let mut e = engine.write().await;
            if e.status().is_terminal() {
                break;
            }
            let outcome = e.tick();
            (outcome, e.overall_percent())
        };

        match outcome {
            TickOutcome::Idle => {
                debug!("Run {} has nothing to advance, stopping ticks", run_id);
                break;
            }
            TickOutcome::Advanced {
                stage_id,
                stage_percent,
            } => {
                let _ = events.send(RunEvent::Progress {
                    stage_id,
                    stage_percent,
                    overall_percent,
                });
            }
            TickOutcome::StageCompleted {
                stage_id,
                next_stage_id,
            } => {
                let _ = events.send(RunEvent::StageCompleted {
                    stage_id,
                    next_stage_id: Some(next_stage_id),
                    overall_percent,
                });
            }
            TickOutcome::RunCompleted { stage_id } => {
                let _ = events.send(RunEvent::StageCompleted {
                    stage_id,
                    next_stage_id: None,
                    overall_percent,
                });
                let _ = events.send(RunEvent::Completed);
                info!("Run {} completed", run_id);
                break;
            }
        }
    }
}

fn with_timing(mut snapshot: RunSnapshot, options: &RunOptions) -> RunSnapshot {
    let elapsed = options.interval.as_secs_f64() * snapshot.ticks as f64;
    snapshot.elapsed_secs = elapsed.round() as u64;
    snapshot.estimated_remaining_secs = match snapshot.status {
        RunStatus::Completed => 0,
        _ => options
            .initial_estimate
            .as_secs()
            .saturating_sub(snapshot.elapsed_secs),
    };
    snapshot
}

impl RunHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> RunSnapshot {
        let snapshot = self.engine.read().await.snapshot();
        with_timing(snapshot, &self.options)
    }

    pub async fn status(&self) -> RunStatus {
        self.engine.read().await.status()
    }

    pub async fn is_complete(&self) -> bool {
        self.engine.read().await.is_complete()
    }

    /// Stop ticking and mark the run `cancelled`. Idempotent; a no-op on a
    /// run that already completed or failed. Returns true on the transition.
    pub async fn cancel(&self) -> bool {
        let changed = self.engine.write().await.cancel();
        let _ = self.stop_tx.send(true);
        if changed {
            let _ = self.events.send(RunEvent::Cancelled);
        }
        changed
    }

    pub async fn fail(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let changed = self.engine.write().await.fail(reason.clone());
        let _ = self.stop_tx.send(true);
        if changed {
            let _ = self.events.send(RunEvent::Failed { reason });
        }
        changed
    }

    /// True once the tick task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the tick task to exit and return the final snapshot.
    pub async fn wait(self) -> RunSnapshot {
        let RunHandle {
            engine,
            stop_tx,
            options,
            task,
            ..
        } = self;
        let _ = task.await;
        drop(stop_tx);
        let snapshot = engine.read().await.snapshot();
        with_timing(snapshot, &options)
    }

    /// Tear down without touching the run status.
    pub fn dispose(self) {
        let _ = self.stop_tx.send(true);
        self.task.abort();
    }
}
