//! Simulated multi-stage progress runs.
//!
//! A run is an ordered queue of [`Stage`]s driven to completion one at a time.
//! [`engine::ProgressEngine`] holds the state machine and is clock-free;
//! [`runner::RunHandle`] drives it from a tokio interval and publishes
//! [`RunEvent`]s; [`transition::DelayedTransition`] is the cancellable
//! one-shot timer hosts use to navigate after completion.

pub mod engine;
pub mod increment;
pub mod runner;
pub mod transition;

use serde::{Deserialize, Serialize};

pub use engine::{ProgressEngine, ProgressError, TickOutcome};
pub use increment::{IncrementSource, RandomIncrement, SequenceIncrement};
pub use runner::{spawn_run, RunHandle, RunOptions};
pub use transition::DelayedTransition;

/// Static description of a stage, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl StageDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: StageStatus,
    pub percent_complete: u8,
}

impl Stage {
    fn from_definition(def: StageDefinition) -> Self {
        Self {
            id: def.id,
            name: def.name,
            description: def.description,
            status: StageStatus::Pending,
            percent_complete: 0,
        }
    }

    /// Short line shown under the stage name.
    pub fn progress_text(&self) -> &'static str {
        match self.status {
            StageStatus::Pending => "Waiting to start...",
            StageStatus::Active if self.percent_complete <= crate::config::STAGE_SEED_PERCENT => {
                "Initializing test..."
            }
            StageStatus::Active => "Analyzing data...",
            StageStatus::Completed => "Completed successfully",
            StageStatus::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// Read-only view of a run for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub stages: Vec<StageView>,
    pub overall_percent: u8,
    pub status: RunStatus,
    pub ticks: u32,
    /// 1-based index of the active stage; equals the stage count once done.
    pub current_step: usize,
    pub total_steps: usize,
    pub elapsed_secs: u64,
    pub estimated_remaining_secs: u64,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageView {
    #[serde(flatten)]
    pub stage: Stage,
    pub progress_text: &'static str,
}

/// Observable signal published by a running [`RunHandle`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Progress {
        stage_id: String,
        stage_percent: u8,
        overall_percent: u8,
    },
    StageCompleted {
        stage_id: String,
        next_stage_id: Option<String>,
        overall_percent: u8,
    },
    Completed,
    Cancelled,
    Failed {
        reason: String,
    },
}

impl RunEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RunEvent::Progress { .. } => "progress",
            RunEvent::StageCompleted { .. } => "stage_completed",
            RunEvent::Completed => "completed",
            RunEvent::Cancelled => "cancelled",
            RunEvent::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunEvent::Completed | RunEvent::Cancelled | RunEvent::Failed { .. }
        )
    }
}
