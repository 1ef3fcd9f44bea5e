use crate::config::STAGE_SEED_PERCENT;

use super::increment::{IncrementSource, SequenceIncrement};
use super::{RunSnapshot, RunStatus, Stage, StageDefinition, StageStatus, StageView};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("a run needs at least one stage")]
    NoStages,
}

/// What a single [`ProgressEngine::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to advance: empty queue or the run is no longer running.
    Idle,
    Advanced {
        stage_id: String,
        stage_percent: u8,
    },
    StageCompleted {
        stage_id: String,
        next_stage_id: String,
    },
    /// The last stage finished; the run is now `completed`.
    RunCompleted { stage_id: String },
}

/// Clock-free state machine for one run.
///
/// At most one stage is `active`. Stages before it are `completed` (or the one
/// `failed` stage after an external failure signal); stages after it are
/// `pending`. Once the run leaves `running`, no method mutates the stages.
pub struct ProgressEngine {
    stages: Vec<Stage>,
    status: RunStatus,
    ticks: u32,
    failure_reason: Option<String>,
    increments: Box<dyn IncrementSource>,
}

impl Default for ProgressEngine {
    /// An empty queue. `tick()` is a no-op and the run never completes.
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            status: RunStatus::Running,
            ticks: 0,
            failure_reason: None,
            increments: Box::new(SequenceIncrement::constant(1)),
        }
    }
}

impl ProgressEngine {
    /// Build a run with the first stage `active` at 0% and the rest `pending`.
    pub fn initialize(
        definitions: Vec<StageDefinition>,
        increments: impl IncrementSource + 'static,
    ) -> Result<Self, ProgressError> {
        if definitions.is_empty() {
            return Err(ProgressError::NoStages);
        }

        let mut stages: Vec<Stage> = definitions.into_iter().map(Stage::from_definition).collect();
        stages[0].status = StageStatus::Active;

        Ok(Self {
            stages,
            status: RunStatus::Running,
            ticks: 0,
            failure_reason: None,
            increments: Box::new(increments),
        })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn active_stage(&self) -> Option<&Stage> {
        self.stages.iter().find(|s| s.status == StageStatus::Active)
    }

    fn active_index(&self) -> Option<usize> {
        self.stages
            .iter()
            .position(|s| s.status == StageStatus::Active)
    }

    /// Advance the active stage by one increment, promoting the next pending
    /// stage when it reaches 100.
    pub fn tick(&mut self) -> TickOutcome {
        if self.stages.is_empty() || self.status != RunStatus::Running {
            return TickOutcome::Idle;
        }
        let Some(idx) = self.active_index() else {
            return TickOutcome::Idle;
        };

        self.ticks += 1;
        let increment = self.increments.next_increment();
        let stage = &mut self.stages[idx];
        let raised = stage.percent_complete.saturating_add(increment);

        if raised < 100 {
            stage.percent_complete = raised;
            return TickOutcome::Advanced {
                stage_id: stage.id.clone(),
                stage_percent: raised,
            };
        }

        stage.percent_complete = 100;
        stage.status = StageStatus::Completed;
        let stage_id = stage.id.clone();

        match self
            .stages
            .iter()
            .position(|s| s.status == StageStatus::Pending)
        {
            Some(next) => {
                let next_stage = &mut self.stages[next];
                next_stage.status = StageStatus::Active;
                next_stage.percent_complete = STAGE_SEED_PERCENT;
                TickOutcome::StageCompleted {
                    stage_id,
                    next_stage_id: next_stage.id.clone(),
                }
            }
            None => {
                self.status = RunStatus::Completed;
                TickOutcome::RunCompleted { stage_id }
            }
        }
    }

    /// `(100 × completed + active percent) / total`, rounded half up.
    pub fn overall_percent(&self) -> u8 {
        let total = self.stages.len() as u32;
        if total == 0 {
            return 0;
        }
        let completed = self
            .stages
            .iter()
            .filter(|s| s.status == StageStatus::Completed)
            .count() as u32;
        let active = self
            .active_stage()
            .map(|s| s.percent_complete as u32)
            .unwrap_or(0);

        let sum = 100 * completed + active;
        let rounded = (2 * sum + total) / (2 * total);
        rounded.min(100) as u8
    }

    pub fn is_complete(&self) -> bool {
        !self.stages.is_empty()
            && self
                .stages
                .iter()
                .all(|s| s.status == StageStatus::Completed)
    }

    /// Returns true if this call moved the run to `cancelled`.
    pub fn cancel(&mut self) -> bool {
        if self.status != RunStatus::Running {
            return false;
        }
        self.status = RunStatus::Cancelled;
        true
    }

    /// External failure signal. Marks the active stage `failed`.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.status != RunStatus::Running {
            return false;
        }
        if let Some(idx) = self.active_index() {
            self.stages[idx].status = StageStatus::Failed;
        }
        self.status = RunStatus::Failed;
        self.failure_reason = Some(reason.into());
        true
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    fn current_step(&self) -> usize {
        match self
            .stages
            .iter()
            .position(|s| matches!(s.status, StageStatus::Active | StageStatus::Failed))
        {
            Some(idx) => idx + 1,
            None => self
                .stages
                .iter()
                .filter(|s| s.status == StageStatus::Completed)
                .count()
                .max(1)
                .min(self.stages.len()),
        }
    }

    /// Snapshot without timing information; the driver fills that in.
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            stages: self
                .stages
                .iter()
                .map(|s| StageView {
                    progress_text: s.progress_text(),
                    stage: s.clone(),
                })
                .collect(),
            overall_percent: self.overall_percent(),
            status: self.status,
            ticks: self.ticks,
            current_step: self.current_step(),
            total_steps: self.stages.len(),
            elapsed_secs: 0,
            estimated_remaining_secs: 0,
            failure_reason: self.failure_reason.clone(),
        }
    }
}
