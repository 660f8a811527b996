//! Run State Management and Step Tracking
//!
//! **Architecture**:
//! - `StepStatus`: discrete lifecycle of one pipeline step
//! - `RunState`: ordered per-step records for one invocation
//! - Transitions are validated; the pipeline drives them sequentially

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::models::StepOutcome;

/// Lifecycle of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    Running,
    /// Ran and changed something
    Completed,
    /// Ran and found nothing to do
    Skipped,
    Failed,
    /// Never started because the run was cancelled
    Cancelled,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Skipped => "skipped",
            StepStatus::Failed => "failed",
            StepStatus::Cancelled => "cancelled",
        }
    }

    /// Get all valid transitions FROM this status.
    pub fn valid_next(&self) -> Vec<StepStatus> {
        match self {
            StepStatus::Pending => vec![StepStatus::Running, StepStatus::Cancelled],
            StepStatus::Running => vec![
                StepStatus::Completed,
                StepStatus::Skipped,
                StepStatus::Failed,
            ],
            StepStatus::Completed
            | StepStatus::Skipped
            | StepStatus::Failed
            | StepStatus::Cancelled => vec![],
        }
    }

    pub fn can_transition_to(&self, next: StepStatus) -> bool {
        self.valid_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_next().is_empty()
    }
}

impl From<&StepOutcome> for StepStatus {
    fn from(outcome: &StepOutcome) -> Self {
        match outcome {
            StepOutcome::Completed => StepStatus::Completed,
            StepOutcome::AlreadySatisfied(_) => StepStatus::Skipped,
        }
    }
}

/// One step's record within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    /// Skip reason or failure message
    pub detail: Option<String>,
    pub elapsed: Option<Duration>,
    started: Option<Instant>,
}

impl StepRecord {
    fn new(name: &str) -> Self {
        StepRecord {
            name: name.to_string(),
            status: StepStatus::Pending,
            detail: None,
            elapsed: None,
            started: None,
        }
    }
}

/// Execution snapshot for one pipeline invocation.
#[derive(Debug, Clone)]
pub struct RunState {
    pub steps: Vec<StepRecord>,
    pub start_time: Instant,
    /// Error message if the run aborted
    pub error: Option<String>,
}

impl RunState {
    pub fn new<'a>(step_names: impl IntoIterator<Item = &'a str>) -> Self {
        RunState {
            steps: step_names.into_iter().map(StepRecord::new).collect(),
            start_time: Instant::now(),
            error: None,
        }
    }

    fn record_mut(&mut self, index: usize) -> Result<&mut StepRecord, String> {
        self.steps
            .get_mut(index)
            .ok_or_else(|| format!("No step at index {}", index))
    }

    /// Attempt to move step `index` to `next`.
    pub fn transition_to(&mut self, index: usize, next: StepStatus) -> Result<(), String> {
        let record = self.record_mut(index)?;
        if !record.status.can_transition_to(next) {
            return Err(format!(
                "Invalid step transition for '{}': {} -> {}",
                record.name,
                record.status.as_str(),
                next.as_str()
            ));
        }

        match next {
            StepStatus::Running => record.started = Some(Instant::now()),
            _ => record.elapsed = record.started.map(|s| s.elapsed()),
        }
        record.status = next;
        Ok(())
    }

    /// Close a running step with its outcome.
    pub fn record_outcome(&mut self, index: usize, outcome: &StepOutcome) -> Result<(), String> {
        self.transition_to(index, StepStatus::from(outcome))?;
        if let StepOutcome::AlreadySatisfied(reason) = outcome {
            self.record_mut(index)?.detail = Some(reason.clone());
        }
        Ok(())
    }

    /// Record an error and mark the step failed.
    pub fn record_error(&mut self, index: usize, error: String) -> Result<(), String> {
        self.transition_to(index, StepStatus::Failed)?;
        self.record_mut(index)?.detail = Some(error.clone());
        self.error = Some(error);
        Ok(())
    }

    /// Mark every still-pending step cancelled.
    pub fn cancel_remaining(&mut self) {
        for record in self.steps.iter_mut() {
            if record.status == StepStatus::Pending {
                record.status = StepStatus::Cancelled;
            }
        }
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|r| r.status == status).count()
    }

    pub fn status_of(&self, name: &str) -> Option<StepStatus> {
        self.steps.iter().find(|r| r.name == name).map(|r| r.status)
    }

    /// Time elapsed since run start
    pub fn elapsed_since_start(&self) -> Duration {
        self.start_time.elapsed()
    }
}
