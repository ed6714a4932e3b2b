//! Load job state machine
//!
//! ```text
//! pending -> executing -> succeeded
//!                      -> diagnosing -> failed
//! ```

use serde::Serialize;

use super::diagnostics::DiagnosticOutcome;
use super::plan::CopyDescriptor;

/// Where a job is in its lifecycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Executing,
    Succeeded,
    /// Ingest failed and was rolled back; load-error log is being read
    Diagnosing { error: String },
    /// Final failed state, with whatever the diagnostic step recovered
    Failed {
        error: String,
        diagnostic: DiagnosticOutcome,
    },
}

impl JobState {
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Executing => "executing",
            JobState::Succeeded => "succeeded",
            JobState::Diagnosing { .. } => "diagnosing",
            JobState::Failed { .. } => "failed",
        }
    }

    pub fn can_advance_to(&self, next: &JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Executing)
                | (JobState::Executing, JobState::Succeeded)
                | (JobState::Executing, JobState::Diagnosing { .. })
                | (JobState::Diagnosing { .. }, JobState::Failed { .. })
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed { .. })
    }
}

/// One table's unit of work and its outcome
#[derive(Debug, Clone, Serialize)]
pub struct LoadJob {
    pub table: String,
    pub source: String,
    #[serde(flatten)]
    pub state: JobState,
    /// Set when rolling back the failed ingest also failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_error: Option<String>,
    pub elapsed_ms: u64,
}

impl LoadJob {
    pub fn new(descriptor: &CopyDescriptor) -> Self {
        Self {
            table: descriptor.table.clone(),
            source: descriptor.source_uri.clone(),
            state: JobState::Pending,
            rollback_error: None,
            elapsed_ms: 0,
        }
    }

    /// Move to `next` if the transition is legal; otherwise the state is left
    /// untouched
    pub fn advance(&mut self, next: JobState) {
        if self.state.can_advance_to(&next) {
            tracing::debug!(table = %self.table, from = self.state.name(), to = next.name(), "job transition");
            self.state = next;
        } else {
            tracing::error!(
                table = %self.table,
                from = self.state.name(),
                to = next.name(),
                "invalid job transition"
            );
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self.state, JobState::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, JobState::Failed { .. })
    }

    /// Primary ingest error, once the job has failed
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            JobState::Diagnosing { error } | JobState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&DiagnosticOutcome> {
        match &self.state {
            JobState::Failed { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}
