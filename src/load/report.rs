//! Batch summary

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::diagnostics::DiagnosticOutcome;
use super::job::LoadJob;
use crate::status::RunStatus;

/// Result of one orchestration run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// One finished job per attempted table, in mapping order
    pub jobs: Vec<LoadJob>,
    /// Tables never attempted because the batch aborted
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unattempted: Vec<String>,
    /// The batch-terminating error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
}

impl BatchReport {
    pub fn new(batch_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            batch_id,
            started_at,
            duration_ms: 0,
            jobs: Vec::new(),
            unattempted: Vec::new(),
            fatal: None,
        }
    }

    /// A batch that never got a connection: no jobs, every table unattempted
    pub fn aborted(
        batch_id: Uuid,
        started_at: DateTime<Utc>,
        tables: Vec<String>,
        error: String,
    ) -> Self {
        Self {
            unattempted: tables,
            fatal: Some(error),
            ..Self::new(batch_id, started_at)
        }
    }

    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|j| j.is_succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.jobs.iter().filter(|j| j.is_failed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &LoadJob> {
        self.jobs.iter().filter(|j| j.is_failed())
    }

    pub fn job(&self, table: &str) -> Option<&LoadJob> {
        self.jobs.iter().find(|j| j.table == table)
    }

    pub fn status(&self) -> RunStatus {
        RunStatus::from_counts(self.failed(), self.fatal.is_some())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Operator-facing summary: every table's outcome, with diagnostic detail
    /// inlined for failures
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        if let Some(fatal) = &self.fatal {
            out.push_str(&format!("Batch {} aborted: {}\n", self.batch_id, fatal));
            if !self.unattempted.is_empty() {
                out.push_str(&format!("Not attempted: {}\n", self.unattempted.join(", ")));
            }
            return out;
        }

        for job in &self.jobs {
            if job.is_succeeded() {
                out.push_str(&format!(
                    "  ok      {} <- {} ({}ms)\n",
                    job.table, job.source, job.elapsed_ms
                ));
                continue;
            }

            out.push_str(&format!(
                "  FAILED  {} <- {}\n",
                job.table, job.source
            ));
            if let Some(error) = job.error() {
                out.push_str(&format!("    Error    : {}\n", error));
            }
            if let Some(rollback) = &job.rollback_error {
                out.push_str(&format!("    Rollback : {}\n", rollback));
            }
            match job.diagnostic() {
                Some(DiagnosticOutcome::Recovered { record }) => {
                    out.push_str(&record.render_text("    "));
                }
                Some(DiagnosticOutcome::NoRecord) => {
                    out.push_str("    (no load-error record found)\n");
                }
                Some(DiagnosticOutcome::Unavailable { error }) => {
                    out.push_str(&format!("    Diagnostic unavailable: {}\n", error));
                }
                None => {}
            }
        }

        out.push_str(&format!(
            "Batch {}: {} succeeded, {} failed ({}ms)\n",
            self.batch_id,
            self.succeeded(),
            self.failed(),
            self.duration_ms
        ));
        out
    }
}
