//! Bulk load orchestration
//!
//! One warehouse session for the whole batch, one transaction per table. A
//! table that fails is rolled back, diagnosed, recorded, and the batch moves
//! on; every table in the plan gets exactly one attempt. The only
//! batch-terminating failure is not being able to connect at all.

use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use super::diagnostics::fetch_load_error;
use super::job::{JobState, LoadJob};
use super::plan::{CopyDescriptor, LoadPlan};
use super::report::BatchReport;
use crate::database::{Connector, WarehouseSession, execute_scoped, quote_ident};

/// Runs a `LoadPlan` against the warehouse
pub struct Orchestrator<C: Connector> {
    connector: C,
    plan: LoadPlan,
}

impl<C: Connector> Orchestrator<C> {
    pub fn new(connector: C, plan: LoadPlan) -> Self {
        Self { connector, plan }
    }

    /// Attempt every table in plan order and return the batch report
    pub async fn run(&self) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::info!(%batch_id, tables = self.plan.len(), "starting load batch");
        if self.plan.is_empty() {
            tracing::warn!(%batch_id, "load plan has no tables");
        }

        let session = match self.connector.connect().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(%batch_id, "batch aborted before any table was attempted: {}", e);
                let mut report =
                    BatchReport::aborted(batch_id, started_at, self.plan.table_names(), e.to_string());
                report.duration_ms = start.elapsed().as_millis() as u64;
                return report;
            }
        };
        tracing::debug!(%batch_id, backend = session.backend_type(), "session open");

        // Tables are addressed schema-qualified; the search path only helps
        // anything the warehouse resolves unqualified.
        let set_path = format!("SET search_path TO {}", quote_ident(&self.plan.schema));
        if let Err(e) = session.execute(&set_path).await {
            tracing::warn!(schema = %self.plan.schema, "could not set search_path: {}", e);
        }

        let mut report = BatchReport::new(batch_id, started_at);
        for descriptor in &self.plan.descriptors {
            let job = self.run_job(&session, descriptor).await;
            report.jobs.push(job);
        }

        if let Err(e) = session.close().await {
            tracing::warn!("failed to close session: {}", e);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            %batch_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "load batch finished"
        );
        report
    }

    async fn run_job(&self, session: &C::Session, descriptor: &CopyDescriptor) -> LoadJob {
        let start = Instant::now();
        let mut job = LoadJob::new(descriptor);
        let statement = descriptor.render(&self.plan.schema);

        tracing::info!(table = %descriptor.table, source = %descriptor.source_uri, "loading");
        tracing::debug!(table = %descriptor.table, %statement, "COPY command");
        job.advance(JobState::Executing);

        match execute_scoped(session, &statement).await {
            Ok(()) => {
                tracing::info!(table = %descriptor.table, "loaded");
                job.advance(JobState::Succeeded);
            }
            Err(failure) => {
                let error = failure.error.to_string();
                tracing::warn!(table = %descriptor.table, "load failed, rolled back: {}", error);
                job.rollback_error = failure.rollback_error.map(|e| e.to_string());
                job.advance(JobState::Diagnosing {
                    error: error.clone(),
                });

                let diagnostic =
                    fetch_load_error(session, &self.plan.schema, &descriptor.table).await;
                job.advance(JobState::Failed { error, diagnostic });
            }
        }

        job.elapsed_ms = start.elapsed().as_millis() as u64;
        job
    }
}
