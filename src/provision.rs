//! Schema provisioning
//!
//! Runs the fixed, ordered DDL list against the warehouse. Each statement is
//! executed in its own transaction and guarded independently: a failing
//! statement is recorded and the remaining statements are still attempted.
//! Only a connection failure stops the run, before anything is attempted.

use serde::Serialize;
use std::time::Instant;

use crate::database::schema::{DdlStatement, WarehouseSchema};
use crate::database::{Connector, WarehouseSession, execute_scoped};
use crate::status::RunStatus;

/// Outcome of one DDL statement
#[derive(Debug, Clone, Serialize)]
pub struct StatementOutcome {
    pub label: String,
    /// `None` when the statement succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatementOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a provisioning run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvisionReport {
    /// One entry per attempted statement, in list order
    pub statements: Vec<StatementOutcome>,
    /// Set when the connection could not be established
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
    pub duration_ms: u64,
}

impl ProvisionReport {
    pub fn succeeded(&self) -> usize {
        self.statements.iter().filter(|s| s.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.statements.len() - self.succeeded()
    }

    pub fn status(&self) -> RunStatus {
        RunStatus::from_counts(self.failed(), self.fatal.is_some())
    }

    /// Human-readable summary
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if let Some(fatal) = &self.fatal {
            out.push_str(&format!("Provisioning aborted: {}\n", fatal));
            return out;
        }
        for statement in &self.statements {
            match &statement.error {
                None => out.push_str(&format!("  ok      {}\n", statement.label)),
                Some(e) => out.push_str(&format!("  FAILED  {}: {}\n", statement.label, e)),
            }
        }
        out.push_str(&format!(
            "Provisioning: {} succeeded, {} failed ({}ms)\n",
            self.succeeded(),
            self.failed(),
            self.duration_ms
        ));
        out
    }
}

/// Ensures the namespace and tables exist
pub struct SchemaProvisioner {
    statements: Vec<DdlStatement>,
}

impl Default for SchemaProvisioner {
    fn default() -> Self {
        Self::new(WarehouseSchema::statements())
    }
}

impl SchemaProvisioner {
    pub fn new(statements: Vec<DdlStatement>) -> Self {
        Self { statements }
    }

    pub fn statements(&self) -> &[DdlStatement] {
        &self.statements
    }

    /// Connect, run every statement, close
    pub async fn provision<C: Connector>(&self, connector: &C) -> ProvisionReport {
        let start = Instant::now();

        let session = match connector.connect().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("cannot provision schema: {}", e);
                return ProvisionReport {
                    statements: Vec::new(),
                    fatal: Some(e.to_string()),
                    duration_ms: start.elapsed().as_millis() as u64,
                };
            }
        };

        tracing::debug!(backend = session.backend_type(), "session open");
        let mut report = self.provision_with(&session).await;

        if let Err(e) = session.close().await {
            tracing::warn!("failed to close session: {}", e);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    /// Run every statement on an already-open session
    pub async fn provision_with<S>(&self, session: &S) -> ProvisionReport
    where
        S: WarehouseSession + ?Sized,
    {
        let mut report = ProvisionReport::default();

        for statement in &self.statements {
            tracing::debug!(statement = %statement.label, "executing DDL");
            let error = match execute_scoped(session, statement.sql).await {
                Ok(()) => {
                    tracing::info!(statement = %statement.label, "ensured");
                    None
                }
                Err(failure) => {
                    tracing::warn!(statement = %statement.label, "DDL failed: {}", failure.error);
                    Some(failure.error.to_string())
                }
            };
            report.statements.push(StatementOutcome {
                label: statement.label.clone(),
                error,
            });
        }

        report
    }
}
