//! Warehouse session abstraction
//!
//! This module provides the narrow interface the provisioner and the load
//! orchestrator talk to:
//! - `Connector`: opens one session per run
//! - `WarehouseSession`: execute a statement, begin/commit/roll back, query rows
//!
//! The PostgreSQL wire implementation (Redshift speaks it) lives behind the
//! `postgres-backend` feature; tests drive the same traits with fabricated
//! sessions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "postgres-backend")]
pub mod postgres;

pub mod schema;

#[cfg(feature = "postgres-backend")]
pub use self::postgres::{PostgresConnector, PostgresSession};

pub use schema::WarehouseSchema;

/// Error type for warehouse operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to the warehouse
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Statement or query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN/COMMIT/ROLLBACK failed
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for warehouse operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Query result row as a JSON value
pub type QueryRow = serde_json::Value;

/// Query result set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows of data
    pub rows: Vec<QueryRow>,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a new query result
    pub fn new(columns: Vec<String>, rows: Vec<QueryRow>) -> Self {
        Self {
            columns,
            rows,
            execution_time_ms: 0,
        }
    }

    /// Create an empty result
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// An open warehouse session
///
/// A session is owned by exactly one component for the duration of a run and
/// carries at most one open transaction at a time.
#[async_trait(?Send)]
pub trait WarehouseSession {
    /// Execute a statement that returns no rows (DDL, COPY, SET)
    async fn execute(&self, sql: &str) -> DatabaseResult<()>;

    /// Open a transaction
    async fn begin(&self) -> DatabaseResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DatabaseResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DatabaseResult<()>;

    /// Execute a parameterized query
    ///
    /// # Arguments
    /// * `sql` - SQL query with parameter placeholders ($1, $2, etc.)
    /// * `params` - Parameter values as JSON
    ///
    /// # Returns
    /// Query result with columns and rows
    async fn query(&self, sql: &str, params: &[serde_json::Value])
    -> DatabaseResult<QueryResult>;

    /// Close the session
    async fn close(&self) -> DatabaseResult<()>;

    /// Backend type name ("postgres", or a test double's name)
    fn backend_type(&self) -> &'static str;
}

/// Opens warehouse sessions
#[async_trait(?Send)]
pub trait Connector {
    type Session: WarehouseSession;

    /// Establish a session. Failure here is fatal for the caller's run.
    async fn connect(&self) -> DatabaseResult<Self::Session>;
}

/// A statement that failed inside its own transaction
#[derive(Debug, Clone)]
pub struct ScopedFailure {
    /// Why BEGIN, the statement, or COMMIT failed
    pub error: DatabaseError,
    /// Set when the rollback that followed also failed
    pub rollback_error: Option<DatabaseError>,
}

/// Run one statement in its own transaction
///
/// Commits on success. On any failure the transaction is rolled back, so a
/// partially applied statement leaves nothing behind and earlier committed
/// work is untouched.
pub async fn execute_scoped<S>(session: &S, sql: &str) -> Result<(), ScopedFailure>
where
    S: WarehouseSession + ?Sized,
{
    let result = match session.begin().await {
        Ok(()) => match session.execute(sql).await {
            Ok(()) => session.commit().await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(()),
        Err(error) => {
            let rollback_error = session.rollback().await.err();
            if let Some(e) = &rollback_error {
                tracing::warn!("rollback failed: {}", e);
            }
            Err(ScopedFailure {
                error,
                rollback_error,
            })
        }
    }
}

/// Quote an SQL identifier (schema, table, column)
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote an SQL string literal
///
/// Redshift treats backslash as an escape character inside literals, so both
/// quotes and backslashes are doubled.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}
