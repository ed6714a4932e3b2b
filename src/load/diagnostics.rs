//! Load-error diagnostics
//!
//! After a failed bulk load the driver error usually says little more than
//! "Load into table 'x' failed. Check 'stl_load_errors' system table for
//! details". The warehouse records the offending row in `stl_load_errors`;
//! this module reads back the most recent entry for one table.

use serde::{Deserialize, Serialize};

use crate::database::{DatabaseError, DatabaseResult, QueryResult, WarehouseSession};

macro_rules! load_error_select {
    () => {
        r#"
SELECT CAST(starttime AS VARCHAR(32)) AS start_time,
       TRIM(filename) AS file_name,
       line_number,
       TRIM(colname) AS column_name,
       position,
       TRIM(raw_line) AS raw_line,
       TRIM(err_reason) AS reason,
       err_code AS error_code
FROM stl_load_errors
WHERE tbl = (
    SELECT c.oid
    FROM pg_class c
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relname = $1 AND n.nspname = $2
    LIMIT 1
)"#
    };
}

/// Most recent load error for a table written by the current session,
/// resolved through its object id.
///
/// `$1` is the table name, `$2` the schema. A failure that left no row
/// (missing object, denied access) never picks up an earlier run's error.
pub const LOAD_ERROR_SQL: &str = concat!(
    load_error_select!(),
    "\nAND session = pg_backend_pid()\nORDER BY starttime DESC\nLIMIT 1"
);

/// Most recent load error for a table from any session
pub const LATEST_LOAD_ERROR_SQL: &str =
    concat!(load_error_select!(), "\nORDER BY starttime DESC\nLIMIT 1");

/// Which sessions' load errors a lookup may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Only rows written by the session running the query
    CurrentSession,
    /// The latest row for the table, whoever wrote it
    AnySession,
}

impl ErrorScope {
    pub fn sql(self) -> &'static str {
        match self {
            ErrorScope::CurrentSession => LOAD_ERROR_SQL,
            ErrorScope::AnySession => LATEST_LOAD_ERROR_SQL,
        }
    }
}

/// One row of the warehouse load-error log
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadErrorRecord {
    pub start_time: Option<String>,
    pub file_name: Option<String>,
    pub line_number: Option<i64>,
    pub column_name: Option<String>,
    /// Byte position of the offending field within the line
    pub position: Option<i64>,
    pub raw_line: Option<String>,
    pub reason: Option<String>,
    pub error_code: Option<i64>,
}

impl LoadErrorRecord {
    /// Indented multi-line rendering for reports
    pub fn render_text(&self, indent: &str) -> String {
        fn text(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("-")
        }
        fn number(value: Option<i64>) -> String {
            value.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
        }

        let mut out = String::new();
        out.push_str(&format!("{}Time     : {}\n", indent, text(&self.start_time)));
        out.push_str(&format!("{}File     : {}\n", indent, text(&self.file_name)));
        out.push_str(&format!(
            "{}Line     : {} (column {}, pos {})\n",
            indent,
            number(self.line_number),
            text(&self.column_name),
            number(self.position)
        ));
        out.push_str(&format!("{}Raw line : {}\n", indent, text(&self.raw_line)));
        out.push_str(&format!(
            "{}Reason   : {} (code {})\n",
            indent,
            text(&self.reason),
            number(self.error_code)
        ));
        out
    }
}

/// What the diagnostic step produced for a failed job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticOutcome {
    /// The load-error log had a row for the table
    Recovered { record: LoadErrorRecord },
    /// The query ran but found nothing for the table
    NoRecord,
    /// The diagnostic query itself failed; the ingest error stands alone
    Unavailable { error: String },
}

impl DiagnosticOutcome {
    pub fn record(&self) -> Option<&LoadErrorRecord> {
        match self {
            DiagnosticOutcome::Recovered { record } => Some(record),
            _ => None,
        }
    }
}

/// Decode the first row of a load-error query result
pub fn parse_load_error(result: &QueryResult) -> DatabaseResult<Option<LoadErrorRecord>> {
    result
        .rows
        .first()
        .map(|row| {
            serde_json::from_value(row.clone()).map_err(|e| {
                DatabaseError::SerializationError(format!("Unexpected load-error row: {}", e))
            })
        })
        .transpose()
}

/// Read the most recent load error for `schema.table` within `scope`
pub async fn query_load_error<S>(
    session: &S,
    schema: &str,
    table: &str,
    scope: ErrorScope,
) -> DatabaseResult<Option<LoadErrorRecord>>
where
    S: WarehouseSession + ?Sized,
{
    let result = session
        .query(
            scope.sql(),
            &[
                serde_json::Value::String(table.to_string()),
                serde_json::Value::String(schema.to_string()),
            ],
        )
        .await?;

    parse_load_error(&result)
}

/// Run the diagnostic step for a failed job on the session that ran it
///
/// Never fails: a failing diagnostic query is reported as `Unavailable`.
pub async fn fetch_load_error<S>(session: &S, schema: &str, table: &str) -> DiagnosticOutcome
where
    S: WarehouseSession + ?Sized,
{
    match query_load_error(session, schema, table, ErrorScope::CurrentSession).await {
        Ok(Some(record)) => {
            tracing::info!(
                table,
                line = ?record.line_number,
                reason = record.reason.as_deref().unwrap_or(""),
                "load error recovered"
            );
            DiagnosticOutcome::Recovered { record }
        }
        Ok(None) => {
            tracing::info!(table, "no load-error record found");
            DiagnosticOutcome::NoRecord
        }
        Err(e) => {
            tracing::warn!(table, "failed to fetch load error info: {}", e);
            DiagnosticOutcome::Unavailable {
                error: e.to_string(),
            }
        }
    }
}
