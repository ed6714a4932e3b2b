//! Load-error lookup CLI command
//!
//! Reads the most recent load-error record for one table without running a
//! load. The lookup runs on a fresh session, so it is not limited to the
//! session that wrote the row.

use std::path::PathBuf;

use serde::Serialize;

use super::{ReportFormat, load_config, print_report, runtime};
use crate::cli::error::CliError;
use crate::database::schema::SCHEMA_NAME;
use crate::database::{Connector, PostgresConnector, WarehouseSession};
use crate::load::{ErrorScope, LoadErrorRecord, query_load_error};
use crate::status::RunStatus;

/// Diagnose command arguments
#[derive(Debug, Clone)]
pub struct DiagnoseArgs {
    /// Table to look up
    pub table: String,
    /// Configuration file path
    pub config: PathBuf,
    /// Output format (`text` or `json`)
    pub format: String,
}

/// Lookup result for one table
#[derive(Debug, Serialize)]
pub struct Diagnosis {
    pub schema: String,
    pub table: String,
    pub record: Option<LoadErrorRecord>,
}

impl Diagnosis {
    pub fn render_text(&self) -> String {
        match &self.record {
            Some(record) => format!(
                "Latest load error for {}.{}:\n{}",
                self.schema,
                self.table,
                record.render_text("  ")
            ),
            None => format!(
                "No load-error record found for {}.{}\n",
                self.schema, self.table
            ),
        }
    }
}

/// Print the latest load error recorded for a table
pub fn handle_diagnose(args: &DiagnoseArgs) -> Result<RunStatus, CliError> {
    let format: ReportFormat = args.format.parse().map_err(CliError::InvalidArgument)?;
    let config = load_config(&args.config)?;
    config.validate_warehouse()?;

    let rt = runtime()?;
    let record = rt.block_on(async {
        let connector = PostgresConnector::new(config.warehouse.clone());
        let session = connector.connect().await?;
        let record =
            query_load_error(&session, SCHEMA_NAME, &args.table, ErrorScope::AnySession).await;
        if let Err(e) = session.close().await {
            tracing::warn!("failed to close session: {}", e);
        }
        record
    })?;

    let diagnosis = Diagnosis {
        schema: SCHEMA_NAME.to_string(),
        table: args.table.clone(),
        record,
    };
    print_report(format, &diagnosis, diagnosis.render_text());
    Ok(RunStatus::Succeeded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_recovered_and_missing() {
        let mut diagnosis = Diagnosis {
            schema: "oecd".to_string(),
            table: "economies".to_string(),
            record: Some(LoadErrorRecord {
                line_number: Some(4),
                raw_line: Some("ZZZ,2010".to_string()),
                reason: Some("Foreign key violation".to_string()),
                ..Default::default()
            }),
        };

        let text = diagnosis.render_text();
        assert!(text.starts_with("Latest load error for oecd.economies:\n"));
        assert!(text.contains("  Raw line : ZZZ,2010"));

        let json = serde_json::to_value(&diagnosis).unwrap();
        assert_eq!(json["record"]["line_number"], 4);

        diagnosis.record = None;
        assert_eq!(
            diagnosis.render_text(),
            "No load-error record found for oecd.economies\n"
        );
        assert!(serde_json::to_value(&diagnosis).unwrap()["record"].is_null());
    }
}
