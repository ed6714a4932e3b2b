//! Schema provisioning CLI command

use super::{ReportArgs, load_config, print_report, runtime};
use crate::cli::error::CliError;
use crate::config::LoaderConfig;
use crate::database::PostgresConnector;
use crate::provision::{ProvisionReport, SchemaProvisioner};
use crate::status::RunStatus;

/// Create the schema and tables if they do not exist
pub fn handle_provision(args: &ReportArgs) -> Result<RunStatus, CliError> {
    let format = args.report_format()?;
    let config = load_config(&args.config)?;
    config.validate_warehouse()?;

    let report = runtime()?.block_on(provision(&config));

    print_report(format, &report, report.render_text());
    Ok(report.status())
}

pub(crate) async fn provision(config: &LoaderConfig) -> ProvisionReport {
    let connector = PostgresConnector::new(config.warehouse.clone());
    SchemaProvisioner::default().provision(&connector).await
}
