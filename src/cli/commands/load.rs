//! Bulk load CLI command

use super::{ReportArgs, load_config, print_report, runtime};
use crate::cli::error::CliError;
use crate::config::LoaderConfig;
use crate::database::PostgresConnector;
use crate::load::{LoadPlan, Orchestrator};
use crate::status::RunStatus;

/// Load every mapped table from its staged file
pub fn handle_load(args: &ReportArgs) -> Result<RunStatus, CliError> {
    let format = args.report_format()?;
    let config = load_config(&args.config)?;
    let orchestrator = orchestrator(&config)?;

    let report = runtime()?.block_on(orchestrator.run());

    print_report(format, &report, report.render_text());
    Ok(report.status())
}

/// Build and validate the plan before anything touches the warehouse
pub(crate) fn orchestrator(
    config: &LoaderConfig,
) -> Result<Orchestrator<PostgresConnector>, CliError> {
    config.validate_warehouse()?;
    let plan = LoadPlan::from_config(&config.load, &config.storage, config.iam_role()?)?;
    plan.validate()?;

    tracing::debug!(tables = ?plan.table_names(), "load plan validated");
    Ok(Orchestrator::new(
        PostgresConnector::new(config.warehouse.clone()),
        plan,
    ))
}
