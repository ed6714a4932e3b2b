//! End-to-end pipeline CLI command
//!
//! Provision, publish, load, in that order. A stage that cannot start at all
//! (no connection, unreadable data directory) stops the pipeline and is
//! recorded in the report; partial failures inside a stage do not stop it.

use serde::Serialize;

use super::load::orchestrator;
use super::publish::{publish_request, publisher};
use super::{ReportArgs, load_config, print_report, runtime};
use crate::cli::error::CliError;
use crate::database::{Connector, PostgresConnector};
use crate::load::{BatchReport, Orchestrator};
use crate::provision::{ProvisionReport, SchemaProvisioner};
use crate::staging::{ObjectPublisher, PublishReport, PublishRequest, publish_directory};
use crate::status::RunStatus;

/// Reports of every stage that ran
#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub provision: ProvisionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<BatchReport>,
    /// Error that kept a stage from starting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
}

impl PipelineReport {
    pub fn status(&self) -> RunStatus {
        if self.fatal.is_some() {
            return RunStatus::Aborted;
        }
        let mut status = self.provision.status();
        if let Some(publish) = &self.publish {
            status = status.worst(publish.status());
        }
        if let Some(load) = &self.load {
            status = status.worst(load.status());
        }
        status
    }

    pub fn render_text(&self) -> String {
        let mut out = String::from("== provision ==\n");
        out.push_str(&self.provision.render_text());
        if let Some(publish) = &self.publish {
            out.push_str("== publish ==\n");
            out.push_str(&publish.render_text());
        }
        if let Some(load) = &self.load {
            out.push_str("== load ==\n");
            out.push_str(&load.render_text());
        }
        if let Some(fatal) = &self.fatal {
            out.push_str(&format!("Pipeline aborted: {}\n", fatal));
        }
        out
    }
}

/// Run every stage against the given warehouse and object store
///
/// `connector` is used for provisioning; the orchestrator carries its own.
pub async fn run_pipeline<C, L, P>(
    connector: &C,
    publisher: &P,
    request: &PublishRequest,
    orchestrator: &Orchestrator<L>,
) -> PipelineReport
where
    C: Connector,
    L: Connector,
    P: ObjectPublisher + ?Sized,
{
    let mut report = PipelineReport {
        provision: SchemaProvisioner::default().provision(connector).await,
        publish: None,
        load: None,
        fatal: None,
    };
    if report.provision.status() == RunStatus::Aborted {
        tracing::error!("provisioning aborted, skipping publish and load");
        return report;
    }

    match publish_directory(request, publisher).await {
        Ok(published) => report.publish = Some(published),
        Err(e) => {
            tracing::error!("publishing could not start, skipping load: {}", e);
            report.fatal = Some(e.to_string());
            return report;
        }
    }

    report.load = Some(orchestrator.run().await);
    report
}

/// Run the whole pipeline with one exit status
pub fn handle_run(args: &ReportArgs) -> Result<RunStatus, CliError> {
    let format = args.report_format()?;
    let config = load_config(&args.config)?;
    // Fail on a bad plan before provisioning anything
    let orchestrator = orchestrator(&config)?;
    let request = publish_request(&config);

    let rt = runtime()?;
    let report = rt.block_on(async {
        let connector = PostgresConnector::new(config.warehouse.clone());
        let publisher = publisher(&config).await;
        run_pipeline(&connector, &publisher, &request, &orchestrator).await
    });

    print_report(format, &report, report.render_text());
    Ok(report.status())
}
