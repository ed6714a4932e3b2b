//! Staged-file publishing CLI command

use super::{ReportArgs, load_config, print_report, runtime};
use crate::cli::error::CliError;
use crate::config::LoaderConfig;
use crate::staging::{PublishRequest, S3Publisher, publish_directory};
use crate::status::RunStatus;

/// Upload every matching local file to the staging bucket
pub fn handle_publish(args: &ReportArgs) -> Result<RunStatus, CliError> {
    let format = args.report_format()?;
    let config = load_config(&args.config)?;
    let request = publish_request(&config);

    let report = runtime()?.block_on(async {
        let publisher = publisher(&config).await;
        publish_directory(&request, &publisher).await
    })?;

    print_report(format, &report, report.render_text());
    Ok(report.status())
}

pub(crate) fn publish_request(config: &LoaderConfig) -> PublishRequest {
    PublishRequest {
        local_dir: config.storage.local_dir.clone(),
        bucket: config.storage.bucket.clone(),
        prefix: config.storage.prefix.clone(),
        extension: config.storage.extension.clone(),
    }
}

pub(crate) async fn publisher(config: &LoaderConfig) -> S3Publisher {
    S3Publisher::from_env(config.storage.region.clone()).await
}
