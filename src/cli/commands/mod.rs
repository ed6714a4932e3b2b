//! CLI command implementations
//!
//! Every handler is synchronous: it loads the configuration, builds a tokio
//! runtime, drives the library, prints the report to stdout and returns the
//! run status that becomes the process exit code.

pub mod diagnose;
pub mod init;
pub mod load;
pub mod pipeline;
pub mod provision;
pub mod publish;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::error::CliError;
use crate::config::LoaderConfig;

/// How reports are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown report format: {} (expected text or json)", s)),
        }
    }
}

/// Arguments shared by the report-producing commands
#[derive(Debug, Clone)]
pub struct ReportArgs {
    /// Configuration file path
    pub config: PathBuf,
    /// Output format (`text` or `json`)
    pub format: String,
}

impl ReportArgs {
    pub(crate) fn report_format(&self) -> Result<ReportFormat, CliError> {
        self.format.parse().map_err(CliError::InvalidArgument)
    }
}

pub(crate) fn load_config(path: &Path) -> Result<LoaderConfig, CliError> {
    let config = LoaderConfig::load(path)?;
    tracing::debug!(config = ?config, "configuration loaded");
    Ok(config)
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::IoError(format!("Failed to create runtime: {}", e)))
}

/// Print a report in the requested format
pub(crate) fn print_report<T: Serialize>(format: ReportFormat, report: &T, text: String) {
    match format {
        ReportFormat::Text => print!("{}", text),
        ReportFormat::Json => match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("failed to serialize report: {}", e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_parsing() {
        assert_eq!("text".parse::<ReportFormat>(), Ok(ReportFormat::Text));
        assert_eq!("JSON".parse::<ReportFormat>(), Ok(ReportFormat::Json));
        assert!("yaml".parse::<ReportFormat>().is_err());
    }
}
