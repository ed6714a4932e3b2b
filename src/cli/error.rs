//! CLI-specific error types

use crate::database::DatabaseError;
use crate::staging::StagingError;
use crate::validation::PlanValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error type
///
/// Anything that surfaces here ends the process with exit code 1; per-table
/// and per-file failures are carried in the reports instead.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("File already exists: {0} (use --force to overwrite)")]
    FileExists(PathBuf),

    #[error("Failed to write file {0}: {1}")]
    FileWriteError(PathBuf, String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("Invalid load plan: {0}")]
    Plan(#[from] PlanValidationError),
}
