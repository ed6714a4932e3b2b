//! Bulk loading of staged files into warehouse tables
//!
//! A [`LoadPlan`] maps each table to its staged source object. The
//! [`Orchestrator`] executes the plan over a single warehouse session, one
//! transaction per table, and collects a [`BatchReport`]. Failed tables are
//! rolled back and diagnosed from the warehouse load-error log without
//! stopping the rest of the batch.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oecd_loader::config::LoaderConfig;
//! use oecd_loader::database::PostgresConnector;
//! use oecd_loader::load::{LoadPlan, Orchestrator};
//!
//! let config = LoaderConfig::load(std::path::Path::new("oecd-loader.toml"))?;
//! let plan = LoadPlan::from_config(&config.load, &config.storage, config.iam_role()?)?;
//! plan.validate()?;
//!
//! let orchestrator = Orchestrator::new(PostgresConnector::new(config.warehouse.clone()), plan);
//! let report = orchestrator.run().await;
//! print!("{}", report.render_text());
//! std::process::exit(report.status().exit_code());
//! ```

pub mod diagnostics;
mod job;
mod orchestrator;
mod plan;
mod report;

pub use diagnostics::{
    DiagnosticOutcome, ErrorScope, LoadErrorRecord, fetch_load_error, query_load_error,
};
pub use job::{JobState, LoadJob};
pub use orchestrator::Orchestrator;
pub use plan::{CopyDescriptor, LoadPlan, SourceFormat};
pub use report::BatchReport;
