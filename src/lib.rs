//! OECD Loader - bulk loading of the OECD countries/economy dataset
//!
//! Provides:
//! - Warehouse schema provisioning (idempotent DDL)
//! - Publishing of local flat files to object storage
//! - Per-table bulk loads with failure isolation and load-error diagnostics
//! - Load-order validation
//! - Configuration (TOML file plus environment overrides)

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod database;
pub mod load;
pub mod models;
pub mod provision;
pub mod staging;
pub mod status;
pub mod validation;

// Re-export commonly used types
pub use config::LoaderConfig;
pub use database::{
    Connector, DatabaseError, DatabaseResult, QueryResult, WarehouseSchema, WarehouseSession,
};
#[cfg(feature = "postgres-backend")]
pub use database::{PostgresConnector, PostgresSession};
pub use load::{BatchReport, CopyDescriptor, DiagnosticOutcome, LoadJob, LoadPlan, Orchestrator};
pub use models::Entity;
pub use provision::{ProvisionReport, SchemaProvisioner};
#[cfg(feature = "s3")]
pub use staging::S3Publisher;
pub use staging::{ObjectPublisher, PublishReport, PublishRequest, StagingError};
pub use status::RunStatus;
pub use validation::PlanValidationError;
