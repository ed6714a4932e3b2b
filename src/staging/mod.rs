//! Staged-file publishing
//!
//! Copies the local flat files into the object store under a deterministic
//! key layout, `{prefix}/{filename}`, which is exactly where the bulk loads
//! expect to find them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oecd_loader::staging::{PublishRequest, S3Publisher, publish_directory};
//!
//! let publisher = S3Publisher::from_env(None).await;
//! let request = PublishRequest {
//!     local_dir: "../data".into(),
//!     bucket: "oecd-countries-data".into(),
//!     prefix: "csv".into(),
//!     extension: "csv".into(),
//! };
//! let report = publish_directory(&request, &publisher).await?;
//! println!("{} published, {} failed", report.published(), report.failed());
//! ```

mod error;
mod publish;
#[cfg(feature = "s3")]
mod s3;

pub use error::{StagingError, StagingResult};
pub use publish::{
    DiscoveredFile, FileOutcome, ObjectPublisher, PublishReport, PublishRequest, discover_files,
    object_key, object_uri, publish_directory,
};
#[cfg(feature = "s3")]
pub use s3::S3Publisher;
