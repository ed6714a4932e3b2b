//! S3 publisher

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use super::error::{StagingError, StagingResult};
use super::publish::{ObjectPublisher, object_uri};

/// Publishes files with `PutObject`, using the default AWS credential chain
#[derive(Debug, Clone)]
pub struct S3Publisher {
    client: aws_sdk_s3::Client,
}

impl S3Publisher {
    /// Build a client from the environment (profile, env vars, instance role)
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        Self::new(aws_sdk_s3::Client::new(&config))
    }

    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl ObjectPublisher for S3Publisher {
    async fn publish(&self, local_path: &Path, bucket: &str, key: &str) -> StagingResult<()> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StagingError::ReadFile {
                path: local_path.to_path_buf(),
                message: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("text/csv")
            .body(body)
            .send()
            .await
            .map_err(|e| StagingError::Upload {
                uri: object_uri(bucket, key),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}
