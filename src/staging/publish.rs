//! Directory publishing logic

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;

use super::error::{StagingError, StagingResult};
use crate::status::RunStatus;

/// Copies one local file to an object-store key
#[async_trait(?Send)]
pub trait ObjectPublisher {
    /// Publish `local_path` to `key` inside `bucket`
    async fn publish(&self, local_path: &Path, bucket: &str, key: &str) -> StagingResult<()>;
}

/// Key a file is published under: `{prefix}/{filename}`, or just the file
/// name when the prefix is empty
pub fn object_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}

/// `s3://bucket/key`
pub fn object_uri(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}

/// What to publish and where
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Local directory to scan (not recursive)
    pub local_dir: PathBuf,
    /// Destination bucket
    pub bucket: String,
    /// Destination key prefix
    pub prefix: String,
    /// Extension to match, without the dot
    pub extension: String,
}

/// A file matched for publishing
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

/// Outcome of one file's publish
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub uri: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Statistics from a publish run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReport {
    /// One entry per matching file, in name order
    pub files: Vec<FileOutcome>,
    /// Entries that did not match the extension (or were not files)
    pub files_skipped: usize,
    /// Total bytes of successfully published files
    pub bytes_published: u64,
    #[serde(skip)]
    pub duration: Duration,
}

impl PublishReport {
    pub fn published(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.published()
    }

    pub fn status(&self) -> RunStatus {
        RunStatus::from_counts(self.failed(), false)
    }

    /// Human-readable summary
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for file in &self.files {
            match &file.error {
                None => out.push_str(&format!("  ok      {} -> {}\n", file.file_name, file.uri)),
                Some(e) => out.push_str(&format!("  FAILED  {}: {}\n", file.file_name, e)),
            }
        }
        out.push_str(&format!(
            "Publishing: {} published, {} failed, {} skipped ({} bytes in {}ms)\n",
            self.published(),
            self.failed(),
            self.files_skipped,
            self.bytes_published,
            self.duration.as_millis()
        ));
        out
    }
}

/// List the files in `dir` whose extension is `extension`
///
/// Returns the matches sorted by name and the number of entries skipped.
pub fn discover_files(dir: &Path, extension: &str) -> StagingResult<(Vec<DiscoveredFile>, usize)> {
    let entries = fs::read_dir(dir).map_err(|source| StagingError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    let mut skipped = 0;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Log but continue
                tracing::warn!("Error accessing directory entry: {}", e);
                skipped += 1;
                continue;
            }
        };

        let path = entry.path();
        let matches = path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension);
        let file_name = entry.file_name().to_str().map(str::to_string);

        match (matches, file_name) {
            (true, Some(file_name)) => {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                files.push(DiscoveredFile {
                    path,
                    file_name,
                    size,
                });
            }
            _ => skipped += 1,
        }
    }

    // Sort by name for consistent ordering
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok((files, skipped))
}

/// Publish every matching file in the request's directory
///
/// Files are published one at a time. A failed file is recorded and the scan
/// continues with the next one; only an unreadable directory is an error.
pub async fn publish_directory<P>(
    request: &PublishRequest,
    publisher: &P,
) -> StagingResult<PublishReport>
where
    P: ObjectPublisher + ?Sized,
{
    let start = Instant::now();
    let (files, files_skipped) = discover_files(&request.local_dir, &request.extension)?;

    tracing::info!(
        dir = %request.local_dir.display(),
        matched = files.len(),
        skipped = files_skipped,
        "publishing files"
    );

    let mut report = PublishReport {
        files_skipped,
        ..Default::default()
    };

    for file in files {
        let key = object_key(&request.prefix, &file.file_name);
        let uri = object_uri(&request.bucket, &key);

        let error = match publisher.publish(&file.path, &request.bucket, &key).await {
            Ok(()) => {
                tracing::info!(file = %file.file_name, %uri, "published");
                report.bytes_published += file.size;
                None
            }
            Err(e) => {
                tracing::warn!(file = %file.file_name, "publish failed: {}", e);
                Some(e.to_string())
            }
        };

        report.files.push(FileOutcome {
            file_name: file.file_name,
            uri,
            size: file.size,
            error,
        });
    }

    report.duration = start.elapsed();
    Ok(report)
}
