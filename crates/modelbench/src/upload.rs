use crate::errors::{util, BenchError, BenchResult};
use aws_sdk_s3::primitives::ByteStream;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Bucket holding userbenchmark metrics for dashboarding.
pub const USERBENCHMARK_S3_BUCKET: &str = "ossci-metrics";

/// Thin wrapper over the S3 SDK scoped to one bucket and object prefix.
pub struct S3Client {
    client: aws_sdk_s3::Client,
    bucket: String,
    object: String,
}

impl S3Client {
    pub async fn new(bucket: impl Into<String>, s3_object: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        S3Client {
            client: aws_sdk_s3::Client::new(&config),
            bucket: bucket.into(),
            object: s3_object.into(),
        }
    }

    /// Upload one file to `{object}/{prefix}/{file_name}`.
    ///
    /// One network call, no retry; an existing remote object is replaced
    /// unconditionally. Transfer failures propagate to the caller, so a
    /// multi-file upload interrupted midway leaves earlier files uploaded.
    pub async fn upload_file(&self, prefix: &str, file_path: &Path) -> BenchResult<()> {
        util::ensure_file_exists(file_path)?;
        let file_name = file_path
            .file_name()
            .ok_or_else(|| {
                BenchError::ConfigError(format!("Not a file path: {}", file_path.display()))
            })?
            .to_string_lossy();
        let key = object_key(&self.object, prefix, &file_name);
        let body = ByteStream::from_path(file_path)
            .await
            .map_err(|e| BenchError::TransferError(e.to_string()))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| BenchError::TransferError(e.to_string()))?;
        tracing::info!(
            "Uploaded {} to s3://{}/{}",
            file_path.display(),
            self.bucket,
            key
        );
        Ok(())
    }
}

/// Remote key for an uploaded benchmark file.
pub fn object_key(s3_object: &str, prefix: &str, file_name: &str) -> String {
    format!("{}/{}/{}", s3_object, prefix, file_name)
}

/// Per-run key prefix: `{ub_name}/{workflow_run_id}/{workflow_run_attempt}`.
pub fn run_prefix(ub_name: &str, workflow_run_id: &str, workflow_run_attempt: &str) -> String {
    format!("{}/{}/{}", ub_name, workflow_run_id, workflow_run_attempt)
}

/// Select directory entries whose name matches `match_filename` from the
/// start (prefix-match semantics), in directory iteration order.
pub fn files_to_upload(dir: &Path, match_filename: &str) -> BenchResult<Vec<String>> {
    let pattern = Regex::new(match_filename)
        .map_err(|e| BenchError::ConfigError(format!("Invalid filename pattern: {}", e)))?;
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if pattern.find(&name).map_or(false, |m| m.start() == 0) {
            files.push(name);
        }
    }
    Ok(files)
}

/// Upload every matching file in `upload_path` under
/// `{s3_object}/{ub_name}/{workflow_run_id}/{workflow_run_attempt}/`.
pub async fn upload_benchmark_files(
    s3_object: &str,
    ub_name: &str,
    workflow_run_id: &str,
    workflow_run_attempt: &str,
    upload_path: &Path,
    match_filename: &str,
) -> BenchResult<()> {
    let files = files_to_upload(upload_path, match_filename)?;
    tracing::info!(
        "Uploading {} file(s) from {}",
        files.len(),
        upload_path.display()
    );
    let client = S3Client::new(USERBENCHMARK_S3_BUCKET, s3_object).await;
    let prefix = run_prefix(ub_name, workflow_run_id, workflow_run_attempt);
    for file in &files {
        client.upload_file(&prefix, &upload_path.join(file)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_selects_only_prefix_matching_entries() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["foo.json", "bar.json", "baz.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let files = files_to_upload(dir.path(), "foo.*").unwrap();
        assert_eq!(files, vec!["foo.json".to_string()]);
    }

    #[test]
    fn test_match_is_anchored_at_start() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["bar.json", "foobar.json"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let files = files_to_upload(dir.path(), "bar").unwrap();
        assert_eq!(files, vec!["bar.json".to_string()]);
    }

    #[test]
    fn test_empty_directory_selects_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(files_to_upload(dir.path(), ".*").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = files_to_upload(dir.path(), "([unclosed");
        assert!(matches!(result, Err(BenchError::ConfigError(_))));
    }

    #[test]
    fn test_object_key_layout() {
        let prefix = run_prefix("mybench", "123", "1");
        assert_eq!(
            object_key("myprefix", &prefix, "foo.json"),
            "myprefix/mybench/123/1/foo.json"
        );
    }
}
