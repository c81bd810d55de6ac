use anyhow::Result;
use modelbench::upload::upload_benchmark_files;
use std::path::Path;

/// Upload every matching file from `upload_path` to the metrics bucket
/// under `{s3_prefix}/{userbenchmark}/{run_id}/{run_attempt}/`.
pub async fn handle_upload(
    s3_prefix: &str,
    userbenchmark: &str,
    workflow_run_id: &str,
    workflow_run_attempt: &str,
    upload_path: &Path,
    match_filename: &str,
) -> Result<()> {
    upload_benchmark_files(
        s3_prefix,
        userbenchmark,
        workflow_run_id,
        workflow_run_attempt,
        upload_path,
        match_filename,
    )
    .await?;
    Ok(())
}
