use crate::errors::{util, BenchError, BenchResult};
use std::env;
use std::path::{Path, PathBuf};

const TEST_RUNNER: &str = "gcp_a100";
const JOB_ID: &str = "0";
const HEAD_REPO: &str = "pytorch/ao";
const HEAD_BRANCH: &str = "main";

/// Metadata columns appended to every row of a decorated perf CSV.
pub const METADATA_COLUMNS: [&str; 9] = [
    "workflow_id",
    "run_attempt",
    "test_name",
    "runner",
    "job_id",
    "filename",
    "head_repo",
    "head_branch",
    "head_sha",
];

/// Derive the model-set tag from a perf result filename.
pub fn get_model_set(filename: &str) -> BenchResult<&'static str> {
    if filename.contains("timm") {
        return Ok("timm");
    }
    if filename.contains("huggingface") {
        return Ok("huggingface");
    }
    if filename.contains("torchbench") {
        return Ok("torchbench");
    }
    Err(BenchError::UnknownModelSet(filename.to_string()))
}

fn env_or_zero(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| "0".to_string())
}

/// Decorate each perf CSV with CI run metadata and rewrite it in place.
///
/// Workflow coordinates come from `WORKFLOW_RUN_ID` / `WORKFLOW_RUN_ATTEMPT`
/// (defaulting to `0` when unset).
pub fn post_ci_process(output_files: &[PathBuf]) -> BenchResult<()> {
    let workflow_run_id = env_or_zero("WORKFLOW_RUN_ID");
    let workflow_run_attempt = env_or_zero("WORKFLOW_RUN_ATTEMPT");
    for path in output_files {
        decorate_file(path, &workflow_run_id, &workflow_run_attempt)?;
    }
    Ok(())
}

/// Append the nine metadata columns to every row of `path`.
///
/// The file is read fully, then replaced atomically via a temp file in the
/// same directory; the original is never truncated while still being read.
pub fn decorate_file(
    path: &Path,
    workflow_run_id: &str,
    workflow_run_attempt: &str,
) -> BenchResult<()> {
    util::ensure_file_exists(path)?;
    let model_set = get_model_set(&path.to_string_lossy())?;
    let test_name = format!("torchao_{}_perf", model_set);
    let filename = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let head_sha = env!("CARGO_PKG_VERSION");
    tracing::info!("Processing file {}", path.display());

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?);
    }
    drop(reader);

    let metadata = [
        workflow_run_id,
        workflow_run_attempt,
        &test_name,
        TEST_RUNNER,
        JOB_ID,
        &filename,
        HEAD_REPO,
        HEAD_BRANCH,
        head_sha,
    ];

    let dir = path.parent().ok_or_else(|| {
        BenchError::ConfigError(format!("No parent directory for {}", path.display()))
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        let mut header = headers.clone();
        for column in METADATA_COLUMNS {
            header.push_field(column);
        }
        writer.write_record(&header)?;
        for row in &rows {
            let mut decorated = row.clone();
            for value in metadata {
                decorated.push_field(value);
            }
            writer.write_record(&decorated)?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| BenchError::IoError(e.error))?;
    Ok(())
}
