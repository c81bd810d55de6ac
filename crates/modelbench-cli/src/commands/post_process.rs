use anyhow::Result;
use modelbench::postprocess::post_ci_process;
use std::path::PathBuf;

/// Decorate each given perf CSV with CI run metadata, in place.
pub fn handle_post_process(test_files: &[PathBuf]) -> Result<()> {
    post_ci_process(test_files)?;
    Ok(())
}
