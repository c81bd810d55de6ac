use crate::errors::BenchResult;
use crate::metrics::{Metric, MetricsRecord};
use crate::model::{ModelConfig, ModelLoader};
use crate::runners::accuracy_runner::get_model_accuracy;
use crate::runners::metrics_runner::{get_model_test_metrics, MetricsOptions};
use std::io::{self, Write};

/// Run one benchmark configuration end to end and return its metrics.
///
/// With `dryrun` set, prints the skip marker and returns an all-absent
/// record without instantiating any model. Otherwise the accuracy check (if
/// requested) runs against its own isolated instantiation, the remaining
/// metrics run against a second isolated instantiation, and the accuracy
/// value is merged into the final record. The `[skip_by_dryrun]` / `[done]`
/// markers on stdout are part of the contract for sweep drivers scraping
/// progress.
pub fn run_config(
    loader: &dyn ModelLoader,
    config: &ModelConfig,
    dryrun: bool,
) -> BenchResult<MetricsRecord> {
    print!("Running config {} ...", config);
    io::stdout().flush()?;
    if dryrun {
        println!("[skip_by_dryrun]");
        return Ok(MetricsRecord::default());
    }

    let mut required_metrics = config.metrics.clone();
    let mut accuracy = None;
    if let Some(pos) = required_metrics.iter().position(|m| *m == Metric::Accuracy) {
        required_metrics.remove(pos);
        accuracy = get_model_accuracy(loader, config, true)?;
    }

    let mut metrics = MetricsRecord::default();
    if !required_metrics.is_empty() {
        let mut model = loader.load_isolated(config)?;
        metrics = get_model_test_metrics(
            model.as_mut(),
            &required_metrics,
            &MetricsOptions::default(),
        )?;
    }
    metrics.accuracy = accuracy;

    println!("[done]");
    Ok(metrics)
}
