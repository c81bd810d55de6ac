use crate::errors::BenchResult;
use crate::metrics::MetricValue;
use crate::model::{ModelConfig, ModelLoader};

/// Flag forcing the model runner into accuracy-check mode.
pub const ACCURACY_FLAG: &str = "--accuracy";

/// Run an accuracy check for the given configuration.
///
/// Works on a copy of the configuration with the accuracy flag forced into
/// the extra-flags list (only when not already present), so the caller's
/// config is never mutated. The model is instantiated either
/// subprocess-isolated or in-process, its accuracy attribute queried, and
/// the handle released before returning.
pub fn get_model_accuracy(
    loader: &dyn ModelLoader,
    config: &ModelConfig,
    isolated: bool,
) -> BenchResult<Option<String>> {
    let mut accuracy_config = config.clone();
    if !accuracy_config.extra_args.iter().any(|a| a == ACCURACY_FLAG) {
        accuracy_config
            .extra_args
            .insert(0, ACCURACY_FLAG.to_string());
    }
    let model = if isolated {
        loader.load_isolated(&accuracy_config)?
    } else {
        loader.load(&accuracy_config)?
    };
    let accuracy = model
        .get_attribute("accuracy")?
        .map(MetricValue::into_string);
    drop(model);
    Ok(accuracy)
}
