pub mod errors;
pub mod metrics;
pub mod model;
pub mod postprocess;
pub mod runners;
pub mod samplers;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export main components for easier use
pub use errors::{BenchError, BenchResult};
pub use metrics::{Metric, MetricValue, MetricsRecord};
pub use model::{Device, ModelConfig, ModelHandle, ModelLoader};
pub use runners::config_runner::run_config;
pub use runners::metrics_runner::{get_model_test_metrics, MetricsOptions};
