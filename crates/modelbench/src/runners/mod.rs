pub mod accuracy_runner;
pub mod config_runner;
pub mod metrics_runner;

pub use accuracy_runner::get_model_accuracy;
pub use config_runner::run_config;
pub use metrics_runner::{get_model_test_metrics, MetricsOptions};
