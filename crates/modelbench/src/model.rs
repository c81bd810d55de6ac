use crate::errors::{BenchError, BenchResult};
use crate::metrics::{Metric, MetricValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Execution device for a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    /// Accelerator devices need a synchronization barrier around each timed
    /// invocation so asynchronous device work lands inside the measured
    /// interval.
    pub fn is_accelerator(&self) -> bool {
        matches!(self, Device::Cuda)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

impl FromStr for Device {
    type Err = BenchError;

    fn from_str(s: &str) -> BenchResult<Self> {
        match s {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda),
            other => Err(BenchError::ConfigError(format!(
                "Unknown device: {}",
                other
            ))),
        }
    }
}

/// Identifies one benchmark configuration: the model, where it runs, and
/// which metrics to collect for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub device: Device,
    pub batch_size: Option<u32>,
    /// Extra CLI-style flags forwarded to the model runner, in order.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Metrics requested for this configuration.
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>, device: Device) -> Self {
        ModelConfig {
            name: name.into(),
            device,
            batch_size: None,
            extra_args: Vec::new(),
            metrics: Vec::new(),
        }
    }
}

impl fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.device)?;
        if let Some(bs) = self.batch_size {
            write!(f, "-bs{}", bs)?;
        }
        Ok(())
    }
}

/// Capability interface over a loaded model, whether it lives in-process or
/// in a subprocess-isolated worker. The harness only ever talks to a model
/// through this narrow surface.
pub trait ModelHandle {
    /// Run one step of the model.
    fn invoke(&mut self) -> BenchResult<()>;

    /// Query a named attribute reported by the model or its framework
    /// (e.g. "accuracy", "ttfb", "compile_time").
    fn get_attribute(&self, name: &str) -> BenchResult<Option<MetricValue>>;

    /// Process id hosting the model, used for host memory monitoring.
    fn process_id(&self) -> u32;

    fn device(&self) -> Device;

    fn batch_size(&self) -> u32;

    /// Block until all outstanding device work is complete. No-op on cpu.
    fn synchronize(&self) -> BenchResult<()>;

    /// Enter the framework's operation-counting scope.
    fn start_flop_count(&mut self) -> BenchResult<()> {
        Err(BenchError::BenchmarkError(
            "flop counting is not supported by this model handle".to_string(),
        ))
    }

    /// Leave the operation-counting scope, returning counted operations per
    /// captured call site.
    fn finish_flop_count(&mut self) -> BenchResult<HashMap<String, f64>> {
        Err(BenchError::BenchmarkError(
            "flop counting is not supported by this model handle".to_string(),
        ))
    }
}

/// Instantiates models from configurations. The in-process and
/// subprocess-isolated paths are mutually exclusive per call.
pub trait ModelLoader {
    fn load(&self, config: &ModelConfig) -> BenchResult<Box<dyn ModelHandle>>;

    /// Load the model in a separate worker process for crash/state isolation.
    fn load_isolated(&self, config: &ModelConfig) -> BenchResult<Box<dyn ModelHandle>>;
}
