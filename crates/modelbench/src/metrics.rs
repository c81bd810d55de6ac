use crate::errors::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A metric that can be requested for a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Latencies,
    Throughputs,
    Accuracy,
    CpuPeakMem,
    GpuPeakMem,
    Ttfb,
    CompileTime,
    GraphBreaks,
    ModelFlops,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Latencies => "latencies",
            Metric::Throughputs => "throughputs",
            Metric::Accuracy => "accuracy",
            Metric::CpuPeakMem => "cpu_peak_mem",
            Metric::GpuPeakMem => "gpu_peak_mem",
            Metric::Ttfb => "ttfb",
            Metric::CompileTime => "compile_time",
            Metric::GraphBreaks => "graph_breaks",
            Metric::ModelFlops => "model_flops",
        }
    }

    /// Whether this metric is produced by the peak-memory sampler.
    pub fn is_memory(&self) -> bool {
        matches!(self, Metric::CpuPeakMem | Metric::GpuPeakMem)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = BenchError;

    fn from_str(s: &str) -> BenchResult<Self> {
        match s {
            "latencies" => Ok(Metric::Latencies),
            "throughputs" => Ok(Metric::Throughputs),
            "accuracy" => Ok(Metric::Accuracy),
            "cpu_peak_mem" => Ok(Metric::CpuPeakMem),
            "gpu_peak_mem" => Ok(Metric::GpuPeakMem),
            "ttfb" => Ok(Metric::Ttfb),
            "compile_time" => Ok(Metric::CompileTime),
            "graph_breaks" => Ok(Metric::GraphBreaks),
            "model_flops" => Ok(Metric::ModelFlops),
            other => Err(BenchError::ConfigError(format!(
                "Unknown metric name: {}",
                other
            ))),
        }
    }
}

/// A single attribute value reported by a model handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(i) => Some(*i as f64),
            MetricValue::Float(f) => Some(*f),
            MetricValue::Boolean(_) | MetricValue::String(_) => None,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            MetricValue::Integer(i) => i.to_string(),
            MetricValue::Float(f) => f.to_string(),
            MetricValue::String(s) => s,
            MetricValue::Boolean(b) => b.to_string(),
        }
    }
}

/// The fixed set of metrics produced by one benchmark run.
///
/// Constructed empty at the start of a run and populated incrementally as
/// requested metrics are computed. Metrics that were not requested keep
/// their absent default. `throughputs` has the same length as `latencies`
/// whenever both are populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Per-iteration wall-clock latencies, milliseconds.
    pub latencies: Vec<f64>,
    /// Derived throughputs, items per second.
    pub throughputs: Vec<f64>,
    /// Accuracy check result, typically "pass" or "fail".
    pub accuracy: Option<String>,
    /// Host peak memory, MB.
    pub cpu_peak_mem: Option<f64>,
    /// Device peak memory, MB.
    pub gpu_peak_mem: Option<f64>,
    /// Time-to-first-batch, milliseconds.
    pub ttfb: Option<f64>,
    /// Framework-reported compilation time, milliseconds.
    pub compile_time: Option<f64>,
    /// Number of graph breaks reported by the compiling engine.
    pub graph_breaks: Option<f64>,
    /// Total floating-point operations for one invocation.
    pub model_flops: Option<f64>,
    /// Set when the run failed; all numeric fields stay absent.
    pub error_msg: Option<String>,
}

impl MetricsRecord {
    /// An all-absent record carrying only an error message.
    pub fn errored(msg: impl Into<String>) -> Self {
        MetricsRecord {
            error_msg: Some(msg.into()),
            ..Default::default()
        }
    }

    /// Serialize the record into a key-value mapping.
    pub fn to_map(&self) -> BenchResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(BenchError::ResultsProcessingError(format!(
                "Expected metrics record to serialize to an object, got: {}",
                other
            ))),
        }
    }
}
