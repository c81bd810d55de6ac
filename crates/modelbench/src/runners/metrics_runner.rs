use crate::errors::BenchResult;
use crate::metrics::{Metric, MetricsRecord};
use crate::model::ModelHandle;
use crate::samplers::flops::get_model_flops;
use crate::samplers::latency::{LatencySampler, BENCHMARK_ITERS, WARMUP_ROUNDS};
use crate::samplers::memory::{GpuBackend, MemoryProbe, PeakMemorySampler, ProcfsProbe};
use std::path::PathBuf;
use std::sync::Arc;

/// Knobs for one metrics-collection pass.
#[derive(Clone)]
pub struct MetricsOptions {
    pub warmup: usize,
    pub iterations: usize,
    /// When set, raw memory-monitor samples are exported here as CSV.
    pub export_metrics_file: Option<PathBuf>,
    pub gpu_backend: GpuBackend,
    /// Memory probe used by the peak-memory sampler. Unset falls back to
    /// the procfs host probe, which has no device backend: collecting
    /// `gpu_peak_mem` requires injecting an nvml/dcgm-backed probe here.
    pub probe: Option<Arc<dyn MemoryProbe>>,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        MetricsOptions {
            warmup: WARMUP_ROUNDS,
            iterations: BENCHMARK_ITERS,
            export_metrics_file: None,
            gpu_backend: GpuBackend::default(),
            probe: None,
        }
    }
}

/// Collect the requested metrics for a loaded model, dispatching each one to
/// the appropriate sampler or attribute query. Metrics not listed in
/// `required_metrics` are left at their absent defaults.
pub fn get_model_test_metrics(
    model: &mut dyn ModelHandle,
    required_metrics: &[Metric],
    options: &MetricsOptions,
) -> BenchResult<MetricsRecord> {
    let mut metrics = MetricsRecord::default();
    let need = |metric: Metric| required_metrics.contains(&metric);

    if need(Metric::Latencies) || need(Metric::Throughputs) {
        let sampler = LatencySampler {
            warmup: options.warmup,
            iterations: options.iterations,
        };
        metrics.latencies = sampler.sample(model)?;
    }
    if need(Metric::CpuPeakMem) || need(Metric::GpuPeakMem) {
        let probe = options.probe.clone().unwrap_or_else(|| {
            Arc::new(ProcfsProbe::new(model.process_id(), options.gpu_backend))
        });
        let peak = PeakMemorySampler::default().sample(
            model,
            required_metrics,
            probe,
            options.export_metrics_file.as_deref(),
        )?;
        metrics.cpu_peak_mem = peak.cpu_peak_mem;
        metrics.gpu_peak_mem = peak.gpu_peak_mem;
    }
    if need(Metric::Throughputs) {
        let batch = f64::from(model.batch_size());
        metrics.throughputs = metrics
            .latencies
            .iter()
            .map(|latency| batch * 1000.0 / latency)
            .collect();
    }
    if need(Metric::CompileTime) {
        metrics.compile_time = attr_f64(model, "compile_time")?;
    }
    if need(Metric::GraphBreaks) {
        metrics.graph_breaks = attr_f64(model, "graph_breaks")?;
    }
    if need(Metric::ModelFlops) {
        metrics.model_flops = Some(get_model_flops(model)?);
    }
    if need(Metric::Ttfb) {
        metrics.ttfb = attr_f64(model, "ttfb")?;
    }
    Ok(metrics)
}

fn attr_f64(model: &dyn ModelHandle, name: &str) -> BenchResult<Option<f64>> {
    Ok(model.get_attribute(name)?.and_then(|v| v.as_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{BenchError, BenchResult};
    use crate::metrics::MetricValue;
    use crate::model::Device;
    use crate::test_helpers::MockModel;

    fn small_options() -> MetricsOptions {
        MetricsOptions {
            warmup: 1,
            iterations: 4,
            ..Default::default()
        }
    }

    struct StaticProbe;

    impl MemoryProbe for StaticProbe {
        fn sample_host_mb(&self) -> BenchResult<f64> {
            Ok(512.0)
        }

        fn sample_device_mb(&self) -> BenchResult<(u32, f64)> {
            Ok((0, 2048.0))
        }
    }

    #[test]
    fn test_throughput_derivation_matches_latencies() {
        let mut model = MockModel::new(Device::Cpu).with_batch(32);
        let metrics = get_model_test_metrics(
            &mut model,
            &[Metric::Latencies, Metric::Throughputs],
            &small_options(),
        )
        .unwrap();
        assert_eq!(metrics.latencies.len(), 4);
        assert_eq!(metrics.throughputs.len(), metrics.latencies.len());
        for (latency, throughput) in metrics.latencies.iter().zip(&metrics.throughputs) {
            assert_eq!(*throughput, 32.0 * 1000.0 / latency);
        }
    }

    #[test]
    fn test_unrequested_metrics_stay_absent() {
        let mut model = MockModel::new(Device::Cpu)
            .with_attr("ttfb", MetricValue::Float(120.0))
            .with_attr("compile_time", MetricValue::Float(800.0));
        let metrics =
            get_model_test_metrics(&mut model, &[Metric::Latencies], &small_options()).unwrap();
        assert!(!metrics.latencies.is_empty());
        assert!(metrics.throughputs.is_empty());
        assert!(metrics.ttfb.is_none());
        assert!(metrics.compile_time.is_none());
        assert!(metrics.cpu_peak_mem.is_none());
        assert!(metrics.model_flops.is_none());
    }

    #[test]
    fn test_attribute_metrics_are_direct_queries() {
        let mut model = MockModel::new(Device::Cpu)
            .with_attr("ttfb", MetricValue::Float(120.5))
            .with_attr("compile_time", MetricValue::Float(803.0))
            .with_attr("graph_breaks", MetricValue::Integer(3));
        let metrics = get_model_test_metrics(
            &mut model,
            &[Metric::Ttfb, Metric::CompileTime, Metric::GraphBreaks],
            &small_options(),
        )
        .unwrap();
        assert_eq!(metrics.ttfb, Some(120.5));
        assert_eq!(metrics.compile_time, Some(803.0));
        assert_eq!(metrics.graph_breaks, Some(3.0));
        // constant lookups, no invocations
        assert_eq!(model.invoke_count, 0);
    }

    #[test]
    fn test_flops_dispatch_sums_call_sites() {
        let mut model = MockModel::new(Device::Cpu)
            .with_flops("aten::mm", 10.0)
            .with_flops("aten::bmm", 5.0);
        let metrics =
            get_model_test_metrics(&mut model, &[Metric::ModelFlops], &small_options()).unwrap();
        assert_eq!(metrics.model_flops, Some(15.0));
    }

    #[test]
    fn test_injected_probe_reaches_device_metrics() {
        let mut model = MockModel::new(Device::Cuda);
        let options = MetricsOptions {
            probe: Some(Arc::new(StaticProbe)),
            ..small_options()
        };
        let metrics = get_model_test_metrics(
            &mut model,
            &[Metric::CpuPeakMem, Metric::GpuPeakMem],
            &options,
        )
        .unwrap();
        assert_eq!(metrics.cpu_peak_mem, Some(512.0));
        assert_eq!(metrics.gpu_peak_mem, Some(2048.0));
    }

    #[test]
    fn test_device_metric_without_backend_fails_loudly() {
        let mut model = MockModel::new(Device::Cuda);
        let result = get_model_test_metrics(
            &mut model,
            &[Metric::GpuPeakMem],
            &MetricsOptions::default(),
        );
        assert!(matches!(result, Err(BenchError::EnvironmentError(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_cpu_peak_mem_via_default_probe() {
        let mut model = MockModel::new(Device::Cpu);
        let metrics =
            get_model_test_metrics(&mut model, &[Metric::CpuPeakMem], &small_options()).unwrap();
        assert!(metrics.cpu_peak_mem.unwrap() > 0.0);
        assert!(metrics.gpu_peak_mem.is_none());
    }
}
