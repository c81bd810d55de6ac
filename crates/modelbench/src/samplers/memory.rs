use crate::errors::{BenchError, BenchResult};
use crate::metrics::Metric;
use crate::model::ModelHandle;
use crate::samplers::latency::BENCHMARK_ITERS;
use crate::samplers::work_step;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default number of measurement iterations for memory profiling.
pub const MEMPROF_ITERS: usize = 2;
/// Iteration count used when a single invocation finishes under the boost
/// threshold; short workloads need more repetitions for the monitor to
/// observe a representative peak.
pub const MEMPROF_BOOST_ITERS: usize = BENCHMARK_ITERS;
/// Probe-invocation duration below which the boosted count is used.
pub const MEMPROF_BOOST_THRESHOLD: Duration = Duration::from_millis(15);

/// Backend used to read device memory counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuBackend {
    #[default]
    Nvml,
    Dcgm,
}

impl fmt::Display for GpuBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuBackend::Nvml => write!(f, "nvml"),
            GpuBackend::Dcgm => write!(f, "dcgm"),
        }
    }
}

/// Reads instantaneous memory usage for the monitored process and device.
pub trait MemoryProbe: Send + Sync {
    /// Resident host memory of the monitored process, MB.
    fn sample_host_mb(&self) -> BenchResult<f64>;

    /// Used device memory, MB, with the device identifier.
    fn sample_device_mb(&self) -> BenchResult<(u32, f64)>;
}

/// One observation taken by the background monitor.
#[derive(Debug, Clone)]
pub struct MemorySample {
    pub elapsed_ms: f64,
    pub host_mb: Option<f64>,
    pub device_id: Option<u32>,
    pub device_mb: Option<f64>,
}

/// Background memory monitor, scoped to the measurement window.
///
/// Started before the measurement loop and joined by [`MemoryMonitor::stop`].
/// Dropping the monitor (e.g. when a measurement iteration fails) also stops
/// the sampling thread, so the thread never outlives the window.
pub struct MemoryMonitor {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Vec<MemorySample>>>,
}

impl MemoryMonitor {
    pub fn start(
        probe: Arc<dyn MemoryProbe>,
        want_host: bool,
        want_device: bool,
        poll_interval: Duration,
    ) -> BenchResult<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = thread::Builder::new()
            .name("mem-monitor".to_string())
            .spawn(move || {
                let started = Instant::now();
                let mut samples = Vec::new();
                loop {
                    let host_mb = if want_host {
                        probe.sample_host_mb().ok()
                    } else {
                        None
                    };
                    let (device_id, device_mb) = if want_device {
                        match probe.sample_device_mb() {
                            Ok((id, mb)) => (Some(id), Some(mb)),
                            Err(_) => (None, None),
                        }
                    } else {
                        (None, None)
                    };
                    samples.push(MemorySample {
                        elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
                        host_mb,
                        device_id,
                        device_mb,
                    });
                    if stop_flag.load(Ordering::Relaxed) {
                        break;
                    }
                    thread::sleep(poll_interval);
                }
                samples
            })
            .map_err(|e| BenchError::ThreadError(format!("Failed to start monitor: {}", e)))?;
        Ok(MemoryMonitor {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop the monitor and return the collected samples, oldest first.
    pub fn stop(mut self) -> BenchResult<Vec<MemorySample>> {
        self.stop.store(true, Ordering::Relaxed);
        let handle = self
            .handle
            .take()
            .ok_or_else(|| BenchError::ThreadError("Monitor already stopped".to_string()))?;
        handle
            .join()
            .map_err(|_| BenchError::ThreadError("Memory monitor panicked".to_string()))
    }
}

impl Drop for MemoryMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.store(true, Ordering::Relaxed);
            let _ = handle.join();
        }
    }
}

/// Peak memory observed during one measurement window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakMemory {
    pub cpu_peak_mem: Option<f64>,
    pub device_id: Option<u32>,
    pub gpu_peak_mem: Option<f64>,
}

/// Samples peak host and/or device memory while the model runs.
#[derive(Debug, Clone, Copy)]
pub struct PeakMemorySampler {
    /// Measurement iterations for workloads at or above the boost threshold.
    pub iterations: usize,
    /// Measurement iterations for workloads under the boost threshold.
    pub boost_iterations: usize,
    /// Single-probe duration below which `boost_iterations` is used.
    pub boost_threshold: Duration,
    /// Monitor sampling interval.
    pub poll_interval: Duration,
}

impl Default for PeakMemorySampler {
    fn default() -> Self {
        PeakMemorySampler {
            iterations: MEMPROF_ITERS,
            boost_iterations: MEMPROF_BOOST_ITERS,
            boost_threshold: MEMPROF_BOOST_THRESHOLD,
            poll_interval: Duration::from_millis(1),
        }
    }
}

impl PeakMemorySampler {
    /// Iteration count for the measurement pass, given the duration of the
    /// single probe invocation. Strictly under the threshold switches to the
    /// boosted count.
    pub fn measured_iterations(&self, probe_duration: Duration) -> usize {
        if probe_duration < self.boost_threshold {
            self.boost_iterations
        } else {
            self.iterations
        }
    }

    /// Measure peak memory for the requested memory metrics.
    ///
    /// Fails with a configuration error unless `metrics_needed` contains at
    /// least one of `cpu_peak_mem` / `gpu_peak_mem`, and with an environment
    /// error when a requested kind yields no monitor samples (e.g. a device
    /// metric without a working device backend behind the probe). Optionally
    /// exports the raw monitor samples to `export_file` as CSV.
    pub fn sample(
        &self,
        model: &mut dyn ModelHandle,
        metrics_needed: &[Metric],
        probe: Arc<dyn MemoryProbe>,
        export_file: Option<&Path>,
    ) -> BenchResult<PeakMemory> {
        let wanted: Vec<Metric> = metrics_needed
            .iter()
            .copied()
            .filter(Metric::is_memory)
            .collect();
        if wanted.is_empty() {
            return Err(BenchError::ConfigError(format!(
                "Expected memory metrics to be requested, got: {:?}",
                metrics_needed
            )));
        }
        let want_host = wanted.contains(&Metric::CpuPeakMem);
        let want_device = wanted.contains(&Metric::GpuPeakMem);

        let probe_start = Instant::now();
        work_step(model)?;
        let num_iter = self.measured_iterations(probe_start.elapsed());
        tracing::debug!(
            "Peak-memory pass using {} iterations for {}",
            num_iter,
            model.device()
        );

        let monitor =
            MemoryMonitor::start(probe, want_host, want_device, self.poll_interval)?;
        for _ in 0..num_iter {
            work_step(model)?;
        }
        let samples = monitor.stop()?;

        let mut peak = PeakMemory::default();
        if want_host {
            peak.cpu_peak_mem = samples
                .iter()
                .filter_map(|s| s.host_mb)
                .fold(None, |acc: Option<f64>, mb| {
                    Some(acc.map_or(mb, |a| a.max(mb)))
                });
        }
        if want_device {
            for sample in &samples {
                if let Some(mb) = sample.device_mb {
                    if peak.gpu_peak_mem.map_or(true, |peak_mb| mb > peak_mb) {
                        peak.gpu_peak_mem = Some(mb);
                        peak.device_id = sample.device_id;
                    }
                }
            }
        }
        if let Some(path) = export_file {
            export_samples(path, &samples)?;
        }
        if want_host && peak.cpu_peak_mem.is_none() {
            return Err(BenchError::EnvironmentError(
                "cpu_peak_mem was requested but the monitor observed no host samples".to_string(),
            ));
        }
        if want_device && peak.gpu_peak_mem.is_none() {
            return Err(BenchError::EnvironmentError(
                "gpu_peak_mem was requested but the monitor observed no device samples"
                    .to_string(),
            ));
        }
        Ok(peak)
    }
}

/// Write raw monitor samples to a CSV side file.
fn export_samples(path: &Path, samples: &[MemorySample]) -> BenchResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["elapsed_ms", "host_mb", "device_id", "device_mb"])?;
    for sample in samples {
        writer.write_record([
            format!("{:.3}", sample.elapsed_ms),
            sample.host_mb.map(|v| v.to_string()).unwrap_or_default(),
            sample.device_id.map(|v| v.to_string()).unwrap_or_default(),
            sample.device_mb.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Host memory probe backed by `/proc/<pid>/status`. Device sampling
/// requires a backend-specific probe from the framework collaborator.
pub struct ProcfsProbe {
    pid: u32,
    gpu_backend: GpuBackend,
}

impl ProcfsProbe {
    pub fn new(pid: u32, gpu_backend: GpuBackend) -> Self {
        ProcfsProbe { pid, gpu_backend }
    }
}

impl MemoryProbe for ProcfsProbe {
    fn sample_host_mb(&self) -> BenchResult<f64> {
        let status = fs::read_to_string(format!("/proc/{}/status", self.pid))?;
        for line in status.lines() {
            if let Some(rest) = line.strip_prefix("VmRSS:") {
                let kb: f64 = rest
                    .trim()
                    .trim_end_matches("kB")
                    .trim()
                    .parse()
                    .map_err(|e| {
                        BenchError::EnvironmentError(format!("Bad VmRSS value: {}", e))
                    })?;
                return Ok(kb / 1024.0);
            }
        }
        Err(BenchError::EnvironmentError(format!(
            "No VmRSS entry for pid {}",
            self.pid
        )))
    }

    fn sample_device_mb(&self) -> BenchResult<(u32, f64)> {
        Err(BenchError::EnvironmentError(format!(
            "{} device memory backend is not available",
            self.gpu_backend
        )))
    }
}
