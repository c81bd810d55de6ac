use crate::errors::BenchResult;
use crate::model::ModelHandle;
use std::time::Instant;

/// Default number of discarded warmup invocations.
pub const WARMUP_ROUNDS: usize = 10;
/// Default number of measured invocations.
pub const BENCHMARK_ITERS: usize = 15;

/// Measures per-invocation wall-clock latency across a warmup phase and a
/// measurement phase.
#[derive(Debug, Clone, Copy)]
pub struct LatencySampler {
    /// Invocations run and discarded before measuring.
    pub warmup: usize,
    /// Measured invocations; one latency sample per iteration.
    pub iterations: usize,
}

impl Default for LatencySampler {
    fn default() -> Self {
        LatencySampler {
            warmup: WARMUP_ROUNDS,
            iterations: BENCHMARK_ITERS,
        }
    }
}

impl LatencySampler {
    /// Run the warmup and measurement phases, returning the ordered
    /// per-iteration latencies in milliseconds.
    ///
    /// On accelerator devices a synchronization barrier is issued before and
    /// after each timed invocation; without it the timer would only capture
    /// host-side dispatch, not actual device compute.
    pub fn sample(&self, model: &mut dyn ModelHandle) -> BenchResult<Vec<f64>> {
        for _ in 0..self.warmup {
            model.invoke()?;
        }
        let mut latencies = Vec::with_capacity(self.iterations);
        for _ in 0..self.iterations {
            if model.device().is_accelerator() {
                model.synchronize()?;
                let start = Instant::now();
                model.invoke()?;
                model.synchronize()?;
                latencies.push(start.elapsed().as_secs_f64() * 1000.0);
            } else {
                let start = Instant::now();
                model.invoke()?;
                latencies.push(start.elapsed().as_secs_f64() * 1000.0);
            }
        }
        Ok(latencies)
    }
}
