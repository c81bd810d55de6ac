pub mod flops;
pub mod latency;
pub mod memory;

pub use flops::get_model_flops;
pub use latency::LatencySampler;
pub use memory::{
    GpuBackend, MemoryMonitor, MemoryProbe, MemorySample, PeakMemory, PeakMemorySampler,
    ProcfsProbe,
};

use crate::errors::BenchResult;
use crate::model::ModelHandle;

/// Run one step of the model with synchronization bracketing on
/// accelerators, so asynchronous device work is fully accounted.
pub(crate) fn work_step(model: &mut dyn ModelHandle) -> BenchResult<()> {
    if model.device().is_accelerator() {
        model.synchronize()?;
        model.invoke()?;
        model.synchronize()
    } else {
        model.invoke()
    }
}
