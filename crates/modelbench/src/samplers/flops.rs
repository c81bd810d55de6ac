use crate::errors::BenchResult;
use crate::model::ModelHandle;
use crate::samplers::work_step;

/// Count floating-point operations for exactly one model invocation.
///
/// The invocation runs inside the framework's operation-counting scope, with
/// synchronization bracketing on accelerators, and the per-call-site counts
/// are summed into a single total. Single-shot: one invocation is assumed
/// representative.
pub fn get_model_flops(model: &mut dyn ModelHandle) -> BenchResult<f64> {
    model.start_flop_count()?;
    let invoked = work_step(model);
    // close the counting scope before surfacing an invocation failure
    let counts = model.finish_flop_count()?;
    invoked?;
    Ok(counts.values().sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Device;
    use crate::test_helpers::MockModel;

    #[test]
    fn test_sums_counts_across_call_sites() {
        let mut model = MockModel::new(Device::Cpu)
            .with_flops("aten::mm", 2_000_000.0)
            .with_flops("aten::convolution", 3_500_000.0);
        let total = get_model_flops(&mut model).unwrap();
        assert_eq!(total, 5_500_000.0);
        assert_eq!(model.invoke_count, 1);
    }

    #[test]
    fn test_single_invocation_is_sync_bracketed_on_cuda() {
        let mut model = MockModel::new(Device::Cuda).with_flops("aten::mm", 1.0);
        get_model_flops(&mut model).unwrap();
        assert_eq!(model.invoke_count, 1);
        assert_eq!(model.sync_count.get(), 2);
    }

    #[test]
    fn test_counting_scope_closes_on_invocation_failure() {
        let mut model = MockModel::new(Device::Cpu).with_flops("aten::mm", 1.0);
        model.fail_after = Some(0);
        assert!(get_model_flops(&mut model).is_err());
        assert!(!model.counting());
    }
}
