use crate::errors::{BenchError, BenchResult};
use crate::metrics::MetricValue;
use crate::model::{Device, ModelConfig, ModelHandle, ModelLoader};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

/// In-memory model handle for sampler and runner tests.
pub struct MockModel {
    pub device: Device,
    pub batch: u32,
    pub pid: u32,
    pub invoke_delay: Duration,
    pub invoke_count: usize,
    pub sync_count: Cell<usize>,
    /// When set, invocations fail once `invoke_count` reaches this value.
    pub fail_after: Option<usize>,
    attrs: HashMap<String, MetricValue>,
    flop_counts: HashMap<String, f64>,
    counting: bool,
}

impl MockModel {
    pub fn new(device: Device) -> Self {
        MockModel {
            device,
            batch: 1,
            pid: std::process::id(),
            invoke_delay: Duration::ZERO,
            invoke_count: 0,
            sync_count: Cell::new(0),
            fail_after: None,
            attrs: HashMap::new(),
            flop_counts: HashMap::new(),
            counting: false,
        }
    }

    pub fn with_attr(mut self, name: &str, value: MetricValue) -> Self {
        self.attrs.insert(name.to_string(), value);
        self
    }

    pub fn with_flops(mut self, call_site: &str, flops: f64) -> Self {
        self.flop_counts.insert(call_site.to_string(), flops);
        self
    }

    pub fn with_batch(mut self, batch: u32) -> Self {
        self.batch = batch;
        self
    }

    pub fn counting(&self) -> bool {
        self.counting
    }
}

impl ModelHandle for MockModel {
    fn invoke(&mut self) -> BenchResult<()> {
        if let Some(limit) = self.fail_after {
            if self.invoke_count >= limit {
                return Err(BenchError::BenchmarkError(
                    "mock invocation failure".to_string(),
                ));
            }
        }
        self.invoke_count += 1;
        if !self.invoke_delay.is_zero() {
            thread::sleep(self.invoke_delay);
        }
        Ok(())
    }

    fn get_attribute(&self, name: &str) -> BenchResult<Option<MetricValue>> {
        Ok(self.attrs.get(name).cloned())
    }

    fn process_id(&self) -> u32 {
        self.pid
    }

    fn device(&self) -> Device {
        self.device
    }

    fn batch_size(&self) -> u32 {
        self.batch
    }

    fn synchronize(&self) -> BenchResult<()> {
        self.sync_count.set(self.sync_count.get() + 1);
        Ok(())
    }

    fn start_flop_count(&mut self) -> BenchResult<()> {
        self.counting = true;
        Ok(())
    }

    fn finish_flop_count(&mut self) -> BenchResult<HashMap<String, f64>> {
        if !self.counting {
            return Err(BenchError::BenchmarkError(
                "flop counter was never started".to_string(),
            ));
        }
        self.counting = false;
        Ok(self.flop_counts.clone())
    }
}

/// Loader that records every instantiation it is asked for.
#[derive(Default)]
pub struct MockLoader {
    attrs: HashMap<String, MetricValue>,
    /// Each recorded load: the config it received and whether it was isolated.
    pub loads: RefCell<Vec<(ModelConfig, bool)>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, name: &str, value: MetricValue) -> Self {
        self.attrs.insert(name.to_string(), value);
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.borrow().len()
    }

    fn instantiate(&self, config: &ModelConfig, isolated: bool) -> Box<dyn ModelHandle> {
        self.loads.borrow_mut().push((config.clone(), isolated));
        let mut model = MockModel::new(config.device).with_batch(config.batch_size.unwrap_or(1));
        for (name, value) in &self.attrs {
            model = model.with_attr(name, value.clone());
        }
        Box::new(model)
    }
}

impl ModelLoader for MockLoader {
    fn load(&self, config: &ModelConfig) -> BenchResult<Box<dyn ModelHandle>> {
        Ok(self.instantiate(config, false))
    }

    fn load_isolated(&self, config: &ModelConfig) -> BenchResult<Box<dyn ModelHandle>> {
        Ok(self.instantiate(config, true))
    }
}
