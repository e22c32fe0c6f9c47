use super::metrics::{CpuReading, CpuSample, cpu_utilization};

/// The one piece of state carried between polls: the previous aggregate CPU
/// sample, needed to turn cumulative ticks into a live ratio.
#[derive(Debug, Clone, Default)]
pub struct CpuSampler {
    previous: Option<CpuSample>,
}

impl CpuSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the reading for `current` and remember it for the next call.
    pub fn observe(&mut self, current: CpuSample) -> CpuReading {
        let reading = cpu_utilization(self.previous.as_ref(), &current);
        self.previous = Some(current);
        reading
    }

    /// The CPU line could not be read this poll. The previous sample is kept
    /// so the next successful read still yields a delta.
    pub fn miss(&self) -> CpuReading {
        CpuReading::unavailable()
    }

    pub fn previous(&self) -> Option<&CpuSample> {
        self.previous.as_ref()
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
