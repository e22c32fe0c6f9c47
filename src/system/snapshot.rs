use serde::{Deserialize, Serialize};

use super::metrics::CpuReading;
use super::process::ProcessRecord;

/// Result of one poll. Fields that could not be read hold their defaults:
/// empty strings, zero counts, `CpuMode::Unavailable`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub os_name: String,
    pub kernel: String,
    pub uptime_secs: u64,
    /// Fraction of physical memory in use, `0.0..=1.0`.
    pub memory_utilization: f64,
    pub cpu: CpuReading,
    /// Sorted by descending memory, then ascending pid.
    pub processes: Vec<ProcessRecord>,
    pub total_processes: u64,
    pub running_processes: u64,
}

impl SystemSnapshot {
    pub fn process(&self, pid: u32) -> Option<&ProcessRecord> {
        self.processes.iter().find(|p| p.pid == pid)
    }

    pub fn pids(&self) -> Vec<u32> {
        self.processes.iter().map(|p| p.pid).collect()
    }
}
