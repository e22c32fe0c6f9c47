use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::metrics::kb_to_mb;

/// One process as seen by a single poll. Built once, never updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub ppid: u32,
    /// Single-letter scheduler state (`R`, `S`, `D`, `Z`, ...).
    pub state: char,
    pub user: String,
    pub command: String,
    /// Lifetime average CPU share; may exceed 1.0 on multi-core machines.
    pub cpu_utilization: f64,
    /// Resident set size in kB.
    pub memory_kb: u64,
    /// Seconds since the process started.
    pub uptime_secs: u64,
    /// Seconds after boot at which the process started.
    pub start_secs: u64,
}

impl ProcessRecord {
    pub fn memory_mb(&self) -> u64 {
        kb_to_mb(self.memory_kb)
    }
}

/// Descending memory, then ascending pid.
pub fn by_memory_desc(a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
    b.memory_kb
        .cmp(&a.memory_kb)
        .then_with(|| a.pid.cmp(&b.pid))
}

pub fn sort_by_memory(processes: &mut [ProcessRecord]) {
    processes.sort_unstable_by(by_memory_desc);
}

#[cfg(test)]
pub(crate) fn record(pid: u32, memory_kb: u64) -> ProcessRecord {
    ProcessRecord {
        pid,
        ppid: 1,
        state: 'S',
        user: "tester".to_string(),
        command: format!("worker-{pid}"),
        cpu_utilization: 0.0,
        memory_kb,
        uptime_secs: 0,
        start_secs: 0,
    }
}
