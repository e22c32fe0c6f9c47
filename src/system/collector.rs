use std::path::Path;

use tracing::{debug, debug_span};

use super::error::{SourceError, SourceResult};
use super::metrics::{CpuSample, memory_utilization};
use super::platform;
use super::registry::{RowContext, collect_processes};
use super::sampler::CpuSampler;
use super::snapshot::SystemSnapshot;
use super::source::{
    ProcPaths, first_token_match, read_file, read_keyed_file, read_kernel_version, read_os_name,
    read_uptime,
};
use super::users::UserTable;

/// Owns everything that lives across polls: the source paths, the clock rate
/// and the previous CPU sample. `poll` takes `&mut self`, so two polls can
/// never overlap on the same collector.
pub struct Collector {
    paths: ProcPaths,
    clock_ticks: u64,
    sampler: CpuSampler,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(ProcPaths::default())
    }
}

impl Collector {
    pub fn new(paths: ProcPaths) -> Self {
        Self::with_clock_ticks(paths, platform::clock_ticks_per_second())
    }

    pub fn with_clock_ticks(paths: ProcPaths, clock_ticks: u64) -> Self {
        Collector {
            paths,
            clock_ticks: clock_ticks.max(1),
            sampler: CpuSampler::new(),
        }
    }

    pub fn paths(&self) -> &ProcPaths {
        &self.paths
    }

    pub fn clock_ticks(&self) -> u64 {
        self.clock_ticks
    }

    /// Read every source once and assemble a snapshot. Never fails: a field
    /// whose source is missing or malformed takes its default.
    pub fn poll(&mut self) -> SystemSnapshot {
        let _poll_span = debug_span!("collector.poll").entered();

        let os_name = or_default(read_os_name(&self.paths.os_release), "os name")
            .flatten()
            .unwrap_or_default();
        let kernel = or_default(read_kernel_version(&self.paths.version()), "kernel version")
            .flatten()
            .unwrap_or_default();
        let system_uptime = or_default(read_uptime(&self.paths.uptime()), "uptime").unwrap_or(0.0);
        let memory_utilization = or_default(
            read_keyed_file(&self.paths.meminfo()).and_then(|m| memory_utilization(&m)),
            "memory utilization",
        )
        .unwrap_or(0.0);

        let stat_path = self.paths.stat();
        let stat = or_default(read_file(&stat_path), "aggregate stat");
        let cpu = match stat.as_deref().map(|s| cpu_sample(&stat_path, s)) {
            Some(Ok(sample)) => self.sampler.observe(sample),
            Some(Err(err)) => {
                debug!(error = %err, "cpu line unusable, cpu reading unavailable");
                self.sampler.miss()
            }
            None => self.sampler.miss(),
        };
        let total_processes = stat
            .as_deref()
            .map(|s| stat_count(&stat_path, s, "processes"))
            .unwrap_or(0);
        let running_processes = stat
            .as_deref()
            .map(|s| stat_count(&stat_path, s, "procs_running"))
            .unwrap_or(0);

        let users = or_default(UserTable::load(&self.paths.passwd), "account database")
            .unwrap_or_default();
        let processes = collect_processes(&RowContext {
            paths: &self.paths,
            users: &users,
            system_uptime,
            clock_ticks: self.clock_ticks,
        });

        debug!(
            processes = processes.len(),
            cpu_ratio = cpu.ratio,
            "poll complete"
        );

        SystemSnapshot {
            os_name,
            kernel,
            uptime_secs: system_uptime as u64,
            memory_utilization,
            cpu,
            processes,
            total_processes,
            running_processes,
        }
    }

    /// Drop the remembered CPU sample; the next poll reports a since-boot
    /// average again.
    pub fn reset_cpu(&mut self) {
        self.sampler.reset();
    }
}

fn or_default<T>(result: SourceResult<T>, what: &str) -> Option<T> {
    result
        .inspect_err(|err| debug!(error = %err, "{what} unavailable, using default"))
        .ok()
}

fn cpu_sample(origin: &Path, stat: &str) -> SourceResult<CpuSample> {
    let tokens = first_token_match(stat, |t| t == "cpu")
        .ok_or_else(|| SourceError::malformed(origin, "no aggregate `cpu` line"))?;
    CpuSample::from_tokens(origin, &tokens)
}

/// Integer following `label` in the aggregate stat file, 0 when the line is
/// absent or not numeric.
fn stat_count(origin: &Path, stat: &str, label: &str) -> u64 {
    let Some(tokens) = first_token_match(stat, |t| t == label) else {
        debug!(path = %origin.display(), label, "stat line not found, count defaults to 0");
        return 0;
    };
    match tokens.first().map(|t| t.parse::<u64>()) {
        Some(Ok(count)) => count,
        _ => {
            debug!(path = %origin.display(), label, "stat count malformed, defaults to 0");
            0
        }
    }
}
