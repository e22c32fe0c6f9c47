//! Raw counters in, utilization ratios out.
//!
//! All ratios are in `0.0..=1.0` except per-process CPU, which can exceed 1.0
//! for a multi-threaded process that ran on several cores at once.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{SourceError, SourceResult};
use super::source::RawCounterSet;

/// Cumulative per-state ticks from the aggregate `cpu` line, in kernel order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSample {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuSample {
    pub const FIELD_COUNT: usize = 8;

    /// Build from the tokens after the `cpu` label. Trailing guest columns
    /// are ignored; fewer than eight columns is a malformed line.
    pub fn from_tokens(origin: &Path, tokens: &[String]) -> SourceResult<Self> {
        if tokens.len() < Self::FIELD_COUNT {
            return Err(SourceError::malformed(
                origin,
                format!(
                    "cpu line has {} tick columns, need {}",
                    tokens.len(),
                    Self::FIELD_COUNT
                ),
            ));
        }
        let mut ticks = [0u64; Self::FIELD_COUNT];
        for (slot, token) in ticks.iter_mut().zip(tokens) {
            *slot = token.parse().map_err(|_| {
                SourceError::malformed(origin, format!("cpu tick is not numeric: {token:?}"))
            })?;
        }
        let [user, nice, system, idle, iowait, irq, softirq, steal] = ticks;
        Ok(CpuSample {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
        })
    }

    pub fn active(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .into_iter()
        .fold(0u64, u64::saturating_add)
    }

    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    pub fn total(&self) -> u64 {
        self.active().saturating_add(self.idle_total())
    }
}

/// How a system CPU ratio was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuMode {
    /// Live load between the previous and the current sample.
    Delta,
    /// Average since boot; only used when no previous sample exists.
    SinceBoot,
    /// The CPU line could not be read.
    #[default]
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuReading {
    pub ratio: f64,
    pub mode: CpuMode,
}

impl CpuReading {
    pub fn unavailable() -> Self {
        CpuReading::default()
    }
}

/// System CPU utilization.
///
/// With a previous sample this is `Δactive / (Δactive + Δidle)`. Without one,
/// or when the counters went backwards (sample from before a reset), it
/// degrades to `active / total` since boot.
pub fn cpu_utilization(previous: Option<&CpuSample>, current: &CpuSample) -> CpuReading {
    if let Some(prev) = previous
        && current.active() >= prev.active()
        && current.idle_total() >= prev.idle_total()
    {
        let active = current.active() - prev.active();
        let idle = current.idle_total() - prev.idle_total();
        return CpuReading {
            ratio: ratio(active, active.saturating_add(idle)),
            mode: CpuMode::Delta,
        };
    }
    CpuReading {
        ratio: ratio(current.active(), current.total()),
        mode: CpuMode::SinceBoot,
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64).clamp(0.0, 1.0)
}

/// `(MemTotal − MemFree − Buffers − Cached) / MemTotal`.
///
/// `MemTotal` and `MemFree` are required; `Buffers` and `Cached` count as
/// zero when absent.
pub fn memory_utilization(meminfo: &RawCounterSet) -> SourceResult<f64> {
    let total = meminfo.number("MemTotal")?;
    if total == 0 {
        return Err(SourceError::DivideByZero("MemTotal"));
    }
    let free = meminfo.number("MemFree")?;
    let buffers = optional_number(meminfo, "Buffers")?;
    let cached = optional_number(meminfo, "Cached")?;
    let reclaimable = free.saturating_add(buffers).saturating_add(cached);
    Ok(ratio(total.saturating_sub(reclaimable), total))
}

fn optional_number(set: &RawCounterSet, key: &str) -> SourceResult<u64> {
    match set.get(key) {
        Some(_) => set.number(key),
        None => Ok(0),
    }
}

/// Named view over `<pid>/stat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessStat {
    pub comm: String,
    pub state: char,
    pub ppid: u32,
    pub utime: u64,
    pub stime: u64,
    pub cutime: u64,
    pub cstime: u64,
    /// Ticks after boot at which the process started.
    pub starttime: u64,
}

// Column offsets counted from the first field after `(comm)`, i.e. stat
// field N (1-indexed) lives at N - 3.
const STATE: usize = 0;
const PPID: usize = 1;
const UTIME: usize = 11;
const STIME: usize = 12;
const CUTIME: usize = 13;
const CSTIME: usize = 14;
const STARTTIME: usize = 19;

impl ProcessStat {
    /// `comm` may itself contain spaces and parentheses, so fields are
    /// counted from the last `)`.
    pub fn parse(origin: &Path, contents: &str) -> SourceResult<Self> {
        let open = contents
            .find('(')
            .ok_or_else(|| SourceError::malformed(origin, "missing `(` before comm"))?;
        let close = contents
            .rfind(')')
            .filter(|&close| close > open)
            .ok_or_else(|| SourceError::malformed(origin, "missing `)` after comm"))?;
        let comm = contents[open + 1..close].to_string();
        let fields: Vec<&str> = contents[close + 1..].split_whitespace().collect();

        let state = stat_field(origin, &fields, STATE, "state")?
            .chars()
            .next()
            .unwrap_or('?');
        let ppid = stat_number(origin, &fields, PPID, "ppid")?;
        Ok(ProcessStat {
            comm,
            state,
            ppid: u32::try_from(ppid)
                .map_err(|_| SourceError::malformed(origin, format!("ppid out of range: {ppid}")))?,
            utime: stat_number(origin, &fields, UTIME, "utime")?,
            stime: stat_number(origin, &fields, STIME, "stime")?,
            cutime: stat_number(origin, &fields, CUTIME, "cutime")?,
            cstime: stat_number(origin, &fields, CSTIME, "cstime")?,
            starttime: stat_number(origin, &fields, STARTTIME, "starttime")?,
        })
    }

    /// utime + stime + cutime + cstime.
    pub fn active_ticks(&self) -> u64 {
        [self.utime, self.stime, self.cutime, self.cstime]
            .into_iter()
            .fold(0u64, u64::saturating_add)
    }

    pub fn start_secs(&self, clock_ticks: u64) -> f64 {
        if clock_ticks == 0 {
            return 0.0;
        }
        self.starttime as f64 / clock_ticks as f64
    }
}

fn stat_field<'a>(origin: &Path, fields: &[&'a str], idx: usize, name: &str) -> SourceResult<&'a str> {
    fields.get(idx).copied().ok_or_else(|| {
        SourceError::malformed(
            origin,
            format!("stat has {} fields after comm, `{name}` missing", fields.len()),
        )
    })
}

fn stat_number(origin: &Path, fields: &[&str], idx: usize, name: &str) -> SourceResult<u64> {
    let raw = stat_field(origin, fields, idx, name)?;
    raw.parse()
        .map_err(|_| SourceError::malformed(origin, format!("`{name}` is not numeric: {raw:?}")))
}

/// Seconds the process has been alive, never negative.
pub fn process_age_secs(stat: &ProcessStat, system_uptime: f64, clock_ticks: u64) -> f64 {
    (system_uptime - stat.start_secs(clock_ticks)).max(0.0)
}

/// Average CPU share of the process over its lifetime.
///
/// Returns 0 for a process with no measurable elapsed time (started within
/// the current tick) or when the clock rate is unknown.
pub fn process_cpu_utilization(stat: &ProcessStat, system_uptime: f64, clock_ticks: u64) -> f64 {
    if clock_ticks == 0 {
        return 0.0;
    }
    let elapsed = system_uptime - stat.start_secs(clock_ticks);
    if !elapsed.is_finite() || elapsed <= 0.0 {
        return 0.0;
    }
    let cpu_secs = stat.active_ticks() as f64 / clock_ticks as f64;
    let util = cpu_secs / elapsed;
    if util.is_finite() { util } else { 0.0 }
}

/// Memory and ownership fields from `<pid>/status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStatus {
    /// Resident set size in kB; zero for kernel threads that report none.
    pub rss_kb: u64,
    /// Real uid, the first column of `Uid:`.
    pub uid: Option<u32>,
}

impl ProcessStatus {
    pub fn from_counters(status: &RawCounterSet) -> SourceResult<Self> {
        let rss_kb = optional_number(status, "VmRSS")?;
        let uid = match status.get("Uid") {
            Some(_) => Some(u32::try_from(status.number("Uid")?).map_err(|_| {
                SourceError::malformed(status.origin(), "uid out of range")
            })?),
            None => None,
        };
        Ok(ProcessStatus { rss_kb, uid })
    }
}

/// Whole megabytes, truncating.
pub fn kb_to_mb(kb: u64) -> u64 {
    kb / 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn sample(s: &str) -> CpuSample {
        CpuSample::from_tokens(Path::new("stat"), &tokens(s)).unwrap()
    }

    fn counters(s: &str) -> RawCounterSet {
        RawCounterSet::parse(Path::new("meminfo"), s)
    }

    // pid 1234, comm with spaces and parens, state S, ppid 1, utime 100,
    // stime 50, cutime 0, cstime 0, starttime 200.
    const STAT_LINE: &str = "1234 (tmux: server (1)) S 1 1234 1234 0 -1 4194560 \
        3000 0 0 0 100 50 0 0 20 0 1 0 200 12345678 1024 18446744073709551615";

    #[test]
    fn cpu_sample_needs_eight_columns() {
        let err = CpuSample::from_tokens(Path::new("stat"), &tokens("1 2 3 4 5 6 7")).unwrap_err();
        assert!(matches!(err, SourceError::MalformedLine { .. }));
        let err = CpuSample::from_tokens(Path::new("stat"), &[]).unwrap_err();
        assert!(matches!(err, SourceError::MalformedLine { .. }));
    }

    #[test]
    fn cpu_sample_ignores_guest_columns() {
        let s = sample("10 20 30 40 50 60 70 80 90 100");
        assert_eq!(s.steal, 80);
        assert_eq!(s.active(), 10 + 20 + 30 + 60 + 70 + 80);
        assert_eq!(s.idle_total(), 90);
        assert_eq!(s.total(), 360);
    }

    #[test]
    fn cpu_sample_rejects_non_numeric() {
        let err = CpuSample::from_tokens(Path::new("stat"), &tokens("1 2 x 4 5 6 7 8")).unwrap_err();
        assert!(err.to_string().contains("\"x\""));
    }

    #[test]
    fn cpu_delta_between_samples() {
        let prev = sample("100 0 100 800 0 0 0 0");
        let curr = sample("150 0 150 900 0 0 0 0");
        let reading = cpu_utilization(Some(&prev), &curr);
        assert_eq!(reading.mode, CpuMode::Delta);
        assert!((reading.ratio - 0.5).abs() < 1e-12);
    }

    #[test]
    fn cpu_without_previous_is_since_boot() {
        let curr = sample("100 0 100 800 0 0 0 0");
        let reading = cpu_utilization(None, &curr);
        assert_eq!(reading.mode, CpuMode::SinceBoot);
        assert!((reading.ratio - 0.2).abs() < 1e-12);
    }

    #[test]
    fn cpu_identical_samples_are_zero() {
        let s = sample("100 0 100 800 0 0 0 0");
        let reading = cpu_utilization(Some(&s), &s);
        assert_eq!(reading.mode, CpuMode::Delta);
        assert_eq!(reading.ratio, 0.0);
    }

    #[test]
    fn cpu_counter_reset_falls_back_to_since_boot() {
        let prev = sample("1000 0 1000 8000 0 0 0 0");
        let curr = sample("10 0 10 80 0 0 0 0");
        assert_eq!(cpu_utilization(Some(&prev), &curr).mode, CpuMode::SinceBoot);
    }

    #[test]
    fn cpu_all_zero_sample() {
        let reading = cpu_utilization(None, &CpuSample::default());
        assert_eq!(reading.ratio, 0.0);
    }

    #[test]
    fn memory_example() {
        let set = counters("MemTotal: 1000 kB\nMemFree: 400 kB\nBuffers: 100 kB\nCached: 100 kB\n");
        let util = memory_utilization(&set).unwrap();
        assert!((util - 0.4).abs() < 1e-12);
    }

    #[test]
    fn memory_zero_total_is_divide_by_zero() {
        let set = counters("MemTotal: 0 kB\nMemFree: 0 kB\n");
        assert!(matches!(
            memory_utilization(&set),
            Err(SourceError::DivideByZero("MemTotal"))
        ));
    }

    #[test]
    fn memory_missing_free_is_malformed() {
        let set = counters("MemTotal: 1000 kB\n");
        assert!(matches!(
            memory_utilization(&set),
            Err(SourceError::MalformedLine { .. })
        ));
    }

    #[test]
    fn memory_reclaimable_above_total_clamps_to_zero() {
        let set = counters("MemTotal: 1000 kB\nMemFree: 900 kB\nBuffers: 100 kB\nCached: 100 kB\n");
        assert_eq!(memory_utilization(&set).unwrap(), 0.0);
    }

    #[test]
    fn stat_parses_named_fields() {
        let stat = ProcessStat::parse(Path::new("1234/stat"), STAT_LINE).unwrap();
        assert_eq!(stat.comm, "tmux: server (1)");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.ppid, 1);
        assert_eq!(stat.utime, 100);
        assert_eq!(stat.stime, 50);
        assert_eq!(stat.active_ticks(), 150);
        assert_eq!(stat.starttime, 200);
    }

    #[test]
    fn stat_short_line_is_malformed() {
        let err = ProcessStat::parse(Path::new("1/stat"), "1 (init) S 0 1 1").unwrap_err();
        assert!(err.to_string().contains("utime"));
        let err = ProcessStat::parse(Path::new("1/stat"), "").unwrap_err();
        assert!(matches!(err, SourceError::MalformedLine { .. }));
    }

    #[test]
    fn process_cpu_example() {
        let stat = ProcessStat::parse(Path::new("1234/stat"), STAT_LINE).unwrap();
        let util = process_cpu_utilization(&stat, 10.0, 100);
        assert!((util - 0.1875).abs() < 1e-12);
        assert!((process_age_secs(&stat, 10.0, 100) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn process_cpu_no_elapsed_time_is_zero() {
        let stat = ProcessStat {
            utime: 10,
            starttime: 1000,
            ..Default::default()
        };
        assert_eq!(process_cpu_utilization(&stat, 10.0, 100), 0.0);
        assert_eq!(process_cpu_utilization(&stat, 5.0, 100), 0.0);
        assert_eq!(process_cpu_utilization(&stat, 50.0, 0), 0.0);
        assert_eq!(process_age_secs(&stat, 5.0, 100), 0.0);
    }

    #[test]
    fn status_rss_and_uid() {
        let set = counters("Name:\tbash\nUid:\t1000\t1000\t1000\t1000\nVmSize:\t  10000 kB\nVmRSS:\t   5120 kB\n");
        let status = ProcessStatus::from_counters(&set).unwrap();
        assert_eq!(status.rss_kb, 5120);
        assert_eq!(status.uid, Some(1000));
        assert_eq!(kb_to_mb(status.rss_kb), 5);
    }

    #[test]
    fn status_kernel_thread_has_no_rss() {
        let set = counters("Name:\tkthreadd\nUid:\t0\t0\t0\t0\n");
        let status = ProcessStatus::from_counters(&set).unwrap();
        assert_eq!(status.rss_kb, 0);
        assert_eq!(status.uid, Some(0));
    }

    #[test]
    fn kb_to_mb_truncates() {
        assert_eq!(kb_to_mb(1023), 0);
        assert_eq!(kb_to_mb(1024), 1);
        assert_eq!(kb_to_mb(2047), 1);
    }
}
