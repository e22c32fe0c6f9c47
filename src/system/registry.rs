use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use super::error::SourceError;
use super::metrics::{ProcessStat, ProcessStatus, process_age_secs, process_cpu_utilization};
use super::process::{ProcessRecord, sort_by_memory};
use super::source::{ProcPaths, read_cmdline, read_file, read_keyed_file};
use super::users::UserTable;

/// Owner label used when the status file carries no `Uid:` line.
pub const UNKNOWN_USER: &str = "?";

/// Every all-digit entry under `proc_root`. Entries that disappear while the
/// directory is being walked are skipped; an unreadable root yields nothing.
pub fn enumerate_pids(proc_root: &Path) -> BTreeSet<u32> {
    let entries = match std::fs::read_dir(proc_root) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %proc_root.display(), error = %err, "cannot list process root");
            return BTreeSet::new();
        }
    };

    entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            name.parse::<u32>().ok().filter(|&pid| pid > 0)
        })
        .collect()
}

/// Inputs shared by every row of one poll. System uptime is read once by the
/// caller and handed in, so every row measures against the same instant.
pub struct RowContext<'a> {
    pub paths: &'a ProcPaths,
    pub users: &'a UserTable,
    pub system_uptime: f64,
    pub clock_ticks: u64,
}

/// Build the record for `pid`, or `None` if the process exited since it was
/// enumerated (its stat or status file is gone).
pub fn build_row(ctx: &RowContext<'_>, pid: u32) -> Option<ProcessRecord> {
    let stat_path = ctx.paths.pid_stat(pid);
    let stat_contents = match read_file(&stat_path) {
        Ok(contents) => contents,
        Err(err) => {
            debug!(pid, error = %err, "process vanished before stat was read");
            return None;
        }
    };
    let status = match read_keyed_file(&ctx.paths.pid_status(pid)) {
        Ok(status) => status,
        Err(err) => {
            debug!(pid, error = %err, "process vanished before status was read");
            return None;
        }
    };

    let stat = ProcessStat::parse(&stat_path, &stat_contents)
        .inspect_err(|err| debug!(pid, error = %err, "stat unparseable, cpu and uptime default to 0"))
        .ok();
    let status = ProcessStatus::from_counters(&status).unwrap_or_else(|err| {
        debug!(pid, error = %err, "status unparseable, memory defaults to 0");
        ProcessStatus::default()
    });

    let (cpu_utilization, uptime_secs, start_secs) = match &stat {
        Some(stat) => (
            process_cpu_utilization(stat, ctx.system_uptime, ctx.clock_ticks),
            process_age_secs(stat, ctx.system_uptime, ctx.clock_ticks) as u64,
            stat.start_secs(ctx.clock_ticks) as u64,
        ),
        None => (0.0, 0, 0),
    };

    let user = match status.uid {
        Some(uid) => ctx.users.resolve(uid),
        None => UNKNOWN_USER.to_string(),
    };

    Some(ProcessRecord {
        pid,
        ppid: stat.as_ref().map(|s| s.ppid).unwrap_or(0),
        state: stat.as_ref().map(|s| s.state).unwrap_or('?'),
        user,
        command: command_for(ctx.paths, pid, stat.as_ref()),
        cpu_utilization,
        memory_kb: status.rss_kb,
        uptime_secs,
        start_secs,
    })
}

/// argv joined by spaces, falling back to `[comm]` for kernel threads. Empty
/// when the process exited before its cmdline could be read and no stat was
/// parsed.
fn command_for(paths: &ProcPaths, pid: u32, stat: Option<&ProcessStat>) -> String {
    let cmdline = read_cmdline(&paths.pid_cmdline(pid)).unwrap_or_else(|err: SourceError| {
        debug!(pid, error = %err, "cmdline unavailable");
        String::new()
    });
    if !cmdline.is_empty() {
        return cmdline;
    }
    match stat {
        Some(stat) if !stat.comm.is_empty() => format!("[{}]", stat.comm),
        _ => String::new(),
    }
}

/// Rows for every live pid, ordered by descending memory then ascending pid.
pub fn collect_processes(ctx: &RowContext<'_>) -> Vec<ProcessRecord> {
    let pids = enumerate_pids(&ctx.paths.proc_root);
    let mut rows: Vec<ProcessRecord> = pids
        .into_iter()
        .filter_map(|pid| build_row(ctx, pid))
        .collect();
    sort_by_memory(&mut rows);
    rows
}
