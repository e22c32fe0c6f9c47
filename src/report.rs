use std::fmt::Write;

use crate::format::{format_elapsed, format_kb, format_ratio, truncate_unicode};
use crate::system::metrics::CpuMode;
use crate::system::snapshot::SystemSnapshot;

const COMMAND_WIDTH: usize = 40;
const USER_WIDTH: usize = 10;

fn cpu_mode_label(mode: CpuMode) -> &'static str {
    match mode {
        CpuMode::Delta => "live",
        CpuMode::SinceBoot => "since boot",
        CpuMode::Unavailable => "unavailable",
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

/// Header block plus up to `max_rows` process rows (0 = all).
pub fn render_text(snapshot: &SystemSnapshot, max_rows: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "OS:        {}", or_dash(&snapshot.os_name));
    let _ = writeln!(out, "Kernel:    {}", or_dash(&snapshot.kernel));
    let _ = writeln!(out, "Uptime:    {}", format_elapsed(snapshot.uptime_secs));
    let _ = writeln!(
        out,
        "CPU:       {} ({})",
        format_ratio(snapshot.cpu.ratio),
        cpu_mode_label(snapshot.cpu.mode)
    );
    let _ = writeln!(
        out,
        "Memory:    {}",
        format_ratio(snapshot.memory_utilization)
    );
    let _ = writeln!(
        out,
        "Processes: {} total, {} running",
        snapshot.total_processes, snapshot.running_processes
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>7} {:<width$} {:>6} {:>9} {:>9} COMMAND",
        "PID",
        "USER",
        "CPU%",
        "RSS",
        "UPTIME",
        width = USER_WIDTH
    );

    let limit = if max_rows == 0 {
        snapshot.processes.len()
    } else {
        max_rows
    };
    for process in snapshot.processes.iter().take(limit) {
        let _ = writeln!(
            out,
            "{:>7} {:<width$} {:>6.1} {:>9} {:>9} {}",
            process.pid,
            truncate_unicode(&process.user, USER_WIDTH),
            process.cpu_utilization * 100.0,
            format_kb(process.memory_kb),
            format_elapsed(process.uptime_secs),
            truncate_unicode(&process.command, COMMAND_WIDTH),
            width = USER_WIDTH
        );
    }
    out
}
