/// Kernel tick rate used when the platform cannot report one (Linux USER_HZ).
pub const DEFAULT_CLOCK_TICKS: u64 = 100;

pub trait PlatformClock {
    /// Clock ticks per second used by per-process and aggregate tick counters.
    fn clock_ticks_per_second() -> Option<u64>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod other;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(not(target_os = "linux"))]
use other as platform_impl;

pub fn clock_ticks_per_second() -> u64 {
    match platform_impl::Platform::clock_ticks_per_second() {
        Some(hz) if hz > 0 => hz,
        _ => {
            tracing::debug!(
                default = DEFAULT_CLOCK_TICKS,
                "clock tick rate unavailable, using default"
            );
            DEFAULT_CLOCK_TICKS
        }
    }
}
