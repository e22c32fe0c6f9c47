use super::PlatformClock;

pub struct Platform;

impl PlatformClock for Platform {
    fn clock_ticks_per_second() -> Option<u64> {
        // SAFETY: sysconf has no preconditions and _SC_CLK_TCK is always valid.
        let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        u64::try_from(hz).ok().filter(|&hz| hz > 0)
    }
}
