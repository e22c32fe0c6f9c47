use super::PlatformClock;

pub struct Platform;

impl PlatformClock for Platform {
    fn clock_ticks_per_second() -> Option<u64> {
        None
    }
}
