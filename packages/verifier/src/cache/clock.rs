use std::time::SystemTime;

/// Wall-clock source for cache windows
pub trait CacheClock {
    fn now(&self) -> SystemTime;
}

/// The system's real-time clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl CacheClock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
