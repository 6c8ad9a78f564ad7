//! Wall-clock source for credential expiry checks

use chrono::Utc;

/// Current instant in seconds since the Unix epoch
pub trait Clock {
    fn now(&self) -> i64;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}
