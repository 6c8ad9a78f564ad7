//! Inactivity countdown for an authenticated session
//!
//! One timer per session. Activity signals push the deadline forward by
//! resetting the same `Sleep`, so a rearm replaces the pending countdown
//! instead of adding another. Dropping the timer cancels it.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{self, Instant, Sleep};
use tracing::trace;

/// Idle window after which an authenticated session is ended
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(120);

/// User-activity signals that rearm the timer
///
/// The terminal shell only produces `KeyPress`; the pointer signals are for
/// embedders driving the portal from a graphical front end.
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    PointerMove,
    KeyPress,
    Click,
    Scroll,
}

/// A single pending countdown
#[derive(Debug)]
pub struct InactivityTimer {
    duration: Duration,
    sleep: Pin<Box<Sleep>>,
}

impl InactivityTimer {
    /// Start a countdown of `duration` from now
    pub fn arm(duration: Duration) -> Self {
        Self {
            duration,
            sleep: Box::pin(time::sleep(duration)),
        }
    }

    /// Restart the countdown from now
    pub fn rearm(&mut self) {
        let deadline = Instant::now() + self.duration;
        self.sleep.as_mut().reset(deadline);
        trace!(?deadline, "inactivity timer rearmed");
    }

    pub fn deadline(&self) -> Instant {
        self.sleep.deadline()
    }

    pub fn remaining(&self) -> Duration {
        self.deadline().saturating_duration_since(Instant::now())
    }

    /// Resolves once the idle window has elapsed without a rearm
    ///
    /// Cancel-safe: dropping the returned future leaves the countdown intact.
    pub fn elapsed(&mut self) -> impl Future<Output = ()> + '_ {
        self.sleep.as_mut()
    }
}
