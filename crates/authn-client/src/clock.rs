//! Time sources for claim validation and keychain expiry

use parking_lot::Mutex;
use std::fmt::Debug;
use std::time::{Duration, SystemTime};

/// Source of wall-clock time
///
/// The verifier and the keychain cache read the clock on every call, so
/// swapping in a [`ManualClock`] makes `exp`/`nbf` checks and TTL expiry
/// deterministic in tests.
pub trait Clock: Debug + Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> SystemTime;
}

/// The system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Jump to an arbitrary instant
    pub fn set(&self, to: SystemTime) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}
