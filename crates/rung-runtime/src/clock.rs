//! Scan clocks.

#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Duration with nanosecond precision.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Duration {
    nanos: i64,
}

impl Duration {
    pub const ZERO: Self = Self { nanos: 0 };

    #[must_use]
    pub fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    #[must_use]
    pub fn from_micros(micros: i64) -> Self {
        Self {
            nanos: micros * 1_000,
        }
    }

    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self {
            nanos: millis * 1_000_000,
        }
    }

    #[must_use]
    pub fn from_secs(secs: i64) -> Self {
        Self {
            nanos: secs * 1_000_000_000,
        }
    }

    #[must_use]
    pub fn as_nanos(self) -> i64 {
        self.nanos
    }

    #[must_use]
    pub fn as_millis(self) -> i64 {
        self.nanos / 1_000_000
    }

    #[must_use]
    pub fn as_secs(self) -> i64 {
        self.nanos / 1_000_000_000
    }

    /// Difference clamped at zero; scan deltas never run backwards.
    #[must_use]
    pub fn saturating_since(self, earlier: Self) -> Self {
        let delta = self.nanos - earlier.nanos;
        Self {
            nanos: delta.max(0),
        }
    }
}

/// Clock interface driving scan timestamps.
pub trait Clock: Send + Sync + 'static {
    /// Current time for the next commit.
    fn now(&self) -> Duration;
}

/// Monotonic clock based on `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct StdClock {
    start: std::time::Instant,
}

impl StdClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now(&self) -> Duration {
        let elapsed = self.start.elapsed();
        let nanos = i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX);
        Duration::from_nanos(nanos)
    }
}

/// Deterministic clock for tests and simulations.
///
/// Clones share the same time source, so a runner and the test driving it
/// observe identical advances.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current manual time.
    #[must_use]
    pub fn current_time(&self) -> Duration {
        *self.inner.lock().expect("manual clock lock poisoned")
    }

    /// Advance time by the given delta.
    pub fn advance(&self, delta: Duration) -> Duration {
        let mut now = self.inner.lock().expect("manual clock lock poisoned");
        *now = Duration::from_nanos(now.as_nanos().saturating_add(delta.as_nanos()));
        *now
    }

    /// Set the current time explicitly.
    pub fn set_time(&self, time: Duration) {
        *self.inner.lock().expect("manual clock lock poisoned") = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.current_time()
    }
}
