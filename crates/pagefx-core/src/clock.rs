#![forbid(unsafe_code)]

//! Monotonic time sources.
//!
//! The engine never reads a clock on its own; the host passes readings into
//! [`Engine::advance_to`](crate::engine::Engine::advance_to). Tests use
//! [`DeterministicClock`], the browser adapter uses [`SystemClock`].

use core::time::Duration;

use web_time::Instant;

/// A monotonic clock measured from an arbitrary origin.
pub trait Clock {
    fn now_mono(&self) -> Duration;
}

/// Deterministic monotonic clock controlled by the caller.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl Clock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// Wall-clock backed monotonic time (`performance.now()` on wasm32).
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}
