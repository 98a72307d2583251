//! Millisecond clock adapters.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side testing and simulation.
//!
//! Both truncate to a `u32` millisecond count, which wraps after about
//! 49.7 days of uptime.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::app::ports::Clock;

/// Uptime clock of the running platform.
pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since this clock was created (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap.
        (self.uptime_us() / 1_000) as u32
    }
}

/// Hand-driven clock for deterministic tests. Safe to advance from one
/// thread while tasks read it from others.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    pub const fn new(start_ms: u32) -> Self {
        Self {
            now: AtomicU32::new(start_ms),
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::Release);
    }

    /// Move forward by `ms`, wrapping at `u32::MAX`.
    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Acquire)
    }
}
