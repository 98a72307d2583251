//! Runtime symbol providers the async timing and locking stack links
//! against.
//!
//! - **Time driver.** `async_io_mini::Timer` reads the clock and
//!   schedules wake-ups through the `embassy-time` driver symbols. Every
//!   timed wait here goes through it: the control poll, the monitor
//!   deadline and the shared-context lock timeout. On ESP-IDF the driver
//!   is backed by `esp_timer`; host builds use `embassy-time`'s `std`
//!   driver.
//! - **Critical section.** `embassy-sync` guards its mutexes with
//!   `critical-section`. The control and monitor tasks are separate
//!   FreeRTOS threads, so the section must exclude other threads, and
//!   sections may nest on one thread. The target implementation is one
//!   process-wide std mutex plus a per-thread depth count. Host builds
//!   get `critical-section`'s `std` impl.

// Pulls the driver crate into the link even though no item is used.
use embassy_time as _;

#[cfg(target_os = "espidf")]
use core::cell::{Cell, RefCell};
#[cfg(target_os = "espidf")]
use core::time::Duration;
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, MutexGuard, PoisonError};

// ---------------------------------------------------------------------------
// Time driver (ESP-IDF)
// ---------------------------------------------------------------------------

/// Microseconds since boot; matches `embassy-time`'s default 1 MHz tick.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_now() -> u64 {
    unsafe { esp_idf_svc::sys::esp_timer_get_time() as u64 }
}

/// Wake `waker` once the clock reaches `at`.
///
/// Each registration parks a short-lived helper thread. Only the two task
/// loops register timers, at most one pending each.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_schedule_wake(at: u64, waker: *mut core::ffi::c_void) {
    if waker.is_null() {
        return;
    }

    // SAFETY: the pointer refers to a live `Waker` for the duration of
    // this call; it is cloned before returning.
    let waker = unsafe { (&*(waker as *const core::task::Waker)).clone() };
    let fallback = waker.clone();
    let spawned = std::thread::Builder::new()
        .name("timer-wake".into())
        .stack_size(4 * 1024)
        .spawn(move || {
            let now = _embassy_time_now();
            if at > now {
                std::thread::sleep(Duration::from_micros(at - now));
            }
            waker.wake();
        });
    if let Err(e) = spawned {
        // Wake now: the timer re-polls and re-registers instead of hanging.
        log::warn!("[TIME] wake thread spawn failed: {e}");
        fallback.wake();
    }
}

// ---------------------------------------------------------------------------
// Critical section (ESP-IDF)
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
static SECTION_LOCK: Mutex<()> = Mutex::new(());

#[cfg(target_os = "espidf")]
thread_local! {
    static SECTION_DEPTH: Cell<u8> = const { Cell::new(0) };
    static SECTION_GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

/// Enter the section; only the outermost entry on a thread takes the lock.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    SECTION_DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            // A panic inside a section must not wedge the other task.
            let lock = SECTION_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            SECTION_GUARD.with(|guard| *guard.borrow_mut() = Some(lock));
        }
        let entered = d.saturating_add(1);
        depth.set(entered);
        entered
    })
}

/// Leave the section; the lock drops with the outermost exit.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    SECTION_DEPTH.with(|depth| match depth.get() {
        0 => {}
        1 => {
            depth.set(0);
            SECTION_GUARD.with(|guard| *guard.borrow_mut() = None);
        }
        d => depth.set(d - 1),
    });
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use async_io_mini::Timer;
    use futures_lite::future;

    #[test]
    fn timer_sleeps_for_its_duration() {
        let started = Instant::now();
        future::block_on(Timer::after(Duration::from_millis(15)));
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(15), "{waited:?}");
        assert!(waited < Duration::from_secs(1), "{waited:?}");
    }

    #[test]
    fn shorter_timer_wins_a_race() {
        let short = async {
            Timer::after(Duration::from_millis(5)).await;
            "short"
        };
        let long = async {
            Timer::after(Duration::from_secs(5)).await;
            "long"
        };
        let started = Instant::now();
        assert_eq!(future::block_on(future::or(short, long)), "short");
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
