//! Core-pinned scoped thread spawning.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::Builder::spawn_scoped`
//! creates a FreeRTOS task pinned to a specific CPU core with explicit
//! priority and stack size. On non-ESP targets, falls back to a plain
//! scoped thread.
//!
//! Scoped threads let the tasks borrow the shared context from the
//! composition root instead of requiring `'static` globals.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread. This means the config→spawn pair must not be
//! interleaved with other thread creation on the same thread.

use std::io;
use std::thread::{Builder, Scope, ScopedJoinHandle};

/// CPU core identifiers for the ESP32 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): protocol stacks.
    Pro = 0,
    /// Core 1 (APP_CPU): signal control tasks.
    App = 1,
}

/// Host threads get at least this much stack regardless of the FreeRTOS
/// sizing, which is tuned for the target.
#[cfg(not(target_os = "espidf"))]
const SIM_MIN_STACK_BYTES: usize = 64 * 1024;

/// Spawn a scoped thread pinned to `core` with explicit priority and stack.
///
/// The `name` parameter must be a null-terminated string (e.g. `"control\0"`).
#[cfg(target_os = "espidf")]
pub fn spawn_scoped_on_core<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> io::Result<ScopedJoinHandle<'scope, T>>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as _;
        cfg.thread_name = name.as_ptr() as *const _;
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other("esp_pthread_set_cfg failed"));
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "[TASK] spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );

    Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn_scoped(scope, f)
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_scoped_on_core<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> io::Result<ScopedJoinHandle<'scope, T>>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    let display_name = name.trim_end_matches('\0');
    log::info!(
        "[TASK] spawning '{}' (sim, no core pinning, stack={}KB)",
        display_name,
        stack_kb
    );

    Builder::new()
        .name(display_name.into())
        .stack_size((stack_kb * 1024).max(SIM_MIN_STACK_BYTES))
        .spawn_scoped(scope, f)
}
