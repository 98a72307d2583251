//! Task layer: the control and monitor tasks and their lifecycle.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  TaskManager                                                 │
//! │                                                              │
//! │  control (high prio)               monitor (low prio)        │
//! │  ┌─────────────────────┐           ┌──────────────────────┐  │
//! │  │ lock(timeout)       │           │ sleep until deadline │  │
//! │  │  active? update()   │           │ lock(timeout)        │  │
//! │  │  changed? record()  │           │  active? snapshot    │  │
//! │  │ unlock              │           │ unlock               │  │
//! │  │ sleep(poll)         │           │ sink.emit(snapshot)  │  │
//! │  └──────────┬──────────┘           └──────────┬───────────┘  │
//! │             └──────── SharedContext ──────────┘              │
//! │                                                              │
//! │  ShutdownSignal ── checked by both loops between iterations  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each task is an async loop driven by `futures_lite::future::block_on`
//! on its own core-pinned thread, sleeping on `async_io_mini` timers.
//! Lock contention is never fatal: a task that times out skips that
//! iteration and tries again on the next one.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::thread::{Scope, ScopedJoinHandle};
use std::time::Instant;

use async_io_mini::Timer;
use futures_lite::future;
use log::{debug, error, info, warn};

use crate::app::ports::{Clock, DiagnosticSink, HardwareController};
use crate::app::shared::{LockTimeout, SharedContext};
use crate::config::{SystemConfig, TaskParams};
use crate::drivers::task_pin::{self, Core};
use crate::error::{Error, Result};

const CONTROL_TASK: &str = "control\0";
const MONITOR_TASK: &str = "monitor\0";

fn display_name(name: &'static str) -> &'static str {
    name.trim_end_matches('\0')
}

// ═══════════════════════════════════════════════════════════════
//  Configuration and signals
// ═══════════════════════════════════════════════════════════════

/// Cadence and thread parameters for both tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    pub poll_interval: Duration,
    pub monitor_period: Duration,
    pub lock_timeout: Duration,
    pub control: TaskParams,
    pub monitor: TaskParams,
}

impl From<&SystemConfig> for TaskConfig {
    fn from(c: &SystemConfig) -> Self {
        Self {
            poll_interval: c.control_poll_interval(),
            monitor_period: c.monitor_period(),
            lock_timeout: c.lock_timeout(),
            control: c.control_task,
            monitor: c.monitor_task,
        }
    }
}

/// Stop request observed by both task loops between iterations.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    requested: AtomicBool,
}

impl ShutdownSignal {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Task bodies
// ═══════════════════════════════════════════════════════════════

/// Counters returned by [`control_task`] when it exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlStats {
    pub polls: u64,
    pub transitions: u64,
    /// Iterations whose critical section was skipped on lock timeout.
    pub skipped: u64,
}

/// Counters returned by [`monitor_task`] together with its sink.
#[derive(Debug)]
pub struct MonitorStats<S> {
    pub sink: S,
    pub reports: u64,
    /// Wakes that found the context paused.
    pub paused: u64,
    pub skipped: u64,
}

/// Poll the state machine until shutdown, then force the outputs safe.
pub async fn control_task<H: HardwareController, C: Clock>(
    ctx: &SharedContext<'_, H, C>,
    config: &TaskConfig,
    shutdown: &ShutdownSignal,
) -> ControlStats {
    info!(
        "[TASK] control started (poll={}ms, lock timeout={}ms)",
        config.poll_interval.as_millis(),
        config.lock_timeout.as_millis()
    );
    let mut stats = ControlStats::default();

    while !shutdown.is_requested() {
        stats.polls += 1;
        let outcome = ctx
            .with_lock(config.lock_timeout, |shared| {
                if !shared.is_active() {
                    return false;
                }
                let changed = shared.machine_mut().update();
                if changed {
                    shared.record_transition();
                }
                changed
            })
            .await;

        match outcome {
            Ok(true) => stats.transitions += 1,
            Ok(false) => {}
            Err(LockTimeout) => {
                stats.skipped += 1;
                debug!("[TASK] control: lock contended, skipping poll");
            }
        }

        Timer::after(config.poll_interval).await;
    }

    // This task is the only caller of `update`, so no `apply` can follow.
    ctx.release_outputs();
    info!(
        "[TASK] control stopped ({} polls, {} transitions, {} skipped)",
        stats.polls, stats.transitions, stats.skipped
    );
    stats
}

/// Report a status snapshot every `monitor_period` until shutdown.
///
/// Wake-ups follow absolute deadlines so time spent waiting for the lock
/// or emitting does not accumulate as drift.
pub async fn monitor_task<H: HardwareController, C: Clock, S: DiagnosticSink>(
    ctx: &SharedContext<'_, H, C>,
    config: &TaskConfig,
    shutdown: &ShutdownSignal,
    sink: S,
) -> MonitorStats<S> {
    info!(
        "[TASK] monitor started (period={}ms)",
        config.monitor_period.as_millis()
    );
    let mut stats = MonitorStats {
        sink,
        reports: 0,
        paused: 0,
        skipped: 0,
    };
    let mut deadline = Instant::now();

    while !shutdown.is_requested() {
        deadline += config.monitor_period;
        Timer::after(deadline.saturating_duration_since(Instant::now())).await;
        if shutdown.is_requested() {
            break;
        }

        let read = ctx
            .with_lock(config.lock_timeout, |shared| {
                shared.is_active().then(|| shared.status())
            })
            .await;

        // Emit outside the lock.
        match read {
            Ok(Some(status)) => {
                stats.sink.emit(&status);
                stats.reports += 1;
            }
            Ok(None) => stats.paused += 1,
            Err(LockTimeout) => {
                stats.skipped += 1;
                debug!("[TASK] monitor: lock contended, skipping report");
            }
        }
    }

    info!(
        "[TASK] monitor stopped ({} reports, {} skipped)",
        stats.reports, stats.skipped
    );
    stats
}

// ═══════════════════════════════════════════════════════════════
//  Task manager
// ═══════════════════════════════════════════════════════════════

/// Final counters of both tasks.
#[derive(Debug)]
pub struct TaskReport<S> {
    pub control: ControlStats,
    pub monitor: MonitorStats<S>,
}

/// Join handles of a spawned task pair.
pub struct TaskHandles<'scope, S> {
    control: ScopedJoinHandle<'scope, ControlStats>,
    monitor: ScopedJoinHandle<'scope, MonitorStats<S>>,
}

impl<S> TaskHandles<'_, S> {
    /// Block until both tasks have exited.
    pub fn join(self) -> Result<TaskReport<S>> {
        let control = self
            .control
            .join()
            .map_err(|_| Error::TaskPanicked(display_name(CONTROL_TASK)));
        let monitor = self
            .monitor
            .join()
            .map_err(|_| Error::TaskPanicked(display_name(MONITOR_TASK)));
        Ok(TaskReport {
            control: control?,
            monitor: monitor?,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.control.is_finished() && self.monitor.is_finished()
    }
}

/// Ends the task pair if the control thread exits for any reason; a
/// panicking control task also forces the outputs off.
struct ControlExitGuard<'g, 'a, H: HardwareController, C: Clock> {
    ctx: &'g SharedContext<'a, H, C>,
    shutdown: &'g ShutdownSignal,
}

impl<H: HardwareController, C: Clock> Drop for ControlExitGuard<'_, '_, H, C> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!("[TASK] control task panicked");
            self.ctx.emergency_stop();
        }
        self.shutdown.request();
    }
}

/// Creates and controls the two tasks over one shared context.
pub struct TaskManager<'c, 'a, H, C> {
    ctx: &'c SharedContext<'a, H, C>,
    config: TaskConfig,
    shutdown: ShutdownSignal,
    started: AtomicBool,
}

impl<'c, 'a, H: HardwareController, C: Clock> TaskManager<'c, 'a, H, C> {
    pub fn new(ctx: &'c SharedContext<'a, H, C>, config: TaskConfig) -> Self {
        Self {
            ctx,
            config,
            shutdown: ShutdownSignal::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the control task, then the monitor task, inside `scope`.
    ///
    /// Tasks are created once per manager. If the monitor cannot be
    /// created, the control task is stopped and joined before returning.
    pub fn spawn<'scope, S>(
        &'scope self,
        scope: &'scope Scope<'scope, '_>,
        sink: S,
    ) -> Result<TaskHandles<'scope, S>>
    where
        S: DiagnosticSink + Send + 'scope,
    {
        if self.started.swap(true, Ordering::AcqRel) {
            warn!("[TASK] tasks already started");
            return Err(Error::TasksAlreadyStarted);
        }

        let control = task_pin::spawn_scoped_on_core(
            scope,
            Core::App,
            self.config.control.priority,
            self.config.control.stack_kb,
            CONTROL_TASK,
            move || {
                let _exit = ControlExitGuard {
                    ctx: self.ctx,
                    shutdown: &self.shutdown,
                };
                future::block_on(control_task(self.ctx, &self.config, &self.shutdown))
            },
        )
        .map_err(|e| {
            error!("[TASK] failed to create control task: {e}");
            Error::TaskSpawn(display_name(CONTROL_TASK))
        })?;

        let monitor = match task_pin::spawn_scoped_on_core(
            scope,
            Core::App,
            self.config.monitor.priority,
            self.config.monitor.stack_kb,
            MONITOR_TASK,
            move || future::block_on(monitor_task(self.ctx, &self.config, &self.shutdown, sink)),
        ) {
            Ok(handle) => handle,
            Err(e) => {
                error!("[TASK] failed to create monitor task: {e}");
                self.shutdown.request();
                let _ = control.join();
                return Err(Error::TaskSpawn(display_name(MONITOR_TASK)));
            }
        };

        info!("[TASK] control and monitor tasks running");
        Ok(TaskHandles { control, monitor })
    }

    /// Spawn both tasks and block until they exit.
    pub fn run<S>(&self, sink: S) -> Result<TaskReport<S>>
    where
        S: DiagnosticSink + Send,
    {
        std::thread::scope(|scope| self.spawn(scope, sink)?.join())
    }

    /// Pause phase advancement; tasks keep running.
    pub fn suspend(&self) -> core::result::Result<(), LockTimeout> {
        self.set_active(false)
    }

    /// Resume phase advancement after [`suspend`](Self::suspend).
    pub fn resume(&self) -> core::result::Result<(), LockTimeout> {
        self.set_active(true)
    }

    fn set_active(&self, active: bool) -> core::result::Result<(), LockTimeout> {
        self.ctx
            .with_lock_blocking(self.config.lock_timeout, |shared| shared.set_active(active))?;
        info!("[TASK] {}", if active { "resumed" } else { "suspended" });
        Ok(())
    }

    /// Ask both tasks to exit after their current iteration.
    pub fn shutdown(&self) {
        info!("[TASK] shutdown requested");
        self.shutdown.request();
    }

    /// Force outputs off immediately, without the lock, then shut down.
    pub fn emergency_stop(&self) {
        self.ctx.emergency_stop();
        self.shutdown.request();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_requested()
    }

    pub fn context(&self) -> &'c SharedContext<'a, H, C> {
        self.ctx
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }
}
