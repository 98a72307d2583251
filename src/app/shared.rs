//! Lock-protected state shared by the control and monitor tasks.
//!
//! ```text
//!   control task ──┐                        ┌── monitor task
//!                  ▼                        ▼
//!          with_lock(timeout) ══ Mutex ══ with_lock(timeout)
//!                  │   SharedState {        │
//!                  │     machine,           │
//!                  │     active,            │
//!                  │     transitions }      │
//!                  ▼                        ▼
//!            update + record           read snapshot
//!
//!   emergency_stop() ──▶ hardware.all_off()   (no lock)
//! ```
//!
//! [`SharedState`] is only reachable through [`SharedContext::with_lock`],
//! so every read and write of the machine and counters happens under the
//! lock and the monitor can never observe a half-applied transition.

use core::fmt;
use core::time::Duration;

use async_io_mini::Timer;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use futures_lite::future;
use log::{info, warn};

use super::events::StatusSnapshot;
use super::ports::{Clock, HardwareController};
use crate::fsm::StateMachine;
use crate::safety;

/// The lock could not be acquired before the timeout elapsed; the
/// critical section was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTimeout;

impl fmt::Display for LockTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shared context lock timed out")
    }
}

// ---------------------------------------------------------------------------
// Lock-held view
// ---------------------------------------------------------------------------

/// Everything guarded by the shared-context lock.
pub struct SharedState<'a, H, C> {
    machine: StateMachine<'a, H, C>,
    active: bool,
    transitions: u64,
}

impl<'a, H: HardwareController, C: Clock> SharedState<'a, H, C> {
    pub fn machine(&self) -> &StateMachine<'a, H, C> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut StateMachine<'a, H, C> {
        &mut self.machine
    }

    /// Run/pause flag polled by the control task before every `update`.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn record_transition(&mut self) {
        self.transitions = self.transitions.wrapping_add(1);
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Machine snapshot plus transition counter, read atomically.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot::new(self.machine.snapshot(), self.transitions)
    }
}

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

/// Single point of concurrent access to the state machine.
pub struct SharedContext<'a, H, C> {
    state: Mutex<CriticalSectionRawMutex, SharedState<'a, H, C>>,
    /// Lock-free path to the outputs for the emergency stop.
    hw: &'a H,
}

impl<'a, H: HardwareController, C: Clock> SharedContext<'a, H, C> {
    /// Wrap `machine`. The context starts active with zero transitions.
    pub fn new(machine: StateMachine<'a, H, C>) -> Self {
        let hw = machine.hardware();
        Self {
            state: Mutex::new(SharedState {
                machine,
                active: true,
                transitions: 0,
            }),
            hw,
        }
    }

    /// Run `f` with exclusive access, or give up after `timeout`.
    ///
    /// The guard is released on every exit from `f`, unwinding included.
    pub async fn with_lock<R>(
        &self,
        timeout: Duration,
        f: impl FnOnce(&mut SharedState<'a, H, C>) -> R,
    ) -> Result<R, LockTimeout> {
        let acquire = async { Some(self.state.lock().await) };
        let expire = async {
            Timer::after(timeout).await;
            None
        };

        match future::or(acquire, expire).await {
            Some(mut guard) => Ok(f(&mut guard)),
            None => Err(LockTimeout),
        }
    }

    /// Blocking form of [`with_lock`](Self::with_lock) for callers outside
    /// the task loops.
    pub fn with_lock_blocking<R>(
        &self,
        timeout: Duration,
        f: impl FnOnce(&mut SharedState<'a, H, C>) -> R,
    ) -> Result<R, LockTimeout> {
        future::block_on(self.with_lock(timeout, f))
    }

    /// Force all outputs off from any thread without taking the lock.
    /// Machine state is left untouched.
    pub fn emergency_stop(&self) {
        warn!("[CTX] EMERGENCY STOP requested, forcing outputs off");
        safety::force_outputs_off(self.hw);
    }

    /// Drive the outputs to the safe state on orderly shutdown.
    pub(crate) fn release_outputs(&self) {
        info!("[CTX] outputs released to safe state");
        safety::force_outputs_off(self.hw);
    }

    /// Tear down and hand back the machine.
    pub fn into_machine(self) -> StateMachine<'a, H, C> {
        self.state.into_inner().machine
    }
}
