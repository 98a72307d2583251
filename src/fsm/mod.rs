//! Time-driven phase engine.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  StateMachine                                             │
//! │                                                           │
//! │   StateTable ──▶ duration / pattern / label per Phase     │
//! │   Clock      ──▶ now_ms() (u32, wraps)                    │
//! │   Hardware   ◀── apply(pattern) on every transition       │
//! │                                                           │
//! │   MachineState { phase, phase_start_ms, cycle_count }     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The machine is polled: every `update()` compares the elapsed time in
//! the current phase with its duration and advances at most one phase.
//! Elapsed time uses wrapping subtraction so a rolled-over clock counter
//! does not stall or skip a phase.

pub mod pattern;
pub mod states;

use log::{info, warn};

use crate::app::ports::{Clock, HardwareController};
use crate::safety;
use states::StateTable;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// The five phases of the fixed cycle, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    GreenPrimary = 0,
    YellowPrimary = 1,
    SafetyGapA = 2,
    GreenSecondary = 3,
    SafetyGapB = 4,
}

impl Phase {
    /// Total number of phases: used to size the table array.
    pub const COUNT: usize = 5;

    pub const FIRST: Self = Self::GreenPrimary;
    pub const LAST: Self = Self::SafetyGapB;

    /// Every phase, in cycle order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::GreenPrimary,
        Self::YellowPrimary,
        Self::SafetyGapA,
        Self::GreenSecondary,
        Self::SafetyGapB,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Self::GreenPrimary),
            1 => Some(Self::YellowPrimary),
            2 => Some(Self::SafetyGapA),
            3 => Some(Self::GreenSecondary),
            4 => Some(Self::SafetyGapB),
            _ => None,
        }
    }

    /// The only legal next phase. `LAST` wraps to `FIRST`.
    pub const fn successor(self) -> Self {
        match self {
            Self::GreenPrimary => Self::YellowPrimary,
            Self::YellowPrimary => Self::SafetyGapA,
            Self::SafetyGapA => Self::GreenSecondary,
            Self::GreenSecondary => Self::SafetyGapB,
            Self::SafetyGapB => Self::GreenPrimary,
        }
    }
}

// ---------------------------------------------------------------------------
// Machine state
// ---------------------------------------------------------------------------

/// Mutable part of the machine, created by [`StateMachine::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineState {
    pub phase: Phase,
    /// Clock reading at which `phase` was entered.
    pub phase_start_ms: u32,
    /// Starts at 1; incremented on every wrap back to [`Phase::FIRST`].
    pub cycle_count: u32,
}

/// Consistent read of the machine at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineSnapshot {
    pub phase: Phase,
    pub label: &'static str,
    pub time_remaining_ms: u32,
    pub cycle_count: u32,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Phase engine bound to one hardware controller and one clock for its
/// whole lifetime.
pub struct StateMachine<'a, H, C> {
    table: StateTable,
    hw: &'a H,
    clock: &'a C,
    /// `None` until `begin()`.
    state: Option<MachineState>,
    initialized: bool,
    log_transitions: bool,
}

impl<'a, H: HardwareController, C: Clock> StateMachine<'a, H, C> {
    pub fn new(table: StateTable, hw: &'a H, clock: &'a C) -> Self {
        Self {
            table,
            hw,
            clock,
            state: None,
            initialized: false,
            log_transitions: true,
        }
    }

    /// Enable or silence the per-transition info log.
    pub fn set_log_transitions(&mut self, enabled: bool) {
        self.log_transitions = enabled;
    }

    /// Bring the outputs into the known-safe state. Repeated calls are no-ops.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.hw.initialize();
        self.initialized = true;
        info!("[STATE] machine initialized");
    }

    /// Enter the running cycle at the first phase. Initialises on demand.
    ///
    /// Calling `begin()` again restarts the cycle; this is also the
    /// recovery path after [`emergency_stop`](Self::emergency_stop).
    pub fn begin(&mut self) {
        self.initialize();
        let now = self.clock.now_ms();
        self.state = Some(MachineState {
            phase: Phase::FIRST,
            phase_start_ms: now,
            cycle_count: 1,
        });
        self.hw.apply(self.table.pattern_of(Phase::FIRST));
        info!(
            "[STATE] cycle started | {} | {} ms",
            self.table.label_of(Phase::FIRST),
            self.table.duration_of(Phase::FIRST)
        );
    }

    /// Advance one phase if the current one has expired.
    ///
    /// Returns `false` without side effects when the machine has not been
    /// initialised and started.
    pub fn update(&mut self) -> bool {
        if !self.initialized {
            return false;
        }
        let Some(state) = self.state.as_mut() else {
            return false;
        };

        let now = self.clock.now_ms();
        let elapsed = now.wrapping_sub(state.phase_start_ms);
        if elapsed < self.table.duration_of(state.phase) {
            return false;
        }

        let from = state.phase;
        let next = from.successor();
        if next == Phase::FIRST {
            state.cycle_count = state.cycle_count.wrapping_add(1);
        }
        state.phase = next;
        state.phase_start_ms = now;
        let cycle = state.cycle_count;

        self.hw.apply(self.table.pattern_of(next));

        if self.log_transitions {
            info!(
                "[STATE] cycle {} | {:?} -> {:?} | {}",
                cycle,
                from,
                next,
                self.table.label_of(next)
            );
        }
        true
    }

    /// Time left in the current phase, clamped to zero once expired.
    /// Before `begin()` this is the full duration of the first phase.
    pub fn time_remaining(&self) -> u32 {
        match self.state {
            Some(state) => {
                let elapsed = self.clock.now_ms().wrapping_sub(state.phase_start_ms);
                self.table.duration_of(state.phase).saturating_sub(elapsed)
            }
            None => self.table.duration_of(Phase::FIRST),
        }
    }

    /// Force every output off without touching phase, timer or cycle count.
    pub fn emergency_stop(&self) {
        warn!("[STATE] EMERGENCY STOP: all outputs forced off");
        safety::force_outputs_off(self.hw);
    }

    pub fn current_phase(&self) -> Phase {
        self.state.map_or(Phase::FIRST, |s| s.phase)
    }

    /// Zero until the cycle has been started.
    pub fn cycle_count(&self) -> u32 {
        self.state.map_or(0, |s| s.cycle_count)
    }

    pub fn state(&self) -> Option<MachineState> {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// The controller this machine drives.
    pub fn hardware(&self) -> &'a H {
        self.hw
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        let phase = self.current_phase();
        MachineSnapshot {
            phase,
            label: self.table.label_of(phase),
            time_remaining_ms: self.time_remaining(),
            cycle_count: self.cycle_count(),
        }
    }
}
