//! Phase table: duration, actuator pattern and label for every phase.
//!
//! ```text
//!   ┌──────────────┐ duration ┌───────────────┐ duration ┌────────────┐
//!   │ GreenPrimary │─────────▶│ YellowPrimary │─────────▶│ SafetyGapA │
//!   └──────────────┘          └───────────────┘          └─────┬──────┘
//!          ▲                                                   │
//!          │ duration   ┌────────────┐ duration ┌──────────────┐ │
//!          └────────────│ SafetyGapB │◀─────────│GreenSecondary│◀┘
//!                       └────────────┘          └──────────────┘
//! ```
//!
//! Durations come from [`PhaseTimings`]; patterns and labels are fixed
//! here and nowhere else.

use super::Phase;
use super::pattern::ActuatorPattern;
use crate::config::PhaseTimings;
use crate::error::TableError;

/// One immutable row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDescriptor {
    pub phase: Phase,
    pub duration_ms: u32,
    pub pattern: ActuatorPattern,
    pub label: &'static str,
}

impl PhaseDescriptor {
    /// Filler for array construction; always overwritten.
    const fn placeholder() -> Self {
        Self {
            phase: Phase::FIRST,
            duration_ms: 0,
            pattern: ActuatorPattern::ALL_OFF,
            label: "",
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed per-phase patterns
// ---------------------------------------------------------------------------

// Index 0: vehicles go, pedestrians wait.
const GREEN_PRIMARY_PATTERN: ActuatorPattern = ActuatorPattern {
    primary_red: false,
    primary_yellow: false,
    primary_green: true,
    secondary_red: true,
    secondary_green: false,
};

// Index 1: vehicles clear the junction.
const YELLOW_PRIMARY_PATTERN: ActuatorPattern = ActuatorPattern {
    primary_red: false,
    primary_yellow: true,
    primary_green: false,
    secondary_red: true,
    secondary_green: false,
};

// Index 2 and 4: all-red clearance.
const SAFETY_GAP_PATTERN: ActuatorPattern = ActuatorPattern {
    primary_red: true,
    primary_yellow: false,
    primary_green: false,
    secondary_red: true,
    secondary_green: false,
};

// Index 3: pedestrians cross.
const GREEN_SECONDARY_PATTERN: ActuatorPattern = ActuatorPattern {
    primary_red: true,
    primary_yellow: false,
    primary_green: false,
    secondary_red: false,
    secondary_green: true,
};

/// Pattern shown during `phase`.
pub const fn pattern_for(phase: Phase) -> ActuatorPattern {
    match phase {
        Phase::GreenPrimary => GREEN_PRIMARY_PATTERN,
        Phase::YellowPrimary => YELLOW_PRIMARY_PATTERN,
        Phase::SafetyGapA | Phase::SafetyGapB => SAFETY_GAP_PATTERN,
        Phase::GreenSecondary => GREEN_SECONDARY_PATTERN,
    }
}

/// Operator-facing description of `phase`.
pub const fn label_for(phase: Phase) -> &'static str {
    match phase {
        Phase::GreenPrimary => "GREEN_PRIMARY: vehicles go, pedestrians wait",
        Phase::YellowPrimary => "YELLOW_PRIMARY: vehicles prepare to stop",
        Phase::SafetyGapA => "SAFETY_GAP_A: all red before crossing",
        Phase::GreenSecondary => "GREEN_SECONDARY: pedestrians cross, vehicles wait",
        Phase::SafetyGapB => "SAFETY_GAP_B: all red after crossing",
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Validated lookup of one [`PhaseDescriptor`] per phase, indexed by
/// [`Phase::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTable {
    descriptors: [PhaseDescriptor; Phase::COUNT],
}

impl StateTable {
    /// Build the production table from configured durations.
    pub fn from_timings(timings: &PhaseTimings) -> Result<Self, TableError> {
        let rows = Phase::ALL.map(|phase| PhaseDescriptor {
            phase,
            duration_ms: timings.duration_of(phase),
            pattern: pattern_for(phase),
            label: label_for(phase),
        });
        Self::from_descriptors(&rows)
    }

    /// Build a table from an explicit list of rows, in any order.
    ///
    /// Fails unless every phase appears exactly once with a positive
    /// duration and a pattern that never shows both greens.
    pub fn from_descriptors(rows: &[PhaseDescriptor]) -> Result<Self, TableError> {
        let mut slots: [Option<PhaseDescriptor>; Phase::COUNT] = [None; Phase::COUNT];

        for row in rows {
            let slot = &mut slots[row.phase.index()];
            if slot.is_some() {
                return Err(TableError::DuplicatePhase(row.phase));
            }
            if row.duration_ms == 0 {
                return Err(TableError::ZeroDuration(row.phase));
            }
            if row.pattern.has_conflicting_go() {
                return Err(TableError::ConflictingGo(row.phase));
            }
            *slot = Some(*row);
        }

        let mut descriptors = [PhaseDescriptor::placeholder(); Phase::COUNT];
        for phase in Phase::ALL {
            descriptors[phase.index()] =
                slots[phase.index()].ok_or(TableError::MissingPhase(phase))?;
        }

        Ok(Self { descriptors })
    }

    /// O(1) lookup; total because `Phase` is closed.
    pub fn describe(&self, phase: Phase) -> &PhaseDescriptor {
        &self.descriptors[phase.index()]
    }

    pub fn duration_of(&self, phase: Phase) -> u32 {
        self.describe(phase).duration_ms
    }

    pub fn pattern_of(&self, phase: Phase) -> ActuatorPattern {
        self.describe(phase).pattern
    }

    pub fn label_of(&self, phase: Phase) -> &'static str {
        self.describe(phase).label
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhaseDescriptor> {
        self.descriptors.iter()
    }

    /// Shortest phase; bounds the acceptable polling interval.
    pub fn min_duration_ms(&self) -> u32 {
        self.iter().map(|d| d.duration_ms).min().unwrap_or(0)
    }

    /// Length of one full cycle through all five phases.
    pub fn total_cycle_ms(&self) -> u64 {
        self.iter().map(|d| u64::from(d.duration_ms)).sum()
    }
}
