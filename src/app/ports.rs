//! Port traits: the boundary between the phase engine and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ StateMachine / tasks (domain)
//! ```
//!
//! The hardware controller drives the signal heads, the clock supplies
//! elapsed time, and the diagnostic sink receives periodic status
//! reports. The domain consumes all three via generics, so mock
//! implementations substitute without touching the engine.
//!
//! All methods take `&self`: one controller instance is shared by the
//! locked update path and the lock-free emergency-stop path, so
//! implementations carry their own interior synchronisation.

use super::events::StatusSnapshot;
use crate::fsm::pattern::ActuatorPattern;

// ───────────────────────────────────────────────────────────────
// Hardware controller (driven adapter: domain → signal heads)
// ───────────────────────────────────────────────────────────────

/// Applies actuator patterns to the five physical output lines.
///
/// # Contract
///
/// - `initialize` drives every line OFF and must complete before the
///   first `apply` or `all_off`. Calling either earlier is a programmer
///   error and panics.
/// - `apply` turns every line OFF, then sets the new pattern. The all-off
///   frame is the only intermediate state an observer may see.
/// - `all_off` is safe to call concurrently with `apply`; the last write
///   wins.
pub trait HardwareController: Sync {
    /// Configure every line as an output in the OFF state. Idempotent.
    fn initialize(&self);

    /// Show `pattern` on the five lines.
    fn apply(&self, pattern: ActuatorPattern);

    /// Force the known-safe state.
    fn all_off(&self);
}

impl<T: HardwareController + ?Sized> HardwareController for &T {
    fn initialize(&self) {
        (**self).initialize();
    }

    fn apply(&self, pattern: ActuatorPattern) {
        (**self).apply(pattern);
    }

    fn all_off(&self) {
        (**self).all_off();
    }
}

// ───────────────────────────────────────────────────────────────
// Clock (driven adapter: system timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond counter. Readings wrap at `u32::MAX`; consumers
/// must compute differences with `wrapping_sub`.
pub trait Clock: Sync {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Diagnostic sink (driven adapter: domain → serial / telemetry)
// ───────────────────────────────────────────────────────────────

/// Receives the monitor task's periodic [`StatusSnapshot`]s.
///
/// Purely observational: a sink that drops everything must not change
/// controller behaviour.
pub trait DiagnosticSink {
    fn emit(&mut self, snapshot: &StatusSnapshot);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, snapshot: &StatusSnapshot) {
        (**self).emit(snapshot);
    }
}
