//! Fail-safe response to unrecoverable errors.
//!
//! Once the controller cannot run correctly (task creation failed, a task
//! panicked, configuration rejected at boot) the only permitted response
//! is to drive every signal line OFF and stop. The system never keeps
//! operating half-initialised.

use core::time::Duration;

use log::error;

use crate::app::ports::HardwareController;
use crate::error::Error;

const PARK_INTERVAL: Duration = Duration::from_secs(60);

/// Turn every line OFF whether or not the controller was brought up.
///
/// `initialize` is idempotent, so this never trips the initialize-first
/// precondition. Every lock-free safe-state path goes through here.
pub fn force_outputs_off(hw: &impl HardwareController) {
    hw.initialize();
    hw.all_off();
}

/// Drive all outputs to the known-safe state after `reason`.
pub fn enter_safe_state(hw: &impl HardwareController, reason: &Error) {
    error!("SAFETY: {reason}, forcing all outputs off");
    force_outputs_off(hw);
}

/// [`enter_safe_state`], then park the calling thread forever. On target
/// the task watchdog eventually resets the chip.
pub fn halt(hw: &impl HardwareController, reason: &Error) -> ! {
    enter_safe_state(hw, reason);
    error!("SAFETY: controller halted");
    park()
}

/// Sleep the calling thread forever without spinning the core.
pub fn park() -> ! {
    loop {
        std::thread::sleep(PARK_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockHardwareController;
    use crate::fsm::pattern::{ActuatorLine, ActuatorPattern};

    #[test]
    fn safe_state_from_uninitialised_controller() {
        let hw = MockHardwareController::new();
        enter_safe_state(&hw, &Error::TaskSpawn("monitor"));
        assert!(hw.is_initialized());
        assert!(hw.outputs().is_all_off());
        assert_eq!(hw.all_off_count(), 1);
    }

    #[test]
    fn force_outputs_off_before_initialize() {
        let hw = MockHardwareController::new();
        force_outputs_off(&hw);
        assert!(hw.is_initialized());
        assert!(hw.outputs().is_all_off());
        force_outputs_off(&hw);
        assert_eq!(hw.all_off_count(), 2);
    }

    #[test]
    fn park_never_returns() {
        let parked = std::thread::spawn(|| {
            park();
        });
        std::thread::sleep(Duration::from_millis(20));
        assert!(!parked.is_finished());
    }

    #[test]
    fn safe_state_clears_running_pattern() {
        let hw = MockHardwareController::new();
        hw.initialize();
        hw.apply(ActuatorPattern::ALL_OFF.with(ActuatorLine::PrimaryGreen, true));
        enter_safe_state(&hw, &Error::TaskPanicked("control"));
        assert!(hw.outputs().is_all_off());
    }
}
