//! In-memory hardware controller for host tests.
//!
//! Records every call and every output frame (including the all-off
//! frame `apply` passes through) so tests can assert on both the final
//! pattern and what an observer could have seen in between.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::app::ports::HardwareController;
use crate::fsm::pattern::ActuatorPattern;

#[derive(Debug, Default)]
struct Record {
    initialized: bool,
    initialize_calls: usize,
    apply_calls: usize,
    all_off_calls: usize,
    last_applied: Option<ActuatorPattern>,
    outputs: ActuatorPattern,
    frames: Vec<ActuatorPattern>,
}

impl Record {
    fn show(&mut self, frame: ActuatorPattern) {
        self.outputs = frame;
        self.frames.push(frame);
    }
}

/// Mock [`HardwareController`]. Enforces the same `initialize`-first
/// contract as the GPIO controller.
pub struct MockHardwareController {
    record: Mutex<CriticalSectionRawMutex, RefCell<Record>>,
}

impl Default for MockHardwareController {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHardwareController {
    pub fn new() -> Self {
        Self {
            record: Mutex::new(RefCell::new(Record::default())),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Record) -> R) -> R {
        self.record.lock(|r| f(&mut r.borrow_mut()))
    }

    pub fn is_initialized(&self) -> bool {
        self.with(|r| r.initialized)
    }

    pub fn initialize_count(&self) -> usize {
        self.with(|r| r.initialize_calls)
    }

    pub fn apply_count(&self) -> usize {
        self.with(|r| r.apply_calls)
    }

    pub fn all_off_count(&self) -> usize {
        self.with(|r| r.all_off_calls)
    }

    /// Pattern passed to the most recent `apply`.
    pub fn last_applied(&self) -> Option<ActuatorPattern> {
        self.with(|r| r.last_applied)
    }

    /// What the lines show right now.
    pub fn outputs(&self) -> ActuatorPattern {
        self.with(|r| r.outputs)
    }

    /// Every frame the lines have shown, oldest first.
    pub fn frames(&self) -> Vec<ActuatorPattern> {
        self.with(|r| r.frames.clone())
    }
}

impl HardwareController for MockHardwareController {
    fn initialize(&self) {
        self.with(|r| {
            r.initialize_calls += 1;
            if !r.initialized {
                r.initialized = true;
                r.show(ActuatorPattern::ALL_OFF);
            }
        });
    }

    fn apply(&self, pattern: ActuatorPattern) {
        // Checked outside the critical section so the panic never unwinds
        // through it.
        assert!(self.is_initialized(), "apply() called before initialize()");
        self.with(|r| {
            r.apply_calls += 1;
            r.last_applied = Some(pattern);
            r.show(ActuatorPattern::ALL_OFF);
            r.show(pattern);
        });
    }

    fn all_off(&self) {
        assert!(self.is_initialized(), "all_off() called before initialize()");
        self.with(|r| {
            r.all_off_calls += 1;
            r.show(ActuatorPattern::ALL_OFF);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::pattern::ActuatorLine;

    #[test]
    fn apply_passes_through_all_off() {
        let hw = MockHardwareController::new();
        hw.initialize();
        let p = ActuatorPattern::ALL_OFF.with(ActuatorLine::PrimaryGreen, true);
        hw.apply(p);
        assert_eq!(
            hw.frames(),
            vec![ActuatorPattern::ALL_OFF, ActuatorPattern::ALL_OFF, p]
        );
        assert_eq!(hw.last_applied(), Some(p));
        assert_eq!(hw.apply_count(), 1);
    }

    #[test]
    fn initialize_twice_counts_but_does_not_reset() {
        let hw = MockHardwareController::new();
        hw.initialize();
        let p = ActuatorPattern::ALL_OFF.with(ActuatorLine::SecondaryRed, true);
        hw.apply(p);
        hw.initialize();
        assert_eq!(hw.initialize_count(), 2);
        assert_eq!(hw.outputs(), p);
    }

    #[test]
    #[should_panic(expected = "before initialize")]
    fn apply_before_initialize_panics() {
        MockHardwareController::new().apply(ActuatorPattern::ALL_OFF);
    }

    #[test]
    #[should_panic(expected = "before initialize")]
    fn all_off_before_initialize_panics() {
        MockHardwareController::new().all_off();
    }
}
