//! GPIO hardware controller.
//!
//! Drives the five signal lines through any `embedded_hal::digital::OutputPin`
//! implementation (`esp_idf_hal::gpio::PinDriver` in production). The pins
//! sit behind a critical-section mutex so the locked update path and the
//! lock-free emergency path never interleave their writes.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::{Error as _, OutputPin, PinState};
use log::{info, warn};

use crate::app::ports::HardwareController;
use crate::fsm::pattern::{ActuatorLine, ActuatorPattern};

/// Production [`HardwareController`] over five output pins, indexed by
/// [`ActuatorLine::index`].
pub struct GpioHardwareController<P> {
    lines: Mutex<CriticalSectionRawMutex, RefCell<[P; ActuatorLine::COUNT]>>,
    initialized: AtomicBool,
}

impl<P: OutputPin + Send> GpioHardwareController<P> {
    /// Take ownership of the pins. Nothing is written until `initialize`.
    pub fn new(lines: [P; ActuatorLine::COUNT]) -> Self {
        Self {
            lines: Mutex::new(RefCell::new(lines)),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn require_initialized(&self, op: &str) {
        assert!(
            self.is_initialized(),
            "{op}() called before initialize()"
        );
    }

    fn with_lines(&self, f: impl FnOnce(&mut [P; ActuatorLine::COUNT])) {
        self.lines.lock(|cell| f(&mut cell.borrow_mut()));
    }

    fn drive(pins: &mut [P; ActuatorLine::COUNT], line: ActuatorLine, on: bool) {
        if let Err(e) = pins[line.index()].set_state(PinState::from(on)) {
            warn!("GPIO write failed on {}: {:?}", line.name(), e.kind());
        }
    }

    fn drive_all_off(pins: &mut [P; ActuatorLine::COUNT]) {
        for line in ActuatorLine::ALL {
            Self::drive(pins, line, false);
        }
    }
}

impl<P: OutputPin + Send> HardwareController for GpioHardwareController<P> {
    fn initialize(&self) {
        if self.is_initialized() {
            return;
        }
        self.with_lines(Self::drive_all_off);
        self.initialized.store(true, Ordering::Release);
        info!("Signal outputs configured, all lines OFF");
    }

    fn apply(&self, pattern: ActuatorPattern) {
        self.require_initialized("apply");
        self.with_lines(|pins| {
            Self::drive_all_off(pins);
            for line in ActuatorLine::ALL {
                if pattern.level(line) {
                    Self::drive(pins, line, true);
                }
            }
        });
    }

    fn all_off(&self) {
        self.require_initialized("all_off");
        self.with_lines(Self::drive_all_off);
    }
}
