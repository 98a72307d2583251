//! TrafficLight Firmware: Main Entry Point
//!
//! Composition root: owns the hardware controller, clock, state machine,
//! shared context and task manager for the lifetime of the process and
//! hands references down. Nothing is global.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioHardwareController   SystemClock     LogDiagnosticSink    │
//! │  (HardwareController)     (Clock)         (DiagnosticSink)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  SharedContext { StateMachine · active · transitions } │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TaskManager: control task (prio 5) · monitor task (prio 3)    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_svc::sys::EspError;
use log::info;

use trafficlight::adapters::hardware::GpioHardwareController;
use trafficlight::adapters::log_sink::LogDiagnosticSink;
use trafficlight::adapters::time::SystemClock;
use trafficlight::app::shared::SharedContext;
use trafficlight::config::SystemConfig;
use trafficlight::fsm::pattern::ActuatorLine;
use trafficlight::fsm::states::StateTable;
use trafficlight::fsm::{Phase, StateMachine};
use trafficlight::scheduler::{TaskConfig, TaskManager};
use trafficlight::{error, pins, safety};

type SignalPin = PinDriver<'static, AnyOutputPin, Output>;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TrafficLight v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    log_configuration(&config);

    // ── 2. Signal outputs ─────────────────────────────────────
    let lines = match output_pins() {
        Ok(lines) => lines,
        Err(e) => {
            // No controller exists yet, so there is nothing to drive safe.
            log::error!("GPIO init failed: {}, halting", e);
            safety::park()
        }
    };
    let hw = GpioHardwareController::new(lines);

    // ── 3. Run until the tasks exit ───────────────────────────
    if let Err(e) = run(&hw, &config) {
        safety::halt(&hw, &e);
    }
    Ok(())
}

/// Build the machine, wrap it and drive it with both tasks.
fn run(hw: &GpioHardwareController<SignalPin>, config: &SystemConfig) -> error::Result<()> {
    config.validate()?;
    let table = StateTable::from_timings(&config.phases)?;
    let clock = SystemClock::new();

    let mut machine = StateMachine::new(table, hw, &clock);
    machine.set_log_transitions(config.log_transitions);
    machine.begin();

    let ctx = SharedContext::new(machine);
    let manager = TaskManager::new(&ctx, TaskConfig::from(config));
    let report = manager.run(LogDiagnosticSink::new())?;

    info!(
        "Tasks exited: {} transitions, {} status reports",
        report.control.transitions, report.monitor.reports
    );
    Ok(())
}

fn output_pins() -> core::result::Result<[SignalPin; ActuatorLine::COUNT], EspError> {
    // SAFETY: every number comes from `pins` and each is claimed once here.
    let [a, b, c, d, e] = ActuatorLine::ALL
        .map(|line| PinDriver::output(unsafe { AnyOutputPin::new(pins::gpio_for(line)) }));
    Ok([a?, b?, c?, d?, e?])
}

fn log_configuration(config: &SystemConfig) {
    info!("Phase durations:");
    for phase in Phase::ALL {
        info!("  {:?}: {} ms", phase, config.phases.duration_of(phase));
    }
    info!("  total cycle: {} ms", config.phases.total_cycle_ms());
    info!(
        "Tasks: control poll {} ms (pri {}), monitor period {} ms (pri {}), lock timeout {} ms",
        config.control_poll_interval_ms,
        config.control_task.priority,
        config.monitor_period_ms,
        config.monitor_task.priority,
        config.lock_timeout_ms
    );
    info!("Pin configuration:");
    for line in ActuatorLine::ALL {
        info!("  {:<16} GPIO{}", line.name(), pins::gpio_for(line));
    }
}
