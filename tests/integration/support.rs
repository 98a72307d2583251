//! Shared fixtures: default table, started machines, fast task timing and
//! a sink that keeps every report.

use std::time::Duration;

use trafficlight::adapters::mock::MockHardwareController;
use trafficlight::adapters::time::ManualClock;
use trafficlight::app::events::StatusSnapshot;
use trafficlight::app::ports::DiagnosticSink;
use trafficlight::config::{PhaseTimings, TaskParams};
use trafficlight::fsm::StateMachine;
use trafficlight::fsm::states::StateTable;
use trafficlight::scheduler::TaskConfig;

pub type MockMachine<'a> = StateMachine<'a, MockHardwareController, ManualClock>;

pub fn default_table() -> StateTable {
    StateTable::from_timings(&PhaseTimings::default()).expect("default timings are valid")
}

/// Machine over `hw`/`clock`, already `begin()`-ed.
pub fn started_machine<'a>(hw: &'a MockHardwareController, clock: &'a ManualClock) -> MockMachine<'a> {
    let mut sm = StateMachine::new(default_table(), hw, clock);
    sm.set_log_transitions(false);
    sm.begin();
    sm
}

/// Millisecond-scale cadence so threaded tests finish quickly.
pub fn fast_config() -> TaskConfig {
    TaskConfig {
        poll_interval: Duration::from_millis(1),
        monitor_period: Duration::from_millis(5),
        lock_timeout: Duration::from_millis(50),
        control: TaskParams {
            priority: 5,
            stack_kb: 8,
        },
        monitor: TaskParams {
            priority: 3,
            stack_kb: 6,
        },
    }
}

/// Sink that keeps every snapshot it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub snapshots: Vec<StatusSnapshot>,
}

impl DiagnosticSink for RecordingSink {
    fn emit(&mut self, snapshot: &StatusSnapshot) {
        self.snapshots.push(*snapshot);
    }
}
