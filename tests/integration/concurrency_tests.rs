//! Control and monitor tasks running on real threads over one shared
//! context, with the test thread driving a manual clock.

use std::thread;
use std::time::Duration;

use trafficlight::adapters::log_sink::NoopDiagnosticSink;
use trafficlight::adapters::mock::MockHardwareController;
use trafficlight::adapters::time::ManualClock;
use trafficlight::app::shared::SharedContext;
use trafficlight::fsm::{Phase, StateMachine};
use trafficlight::scheduler::TaskManager;

use crate::support::{RecordingSink, default_table, fast_config, started_machine};

const LONG: Duration = Duration::from_secs(1);

#[test]
fn monitor_never_observes_a_torn_snapshot() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let ctx = SharedContext::new(started_machine(&hw, &clock));
    let manager = TaskManager::new(&ctx, fast_config());
    let table = default_table();

    let report = thread::scope(|s| {
        let handles = manager.spawn(s, RecordingSink::default()).unwrap();
        for _ in 0..400 {
            clock.advance(1_700);
            thread::sleep(Duration::from_micros(500));
        }
        manager.shutdown();
        handles.join().unwrap()
    });

    let snapshots = &report.monitor.sink.snapshots;
    assert!(!snapshots.is_empty());
    assert_eq!(report.monitor.reports, snapshots.len() as u64);
    for snap in snapshots {
        // Each committed state fixes the counter: five transitions per
        // completed cycle plus the phase index within this one.
        let committed =
            u64::from(snap.cycle_count - 1) * Phase::COUNT as u64 + snap.phase.index() as u64;
        assert_eq!(snap.transitions, committed, "{snap:?}");
        assert!(snap.time_remaining_ms <= table.duration_of(snap.phase), "{snap:?}");
        assert_eq!(snap.label, table.label_of(snap.phase));
    }

    let transitions = ctx.with_lock_blocking(LONG, |s| s.transitions()).unwrap();
    assert!(transitions > 0);
    assert_eq!(transitions, report.control.transitions);
    assert!(hw.frames().iter().all(|f| !f.has_conflicting_go()));
    // Orderly shutdown leaves the junction dark.
    assert!(hw.outputs().is_all_off());
}

#[test]
fn held_lock_makes_tasks_skip_not_fail() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let ctx = SharedContext::new(started_machine(&hw, &clock));
    let manager = TaskManager::new(&ctx, fast_config());

    let report = thread::scope(|s| {
        let handles = manager.spawn(s, RecordingSink::default()).unwrap();
        thread::sleep(Duration::from_millis(10));
        ctx.with_lock_blocking(LONG, |_| thread::sleep(Duration::from_millis(160)))
            .unwrap();
        // Tasks recover once the lock is free again.
        clock.set(20_000);
        thread::sleep(Duration::from_millis(40));
        manager.shutdown();
        handles.join().unwrap()
    });

    assert!(report.control.skipped >= 1, "{:?}", report.control);
    assert_eq!(report.control.transitions, 1);
    assert!(report.monitor.reports > 0);
}

#[test]
fn suspend_freezes_phase_and_silences_monitor() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let ctx = SharedContext::new(started_machine(&hw, &clock));
    let manager = TaskManager::new(&ctx, fast_config());

    let (frozen, report) = thread::scope(|s| {
        let handles = manager.spawn(s, RecordingSink::default()).unwrap();
        manager.suspend().unwrap();
        clock.set(60_000);
        thread::sleep(Duration::from_millis(40));
        let frozen = ctx.with_lock_blocking(LONG, |s| s.machine().current_phase()).unwrap();

        manager.resume().unwrap();
        thread::sleep(Duration::from_millis(40));
        manager.shutdown();
        (frozen, handles.join().unwrap())
    });

    assert_eq!(frozen, Phase::GreenPrimary);
    assert!(report.monitor.paused > 0);
    // Resumed: the overdue phase advances once, then waits for its own
    // duration against the stopped manual clock.
    assert_eq!(report.control.transitions, 1);
    let phase = ctx.with_lock_blocking(LONG, |s| s.machine().current_phase()).unwrap();
    assert_eq!(phase, Phase::YellowPrimary);
}

#[test]
fn emergency_stop_while_running() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let ctx = SharedContext::new(started_machine(&hw, &clock));
    let manager = TaskManager::new(&ctx, fast_config());

    let report = thread::scope(|s| {
        let handles = manager.spawn(s, NoopDiagnosticSink).unwrap();
        clock.set(20_000);
        thread::sleep(Duration::from_millis(20));
        manager.emergency_stop();
        assert!(hw.outputs().is_all_off());
        handles.join().unwrap()
    });

    assert!(manager.is_shutdown_requested());
    assert!(hw.outputs().is_all_off());
    assert_eq!(report.control.transitions, 1);
    // Phase and cycle survive the stop.
    let state = ctx.with_lock_blocking(LONG, |s| s.machine().state()).unwrap().unwrap();
    assert_eq!(state.phase, Phase::YellowPrimary);
    assert_eq!(state.cycle_count, 1);
}

#[test]
fn run_returns_after_shutdown_from_another_thread() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let ctx = SharedContext::new(started_machine(&hw, &clock));
    let manager = TaskManager::new(&ctx, fast_config());

    let report = thread::scope(|s| {
        s.spawn(|| {
            thread::sleep(Duration::from_millis(30));
            manager.shutdown();
        });
        manager.run(RecordingSink::default())
    })
    .unwrap();

    assert!(report.control.polls > 0);
    assert!(report.monitor.reports > 0);
}

#[test]
fn tasks_over_unarmed_machine_shut_down_cleanly() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let ctx = SharedContext::new(StateMachine::new(default_table(), &hw, &clock));
    let manager = TaskManager::new(&ctx, fast_config());

    let report = thread::scope(|s| {
        let handles = manager.spawn(s, RecordingSink::default()).unwrap();
        clock.set(60_000);
        thread::sleep(Duration::from_millis(20));
        manager.shutdown();
        handles.join()
    })
    .expect("both tasks exit without panicking");

    assert!(report.control.polls > 0);
    assert_eq!(report.control.transitions, 0);
    assert!(hw.outputs().is_all_off());
    assert_eq!(hw.apply_count(), 0);
    for snap in &report.monitor.sink.snapshots {
        assert_eq!(snap.cycle_count, 0);
        assert_eq!(snap.transitions, 0);
    }
}
