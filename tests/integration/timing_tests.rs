//! Deterministic, single-threaded timing scenarios.

use std::time::Duration;

use trafficlight::adapters::mock::MockHardwareController;
use trafficlight::adapters::time::ManualClock;
use trafficlight::app::ports::Clock;
use trafficlight::app::shared::SharedContext;
use trafficlight::fsm::Phase;

use crate::support::{default_table, started_machine};

const LOCK: Duration = Duration::from_millis(100);

#[test]
fn documented_timeline() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let mut sm = started_machine(&hw, &clock);

    clock.set(19_999);
    assert!(!sm.update());
    assert_eq!(sm.current_phase(), Phase::GreenPrimary);

    clock.set(20_000);
    assert!(sm.update());
    assert_eq!(sm.current_phase(), Phase::YellowPrimary);

    clock.set(23_500);
    assert!(sm.update());
    assert_eq!(sm.current_phase(), Phase::SafetyGapA);
    assert_eq!(sm.cycle_count(), 1);
}

#[test]
fn polled_run_over_two_cycles() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let mut sm = started_machine(&hw, &clock);
    let mut seen = vec![sm.current_phase()];

    // 10 ms polling, like the control task.
    while clock.now_ms() < 2 * 53_000 {
        clock.advance(10);
        if sm.update() {
            seen.push(sm.current_phase());
        }
    }

    let expected: Vec<Phase> = Phase::ALL
        .iter()
        .chain(Phase::ALL.iter())
        .copied()
        .chain([Phase::GreenPrimary])
        .collect();
    assert_eq!(seen, expected);
    assert_eq!(sm.cycle_count(), 3);
    // begin plus ten transitions
    assert_eq!(hw.apply_count(), 11);
}

#[test]
fn frames_never_show_both_greens() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let mut sm = started_machine(&hw, &clock);
    for _ in 0..20 {
        clock.advance(sm.time_remaining());
        assert!(sm.update());
    }
    let frames = hw.frames();
    assert!(frames.iter().all(|f| !f.has_conflicting_go()));
    // Every apply goes through one all-off frame before the new pattern.
    for pair in frames.windows(2) {
        if !pair[0].is_all_off() {
            assert!(pair[1].is_all_off(), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }
}

#[test]
fn emergency_stop_mid_cycle() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let ctx = SharedContext::new(started_machine(&hw, &clock));

    clock.set(20_000);
    ctx.with_lock_blocking(LOCK, |s| {
        assert!(s.machine_mut().update());
        s.record_transition();
    })
    .unwrap();
    clock.set(21_000);

    ctx.emergency_stop();
    assert!(hw.outputs().is_all_off());

    let status = ctx.with_lock_blocking(LOCK, |s| s.status()).unwrap();
    assert_eq!(status.phase, Phase::YellowPrimary);
    assert_eq!(status.cycle_count, 1);
    assert_eq!(status.time_remaining_ms, 2_000);
    assert_eq!(status.transitions, 1);
}

#[test]
fn table_is_single_source_of_pattern() {
    let hw = MockHardwareController::new();
    let clock = ManualClock::new(0);
    let mut sm = started_machine(&hw, &clock);
    let table = default_table();
    for _ in 0..Phase::COUNT {
        assert_eq!(hw.outputs(), table.pattern_of(sm.current_phase()));
        clock.advance(table.duration_of(sm.current_phase()));
        assert!(sm.update());
    }
}
