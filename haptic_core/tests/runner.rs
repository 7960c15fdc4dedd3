use std::cell::Cell;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use haptic_core::mocks::ScriptedDevice;
use haptic_core::{
    ForceCfg, HapticError, HapticLoop, LoopCfg, RunOptions, build_haptic_loop, run_paced,
};
use haptic_traits::Clock;

/// Simulated time: `sleep` advances it, and every `now` call advances it by `step`.
struct TestClock {
    t: Cell<Instant>,
    step: Duration,
    sleeps: Cell<u32>,
}

impl TestClock {
    fn new(step: Duration) -> Self {
        Self {
            t: Cell::new(Instant::now()),
            step,
            sleeps: Cell::new(0),
        }
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        let t = self.t.get();
        self.t.set(t + self.step);
        t
    }

    fn sleep(&self, d: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.t.set(self.t.get() + d);
    }
}

fn haptic(dev: ScriptedDevice) -> HapticLoop<ScriptedDevice> {
    let cfg = LoopCfg {
        timestep_s: 0.01,
        estimate_window_s: 0.1,
        ..LoopCfg::default()
    };
    build_haptic_loop(dev, cfg, ForceCfg::default(), None, None).unwrap()
}

#[test]
fn runs_requested_cycles_on_schedule() {
    let dev = ScriptedDevice::new();
    let log = dev.log();
    let mut h = haptic(dev);
    let clock = TestClock::new(Duration::ZERO);
    let stop = AtomicBool::new(false);

    let stats = run_paced(
        &mut h,
        &clock,
        RunOptions {
            max_cycles: Some(5),
        },
        &stop,
        |h| h.add_force([1.0, 0.0, 0.0]),
    )
    .unwrap();

    assert_eq!(stats.cycles, 5);
    assert_eq!(stats.missed_deadlines, 0);
    assert_eq!(stats.max_latency_us, 0);
    assert_eq!(clock.sleeps.get(), 5);
    let log = log.borrow();
    assert_eq!(log.reads, 5);
    assert_eq!(log.writes, vec![[1.0, 0.0, 0.0]; 5]);
}

#[test]
fn raised_shutdown_flag_runs_nothing() {
    let dev = ScriptedDevice::new();
    let log = dev.log();
    let mut h = haptic(dev);
    let stop = AtomicBool::new(true);
    let stats = run_paced(
        &mut h,
        &TestClock::new(Duration::ZERO),
        RunOptions::default(),
        &stop,
        |_| {},
    )
    .unwrap();
    assert_eq!(stats.cycles, 0);
    assert_eq!(stats.mean_latency_us, 0.0);
    assert_eq!(log.borrow().reads, 0);
}

#[test]
fn slow_cycles_count_as_missed_not_fatal() {
    let mut h = haptic(ScriptedDevice::new());
    // start and end of each cycle are 15 ms apart against a 10 ms period
    let clock = TestClock::new(Duration::from_millis(15));
    let stop = AtomicBool::new(false);
    let stats = run_paced(
        &mut h,
        &clock,
        RunOptions {
            max_cycles: Some(4),
        },
        &stop,
        |_| {},
    )
    .unwrap();
    assert_eq!(stats.cycles, 4);
    assert_eq!(stats.missed_deadlines, 4);
    assert_eq!(stats.max_latency_us, 15_000);
    assert!((stats.mean_latency_us - 15_000.0).abs() < 1e-9);
    assert_eq!(clock.sleeps.get(), 0);
}

#[test]
fn read_failure_stops_the_run() {
    let dev = ScriptedDevice::new().fail_read_at(2);
    let log = dev.log();
    let mut h = haptic(dev);
    let stop = AtomicBool::new(false);
    let err = run_paced(
        &mut h,
        &TestClock::new(Duration::ZERO),
        RunOptions {
            max_cycles: Some(10),
        },
        &stop,
        |_| {},
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HapticError>(),
        Some(HapticError::Hardware(_))
    ));
    assert_eq!(err.to_string(), "cycle 2");
    assert_eq!(log.borrow().writes.len(), 2);
}
