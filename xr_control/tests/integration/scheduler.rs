//! Integration test: drift-corrected scheduling on a manual clock.
//!
//! The subsystem holds a clone of the clock and burns time inside its own
//! control cycle, so the loop sees realistic execution times without any
//! real sleeping.

use xr_control::controller::{Subsystem, SubsystemHandle};
use xr_control::cycle::{ControlLoop, ManualClock, NoInputs};

const PERIOD_US: u32 = 2000;

struct Worker {
    clock: ManualClock,
    /// Time burnt per cycle [µs], indexed by cycle number.
    cost_us: Vec<u64>,
    starts_ms: Vec<u32>,
    dts: Vec<f32>,
}

impl Worker {
    fn new(clock: ManualClock, cost_us: Vec<u64>) -> Self {
        Self {
            clock,
            cost_us,
            starts_ms: Vec::new(),
            dts: Vec::new(),
        }
    }
}

impl Subsystem for Worker {
    type Event = ();
    type Feed = ();
    type Status = usize;

    fn name(&self) -> &'static str {
        "worker"
    }
    fn apply_event(&mut self, _event: ()) {}
    fn update_feedback(&mut self, _feed: &()) {}
    fn control(&mut self, now_ms: u32, dt: f32) {
        let cost = self.cost_us.get(self.starts_ms.len()).copied().unwrap_or(0);
        self.starts_ms.push(now_ms);
        self.dts.push(dt);
        self.clock.advance_ns(cost * 1_000);
    }
    fn status(&self) -> usize {
        self.starts_ms.len()
    }
}

fn worker_loop(cost_us: Vec<u64>) -> ControlLoop<Worker, NoInputs<()>, ManualClock> {
    let clock = ManualClock::new();
    let handle = SubsystemHandle::new(Worker::new(clock.clone(), cost_us));
    ControlLoop::new(handle, NoInputs::default(), clock, PERIOD_US)
}

#[test]
fn execution_time_does_not_accumulate_drift() {
    let mut control_loop = worker_loop(vec![1_500; 500]);
    for _ in 0..500 {
        control_loop.step();
    }

    let handle = control_loop.handle().clone();
    handle.with(|w| {
        for (k, &start) in w.starts_ms.iter().enumerate() {
            assert_eq!(start, 2 * k as u32, "cycle {k} started late");
        }
        for &dt in &w.dts[1..] {
            assert!((dt - 0.002).abs() < 1e-6, "dt {dt}");
        }
    });
    assert_eq!(control_loop.stats().overruns, 0);
    assert_eq!(control_loop.stats().cycle_count, 500);
}

#[test]
fn overrun_reanchors_schedule() {
    let mut costs = vec![100; 20];
    costs[5] = 2_500;
    let mut control_loop = worker_loop(costs);
    for _ in 0..8 {
        control_loop.step();
    }

    assert_eq!(control_loop.stats().overruns, 1);
    let handle = control_loop.handle().clone();
    handle.with(|w| {
        // Cycle 5 starts at 10 ms and ends at 12.5 ms; the schedule restarts there.
        assert_eq!(&w.starts_ms[..6], &[0, 2, 4, 6, 8, 10]);
        assert_eq!(w.starts_ms[6], 12);
        assert_eq!(w.starts_ms[7], 14);
        assert!((w.dts[6] - 0.0025).abs() < 1e-6, "dt {}", w.dts[6]);
    });
}

#[test]
fn status_is_published_every_cycle() {
    let mut control_loop = worker_loop(Vec::new());
    let status = control_loop.status_topic();
    for _ in 0..10 {
        control_loop.step();
    }
    assert_eq!(status.latest(), 10);
    assert_eq!(status.sequence(), 10);
}
