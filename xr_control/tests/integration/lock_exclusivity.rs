//! Integration test: one exclusive lock per subsystem.
//!
//! A mode change and a control cycle never interleave. The probe subsystem
//! writes its mode and setpoint in two separate steps on every event, and
//! the control cycle reads them in two separate steps; any overlap would
//! show up as a recorded pair that disagrees.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use xr_common::consts::EVENT_QUEUE_CAPACITY;
use xr_control::controller::{EventError, EventTable, Subsystem, SubsystemHandle};
use xr_control::cycle::{ControlLoop, ManualClock, NoInputs};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Default)]
struct TornWriteProbe {
    mode: u32,
    setpoint: u32,
    pairs: Vec<(u32, u32)>,
}

fn busy(iterations: u32) {
    for _ in 0..iterations {
        std::hint::spin_loop();
    }
}

impl Subsystem for TornWriteProbe {
    type Event = u32;
    type Feed = ();
    type Status = usize;

    fn name(&self) -> &'static str {
        "probe"
    }

    fn apply_event(&mut self, event: u32) {
        self.mode = event;
        busy(200);
        self.setpoint = event;
    }

    fn update_feedback(&mut self, _feed: &()) {}

    fn control(&mut self, _now_ms: u32, _dt: f32) {
        let mode = self.mode;
        busy(200);
        let setpoint = self.setpoint;
        self.pairs.push((mode, setpoint));
    }

    fn status(&self) -> usize {
        self.pairs.len()
    }
}

fn probe_loop() -> ControlLoop<TornWriteProbe, NoInputs<()>, ManualClock> {
    let handle = SubsystemHandle::new(TornWriteProbe::default());
    ControlLoop::new(handle, NoInputs::default(), ManualClock::new(), 2000)
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn concurrent_events_never_tear_a_cycle() {
    let mut control_loop = probe_loop();
    let handle = control_loop.handle().clone();
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let handle = handle.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut value = 1u32;
            while !done.load(Ordering::Relaxed) {
                if value % 3 == 0 {
                    // Queue full just means the loop is behind; not a failure here.
                    let _ = handle.post(value);
                } else {
                    handle.apply_event(value);
                }
                value = value.wrapping_add(1);
            }
        })
    };

    for _ in 0..2_000 {
        control_loop.step();
    }
    done.store(true, Ordering::Relaxed);
    writer.join().expect("writer thread panicked");

    handle.with(|probe| {
        assert_eq!(probe.pairs.len(), 2_000);
        let torn: Vec<_> = probe.pairs.iter().filter(|(m, s)| m != s).collect();
        assert!(torn.is_empty(), "torn reads: {torn:?}");
    });
}

#[test]
fn posted_events_apply_before_control_in_order() {
    let mut control_loop = probe_loop();
    let handle = control_loop.handle().clone();

    handle.post(4).expect("queue has room");
    handle.post(9).expect("queue has room");
    assert_eq!(handle.pending(), 2);

    control_loop.run_cycle();

    assert_eq!(handle.pending(), 0);
    handle.with(|probe| assert_eq!(probe.pairs, vec![(9, 9)]));
}

#[test]
fn full_queue_rejects_without_blocking() {
    let control_loop = probe_loop();
    let handle = control_loop.handle().clone();

    for i in 0..EVENT_QUEUE_CAPACITY as u32 {
        handle.post(i).expect("queue has room");
    }
    assert_eq!(handle.post(99), Err(EventError::QueueFull("probe")));
    assert_eq!(handle.pending(), EVENT_QUEUE_CAPACITY);
}

#[test]
fn event_table_routes_only_bound_ids() {
    let mut control_loop = probe_loop();
    let handle = control_loop.handle().clone();
    let table = EventTable::new(&[(0x10, 1u32), (0x20, 2u32)]).expect("table fits");

    assert_eq!(table.dispatch(0x20, &handle), Ok(true));
    assert_eq!(table.dispatch(0x30, &handle), Ok(false));
    control_loop.run_cycle();

    handle.with(|probe| assert_eq!(probe.pairs, vec![(2, 2)]));
}
