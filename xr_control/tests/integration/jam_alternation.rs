//! Integration test: jam recovery on a stalled feed motor.
//!
//! The simulated feed motor is held still, so every step after the first
//! fails the travel check. The launcher must alternate stepping back and
//! re-attempting until the jam clears, then finish the burst.

use xr_common::control::config::LauncherConfig;
use xr_common::control::event::LauncherEvent;
use xr_common::control::status::{FeedAction, LauncherFlags, LauncherStatus};
use xr_control::controller::Subsystem;
use xr_control::launcher::{Launcher, LauncherFeed};
use xr_control::sim::{SimMotor, SimMotorParams};

const DT: f32 = 0.002;

// ── Helpers ─────────────────────────────────────────────────────────

struct Bench {
    launcher: Launcher<SimMotor>,
    now_ms: u32,
    last_setpoint: f32,
    actions: Vec<FeedAction>,
}

impl Bench {
    fn new(allow_reverse: bool) -> Self {
        let config = LauncherConfig {
            min_launch_delay_ms: 250,
            allow_reverse,
            ..LauncherConfig::default()
        };
        let mut launcher = Launcher::new(
            &config,
            SimMotor::new("trig", SimMotorParams::M2006, DT),
            [
                SimMotor::new("fric0", SimMotorParams::M3508, DT),
                SimMotor::new("fric1", SimMotorParams::M3508, DT),
            ],
        );
        launcher.trig_motor_mut().set_jammed(true);
        launcher.apply_event(LauncherEvent::FireModeLoaded);
        launcher.apply_event(LauncherEvent::TrigBurst);
        launcher.apply_event(LauncherEvent::StartFire);
        Self {
            launcher,
            now_ms: 0,
            last_setpoint: 0.0,
            actions: Vec::new(),
        }
    }

    /// One control cycle. Records the feed action whenever the setpoint moved.
    fn cycle(&mut self) -> LauncherStatus {
        self.launcher.update_feedback(&LauncherFeed::default());
        self.launcher.control(self.now_ms, DT);
        self.now_ms += 2;

        let s = self.launcher.status();
        if s.trig_setpoint != self.last_setpoint {
            self.last_setpoint = s.trig_setpoint;
            self.actions.push(s.last_action);
        }
        s
    }

    fn run_until_actions(&mut self, count: usize, max_cycles: u32) {
        for _ in 0..max_cycles {
            if self.actions.len() >= count {
                return;
            }
            self.cycle();
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn stalled_feed_alternates_then_recovers() {
    let mut bench = Bench::new(true);
    let step = bench.launcher.fire_control().step();

    bench.run_until_actions(5, 5_000);
    assert_eq!(
        bench.actions,
        [
            FeedAction::Advance,
            FeedAction::Reverse,
            FeedAction::Retry,
            FeedAction::Reverse,
            FeedAction::Retry,
        ]
    );
    let s = bench.launcher.status();
    assert!(s.flags.contains(LauncherFlags::JAMMED));
    assert!(!s.flags.contains(LauncherFlags::FEED_REVERSING));
    assert_eq!(s.launched, 1);
    assert!((s.trig_setpoint + step).abs() < 1e-5);

    bench.launcher.trig_motor_mut().set_jammed(false);
    for _ in 0..1_500 {
        bench.cycle();
    }

    assert_eq!(
        &bench.actions[5..],
        [FeedAction::Advance; 4].as_slice(),
        "actions: {:?}",
        bench.actions
    );
    let s = bench.launcher.status();
    assert_eq!(s.to_launch, 0, "burst still open: {s:?}");
    assert!(!s.flags.contains(LauncherFlags::JAMMED));
    assert!((s.trig_setpoint + 5.0 * step).abs() < 1e-4);
}

#[test]
fn reverse_is_flagged_while_active() {
    let mut bench = Bench::new(true);
    bench.run_until_actions(2, 5_000);
    assert_eq!(bench.actions, [FeedAction::Advance, FeedAction::Reverse]);

    let s = bench.launcher.status();
    assert!(s.flags.contains(LauncherFlags::JAMMED | LauncherFlags::FEED_REVERSING));
    assert_eq!(s.trig_setpoint, 0.0);
}

#[test]
fn without_reverse_the_feed_holds_position() {
    let mut bench = Bench::new(false);
    let step = bench.launcher.fire_control().step();

    for _ in 0..1_000 {
        bench.cycle();
    }

    assert_eq!(bench.actions, [FeedAction::Advance]);
    let s = bench.launcher.status();
    assert_eq!(s.last_action, FeedAction::Blocked);
    assert!(s.flags.contains(LauncherFlags::JAMMED));
    assert!((s.trig_setpoint + step).abs() < 1e-5);
    assert_eq!(s.launched, 1);
    assert_eq!(s.to_launch, 5);
}
