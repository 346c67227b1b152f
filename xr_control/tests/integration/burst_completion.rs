//! Integration test: bursts through the full launcher stack.
//!
//! Events go through the launcher's event table, the feed wheel is a
//! simulated motor behind the cascade actuator, and time comes from the
//! control loop's manual clock. The inter-shot delay is long enough for the
//! simulated feed wheel to settle between steps.

use xr_common::control::config::LauncherConfig;
use xr_common::control::event::{
    EV_KEY_G, EV_MOUSE_LEFT, EV_SW_R_MID, EV_SW_R_UP, EventId, LAUNCHER_BINDINGS, LauncherEvent,
};
use xr_common::control::input::{RefereeData, RefereeStatus};
use xr_common::control::state::{FireMode, TrigMode};
use xr_common::control::status::{LauncherFlags, LauncherStatus};
use xr_control::controller::{EventTable, SubsystemHandle};
use xr_control::cycle::{ControlLoop, ManualClock};
use xr_control::launcher::{Launcher, LauncherInputs};
use xr_control::sim::{SimMotor, SimMotorParams};
use xr_control::topic::Topic;

const DT: f32 = 0.002;

// ── Helpers ─────────────────────────────────────────────────────────

struct Rig {
    control_loop: ControlLoop<Launcher<SimMotor>, LauncherInputs, ManualClock>,
    table: EventTable<LauncherEvent>,
    referee: Topic<RefereeData>,
    status: Topic<LauncherStatus>,
    step: f32,
}

impl Rig {
    fn new(config: &LauncherConfig) -> Self {
        let launcher = Launcher::new(
            config,
            SimMotor::new("trig", SimMotorParams::M2006, DT),
            [
                SimMotor::new("fric0", SimMotorParams::M3508, DT),
                SimMotor::new("fric1", SimMotorParams::M3508, DT),
            ],
        );
        let referee = Topic::new("referee");
        let control_loop = ControlLoop::new(
            SubsystemHandle::new(launcher),
            LauncherInputs::new(&referee),
            ManualClock::new(),
            2000,
        );
        let status = control_loop.status_topic();
        Self {
            control_loop,
            table: EventTable::new(LAUNCHER_BINDINGS).expect("bindings fit"),
            referee,
            status,
            step: config.trig_step(),
        }
    }

    fn press(&self, id: EventId) {
        let handled = self
            .table
            .dispatch(id, self.control_loop.handle())
            .expect("queue has room");
        assert!(handled, "id {id:#x} not bound");
    }

    fn run_cycles(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.control_loop.step();
        }
    }

    fn status(&self) -> LauncherStatus {
        self.status.latest()
    }
}

fn slow_feed() -> LauncherConfig {
    LauncherConfig {
        min_launch_delay_ms: 250,
        ..LauncherConfig::default()
    }
}

/// Loaded, burst mode, trigger pulled once.
fn arm_burst(rig: &Rig) {
    rig.press(EV_SW_R_UP);
    rig.press(EV_KEY_G);
    rig.press(EV_MOUSE_LEFT);
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn burst_releases_exactly_burst_count() {
    let mut rig = Rig::new(&slow_feed());
    arm_burst(&rig);

    rig.run_cycles(150);
    let s = rig.status();
    assert_eq!(s.fire_mode, FireMode::Loaded);
    assert_eq!(s.trig_mode, TrigMode::Burst);
    assert_eq!(s.to_launch, 5);
    assert_eq!(s.launched, 1);

    rig.run_cycles(850);
    let s = rig.status();
    assert_eq!(s.to_launch, 0, "burst still open: {s:?}");
    assert_eq!(s.launched, 0);
    assert!((s.trig_setpoint + 5.0 * rig.step).abs() < 1e-4, "{}", s.trig_setpoint);
    assert!((s.trig_angle - s.trig_setpoint).abs() < 0.1 * rig.step, "{s:?}");
    assert!(!s.flags.contains(LauncherFlags::JAMMED));
}

#[test]
fn held_trigger_does_not_rearm_and_second_pull_does() {
    let mut rig = Rig::new(&slow_feed());
    arm_burst(&rig);
    rig.run_cycles(1000);
    assert!((rig.status().trig_setpoint + 5.0 * rig.step).abs() < 1e-4);

    // Nothing new without another pull.
    rig.run_cycles(500);
    assert!((rig.status().trig_setpoint + 5.0 * rig.step).abs() < 1e-4);

    rig.press(EV_MOUSE_LEFT);
    rig.run_cycles(1000);
    let s = rig.status();
    assert!((s.trig_setpoint + 10.0 * rig.step).abs() < 1e-4, "{}", s.trig_setpoint);
    assert_eq!(s.to_launch, 0);
}

#[test]
fn heat_budget_caps_burst() {
    let mut rig = Rig::new(&slow_feed());
    rig.referee.publish(RefereeData {
        status: RefereeStatus::Running,
        shooter_heat: 70.0,
        shooter_heat_limit: 100.0,
        ..RefereeData::default()
    });
    arm_burst(&rig);

    rig.run_cycles(1000);
    let s = rig.status();
    assert_eq!(s.available_shots, 3);
    assert!((s.trig_setpoint + 3.0 * rig.step).abs() < 1e-4, "{}", s.trig_setpoint);
    assert!(!s.flags.contains(LauncherFlags::REFEREE_OFFLINE));
}

#[test]
fn safe_mode_ignores_trigger() {
    let mut rig = Rig::new(&slow_feed());
    rig.press(EV_SW_R_MID);
    rig.press(EV_KEY_G);
    rig.press(EV_MOUSE_LEFT);

    rig.run_cycles(500);
    let s = rig.status();
    assert_eq!(s.fire_mode, FireMode::Safe);
    assert_eq!(s.to_launch, 0);
    assert_eq!(s.trig_setpoint, 0.0);
}
