//! Integration test: gimbal and chassis coupled through the heading topic.
//!
//! The gimbal publishes its yaw relative to the mechanical zero every cycle;
//! the chassis picks it up as its heading input on its next cycle.

use rand::SeedableRng;
use rand::rngs::StdRng;

use xr_common::control::config::{ChassisConfig, GimbalConfig};
use xr_common::control::event::ChassisEvent;
use xr_common::control::input::{
    CapInfo, ChassisCommand, Eulr, GimbalCommand, GimbalCommandKind, Gyro, Heading, RefereeData,
};
use xr_common::control::status::{ChassisStatus, GimbalStatus};
use xr_control::chassis::{Chassis, ChassisInputs};
use xr_control::controller::SubsystemHandle;
use xr_control::cycle::{ControlLoop, ManualClock};
use xr_control::gimbal::{Gimbal, GimbalInputs};
use xr_control::sim::{SimMotor, SimMotorParams};
use xr_control::topic::Topic;

const DT: f32 = 0.002;

struct Robot {
    gimbal: ControlLoop<Gimbal<SimMotor>, GimbalInputs, ManualClock>,
    chassis: ControlLoop<Chassis<SimMotor>, ChassisInputs, ManualClock>,
    gimbal_cmd: Topic<GimbalCommand>,
    gimbal_status: Topic<GimbalStatus>,
    chassis_status: Topic<ChassisStatus>,
}

impl Robot {
    fn new(gimbal_config: &GimbalConfig) -> Self {
        let heading = Topic::<Heading>::new("chassis_yaw");
        let gimbal_cmd = Topic::new("cmd_gimbal");
        let eulr = Topic::<Eulr>::new("imu_eulr");
        let gyro = Topic::<Gyro>::new("imu_gyro");
        let chassis_cmd = Topic::<ChassisCommand>::new("cmd_chassis");
        let cap = Topic::<CapInfo>::new("cap_info");
        let referee = Topic::<RefereeData>::new("referee");
        let clock = ManualClock::new();

        let gimbal = Gimbal::new(
            gimbal_config,
            SimMotor::new("yaw", SimMotorParams::GM6020, DT),
            SimMotor::new("pit", SimMotorParams::GM6020, DT),
            heading.clone(),
        );
        let wheels = std::array::from_fn(|_| SimMotor::new("wheel", SimMotorParams::M3508, DT));
        let chassis = Chassis::new(&ChassisConfig::default(), wheels, StdRng::seed_from_u64(0));

        let gimbal = ControlLoop::new(
            SubsystemHandle::new(gimbal),
            GimbalInputs::new(&gimbal_cmd, &eulr, &gyro),
            clock.clone(),
            2000,
        );
        let chassis = ControlLoop::new(
            SubsystemHandle::new(chassis),
            ChassisInputs::new(&chassis_cmd, &heading, &cap, &referee),
            clock,
            2000,
        );
        let gimbal_status = gimbal.status_topic();
        let chassis_status = chassis.status_topic();
        Self {
            gimbal,
            chassis,
            gimbal_cmd,
            gimbal_status,
            chassis_status,
        }
    }

    fn set_yaw_shaft(&self, angle: f32) {
        self.gimbal
            .handle()
            .with(|g| g.yaw_motor_mut().set_shaft_angle(angle));
    }

    fn run_cycles(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.gimbal.run_cycle();
            self.chassis.run_cycle();
        }
    }
}

#[test]
fn chassis_heading_follows_gimbal_encoder() {
    let mut robot = Robot::new(&GimbalConfig::default());
    robot.set_yaw_shaft(0.3);
    robot.run_cycles(2);

    assert!((robot.gimbal_status.latest().relative_yaw - 0.3).abs() < 1e-6);
    assert!((robot.chassis_status.latest().yaw - 0.3).abs() < 1e-6);
}

#[test]
fn heading_is_relative_to_mechanical_zero() {
    let config = GimbalConfig {
        yaw_mech_zero: 1.0,
        ..GimbalConfig::default()
    };
    let mut robot = Robot::new(&config);
    robot.set_yaw_shaft(0.3);
    robot.run_cycles(2);

    assert!((robot.chassis_status.latest().yaw + 0.7).abs() < 1e-6);
}

#[test]
fn follow_mode_uses_published_heading() {
    let mut robot = Robot::new(&GimbalConfig::default());
    robot
        .chassis
        .handle()
        .apply_event(ChassisEvent::SetModeFollow);
    robot.set_yaw_shaft(-0.4);
    robot.run_cycles(5);

    // Gimbal turned right of the chassis front: the chassis turns after it.
    assert!(robot.chassis_status.latest().move_vec.wz > 0.0);
}

#[test]
fn pitch_setpoint_stops_at_soft_limit() {
    let mut robot = Robot::new(&GimbalConfig::default());
    robot.gimbal_cmd.publish(GimbalCommand {
        yaw: 0.0,
        pit: 1.0,
        kind: GimbalCommandKind::Relative,
    });
    robot.run_cycles(500);

    let limit = GimbalConfig::default().pit_limit;
    let s = robot.gimbal_status.latest();
    assert!(s.setpoint_pit <= limit.max + 1e-5, "{}", s.setpoint_pit);
    assert!(s.setpoint_pit > limit.max - 1e-3, "{}", s.setpoint_pit);
}
