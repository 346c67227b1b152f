//! Integration test: the shipped robot configuration.

use std::io::Write;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::NamedTempFile;

use xr_common::config::ConfigError;
use xr_common::control::config::{MixerKind, RobotConfig};
use xr_control::chassis::Chassis;
use xr_control::config::{load_config, load_or_default};
use xr_control::controller::Subsystem;
use xr_control::launcher::Launcher;
use xr_control::sim::{SimMotor, SimMotorParams};

fn shipped() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/config/robot.toml"))
}

#[test]
fn shipped_config_loads_and_validates() {
    let cfg = load_config(shipped()).expect("shipped config is valid");
    assert_eq!(cfg.shared.service_name, "infantry-01");
    assert_eq!(cfg.control.cycle_time_us, 2000);
    assert_eq!(cfg.chassis.mixer, MixerKind::Mecanum);
    assert!(cfg.chassis.rotor_varying);
    assert_eq!(cfg.launcher.burst_count, 5);
    assert_eq!(cfg.launcher.fric_rpm, [-6500.0, 6500.0]);
    assert!(cfg.gimbal.pit_limit.enabled());
    assert!(!cfg.gimbal.yaw_limit.enabled());
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-6 * b.abs().max(1.0)
}

#[test]
fn shipped_config_matches_builtin_tuning() {
    let cfg = load_config(shipped()).expect("shipped config is valid");
    let defaults = RobotConfig::default();

    let (p, d) = (cfg.chassis.power, defaults.chassis.power);
    assert!(close(p.torque_coeff, d.torque_coeff));
    assert!(close(p.speed2_coeff, d.speed2_coeff));
    assert!(close(p.out2_coeff, d.out2_coeff));
    assert!(close(p.constant, d.constant));

    assert!(close(cfg.chassis.wheel.speed.kp, defaults.chassis.wheel.speed.kp));
    assert!(close(cfg.launcher.trig.position.kp, defaults.launcher.trig.position.kp));
    assert_eq!(cfg.launcher.trig.position.cycle, defaults.launcher.trig.position.cycle);
    assert!(close(cfg.gimbal.yaw.speed.ki, defaults.gimbal.yaw.speed.ki));
}

#[test]
fn subsystems_build_from_shipped_config() {
    let cfg = load_config(shipped()).expect("shipped config is valid");
    let step = cfg.control.period_s();

    let wheels = std::array::from_fn(|_| SimMotor::new("wheel", SimMotorParams::M3508, step));
    let chassis = Chassis::new(&cfg.chassis, wheels, StdRng::seed_from_u64(0));
    assert_eq!(chassis.name(), "chassis");

    let launcher = Launcher::new(
        &cfg.launcher,
        SimMotor::new("trig", SimMotorParams::M2006, step),
        [
            SimMotor::new("fric0", SimMotorParams::M3508, step),
            SimMotor::new("fric1", SimMotorParams::M3508, step),
        ],
    );
    assert!((launcher.fire_control().step() - cfg.launcher.trig_step()).abs() < 1e-6);
}

#[test]
fn out_of_range_cycle_time_is_rejected() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "[control]\ncycle_time_us = 50").expect("write");

    let err = load_or_default(file.path()).unwrap_err();
    match err {
        ConfigError::ValidationError(msg) => assert!(msg.starts_with("[control]"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}
