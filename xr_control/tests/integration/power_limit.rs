//! Integration test: chassis power limiting.
//!
//! Property tests for the limiter on its own, then the full chassis against
//! each budget source.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use xr_common::consts::MAX_WHEELS;
use xr_common::control::config::ChassisConfig;
use xr_common::control::event::ChassisEvent;
use xr_common::control::input::{CapInfo, ChassisCommand, RefereeData, RefereeStatus};
use xr_common::control::status::{ChassisFlags, ChassisStatus};
use xr_control::chassis::power::{PowerLimit, PowerModel, limit_output_power};
use xr_control::chassis::{Chassis, ChassisFeed};
use xr_control::controller::Subsystem;
use xr_control::sim::{SimMotor, SimMotorParams};

const DT: f32 = 0.002;

// ── Limiter properties ──────────────────────────────────────────────

/// The part of the modeled power that does not depend on the outputs.
fn speed_floor(model: &PowerModel, speeds: &[f32]) -> f32 {
    speeds
        .iter()
        .map(|s| model.speed2_coeff * s * s)
        .sum::<f32>()
        + model.constant
}

fn wheel_state() -> impl Strategy<Value = ([f32; MAX_WHEELS], [f32; MAX_WHEELS])> {
    (
        prop::array::uniform4(-1.0f32..1.0),
        prop::array::uniform4(-9000.0f32..9000.0),
    )
}

proptest! {
    #[test]
    fn limited_power_never_exceeds_budget(
        (outputs, speeds) in wheel_state(),
        budget in 0.0f32..400.0,
        torque in 0.0f32..0.1,
        out2 in 0.0f32..100.0,
    ) {
        // Without the speed² and constant terms every term shrinks at least
        // linearly with the scale, so the cap is exact.
        let model = PowerModel {
            torque_coeff: torque,
            speed2_coeff: 0.0,
            out2_coeff: out2,
            constant: 0.0,
        };
        let mut limited = outputs;
        limit_output_power(&model, budget, &mut limited, &speeds);
        let after = model.total(&limited, &speeds);
        prop_assert!(after <= budget * 1.0001 + 1e-4, "after {} budget {}", after, budget);
    }

    #[test]
    fn shipped_model_scales_output_terms(
        (outputs, speeds) in wheel_state(),
        budget in 0.0f32..400.0,
    ) {
        let model = PowerModel::from(&ChassisConfig::default().power);
        let mut limited = outputs;
        let limit = limit_output_power(&model, budget, &mut limited, &speeds);

        let fixed = speed_floor(&model, &speeds);
        let modeled = model.total(&outputs, &speeds);
        let after = model.total(&limited, &speeds);
        let scale = match limit {
            PowerLimit::Scaled { scale, .. } => scale,
            PowerLimit::WithinBudget { .. } => 1.0,
            PowerLimit::Disabled => unreachable!("budget is non-negative"),
        };
        let bound = scale * (modeled - fixed);
        prop_assert!(
            after - fixed <= bound * 1.0001 + 1e-3,
            "after {} fixed {} bound {}", after, fixed, bound
        );
        for (before, after) in outputs.iter().zip(&limited) {
            prop_assert!((before * scale - after).abs() <= 1e-6);
        }
    }

    #[test]
    fn limiting_preserves_wheel_ratios(
        (outputs, speeds) in wheel_state(),
        budget in 0.0f32..400.0,
    ) {
        let model = PowerModel::from(&ChassisConfig::default().power);
        let mut limited = outputs;
        let limit = limit_output_power(&model, budget, &mut limited, &speeds);

        let scale = match limit {
            PowerLimit::Scaled { scale, .. } => scale,
            PowerLimit::WithinBudget { .. } => 1.0,
            PowerLimit::Disabled => unreachable!("budget is non-negative"),
        };
        prop_assert!((0.0..=1.0).contains(&scale));
        for (before, after) in outputs.iter().zip(&limited) {
            prop_assert!((before * scale - after).abs() <= 1e-6);
        }
    }

    #[test]
    fn negative_budget_never_touches_outputs(
        (outputs, speeds) in wheel_state(),
        budget in -1000.0f32..-0.001,
    ) {
        let model = PowerModel::from(&ChassisConfig::default().power);
        let mut limited = outputs;
        let limit = limit_output_power(&model, budget, &mut limited, &speeds);
        prop_assert_eq!(limit, PowerLimit::Disabled);
        prop_assert_eq!(limited, outputs);
    }
}

#[test]
fn fast_chassis_keeps_speed_floor_after_scaling() {
    let model = PowerModel::from(&ChassisConfig::default().power);
    let speeds = [8000.0, 8000.0, -8000.0, -8000.0];
    let outputs = [0.6, 0.6, -0.6, -0.6];
    let mut limited = outputs;

    let limit = limit_output_power(&model, 40.0, &mut limited, &speeds);
    let PowerLimit::Scaled { modeled, scale } = limit else {
        panic!("expected scaling, got {limit:?}");
    };
    assert!((scale - 40.0 / modeled).abs() < 1e-6);
    for (before, after) in outputs.iter().zip(&limited) {
        assert!((before * scale - after).abs() < 1e-6);
    }
    assert!((limited[0] / limited[2] + 1.0).abs() < 1e-6);

    // The rpm² and idle terms do not shrink with the outputs, so the total
    // stays above budget until the wheels slow down.
    let fixed = speed_floor(&model, &speeds);
    let after = model.total(&limited, &speeds);
    assert!(after > 40.0, "after {after}");
    assert!(after - fixed <= scale * (modeled - fixed) * 1.0001, "after {after} fixed {fixed}");
}

// ── Chassis budgets ─────────────────────────────────────────────────

fn chassis(config: &ChassisConfig) -> Chassis<SimMotor> {
    let wheels = std::array::from_fn(|_| SimMotor::new("wheel", SimMotorParams::M3508, DT));
    let mut c = Chassis::new(config, wheels, StdRng::seed_from_u64(7));
    c.apply_event(ChassisEvent::SetModeIndependent);
    c
}

fn drive_forward(c: &mut Chassis<SimMotor>, mut feed: ChassisFeed, cycles: u32) -> ChassisStatus {
    feed.cmd = ChassisCommand { x: 1.0, y: 0.0, z: 0.0 };
    for t in 0..cycles {
        c.update_feedback(&feed);
        c.control(t * 2, DT);
    }
    c.status()
}

#[test]
fn fallback_budget_caps_full_throttle() {
    let config = ChassisConfig::default();
    let mut c = chassis(&config);
    let s = drive_forward(&mut c, ChassisFeed::default(), 1_000);

    assert_eq!(s.power_budget, config.fallback_power_limit);
    assert!(s.flags.contains(ChassisFlags::POWER_LIMITED | ChassisFlags::REFEREE_OFFLINE));
    assert!(s.modeled_power > s.power_budget);
    // Forward travel: left wheels positive, right wheels mirrored.
    assert!(s.wheel_out[0] > 0.0 && s.wheel_out[1] > 0.0);
    assert!(s.wheel_out[2] < 0.0 && s.wheel_out[3] < 0.0);
}

#[test]
fn referee_budget_replaces_fallback() {
    let mut c = chassis(&ChassisConfig::default());
    let feed = ChassisFeed {
        referee: RefereeData {
            status: RefereeStatus::Running,
            chassis_power_limit: 10_000.0,
            ..RefereeData::default()
        },
        ..ChassisFeed::default()
    };
    let s = drive_forward(&mut c, feed, 1_000);

    assert_eq!(s.power_budget, 10_000.0);
    assert!(!s.flags.contains(ChassisFlags::POWER_LIMITED));
    assert!(!s.flags.contains(ChassisFlags::REFEREE_OFFLINE));
}

#[test]
fn energy_buffer_budget_only_in_boost() {
    let config = ChassisConfig::default();
    let mut c = chassis(&config);
    let feed = ChassisFeed {
        cap: CapInfo {
            online: true,
            percentage: 0.5,
        },
        referee: RefereeData {
            status: RefereeStatus::Running,
            chassis_power_limit: 60.0,
            ..RefereeData::default()
        },
        ..ChassisFeed::default()
    };

    c.apply_event(ChassisEvent::PowerBoost);
    let s = drive_forward(&mut c, feed, 10);
    let expected = config.cap_power_base + 0.5 * config.cap_power_gain;
    assert!((s.power_budget - expected).abs() < 1e-4, "{}", s.power_budget);
    assert!(s.flags.contains(ChassisFlags::CAP_ONLINE));

    c.apply_event(ChassisEvent::PowerNormal);
    let s = drive_forward(&mut c, feed, 10);
    assert_eq!(s.power_budget, 60.0);
}

#[test]
fn disabled_budget_never_limits() {
    let config = ChassisConfig {
        fallback_power_limit: -1.0,
        ..ChassisConfig::default()
    };
    let mut c = chassis(&config);
    let s = drive_forward(&mut c, ChassisFeed::default(), 1_000);

    assert!(s.power_budget < 0.0);
    assert!(!s.flags.contains(ChassisFlags::POWER_LIMITED));
    assert!(s.modeled_power > 100.0, "{}", s.modeled_power);
}
