//! Two-axis gimbal subsystem.
//!
//! Operator or host commands move an attitude setpoint (relative commands
//! as a rate, absolute commands as a target), soft limits keep the encoder
//! angle inside the configured travel, and a cascade actuator per axis
//! tracks the setpoint against IMU attitude and rate. ABSOLUTE and AUTO_AIM
//! use separately tuned actuators.
//!
//! The gimbal also publishes its yaw relative to the chassis, which the
//! chassis uses as its heading input.

use tracing::info;

use xr_common::consts::GIMBAL_MAX_SPEED;
use xr_common::control::config::{AxisLimit, GimbalConfig};
use xr_common::control::event::GimbalEvent;
use xr_common::control::input::{Eulr, GimbalCommand, GimbalCommandKind, Gyro, Heading};
use xr_common::control::state::GimbalMode;
use xr_common::control::status::GimbalStatus;

use crate::actuator::{CascadePositionActuator, PositionActuator, wrap_angle};
use crate::controller::Subsystem;
use crate::cycle::Ingest;
use crate::motor::Motor;
use crate::topic::{Subscriber, Topic};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GimbalFeed {
    pub cmd: GimbalCommand,
    pub eulr: Eulr,
    pub gyro: Gyro,
}

#[derive(Debug)]
pub struct GimbalInputs {
    cmd: Subscriber<GimbalCommand>,
    eulr: Subscriber<Eulr>,
    gyro: Subscriber<Gyro>,
}

impl GimbalInputs {
    pub fn new(cmd: &Topic<GimbalCommand>, eulr: &Topic<Eulr>, gyro: &Topic<Gyro>) -> Self {
        Self {
            cmd: cmd.subscribe(),
            eulr: eulr.subscribe(),
            gyro: gyro.subscribe(),
        }
    }
}

impl Ingest for GimbalInputs {
    type Feed = GimbalFeed;

    fn ingest(&mut self, feed: &mut GimbalFeed) {
        self.cmd.dump(&mut feed.cmd);
        self.eulr.dump(&mut feed.eulr);
        self.gyro.dump(&mut feed.gyro);
    }
}

/// Clamp `delta` so the axis stays inside `limit`.
///
/// `encoder` is the current encoder angle relative to the mechanical zero
/// and `tracking_err` the setpoint minus the measured attitude; the setpoint
/// may only move as far as the encoder can still travel once that error is
/// closed.
pub fn soft_limit(limit: &AxisLimit, delta: f32, encoder: f32, tracking_err: f32) -> f32 {
    if !limit.enabled() {
        return delta;
    }
    let lo = limit.min - encoder - tracking_err;
    let hi = limit.max - encoder - tracking_err;
    delta.max(lo).min(hi)
}

#[derive(Debug, Clone)]
struct AxisPair {
    yaw: CascadePositionActuator,
    pit: CascadePositionActuator,
}

impl AxisPair {
    fn reset(&mut self) {
        self.yaw.reset();
        self.pit.reset();
    }
}

pub struct Gimbal<M: Motor> {
    config: GimbalConfig,
    mode: GimbalMode,
    yaw_motor: M,
    pit_motor: M,
    absolute: AxisPair,
    auto_aim: AxisPair,
    feed: GimbalFeed,
    setpoint: Eulr,
    yaw_encoder: f32,
    pit_encoder: f32,
    heading: Topic<Heading>,
}

impl<M: Motor> Gimbal<M> {
    /// `heading` receives the chassis-relative yaw after every cycle.
    pub fn new(
        config: &GimbalConfig,
        yaw_motor: M,
        pit_motor: M,
        heading: Topic<Heading>,
    ) -> Self {
        Self {
            config: *config,
            mode: GimbalMode::default(),
            yaw_motor,
            pit_motor,
            absolute: AxisPair {
                yaw: CascadePositionActuator::new(&config.yaw),
                pit: CascadePositionActuator::new(&config.pit),
            },
            auto_aim: AxisPair {
                yaw: CascadePositionActuator::new(&config.yaw_ai),
                pit: CascadePositionActuator::new(&config.pit_ai),
            },
            feed: GimbalFeed::default(),
            setpoint: Eulr::default(),
            yaw_encoder: 0.0,
            pit_encoder: 0.0,
            heading,
        }
    }

    #[inline]
    pub fn mode(&self) -> GimbalMode {
        self.mode
    }

    #[inline]
    pub fn setpoint(&self) -> Eulr {
        self.setpoint
    }

    pub fn yaw_motor(&self) -> &M {
        &self.yaw_motor
    }

    pub fn pit_motor(&self) -> &M {
        &self.pit_motor
    }

    pub fn pit_motor_mut(&mut self) -> &mut M {
        &mut self.pit_motor
    }

    pub fn yaw_motor_mut(&mut self) -> &mut M {
        &mut self.yaw_motor
    }

    /// Switch mode, restarting both axes from the current attitude.
    pub fn set_mode(&mut self, mode: GimbalMode) {
        if mode == self.mode {
            return;
        }
        self.absolute.reset();
        self.auto_aim.reset();
        self.setpoint.yaw = self.feed.eulr.yaw;
        self.setpoint.pit = self.feed.eulr.pit;
        self.setpoint.rol = self.feed.eulr.rol;
        info!(from = ?self.mode, to = ?mode, "gimbal mode change");
        self.mode = mode;
    }

    fn move_setpoint(&mut self, dt: f32) {
        let cmd = self.feed.cmd;
        let (yaw_delta, pit_delta) = match cmd.kind {
            GimbalCommandKind::Relative => {
                (cmd.yaw * dt * GIMBAL_MAX_SPEED, cmd.pit * dt * GIMBAL_MAX_SPEED)
            }
            GimbalCommandKind::Absolute => (
                wrap_angle(cmd.yaw) - self.setpoint.yaw,
                wrap_angle(cmd.pit) - self.setpoint.pit,
            ),
        };

        let yaw_delta = soft_limit(
            &self.config.yaw_limit,
            yaw_delta,
            self.yaw_encoder,
            self.setpoint.yaw - self.feed.eulr.yaw,
        );
        self.setpoint.yaw = wrap_angle(self.setpoint.yaw + yaw_delta);

        let pit_delta = soft_limit(
            &self.config.pit_limit,
            pit_delta,
            self.pit_encoder,
            self.setpoint.pit - self.feed.eulr.pit,
        );
        self.setpoint.pit = wrap_angle(self.setpoint.pit + pit_delta);
    }
}

impl<M: Motor + 'static> Subsystem for Gimbal<M> {
    type Event = GimbalEvent;
    type Feed = GimbalFeed;
    type Status = GimbalStatus;

    fn name(&self) -> &'static str {
        "gimbal"
    }

    fn apply_event(&mut self, event: GimbalEvent) {
        match event {
            GimbalEvent::SetModeRelax => self.set_mode(GimbalMode::Relax),
            GimbalEvent::SetModeAbsolute => self.set_mode(GimbalMode::Absolute),
            GimbalEvent::SetModeAutoAim => self.set_mode(GimbalMode::AutoAim),
        }
    }

    fn update_feedback(&mut self, feed: &GimbalFeed) {
        self.feed = *feed;
        self.yaw_motor.update();
        self.pit_motor.update();
        self.yaw_encoder = wrap_angle(self.yaw_motor.angle() - self.config.yaw_mech_zero);
        self.pit_encoder = wrap_angle(self.pit_motor.angle() - self.config.pit_mech_zero);
    }

    fn control(&mut self, _now_ms: u32, dt: f32) {
        self.move_setpoint(dt);

        let pair = match self.mode {
            GimbalMode::Relax => None,
            GimbalMode::Absolute => Some(&mut self.absolute),
            GimbalMode::AutoAim => Some(&mut self.auto_aim),
        };

        match pair {
            None => {
                self.yaw_motor.relax();
                self.pit_motor.relax();
            }
            Some(pair) => {
                let eulr = self.feed.eulr;
                let gyro = self.feed.gyro;
                let yaw_out = pair.yaw.calculate(self.setpoint.yaw, gyro.z, eulr.yaw, dt);
                let pit_out = pair.pit.calculate(self.setpoint.pit, gyro.x, eulr.pit, dt);
                self.yaw_motor.control(yaw_out);
                self.pit_motor.control(pit_out);
            }
        }

        self.heading.publish(Heading {
            yaw: self.yaw_encoder,
        });
    }

    fn status(&self) -> GimbalStatus {
        GimbalStatus {
            mode: self.mode,
            setpoint_yaw: self.setpoint.yaw,
            setpoint_pit: self.setpoint.pit,
            relative_yaw: self.yaw_encoder,
        }
    }
}
