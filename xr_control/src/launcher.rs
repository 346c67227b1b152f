//! Launcher subsystem: one feed motor and two friction wheels.
//!
//! The fire-control state machine decides where the feed wheel should be;
//! this module turns that into motor commands. RELAX releases every motor.
//! SAFE holds the feed wheel and stops the friction wheels. LOADED spins the
//! friction wheels up to their launch speed.

pub mod fire;
pub mod heat;
pub mod trigger;

use tracing::{debug, info};

use xr_common::consts::MAX_FRIC_WHEELS;
use xr_common::control::config::LauncherConfig;
use xr_common::control::event::LauncherEvent;
use xr_common::control::input::RefereeData;
use xr_common::control::state::{FireMode, TrigMode};
use xr_common::control::status::{FeedAction, LauncherFlags, LauncherStatus};

use crate::actuator::{
    CascadePositionActuator, PidSpeedActuator, PositionActuator, SpeedActuator, wrap_angle,
};
use crate::controller::Subsystem;
use crate::cycle::Ingest;
use crate::motor::Motor;
use crate::topic::{Subscriber, Topic};

use self::fire::FireControl;
use self::heat::HeatBudget;

/// Feed motor speed that maps to 1.0 on the inner speed loop [rpm].
pub const TRIG_SPEED_FULL_SCALE: f32 = 8191.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LauncherFeed {
    pub referee: RefereeData,
}

#[derive(Debug)]
pub struct LauncherInputs {
    referee: Subscriber<RefereeData>,
}

impl LauncherInputs {
    pub fn new(referee: &Topic<RefereeData>) -> Self {
        Self {
            referee: referee.subscribe(),
        }
    }
}

impl Ingest for LauncherInputs {
    type Feed = LauncherFeed;

    fn ingest(&mut self, feed: &mut LauncherFeed) {
        self.referee.dump(&mut feed.referee);
    }
}

pub struct Launcher<M: Motor> {
    config: LauncherConfig,
    fire: FireControl,
    heat: HeatBudget,
    trig_motor: M,
    fric_motors: [M; MAX_FRIC_WHEELS],
    trig_actuator: CascadePositionActuator,
    fric_actuators: [PidSpeedActuator; MAX_FRIC_WHEELS],
    feed: LauncherFeed,
    /// Feed-wheel angle accumulated from motor deltas [rad].
    trig_angle: f32,
    last_motor_angle: Option<f32>,
    trig_speed: f32,
    fric_setpoints: [f32; MAX_FRIC_WHEELS],
    fric_speeds: [f32; MAX_FRIC_WHEELS],
    flags: LauncherFlags,
}

impl<M: Motor> Launcher<M> {
    pub fn new(config: &LauncherConfig, trig_motor: M, fric_motors: [M; MAX_FRIC_WHEELS]) -> Self {
        let fric_actuator = PidSpeedActuator::new(&config.fric);
        Self {
            config: *config,
            fire: FireControl::new(config),
            heat: HeatBudget::new(config.heat_increase, config.fallback_shots),
            trig_motor,
            fric_motors,
            trig_actuator: CascadePositionActuator::new(&config.trig),
            fric_actuators: core::array::from_fn(|_| fric_actuator.clone()),
            feed: LauncherFeed::default(),
            trig_angle: 0.0,
            last_motor_angle: None,
            trig_speed: 0.0,
            fric_setpoints: [0.0; MAX_FRIC_WHEELS],
            fric_speeds: [0.0; MAX_FRIC_WHEELS],
            flags: LauncherFlags::REFEREE_OFFLINE,
        }
    }

    pub fn fire_control(&self) -> &FireControl {
        &self.fire
    }

    pub fn heat(&self) -> &HeatBudget {
        &self.heat
    }

    /// Measured feed-wheel angle [rad].
    #[inline]
    pub fn trig_angle(&self) -> f32 {
        self.trig_angle
    }

    pub fn trig_motor(&self) -> &M {
        &self.trig_motor
    }

    pub fn trig_motor_mut(&mut self) -> &mut M {
        &mut self.trig_motor
    }

    pub fn fric_motors(&self) -> &[M; MAX_FRIC_WHEELS] {
        &self.fric_motors
    }

    pub fn set_fire_mode(&mut self, mode: FireMode) {
        let from = self.fire.fire_mode();
        if self.fire.set_fire_mode(mode) {
            for actuator in &mut self.fric_actuators {
                actuator.reset();
            }
            info!(?from, to = ?mode, "launcher fire mode change");
        }
    }

    pub fn set_trig_mode(&mut self, mode: TrigMode) {
        let from = self.fire.trig_mode();
        if self.fire.set_trig_mode(mode) {
            info!(?from, to = ?mode, "launcher trigger mode change");
        }
    }

    fn update_flags(&mut self) {
        let online = self.heat.is_online();
        self.flags.set(LauncherFlags::REFEREE_OFFLINE, !online);
        self.flags
            .set(LauncherFlags::HEAT_LOCKED, online && self.heat.available() == 0);
        self.flags.set(LauncherFlags::JAMMED, self.fire.is_jammed());
        self.flags.set(
            LauncherFlags::FEED_REVERSING,
            self.fire.last_action() == FeedAction::Reverse,
        );
    }
}

impl<M: Motor + 'static> Subsystem for Launcher<M> {
    type Event = LauncherEvent;
    type Feed = LauncherFeed;
    type Status = LauncherStatus;

    fn name(&self) -> &'static str {
        "launcher"
    }

    fn apply_event(&mut self, event: LauncherEvent) {
        match event {
            LauncherEvent::FireModeRelax => self.set_fire_mode(FireMode::Relax),
            LauncherEvent::FireModeSafe => self.set_fire_mode(FireMode::Safe),
            LauncherEvent::FireModeLoaded => self.set_fire_mode(FireMode::Loaded),
            LauncherEvent::StartFire => {
                if !self.fire.start_fire() {
                    debug!(fire_mode = ?self.fire.fire_mode(), "fire request ignored");
                }
            }
            LauncherEvent::TrigSingle => self.set_trig_mode(TrigMode::Single),
            LauncherEvent::TrigBurst => self.set_trig_mode(TrigMode::Burst),
            LauncherEvent::TrigContinued => self.set_trig_mode(TrigMode::Continued),
            LauncherEvent::TrigStop => self.set_trig_mode(TrigMode::Stop),
            LauncherEvent::TrigCycle => self.set_trig_mode(self.fire.trig_mode().cycled()),
        }
    }

    fn update_feedback(&mut self, feed: &LauncherFeed) {
        self.feed = *feed;

        for (motor, speed) in self.fric_motors.iter_mut().zip(self.fric_speeds.iter_mut()) {
            motor.update();
            *speed = motor.speed();
        }

        self.trig_motor.update();
        self.trig_speed = self.trig_motor.speed();
        let angle = self.trig_motor.angle();
        if let Some(last) = self.last_motor_angle {
            self.trig_angle += wrap_angle(angle - last) / self.config.trig_gear_ratio;
        }
        self.last_motor_angle = Some(angle);
    }

    fn control(&mut self, now_ms: u32, dt: f32) {
        self.heat.update(&self.feed.referee);
        self.fire.tick(now_ms, self.heat.available(), self.trig_angle);
        self.update_flags();

        self.fric_setpoints = match self.fire.fire_mode() {
            FireMode::Loaded => self.config.fric_rpm,
            FireMode::Relax | FireMode::Safe => [0.0; MAX_FRIC_WHEELS],
        };

        if self.fire.fire_mode() == FireMode::Relax {
            self.trig_motor.relax();
            for motor in &mut self.fric_motors {
                motor.relax();
            }
            return;
        }

        let trig_out = self.trig_actuator.calculate(
            self.fire.trig_setpoint(),
            self.trig_speed / TRIG_SPEED_FULL_SCALE,
            self.trig_angle,
            dt,
        );
        self.trig_motor.control(trig_out);

        for i in 0..MAX_FRIC_WHEELS {
            let out =
                self.fric_actuators[i].calculate(self.fric_setpoints[i], self.fric_speeds[i], dt);
            self.fric_motors[i].control(out);
        }
    }

    fn status(&self) -> LauncherStatus {
        LauncherStatus {
            fire_mode: self.fire.fire_mode(),
            trig_mode: self.fire.trig_mode(),
            available_shots: self.heat.available(),
            launched: self.fire.launched(),
            to_launch: self.fire.to_launch(),
            trig_setpoint: self.fire.trig_setpoint(),
            trig_angle: self.trig_angle,
            fric_speed: self.fric_speeds,
            last_action: self.fire.last_action(),
            flags: self.flags,
        }
    }
}
