//! Chassis subsystem.
//!
//! Per cycle: motion law for the active mode → kinematic mixer → per-wheel
//! speed actuators → power limiter → motor commands. RELAX keeps computing
//! the motion vector but releases every motor.

pub mod law;
pub mod mixer;
pub mod power;

use rand::RngCore;
use tracing::{debug, info};

use xr_common::consts::{MAX_WHEELS, MOTOR_MAX_ROTATIONAL_SPEED};
use xr_common::control::config::ChassisConfig;
use xr_common::control::event::ChassisEvent;
use xr_common::control::input::{CapInfo, ChassisCommand, Heading, RefereeData};
use xr_common::control::state::{ChassisMode, PowerMode};
use xr_common::control::status::{ChassisFlags, ChassisStatus, MoveVector};

use crate::actuator::{PidSpeedActuator, SpeedActuator};
use crate::controller::Subsystem;
use crate::cycle::Ingest;
use crate::motor::Motor;
use crate::topic::{Subscriber, Topic};

use self::law::{MotionContext, MotionLoops, law_for};
use self::mixer::Mixer;
use self::power::{PowerModel, limit_output_power, select_budget};

/// External inputs of the chassis, refreshed once per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChassisFeed {
    pub cmd: ChassisCommand,
    pub heading: Heading,
    pub cap: CapInfo,
    pub referee: RefereeData,
}

/// Topic subscriptions feeding [`ChassisFeed`].
#[derive(Debug)]
pub struct ChassisInputs {
    cmd: Subscriber<ChassisCommand>,
    heading: Subscriber<Heading>,
    cap: Subscriber<CapInfo>,
    referee: Subscriber<RefereeData>,
}

impl ChassisInputs {
    pub fn new(
        cmd: &Topic<ChassisCommand>,
        heading: &Topic<Heading>,
        cap: &Topic<CapInfo>,
        referee: &Topic<RefereeData>,
    ) -> Self {
        Self {
            cmd: cmd.subscribe(),
            heading: heading.subscribe(),
            cap: cap.subscribe(),
            referee: referee.subscribe(),
        }
    }
}

impl Ingest for ChassisInputs {
    type Feed = ChassisFeed;

    fn ingest(&mut self, feed: &mut ChassisFeed) {
        self.cmd.dump(&mut feed.cmd);
        self.heading.dump(&mut feed.heading);
        self.cap.dump(&mut feed.cap);
        self.referee.dump(&mut feed.referee);
    }
}

pub struct Chassis<M: Motor> {
    config: ChassisConfig,
    mixer: Mixer,
    power: PowerModel,
    mode: ChassisMode,
    power_mode: PowerMode,
    wheels: [M; MAX_WHEELS],
    actuators: [PidSpeedActuator; MAX_WHEELS],
    loops: MotionLoops,
    rng: Box<dyn RngCore + Send>,
    spin_dir: f32,
    feed: ChassisFeed,
    move_vec: MoveVector,
    /// Wheel speed fractions from the mixer.
    setpoints: [f32; MAX_WHEELS],
    outputs: [f32; MAX_WHEELS],
    /// Measured wheel speeds [rpm].
    speeds: [f32; MAX_WHEELS],
    modeled_power: f32,
    budget: f32,
    flags: ChassisFlags,
}

impl<M: Motor> Chassis<M> {
    /// `rng` decides the spin direction each time ROTOR is entered.
    pub fn new(
        config: &ChassisConfig,
        wheels: [M; MAX_WHEELS],
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        let wheel_actuator = PidSpeedActuator::new(&config.wheel);
        Self {
            config: config.clone(),
            mixer: Mixer::from(config.mixer),
            power: PowerModel::from(&config.power),
            mode: ChassisMode::default(),
            power_mode: PowerMode::default(),
            wheels,
            actuators: core::array::from_fn(|_| wheel_actuator.clone()),
            loops: MotionLoops::new(config),
            rng: Box::new(rng),
            spin_dir: 1.0,
            feed: ChassisFeed::default(),
            move_vec: MoveVector::default(),
            setpoints: [0.0; MAX_WHEELS],
            outputs: [0.0; MAX_WHEELS],
            speeds: [0.0; MAX_WHEELS],
            modeled_power: 0.0,
            budget: config.fallback_power_limit,
            flags: ChassisFlags::REFEREE_OFFLINE,
        }
    }

    #[inline]
    pub fn mode(&self) -> ChassisMode {
        self.mode
    }

    #[inline]
    pub fn power_mode(&self) -> PowerMode {
        self.power_mode
    }

    #[inline]
    pub fn spin_dir(&self) -> f32 {
        self.spin_dir
    }

    #[inline]
    pub fn move_vec(&self) -> MoveVector {
        self.move_vec
    }

    #[inline]
    pub fn setpoints(&self) -> &[f32; MAX_WHEELS] {
        &self.setpoints
    }

    #[inline]
    pub fn outputs(&self) -> &[f32; MAX_WHEELS] {
        &self.outputs
    }

    pub fn wheels(&self) -> &[M; MAX_WHEELS] {
        &self.wheels
    }

    pub fn wheels_mut(&mut self) -> &mut [M; MAX_WHEELS] {
        &mut self.wheels
    }

    /// Switch mode. Selecting the current mode changes nothing.
    pub fn set_mode(&mut self, mode: ChassisMode) {
        if mode == self.mode {
            return;
        }

        if mode == ChassisMode::Rotor {
            self.spin_dir = if self.rng.next_u32() & 1 == 0 { -1.0 } else { 1.0 };
        }

        for actuator in &mut self.actuators {
            actuator.reset();
        }
        self.loops.reset();

        if mode == ChassisMode::Relax {
            self.move_vec = MoveVector::default();
            self.setpoints = [0.0; MAX_WHEELS];
        }

        info!(from = ?self.mode, to = ?mode, spin_dir = self.spin_dir, "chassis mode change");
        self.mode = mode;
    }

    pub fn set_power_mode(&mut self, power_mode: PowerMode) {
        if power_mode != self.power_mode {
            info!(from = ?self.power_mode, to = ?power_mode, "chassis power mode change");
            self.power_mode = power_mode;
        }
    }

    fn update_flags(&mut self, scaled: bool) {
        if scaled && !self.flags.contains(ChassisFlags::POWER_LIMITED) {
            debug!(
                modeled_w = self.modeled_power,
                budget_w = self.budget,
                "chassis output scaled by power limit"
            );
        }
        self.flags.set(ChassisFlags::POWER_LIMITED, scaled);
        self.flags.set(ChassisFlags::CAP_ONLINE, self.feed.cap.online);
        self.flags
            .set(ChassisFlags::REFEREE_OFFLINE, !self.feed.referee.status.is_running());
    }
}

impl<M: Motor + 'static> Subsystem for Chassis<M> {
    type Event = ChassisEvent;
    type Feed = ChassisFeed;
    type Status = ChassisStatus;

    fn name(&self) -> &'static str {
        "chassis"
    }

    fn apply_event(&mut self, event: ChassisEvent) {
        match event {
            ChassisEvent::SetModeRelax => self.set_mode(ChassisMode::Relax),
            ChassisEvent::SetModeBreak => self.set_mode(ChassisMode::Break),
            ChassisEvent::SetModeFollow => self.set_mode(ChassisMode::Follow),
            ChassisEvent::SetModeRotor => self.set_mode(ChassisMode::Rotor),
            ChassisEvent::SetModeIndependent => self.set_mode(ChassisMode::Independent),
            ChassisEvent::PowerNormal => self.set_power_mode(PowerMode::Normal),
            ChassisEvent::PowerBoost => self.set_power_mode(PowerMode::Boost),
        }
    }

    fn update_feedback(&mut self, feed: &ChassisFeed) {
        self.feed = *feed;
        for (wheel, speed) in self.wheels.iter_mut().zip(self.speeds.iter_mut()) {
            wheel.update();
            *speed = wheel.speed();
        }
    }

    fn control(&mut self, now_ms: u32, dt: f32) {
        let ctx = MotionContext {
            config: &self.config,
            cmd: self.feed.cmd,
            yaw: self.feed.heading.yaw,
            now_ms,
            dt,
            spin_dir: self.spin_dir,
            prev: self.move_vec,
        };
        self.move_vec = law_for(self.mode).compute(&ctx, &mut self.loops);
        self.setpoints = self.mixer.apply(&self.move_vec);

        self.budget = select_budget(
            &self.config,
            self.power_mode,
            &self.feed.cap,
            &self.feed.referee,
        );

        if self.mode == ChassisMode::Relax {
            for wheel in &mut self.wheels {
                wheel.relax();
            }
            self.outputs = [0.0; MAX_WHEELS];
            self.modeled_power = 0.0;
            self.update_flags(false);
            return;
        }

        for i in 0..MAX_WHEELS {
            self.outputs[i] = self.actuators[i].calculate(
                self.setpoints[i] * MOTOR_MAX_ROTATIONAL_SPEED,
                self.speeds[i],
                dt,
            );
        }

        let limit = limit_output_power(&self.power, self.budget, &mut self.outputs, &self.speeds);
        self.modeled_power = match limit.modeled() {
            Some(modeled) => modeled,
            None => self.power.total(&self.outputs, &self.speeds),
        };
        self.update_flags(limit.is_scaled());

        for (wheel, &out) in self.wheels.iter_mut().zip(&self.outputs) {
            wheel.control(out);
        }
    }

    fn status(&self) -> ChassisStatus {
        ChassisStatus {
            mode: self.mode,
            power_mode: self.power_mode,
            yaw: self.feed.heading.yaw,
            move_vec: self.move_vec,
            wheel_out: self.outputs,
            modeled_power: self.modeled_power,
            power_budget: self.budget,
            flags: self.flags,
        }
    }
}
