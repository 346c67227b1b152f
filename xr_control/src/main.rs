//! # XR Control
//!
//! Runs the chassis, launcher and gimbal control loops against simulated
//! motors. One thread per subsystem, plus an operator thread that plays a
//! scripted sequence of switch and mouse events and stick commands.
//!
//! Configuration comes from a single TOML file; a missing file means the
//! built-in defaults.

use std::error::Error;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use xr_common::control::event::{
    CHASSIS_BINDINGS, EV_KEY_G, EV_MOUSE_LEFT, EV_SW_L_DOWN, EV_SW_L_MID, EV_SW_L_UP,
    EV_SW_R_DOWN, EV_SW_R_MID, EV_SW_R_UP, EventId, GIMBAL_BINDINGS, LAUNCHER_BINDINGS,
};
use xr_common::prelude::*;
use xr_control::chassis::{Chassis, ChassisInputs};
use xr_control::config::load_or_default;
use xr_control::controller::{EventError, EventTable, Subsystem, SubsystemHandle};
use xr_control::cycle::{Clock, ControlLoop, Ingest, MonotonicClock, rt_setup};
use xr_control::gimbal::{Gimbal, GimbalInputs};
use xr_control::launcher::{Launcher, LauncherInputs};
use xr_control::sim::{SimMotor, SimMotorParams};
use xr_control::topic::Topic;

/// XR Control: actuation-control core on simulated motors
#[derive(Parser, Debug)]
#[command(name = "xr_control")]
#[command(version)]
#[command(about = "Mode/event controller and control loops for chassis, launcher and gimbal")]
struct Args {
    /// Path to the robot configuration TOML.
    #[arg(long, default_value = "config/robot.toml")]
    config: PathBuf,

    /// Seed for the rotor spin-direction draw (default: from entropy).
    #[arg(long)]
    seed: Option<u64>,

    /// CPU core to pin the control threads to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

/// Operator script: (offset into the loop [ms], event-bus id).
const DEMO_SCRIPT: &[(u64, EventId)] = &[
    (500, EV_SW_L_MID),
    (1_000, EV_SW_R_MID),
    (1_500, EV_SW_R_UP),
    (3_000, EV_MOUSE_LEFT),
    (4_000, EV_KEY_G),
    (4_500, EV_MOUSE_LEFT),
    (6_000, EV_SW_L_UP),
    (9_000, EV_SW_L_MID),
    (10_000, EV_SW_R_DOWN),
    (10_500, EV_SW_L_DOWN),
];
const DEMO_PERIOD_MS: u64 = 12_000;
const DEMO_STEP: Duration = Duration::from_millis(10);

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("XR Control v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("XR Control shutdown complete");
}

/// Input topics shared between the operator thread and the control loops.
#[derive(Clone)]
struct Topics {
    chassis_cmd: Topic<ChassisCommand>,
    gimbal_cmd: Topic<GimbalCommand>,
    heading: Topic<Heading>,
    cap: Topic<CapInfo>,
    referee: Topic<RefereeData>,
    eulr: Topic<Eulr>,
    gyro: Topic<Gyro>,
}

impl Topics {
    fn new() -> Self {
        Self {
            chassis_cmd: Topic::new("cmd_chassis"),
            gimbal_cmd: Topic::new("cmd_gimbal"),
            heading: Topic::new("chassis_yaw"),
            cap: Topic::new("cap_info"),
            referee: Topic::new("referee"),
            eulr: Topic::new("imu_eulr"),
            gyro: Topic::new("imu_gyro"),
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = load_or_default(&args.config)?;
    info!(
        "Config OK: service={}, cycle_time={}µs, mixer={:?}",
        config.shared.service_name, config.control.cycle_time_us, config.chassis.mixer,
    );

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let period_us = config.control.cycle_time_us;
    let step_s = config.control.period_s();
    let topics = Topics::new();

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let wheels = std::array::from_fn(|_| SimMotor::new("wheel", SimMotorParams::M3508, step_s));
    let chassis = SubsystemHandle::new(Chassis::new(&config.chassis, wheels, rng));

    let launcher = SubsystemHandle::new(Launcher::new(
        &config.launcher,
        SimMotor::new("trig", SimMotorParams::M2006, step_s),
        [
            SimMotor::new("fric0", SimMotorParams::M3508, step_s),
            SimMotor::new("fric1", SimMotorParams::M3508, step_s),
        ],
    ));

    let gimbal = SubsystemHandle::new(Gimbal::new(
        &config.gimbal,
        SimMotor::new("yaw", SimMotorParams::GM6020, step_s),
        SimMotor::new("pit", SimMotorParams::GM6020, step_s),
        topics.heading.clone(),
    ));

    let chassis_loop = ControlLoop::new(
        chassis.clone(),
        ChassisInputs::new(
            &topics.chassis_cmd,
            &topics.heading,
            &topics.cap,
            &topics.referee,
        ),
        MonotonicClock::new(),
        period_us,
    );
    let launcher_loop = ControlLoop::new(
        launcher.clone(),
        LauncherInputs::new(&topics.referee),
        MonotonicClock::new(),
        period_us,
    );
    let gimbal_loop = ControlLoop::new(
        gimbal.clone(),
        GimbalInputs::new(&topics.gimbal_cmd, &topics.eulr, &topics.gyro),
        MonotonicClock::new(),
        period_us,
    );

    let operator = Operator {
        chassis,
        launcher,
        gimbal,
        chassis_table: EventTable::new(CHASSIS_BINDINGS)?,
        launcher_table: EventTable::new(LAUNCHER_BINDINGS)?,
        gimbal_table: EventTable::new(GIMBAL_BINDINGS)?,
        chassis_status: chassis_loop.status_topic(),
        launcher_status: launcher_loop.status_topic(),
        gimbal_status: gimbal_loop.status_topic(),
        topics,
    };

    let _threads = [
        spawn_loop("chassis", chassis_loop)?,
        spawn_loop("launcher", launcher_loop)?,
        spawn_loop("gimbal", gimbal_loop)?,
        thread::Builder::new()
            .name("operator".to_string())
            .spawn(move || operator.run())?,
    ];
    info!("Control loops running, press Ctrl-C to stop");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }
    Ok(())
}

fn spawn_loop<S, I, C>(
    name: &str,
    control_loop: ControlLoop<S, I, C>,
) -> std::io::Result<JoinHandle<()>>
where
    S: Subsystem,
    I: Ingest<Feed = S::Feed> + 'static,
    C: Clock + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || drive(control_loop))
}

fn drive<S, I, C>(control_loop: ControlLoop<S, I, C>)
where
    S: Subsystem,
    I: Ingest<Feed = S::Feed>,
    C: Clock,
{
    control_loop.run_forever()
}

// ─── Scripted Operator ──────────────────────────────────────────────

struct Operator {
    chassis: SubsystemHandle<Chassis<SimMotor>>,
    launcher: SubsystemHandle<Launcher<SimMotor>>,
    gimbal: SubsystemHandle<Gimbal<SimMotor>>,
    chassis_table: EventTable<ChassisEvent>,
    launcher_table: EventTable<LauncherEvent>,
    gimbal_table: EventTable<GimbalEvent>,
    chassis_status: Topic<ChassisStatus>,
    launcher_status: Topic<LauncherStatus>,
    gimbal_status: Topic<GimbalStatus>,
    topics: Topics,
}

impl Operator {
    fn run(self) {
        let start = Instant::now();
        let mut next_event = 0usize;
        let mut last_report_s = 0u64;
        let mut last_lap = 0u64;

        loop {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            let lap = elapsed_ms / DEMO_PERIOD_MS;
            let offset = elapsed_ms % DEMO_PERIOD_MS;
            if lap != last_lap {
                last_lap = lap;
                next_event = 0;
            }

            while let Some(&(at, id)) = DEMO_SCRIPT.get(next_event) {
                if at > offset {
                    break;
                }
                self.dispatch(id);
                next_event += 1;
            }

            self.publish_inputs(elapsed_ms);

            let elapsed_s = elapsed_ms / 1_000;
            if elapsed_s != last_report_s {
                last_report_s = elapsed_s;
                self.report();
            }

            thread::sleep(DEMO_STEP);
        }
    }

    fn dispatch(&self, id: EventId) {
        let results = [
            self.chassis_table.dispatch(id, &self.chassis),
            self.launcher_table.dispatch(id, &self.launcher),
            self.gimbal_table.dispatch(id, &self.gimbal),
        ];
        let handled = results.iter().filter(|r| matches!(r, Ok(true))).count();
        debug!(id, handled, "operator event");
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            match err {
                // Already logged by `post`; the scripted operator just drops
                // the event and carries on.
                EventError::QueueFull(_) => {}
                other => warn!("event dispatch failed: {other}"),
            }
        }
    }

    fn publish_inputs(&self, elapsed_ms: u64) {
        let t = elapsed_ms as f32 * 1e-3;
        self.topics.chassis_cmd.publish(ChassisCommand {
            x: 0.5 * (0.5 * t).sin(),
            y: 0.3 * (0.3 * t).cos(),
            z: 0.0,
        });
        self.topics.gimbal_cmd.publish(GimbalCommand {
            yaw: 0.2 * (0.25 * t).sin(),
            pit: 0.1 * (0.4 * t).sin(),
            kind: GimbalCommandKind::Relative,
        });

        // Ideal IMU stand-in: attitude follows the gimbal setpoint.
        let gimbal = self.gimbal_status.latest();
        self.topics.eulr.publish(Eulr {
            yaw: gimbal.setpoint_yaw,
            pit: gimbal.setpoint_pit,
            rol: 0.0,
        });
        self.topics.gyro.publish(Gyro::default());
        self.topics.cap.publish(CapInfo::default());
        self.topics.referee.publish(RefereeData::default());
    }

    fn report(&self) {
        let chassis = self.chassis_status.latest();
        let launcher = self.launcher_status.latest();
        let gimbal = self.gimbal_status.latest();
        info!(
            chassis_mode = ?chassis.mode,
            power_w = chassis.modeled_power,
            budget_w = chassis.power_budget,
            fire_mode = ?launcher.fire_mode,
            trig_mode = ?launcher.trig_mode,
            shots = launcher.available_shots,
            feed = ?launcher.last_action,
            gimbal_mode = ?gimbal.mode,
            relative_yaw = gimbal.relative_yaw,
            "status"
        );

        let snapshot = serde_json::json!({
            "chassis": chassis,
            "launcher": launcher,
            "gimbal": gimbal,
        });
        debug!(%snapshot, "status snapshot");
    }
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
