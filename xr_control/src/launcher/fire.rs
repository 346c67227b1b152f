//! Fire-control state machine.
//!
//! Pure logic, no motors: the launcher feeds it the heat allowance, the
//! measured feed-wheel angle and the time, and reads back the feed setpoint.
//!
//! Per tick:
//! 1. [`FireControl::schedule`] arms a burst on a rising fire edge, closes a
//!    finished burst and picks the inter-shot delay.
//! 2. [`FireControl::feed`] steps the feed wheel once the delay has elapsed,
//!    or runs the jam policy when the last step did not travel far enough.
//!
//! Jams alternate between stepping back one tooth and re-attempting the
//! forward step, indefinitely. Without reversing the feed just stays put.

use tracing::{debug, warn};

use xr_common::consts::JAM_TRAVEL_RATIO;
use xr_common::control::config::LauncherConfig;
use xr_common::control::state::{FireMode, TrigMode};
use xr_common::control::status::FeedAction;

use super::trigger::TrigPolicy;

#[derive(Debug, Clone)]
pub struct FireControl {
    fire_mode: FireMode,
    trig_mode: TrigMode,
    fire: bool,
    last_fire: bool,
    launched: u32,
    to_launch: u32,
    /// `None` = never feed.
    delay_ms: Option<u32>,
    last_launch_ms: u32,
    /// Feed setpoint before the last commanded step. Unknown until the
    /// first step.
    last_trig_angle: Option<f32>,
    trig_setpoint: f32,
    /// Next jam reverses when set, retries forward when clear.
    stall: bool,
    jammed: bool,
    last_action: FeedAction,

    step: f32,
    min_delay_ms: u32,
    allow_reverse: bool,
    burst_count: u32,
}

impl FireControl {
    pub fn new(config: &LauncherConfig) -> Self {
        Self {
            fire_mode: FireMode::default(),
            trig_mode: TrigMode::default(),
            fire: false,
            last_fire: false,
            launched: 0,
            to_launch: 0,
            delay_ms: None,
            last_launch_ms: 0,
            last_trig_angle: None,
            trig_setpoint: 0.0,
            stall: true,
            jammed: false,
            last_action: FeedAction::Hold,
            step: config.trig_step(),
            min_delay_ms: config.min_launch_delay_ms,
            allow_reverse: config.allow_reverse,
            burst_count: config.burst_count,
        }
    }

    // ─── Events ─────────────────────────────────────────────────────

    /// Returns `true` if the mode changed. A change drops any latched fire
    /// request; entering LOADED also discards a pending burst.
    pub fn set_fire_mode(&mut self, mode: FireMode) -> bool {
        if mode == self.fire_mode {
            return false;
        }
        self.fire = false;
        if mode == FireMode::Loaded {
            self.to_launch = 0;
        }
        self.fire_mode = mode;
        true
    }

    pub fn set_trig_mode(&mut self, mode: TrigMode) -> bool {
        if mode == self.trig_mode {
            return false;
        }
        self.trig_mode = mode;
        true
    }

    /// Latch a fire request. Ignored unless LOADED.
    pub fn start_fire(&mut self) -> bool {
        if self.fire_mode == FireMode::Loaded {
            self.fire = true;
        }
        self.fire
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Run one tick: [`schedule`](Self::schedule) then [`feed`](Self::feed).
    pub fn tick(&mut self, now_ms: u32, available: u32, trig_angle: f32) -> FeedAction {
        self.schedule(available);
        self.feed(now_ms, trig_angle)
    }

    /// Arm or close bursts and choose the feed delay.
    pub fn schedule(&mut self, available: u32) {
        let policy = TrigPolicy::for_mode(self.trig_mode, self.burst_count, available);

        if policy.edge_armed {
            let rising = self.fire && !self.last_fire;
            self.last_fire = self.fire;

            if rising && self.to_launch == 0 {
                self.to_launch = policy.max_burst.min(available.saturating_sub(self.launched));
                debug!(
                    to_launch = self.to_launch,
                    available,
                    trig_mode = ?self.trig_mode,
                    "burst armed"
                );
            }

            if self.launched >= self.to_launch {
                self.delay_ms = None;
                self.launched = 0;
                self.to_launch = 0;
                self.fire = false;
            } else {
                self.delay_ms = Some(self.min_delay_ms);
            }
        } else {
            self.last_fire = self.fire;
            self.launched = 0;
            self.to_launch = 0;
            self.delay_ms = (policy.max_burst > 0).then_some(self.min_delay_ms);
        }

        if self.fire_mode != FireMode::Loaded {
            self.delay_ms = None;
        }
    }

    /// Step the feed wheel if the delay has elapsed.
    ///
    /// `trig_angle` is the measured feed-wheel angle [rad]. Feeding moves the
    /// setpoint in the negative direction.
    pub fn feed(&mut self, now_ms: u32, trig_angle: f32) -> FeedAction {
        let Some(delay) = self.delay_ms else {
            return FeedAction::Hold;
        };
        if now_ms.wrapping_sub(self.last_launch_ms) < delay {
            return FeedAction::Hold;
        }

        let travel = self
            .last_trig_angle
            .map(|last| (last - trig_angle) / self.step);

        let action = match travel {
            Some(travel) if travel < JAM_TRAVEL_RATIO => self.clear_jam(now_ms, travel),
            _ => {
                self.last_trig_angle = Some(self.trig_setpoint);
                self.trig_setpoint -= self.step;
                if self.trig_mode != TrigMode::Continued {
                    self.launched += 1;
                }
                self.last_launch_ms = now_ms;
                self.jammed = false;
                FeedAction::Advance
            }
        };
        self.last_action = action;
        action
    }

    fn clear_jam(&mut self, now_ms: u32, travel: f32) -> FeedAction {
        if !self.jammed {
            warn!(travel, setpoint = self.trig_setpoint, "feed jam detected");
        }
        self.jammed = true;

        if !self.allow_reverse {
            return FeedAction::Blocked;
        }

        let action = if self.stall {
            let failed = self.trig_setpoint;
            self.trig_setpoint = self.last_trig_angle.unwrap_or(failed);
            self.last_trig_angle = Some(failed);
            self.stall = false;
            FeedAction::Reverse
        } else {
            self.last_trig_angle = Some(self.trig_setpoint);
            self.trig_setpoint -= self.step;
            self.stall = true;
            FeedAction::Retry
        };
        self.last_launch_ms = now_ms;
        debug!(?action, setpoint = self.trig_setpoint, "feed jam recovery");
        action
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub fn fire_mode(&self) -> FireMode {
        self.fire_mode
    }

    #[inline]
    pub fn trig_mode(&self) -> TrigMode {
        self.trig_mode
    }

    #[inline]
    pub fn is_firing(&self) -> bool {
        self.fire
    }

    #[inline]
    pub fn launched(&self) -> u32 {
        self.launched
    }

    #[inline]
    pub fn to_launch(&self) -> u32 {
        self.to_launch
    }

    #[inline]
    pub fn delay_ms(&self) -> Option<u32> {
        self.delay_ms
    }

    #[inline]
    pub fn trig_setpoint(&self) -> f32 {
        self.trig_setpoint
    }

    #[inline]
    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    /// Last non-idle feed outcome.
    #[inline]
    pub fn last_action(&self) -> FeedAction {
        self.last_action
    }

    #[inline]
    pub fn step(&self) -> f32 {
        self.step
    }
}
