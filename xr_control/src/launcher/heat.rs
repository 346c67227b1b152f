//! Heat budget: how many projectiles may still be released before the
//! barrel heat limit is reached.
//!
//! Referee heat telemetry arrives late and repeats, so the allowance is only
//! recomputed when the reading changed, the allowance ran out, or the
//! reading is zero. With the link down a fixed allowance is assumed.

use xr_common::control::input::RefereeData;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatBudget {
    heat_increase: f32,
    fallback_shots: u32,
    heat: f32,
    last_heat: f32,
    heat_limit: f32,
    cooling_rate: f32,
    available: u32,
    online: bool,
}

impl HeatBudget {
    pub fn new(heat_increase: f32, fallback_shots: u32) -> Self {
        Self {
            heat_increase,
            fallback_shots,
            heat: 0.0,
            last_heat: 0.0,
            heat_limit: 0.0,
            cooling_rate: 0.0,
            available: fallback_shots,
            online: false,
        }
    }

    /// Refresh from telemetry. Returns `true` when the allowance was
    /// recomputed from a heat reading.
    pub fn update(&mut self, referee: &RefereeData) -> bool {
        self.online = referee.status.is_running();
        if !self.online {
            self.available = self.fallback_shots;
            return false;
        }

        self.heat = referee.shooter_heat;
        self.heat_limit = referee.shooter_heat_limit;
        self.cooling_rate = referee.cooling_rate;

        if self.heat != self.last_heat || self.available == 0 || self.heat == 0.0 {
            let headroom = (self.heat_limit - self.heat).max(0.0);
            self.available = (headroom / self.heat_increase).floor() as u32;
            self.last_heat = self.heat;
            return true;
        }
        false
    }

    /// Projectiles that fit in the remaining heat.
    #[inline]
    pub fn available(&self) -> u32 {
        self.available
    }

    /// Telemetry was live at the last update.
    #[inline]
    pub fn is_online(&self) -> bool {
        self.online
    }

    #[inline]
    pub fn heat(&self) -> f32 {
        self.heat
    }

    #[inline]
    pub fn cooling_rate(&self) -> f32 {
        self.cooling_rate
    }
}
