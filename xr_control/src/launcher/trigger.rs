//! Feed cadence policy per trigger mode.

use xr_common::control::state::TrigMode;

/// How a trigger mode arms the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrigPolicy {
    /// Upper bound on projectiles per arming.
    pub max_burst: u32,
    /// Armed on a rising fire edge. Otherwise the feed runs whenever
    /// `max_burst > 0`.
    pub edge_armed: bool,
}

impl TrigPolicy {
    pub const fn for_mode(mode: TrigMode, burst_count: u32, available: u32) -> Self {
        match mode {
            TrigMode::Single => Self::edge(1),
            TrigMode::Burst => Self::edge(burst_count),
            TrigMode::Stop => Self::edge(0),
            TrigMode::Continued => Self {
                max_burst: available,
                edge_armed: false,
            },
        }
    }

    const fn edge(max_burst: u32) -> Self {
        Self {
            max_burst,
            edge_armed: true,
        }
    }
}
