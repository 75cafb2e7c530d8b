use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler ticks in one second of game time
pub const TICKS_PER_SECOND: u32 = 20;

/// How seconds of countdown time translate into scheduler ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Ticks in one second (default: 20)
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,

    /// Speed multiplier applied to every tick count (default: 1.0)
    ///
    /// Values below 1.0 make countdowns run faster, which is handy on test
    /// servers.
    #[serde(default = "default_tick_multiplier")]
    pub tick_multiplier: f64,
}

fn default_ticks_per_second() -> u32 {
    TICKS_PER_SECOND
}

fn default_tick_multiplier() -> f64 {
    1.0
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: TICKS_PER_SECOND,
            tick_multiplier: 1.0,
        }
    }
}

impl TickConfig {
    /// Ticks to request for a delay of `seconds`
    ///
    /// Never returns zero for a positive delay, so a rescheduling countdown
    /// always lets the clock move.
    pub fn ticks_for_seconds(&self, seconds: i64) -> u64 {
        if seconds <= 0 {
            return 0;
        }
        let base = seconds as f64 * f64::from(self.ticks_per_second);
        let scaled = (base * self.tick_multiplier) as u64;
        scaled.max(1)
    }

    /// Wall-clock length of one tick
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.ticks_per_second.max(1)
    }
}
