//! Adaptive interval computation — frequency bands plus daypart adjustments.
//!
//! Busy destinations get wide spacing so the automation does not add to the
//! noise; quiet destinations get even wider spacing so it does not dominate
//! them. Active hours tighten the result, night hours stretch it.

use cadence_core::config::PacingConfig;
use chrono::{DateTime, Duration, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of uniform interval draws. Injected so tests can substitute a
/// deterministic generator without touching global RNG state.
pub trait IntervalSource: Send + Sync {
    /// Uniform draw in `[lo, hi]` seconds.
    fn draw(&self, lo: u64, hi: u64) -> u64;
}

/// Uniform draws from a seedable PRNG.
pub struct UniformSource {
    rng: Mutex<StdRng>,
}

impl UniformSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for UniformSource {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalSource for UniformSource {
    fn draw(&self, lo: u64, hi: u64) -> u64 {
        self.rng
            .lock()
            .expect("interval rng mutex poisoned")
            .gen_range(lo..=hi)
    }
}

/// Always returns the same value, ignoring the requested range. For tests.
pub struct FixedSource(pub u64);

impl IntervalSource for FixedSource {
    fn draw(&self, _lo: u64, _hi: u64) -> u64 {
        self.0
    }
}

/// Computes the required spacing between automated sends into a destination
/// from its observed traffic frequency and the time of day.
pub struct IntervalPlanner {
    config: PacingConfig,
    source: std::sync::Arc<dyn IntervalSource>,
}

impl IntervalPlanner {
    pub fn new(config: PacingConfig, source: std::sync::Arc<dyn IntervalSource>) -> Self {
        Self { config, source }
    }

    /// Base interval band in seconds for a frequency in events/minute.
    /// Bands are half-open on the lower bound; the busiest band wins.
    pub fn base_range(frequency: f64) -> (u64, u64) {
        if frequency > 5.0 {
            (300, 600)
        } else if frequency > 2.0 {
            (180, 360)
        } else if frequency > 0.5 {
            (120, 300)
        } else {
            (600, 1200)
        }
    }

    pub fn is_active_hour(&self, hour: u32) -> bool {
        self.config
            .active_hours
            .iter()
            .any(|&(start, end)| hour >= start && hour < end)
    }

    pub fn is_night_hour(&self, hour: u32) -> bool {
        let (start, end) = self.config.night_hours;
        hour >= start && hour <= end
    }

    /// Required spacing given a frequency estimate and the current time.
    /// Both daypart adjustments stack if the configured windows overlap;
    /// the result never drops below the configured floor.
    pub fn required_interval(&self, frequency: f64, now: DateTime<Utc>) -> Duration {
        let (lo, hi) = Self::base_range(frequency);
        let mut secs = self.source.draw(lo, hi) as f64;

        let hour = now.hour();
        if self.is_active_hour(hour) {
            secs *= self.config.active_hour_factor;
        }
        if self.is_night_hour(hour) {
            secs *= self.config.night_hour_factor;
        }

        Duration::seconds(secs.max(self.config.min_interval_floor_secs as f64).round() as i64)
    }
}
