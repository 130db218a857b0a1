//! Adaptive send-rate controller — per-destination activity tracking and an
//! admission gate for automated sends (cooldowns, anti-monologue rule,
//! daypart-adjusted adaptive intervals, ban list).

pub mod activity;
pub mod controller;
pub mod gate;
pub mod pacing;

pub use activity::ActivityTracker;
pub use controller::Controller;
pub use gate::{Decision, Denial, DestinationStats, SendGate};
pub use pacing::{FixedSource, IntervalPlanner, IntervalSource, UniformSource};
