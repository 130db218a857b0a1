//! Send gate — per-destination admission decisions for automated sends.

use crate::activity::ActivityTracker;
use crate::pacing::IntervalPlanner;
use cadence_core::clock::Clock;
use cadence_core::types::{ActorId, DestinationId};
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a send was denied. Deny outcomes are values, never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("destination banned")]
    Banned,
    #[error("actor sent the last message; awaiting a reply from someone else")]
    Consecutive,
    #[error("cooldown active, {remaining_secs}s remaining")]
    Cooldown { remaining_secs: i64 },
}

/// Outcome of a `can_send` check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn reason(&self) -> String {
        match self {
            Decision::Allowed => "ok".to_string(),
            Decision::Denied(denial) => denial.to_string(),
        }
    }
}

/// Diagnostic snapshot of a destination's pacing state.
#[derive(Debug, Clone, Serialize)]
pub struct DestinationStats {
    pub frequency: f64,
    /// A sample interval draw under the current frequency and hour; the
    /// gate redraws on every check, so this is indicative, not binding.
    pub planned_interval_secs: i64,
    pub last_sender: Option<ActorId>,
    pub retained_events: usize,
    pub banned: bool,
    pub last_sent_at: Option<DateTime<Utc>>,
}

/// Decides whether an automated send into a destination is currently
/// permitted. Checks run in a fixed short-circuit order: ban list, then the
/// anti-monologue rule, then the adaptive cooldown.
pub struct SendGate {
    tracker: Arc<ActivityTracker>,
    planner: IntervalPlanner,
    clock: Arc<dyn Clock>,
    cooldowns: DashMap<DestinationId, DateTime<Utc>>,
    banned: DashSet<DestinationId>,
}

impl SendGate {
    pub fn new(tracker: Arc<ActivityTracker>, planner: IntervalPlanner, clock: Arc<dyn Clock>) -> Self {
        Self {
            tracker,
            planner,
            clock,
            cooldowns: DashMap::new(),
            banned: DashSet::new(),
        }
    }

    /// Check whether `actor` may send into `destination` right now.
    pub fn can_send(&self, destination: DestinationId, actor: ActorId) -> Decision {
        if self.banned.contains(&destination) {
            return Decision::Denied(Denial::Banned);
        }

        if self.tracker.last_sender(destination) == Some(actor) {
            return Decision::Denied(Denial::Consecutive);
        }

        if let Some(last_sent) = self.cooldowns.get(&destination).map(|e| *e) {
            let now = self.clock.now();
            let required = self
                .planner
                .required_interval(self.tracker.frequency(destination), now);
            let elapsed = now - last_sent;
            if elapsed < required {
                return Decision::Denied(Denial::Cooldown {
                    remaining_secs: (required - elapsed).num_seconds().max(1),
                });
            }
        }

        Decision::Allowed
    }

    /// Record a confirmed send. Stamps the cooldown and feeds the send back
    /// into the activity log so the anti-monologue rule sees it. Call
    /// exactly once per delivered message, after the transport confirms.
    pub fn mark_sent(&self, destination: DestinationId, actor: ActorId) {
        self.cooldowns.insert(destination, self.clock.now());
        self.tracker.record(destination, actor);
        debug!(%destination, %actor, "send recorded, cooldown started");
    }

    /// Permanently exclude a destination for the process lifetime.
    /// Idempotent.
    pub fn ban(&self, destination: DestinationId) {
        if self.banned.insert(destination) {
            warn!(%destination, "destination banned for the session");
        }
    }

    pub fn is_banned(&self, destination: DestinationId) -> bool {
        self.banned.contains(&destination)
    }

    pub fn stats(&self, destination: DestinationId) -> DestinationStats {
        let frequency = self.tracker.frequency(destination);
        DestinationStats {
            frequency,
            planned_interval_secs: self
                .planner
                .required_interval(frequency, self.clock.now())
                .num_seconds(),
            last_sender: self.tracker.last_sender(destination),
            retained_events: self.tracker.retained_events(destination),
            banned: self.is_banned(destination),
            last_sent_at: self.cooldowns.get(&destination).map(|e| *e),
        }
    }
}
