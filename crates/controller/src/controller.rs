//! Controller facade — one activity tracker and gate pair per sending
//! persona. Callers hold an explicit instance; there is no process-wide
//! singleton, so several personas can run independent controllers.

use crate::activity::ActivityTracker;
use crate::gate::{Decision, DestinationStats, SendGate};
use crate::pacing::{IntervalPlanner, IntervalSource, UniformSource};
use cadence_core::clock::{Clock, SystemClock};
use cadence_core::config::PacingConfig;
use cadence_core::types::{ActorId, DestinationId};
use chrono::{DateTime, Timelike, Utc};
use std::sync::Arc;

pub struct Controller {
    tracker: Arc<ActivityTracker>,
    gate: SendGate,
    planner: IntervalPlanner,
    clock: Arc<dyn Clock>,
}

impl Controller {
    pub fn new(
        config: &PacingConfig,
        clock: Arc<dyn Clock>,
        source: Arc<dyn IntervalSource>,
    ) -> Self {
        let tracker = Arc::new(ActivityTracker::new(config, clock.clone()));
        let gate = SendGate::new(
            tracker.clone(),
            IntervalPlanner::new(config.clone(), source.clone()),
            clock.clone(),
        );
        Self {
            tracker,
            gate,
            planner: IntervalPlanner::new(config.clone(), source),
            clock,
        }
    }

    /// Wall clock and an entropy-seeded interval source.
    pub fn with_defaults(config: &PacingConfig) -> Self {
        Self::new(
            config,
            Arc::new(SystemClock),
            Arc::new(UniformSource::new()),
        )
    }

    /// Feed an externally observed message into the activity log. The
    /// transport layer calls this for every message seen in a monitored
    /// destination, including the automation's own if it does not
    /// deduplicate them.
    pub fn on_message_observed(
        &self,
        destination: DestinationId,
        sender: ActorId,
        timestamp: DateTime<Utc>,
    ) {
        self.tracker.record_at(destination, sender, timestamp);
    }

    pub fn can_send(&self, destination: DestinationId, actor: ActorId) -> Decision {
        self.gate.can_send(destination, actor)
    }

    pub fn mark_sent(&self, destination: DestinationId, actor: ActorId) {
        self.gate.mark_sent(destination, actor);
    }

    pub fn ban(&self, destination: DestinationId) {
        self.gate.ban(destination);
    }

    pub fn is_banned(&self, destination: DestinationId) -> bool {
        self.gate.is_banned(destination)
    }

    pub fn stats(&self, destination: DestinationId) -> DestinationStats {
        self.gate.stats(destination)
    }

    /// Whether the controller clock currently sits in a configured active
    /// hour range. The automation loop uses this to pick its inter-pass
    /// delay band.
    pub fn is_active_hour(&self) -> bool {
        self.planner.is_active_hour(self.clock.now().hour())
    }

    pub fn tracker(&self) -> &ActivityTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::FixedSource;
    use cadence_core::clock::ManualClock;
    use chrono::TimeZone;

    #[test]
    fn observed_messages_drive_the_monologue_rule() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap(),
        ));
        let controller = Controller::new(
            &PacingConfig::default(),
            clock.clone(),
            Arc::new(FixedSource(120)),
        );
        let dest = DestinationId(1);
        let bot = ActorId(1000);

        controller.on_message_observed(dest, bot, clock.now());
        assert!(!controller.can_send(dest, bot).is_allowed());

        controller.on_message_observed(dest, ActorId(5), clock.now());
        assert!(controller.can_send(dest, bot).is_allowed());
    }

    #[test]
    fn controllers_are_isolated() {
        let config = PacingConfig::default();
        let a = Controller::with_defaults(&config);
        let b = Controller::with_defaults(&config);
        let dest = DestinationId(9);

        a.ban(dest);
        assert!(a.is_banned(dest));
        assert!(!b.is_banned(dest));
    }

    #[test]
    fn active_hour_follows_the_injected_clock() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap(),
        ));
        let controller = Controller::new(
            &PacingConfig::default(),
            clock.clone(),
            Arc::new(FixedSource(120)),
        );
        assert!(controller.is_active_hour());
        clock.set(Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap());
        assert!(!controller.is_active_hour());
    }
}
