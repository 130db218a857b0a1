//! Activity tracker — bounded per-destination log of recent message events
//! with a rolling frequency estimate and last-sender lookup.

use cadence_core::clock::Clock;
use cadence_core::config::PacingConfig;
use cadence_core::types::{ActorId, DestinationId, MessageEvent};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Floor for the frequency estimate: sparse or unknown destinations read as
/// "quiet", which biases pacing toward slower sending.
pub const MIN_FREQUENCY: f64 = 0.1;
/// Ceiling for the frequency estimate.
pub const MAX_FREQUENCY: f64 = 10.0;

/// Per-destination state. The event deque and the cached last sender live in
/// one map entry so both update under the same entry lock.
#[derive(Debug)]
struct DestinationLog {
    events: VecDeque<MessageEvent>,
    last_sender: ActorId,
}

/// Records observed message events per destination inside a trailing
/// retention window and derives an events-per-minute estimate from a
/// shorter sub-window. Trimming is lazy: it happens on append, never on a
/// background timer.
pub struct ActivityTracker {
    logs: DashMap<DestinationId, DestinationLog>,
    clock: Arc<dyn Clock>,
    retention: Duration,
    rate_subwindow: Duration,
}

impl ActivityTracker {
    pub fn new(config: &PacingConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            logs: DashMap::new(),
            clock,
            retention: Duration::seconds(config.retention_window_secs as i64),
            rate_subwindow: Duration::seconds(config.rate_subwindow_secs as i64),
        }
    }

    /// Record an event timestamped "now".
    pub fn record(&self, destination: DestinationId, sender: ActorId) {
        self.record_at(destination, sender, self.clock.now());
    }

    /// Record an event with an explicit timestamp. Callers guarantee
    /// timestamps are nondecreasing per destination.
    pub fn record_at(&self, destination: DestinationId, sender: ActorId, timestamp: DateTime<Utc>) {
        let mut log = self
            .logs
            .entry(destination)
            .or_insert_with(|| DestinationLog {
                events: VecDeque::new(),
                last_sender: sender,
            });
        log.events.push_back(MessageEvent { timestamp, sender });
        log.last_sender = sender;

        let cutoff = self.clock.now() - self.retention;
        while log.events.front().is_some_and(|e| e.timestamp < cutoff) {
            log.events.pop_front();
        }
    }

    /// Rolling frequency estimate in events per minute, clamped to
    /// [0.1, 10.0]. Only events inside the rate sub-window count; the count
    /// is divided by the observed span of those events (at least one
    /// minute), so a short burst reads at its actual rate rather than being
    /// averaged over the whole sub-window.
    pub fn frequency(&self, destination: DestinationId) -> f64 {
        let Some(log) = self.logs.get(&destination) else {
            return MIN_FREQUENCY;
        };
        if log.events.len() < 2 {
            return MIN_FREQUENCY;
        }

        let now = self.clock.now();
        let cutoff = now - self.rate_subwindow;
        let mut count = 0usize;
        let mut earliest: Option<DateTime<Utc>> = None;
        for event in log.events.iter() {
            if event.timestamp >= cutoff {
                count += 1;
                if earliest.is_none() {
                    earliest = Some(event.timestamp);
                }
            }
        }

        let (count, earliest) = match (count, earliest) {
            (c, Some(t)) if c >= 2 => (c, t),
            _ => return MIN_FREQUENCY,
        };

        let span_minutes = ((now - earliest).num_seconds() as f64 / 60.0).max(1.0);
        (count as f64 / span_minutes).clamp(MIN_FREQUENCY, MAX_FREQUENCY)
    }

    /// Actor of the most recent recorded event, if any.
    pub fn last_sender(&self, destination: DestinationId) -> Option<ActorId> {
        self.logs.get(&destination).map(|log| log.last_sender)
    }

    /// Number of events currently retained for a destination.
    pub fn retained_events(&self, destination: DestinationId) -> usize {
        self.logs
            .get(&destination)
            .map(|log| log.events.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::clock::ManualClock;
    use chrono::TimeZone;

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap()
    }

    fn tracker() -> (ActivityTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start_time()));
        let tracker = ActivityTracker::new(&PacingConfig::default(), clock.clone());
        (tracker, clock)
    }

    #[test]
    fn trims_events_older_than_retention_window() {
        let (tracker, clock) = tracker();
        let dest = DestinationId(1);

        tracker.record(dest, ActorId(10));
        clock.advance(Duration::seconds(3601));
        tracker.record(dest, ActorId(11));

        // The first event fell out of the one-hour window.
        assert_eq!(tracker.retained_events(dest), 1);
        assert_eq!(tracker.last_sender(dest), Some(ActorId(11)));
    }

    #[test]
    fn frequency_floor_for_unknown_and_sparse_destinations() {
        let (tracker, _clock) = tracker();
        let dest = DestinationId(2);

        assert_eq!(tracker.frequency(dest), MIN_FREQUENCY);
        tracker.record(dest, ActorId(10));
        assert_eq!(tracker.frequency(dest), MIN_FREQUENCY);
    }

    #[test]
    fn frequency_stays_within_bounds_under_heavy_traffic() {
        let (tracker, clock) = tracker();
        let dest = DestinationId(3);

        // 600 events over 10 minutes (~60/min raw) must clamp to 10.0.
        for i in 0..600 {
            tracker.record(dest, ActorId(i % 7));
            clock.advance(Duration::seconds(1));
        }
        let f = tracker.frequency(dest);
        assert!((MIN_FREQUENCY..=MAX_FREQUENCY).contains(&f));
        assert_eq!(f, MAX_FREQUENCY);
    }

    #[test]
    fn frequency_reflects_burst_rate() {
        let (tracker, clock) = tracker();
        let dest = DestinationId(4);

        // 20 events spaced 30 seconds apart: ~2 events/min.
        for i in 0..20 {
            tracker.record(dest, ActorId(100 + i));
            clock.advance(Duration::seconds(30));
        }
        let f = tracker.frequency(dest);
        assert!((1.5..=2.5).contains(&f), "expected ~2/min, got {f}");
    }

    #[test]
    fn frequency_ignores_events_outside_subwindow() {
        let (tracker, clock) = tracker();
        let dest = DestinationId(5);

        tracker.record(dest, ActorId(1));
        tracker.record(dest, ActorId(2));
        // Both events drift past the 30-minute estimate window but stay
        // within the one-hour retention.
        clock.advance(Duration::seconds(1801));
        assert_eq!(tracker.frequency(dest), MIN_FREQUENCY);
        assert_eq!(tracker.last_sender(dest), Some(ActorId(2)));
    }

    #[test]
    fn last_sender_tracks_most_recent_event() {
        let (tracker, clock) = tracker();
        let dest = DestinationId(6);

        assert_eq!(tracker.last_sender(dest), None);
        tracker.record(dest, ActorId(1));
        clock.advance(Duration::seconds(5));
        tracker.record(dest, ActorId(2));
        assert_eq!(tracker.last_sender(dest), Some(ActorId(2)));
    }

    #[test]
    fn destinations_are_tracked_independently() {
        let (tracker, _clock) = tracker();
        tracker.record(DestinationId(7), ActorId(1));
        assert_eq!(tracker.last_sender(DestinationId(8)), None);
        assert_eq!(tracker.retained_events(DestinationId(7)), 1);
    }
}
