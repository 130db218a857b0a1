//! Simulated chat transport — synthetic destinations and chatter for the
//! demo binary and integration tests. Sends are captured in memory so
//! assertions (and the demo's summary) can inspect them.

use crate::transport::{Transport, TransportError};
use cadence_core::types::{ActorId, DestinationId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Mutex;

pub struct SimulatedChat {
    destinations: Vec<DestinationId>,
    forbidden: HashSet<DestinationId>,
    sent: Mutex<Vec<(DestinationId, String)>>,
    rng: Mutex<StdRng>,
}

impl SimulatedChat {
    /// `count` destinations with ids starting at 1; none forbidden.
    pub fn new(count: usize) -> Self {
        Self::with_seed(count, rand::random())
    }

    pub fn with_seed(count: usize, seed: u64) -> Self {
        Self {
            destinations: (1..=count as i64).map(DestinationId).collect(),
            forbidden: HashSet::new(),
            sent: Mutex::new(Vec::new()),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Mark a destination as write-forbidden; sends into it fail with the
    /// permanent error class.
    pub fn forbid(&mut self, destination: DestinationId) {
        self.forbidden.insert(destination);
    }

    /// All sends accepted so far, in order.
    pub fn sent(&self) -> Vec<(DestinationId, String)> {
        self.sent.lock().expect("sent log mutex poisoned").clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("sent log mutex poisoned").len()
    }

    /// A synthetic human message: a random non-forbidden destination and a
    /// sender id well away from the automation's range.
    pub fn chatter(&self) -> Option<(DestinationId, ActorId)> {
        let candidates: Vec<_> = self
            .destinations
            .iter()
            .filter(|d| !self.forbidden.contains(d))
            .copied()
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let mut rng = self.rng.lock().expect("sim rng mutex poisoned");
        let destination = candidates[rng.gen_range(0..candidates.len())];
        let sender = ActorId(rng.gen_range(1_000_000..2_000_000));
        Some((destination, sender))
    }
}

impl Transport for SimulatedChat {
    fn destinations(&self) -> Vec<DestinationId> {
        self.destinations.clone()
    }

    fn send(&self, destination: DestinationId, text: &str) -> Result<(), TransportError> {
        if self.forbidden.contains(&destination) {
            return Err(TransportError::Forbidden);
        }
        self.sent
            .lock()
            .expect("sent log mutex poisoned")
            .push((destination, text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_destinations_reject_sends() {
        let mut chat = SimulatedChat::with_seed(3, 1);
        chat.forbid(DestinationId(2));

        assert!(chat.send(DestinationId(1), "hi").is_ok());
        assert!(matches!(
            chat.send(DestinationId(2), "hi"),
            Err(TransportError::Forbidden)
        ));
        assert_eq!(chat.sent_count(), 1);
    }

    #[test]
    fn chatter_avoids_forbidden_destinations() {
        let mut chat = SimulatedChat::with_seed(2, 7);
        chat.forbid(DestinationId(1));
        for _ in 0..50 {
            let (destination, sender) = chat.chatter().expect("one destination left");
            assert_eq!(destination, DestinationId(2));
            assert!(sender.0 >= 1_000_000);
        }
    }
}
