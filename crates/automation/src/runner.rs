//! The driving loop: periodic passes over all known destinations, each send
//! gated by the controller and confirmed before being marked.

use crate::transport::Transport;
use cadence_core::config::AutomationConfig;
use cadence_core::error::{CadenceError, CadenceResult};
use cadence_core::types::ActorId;
use cadence_controller::Controller;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Counters for one pass over all destinations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub total: usize,
    pub sent: usize,
    pub skipped: usize,
    pub banned: usize,
    pub failed: usize,
}

pub struct AutomationLoop<T: Transport> {
    controller: Arc<Controller>,
    transport: Arc<T>,
    actor: ActorId,
    messages: Vec<String>,
    config: AutomationConfig,
    rng: Mutex<StdRng>,
}

impl<T: Transport> AutomationLoop<T> {
    pub fn new(
        controller: Arc<Controller>,
        transport: Arc<T>,
        actor: ActorId,
        messages: Vec<String>,
        config: AutomationConfig,
    ) -> CadenceResult<Self> {
        if messages.is_empty() {
            return Err(CadenceError::Config(
                "automation needs a non-empty message pool".to_string(),
            ));
        }
        Ok(Self {
            controller,
            transport,
            actor,
            messages,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Run passes until `shutdown` flips to true. Cancellation lands
    /// between destinations or between passes; a check → send → mark
    /// sequence is never split.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> CadenceResult<()> {
        let mut pass_number = 0u64;
        loop {
            if *shutdown.borrow() {
                info!("automation loop shutting down");
                return Ok(());
            }

            pass_number += 1;
            let summary = self.run_pass(&shutdown).await;
            info!(
                pass = pass_number,
                total = summary.total,
                sent = summary.sent,
                skipped = summary.skipped,
                banned = summary.banned,
                failed = summary.failed,
                "pass complete"
            );

            let delay = self.pass_delay();
            debug!(delay_secs = delay.as_secs(), "waiting before next pass");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {}
            }
        }
    }

    /// One pass over all currently visible destinations.
    pub async fn run_pass(&self, shutdown: &watch::Receiver<bool>) -> PassSummary {
        let mut destinations = self.transport.destinations();
        if self.config.shuffle_destinations {
            destinations.shuffle(&mut *self.rng.lock().expect("rng mutex poisoned"));
        }

        let mut summary = PassSummary {
            total: destinations.len(),
            ..PassSummary::default()
        };

        for destination in destinations {
            if *shutdown.borrow() {
                break;
            }

            let decision = self.controller.can_send(destination, self.actor);
            if !decision.is_allowed() {
                debug!(%destination, reason = %decision.reason(), "send skipped");
                summary.skipped += 1;
                continue;
            }

            let text = self.pick_message();
            match self.transport.send(destination, &text) {
                Ok(()) => {
                    self.controller.mark_sent(destination, self.actor);
                    let stats = self.controller.stats(destination);
                    info!(
                        %destination,
                        frequency = stats.frequency,
                        interval_secs = stats.planned_interval_secs,
                        "message sent"
                    );
                    summary.sent += 1;
                }
                Err(err) if err.is_permanent() => {
                    self.controller.ban(destination);
                    warn!(%destination, error = %err, "destination banned");
                    summary.banned += 1;
                }
                Err(err) => {
                    warn!(%destination, error = %err, "transient send failure, skipping");
                    summary.failed += 1;
                }
            }

            tokio::time::sleep(self.send_jitter()).await;
        }

        summary
    }

    fn pick_message(&self) -> String {
        let mut rng = self.rng.lock().expect("rng mutex poisoned");
        self.messages
            .choose(&mut *rng)
            .cloned()
            .unwrap_or_default()
    }

    fn send_jitter(&self) -> Duration {
        let (lo, hi) = self.config.send_jitter_secs;
        Duration::from_secs(self.draw(lo, hi))
    }

    /// Shorter waits during active hours, longer otherwise, so the loop
    /// itself never becomes a tight poll.
    fn pass_delay(&self) -> Duration {
        let (lo, hi) = if self.controller.is_active_hour() {
            self.config.pass_delay_active_secs
        } else {
            self.config.pass_delay_idle_secs
        };
        Duration::from_secs(self.draw(lo, hi))
    }

    fn draw(&self, lo: u64, hi: u64) -> u64 {
        if lo >= hi {
            return lo;
        }
        self.rng
            .lock()
            .expect("rng mutex poisoned")
            .gen_range(lo..=hi)
    }
}

impl<T: Transport> std::fmt::Debug for AutomationLoop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationLoop")
            .field("actor", &self.actor)
            .field("messages", &self.messages.len())
            .finish()
    }
}
