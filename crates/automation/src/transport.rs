//! Transport abstraction — the outbound messaging boundary.
//!
//! The controller never talks to a network itself; implementations adapt a
//! real messaging client (or a simulation) behind this trait.

use cadence_core::types::DestinationId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    /// The destination will never accept sends again in this session, e.g.
    /// the sender was removed from the group.
    #[error("forbidden to write to destination")]
    Forbidden,

    #[error("rate limited by server, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    /// Permanent failures ban the destination; everything else is skipped
    /// for the current pass with controller state untouched.
    pub fn is_permanent(&self) -> bool {
        matches!(self, TransportError::Forbidden)
    }
}

/// Outbound messaging client.
pub trait Transport: Send + Sync {
    /// Destinations currently visible to the sender.
    fn destinations(&self) -> Vec<DestinationId>;

    /// Deliver a message. Returning `Ok` means the transport confirmed
    /// acceptance; only then may the caller mark the send.
    fn send(&self, destination: DestinationId, text: &str) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_forbidden_is_permanent() {
        assert!(TransportError::Forbidden.is_permanent());
        assert!(!TransportError::RateLimited { retry_after_secs: 30 }.is_permanent());
        assert!(!TransportError::Network("reset".into()).is_permanent());
    }
}
