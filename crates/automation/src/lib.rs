//! Automation loop — drives gated sends through a pluggable transport:
//! shuffled passes over known destinations, gate consultation before every
//! attempt, ban on permanent failure, adaptive inter-pass delays.

pub mod runner;
pub mod simulation;
pub mod transport;

pub use runner::{AutomationLoop, PassSummary};
pub use simulation::SimulatedChat;
pub use transport::{Transport, TransportError};
