pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use error::{CadenceError, CadenceResult};
pub use types::{ActorId, DestinationId, MessageEvent};
