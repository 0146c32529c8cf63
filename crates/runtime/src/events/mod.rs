//! Topic-based event bus for runtime events.
//!
//! Events are published to specific topics, and presentation layers subscribe
//! only to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{ActionEvent, MatchEvent, SyncEvent, TurnEvent};
