//! Worker tasks that back the runtime orchestration.
//!
//! One match worker runs per match and owns its state exclusively.

mod match_worker;

pub use match_worker::{Command, MatchContext, MatchWorker};
