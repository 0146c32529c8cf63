//! Decisions and their resolution results.
//!
//! A [`Decision`] is the only input that drives a turn. Resolution itself
//! lives on [`crate::engine::BattleEngine`]; this module holds the data types,
//! the resolver error taxonomy, and the automatic decision used for timeouts
//! and auto-play.
mod auto;
mod decision;
mod error;
mod result;

pub use auto::auto_decision;
pub use decision::{ActionKind, Decision};
pub use error::ResolveError;
pub use result::ActionOutcome;
