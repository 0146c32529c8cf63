//! Turn scheduling and action resolution.
//!
//! [`BattleEngine`] is the only writer of [`BattleState`] outside snapshot
//! application. The authority drives it through the full turn cycle; followers
//! use it to mirror activations and replay broadcast decisions.

mod errors;
mod resolve;
mod turns;

pub use errors::TurnError;
pub use resolve::ResolvePlan;
pub use turns::Activation;

use crate::config::BattleConfig;
use crate::state::BattleState;

/// Engine borrowing a match state for the duration of one operation.
pub struct BattleEngine<'a> {
    state: &'a mut BattleState,
    config: &'a BattleConfig,
}

impl<'a> BattleEngine<'a> {
    pub fn new(state: &'a mut BattleState, config: &'a BattleConfig) -> Self {
        Self { state, config }
    }

    pub fn state(&self) -> &BattleState {
        self.state
    }
}
