//! Asynchronous seam for decisions nobody submitted.
//!
//! The authority asks a [`FallbackPolicy`] when a decision window expires, when
//! the active side has nobody seated to decide for it, and on auto-play.
use async_trait::async_trait;
use battle_core::{BattleState, Decision, auto_decision};

/// Trait for synthesizing a decision for the active combatant.
///
/// Implementations must be deterministic in the state they are given when
/// followers are expected to audit the result. Returning `None` makes the
/// activation a no-op turn.
#[async_trait]
pub trait FallbackPolicy: Send + Sync {
    async fn decide(&self, state: &BattleState) -> Option<Decision>;
}

/// Picks a random valid action seeded from the match seed and the activation
/// number.
pub struct AutoFallback;

#[async_trait]
impl FallbackPolicy for AutoFallback {
    async fn decide(&self, state: &BattleState) -> Option<Decision> {
        auto_decision(state)
    }
}

/// Forfeits the turn.
/// Useful for testing or when stalled players should simply lose their turn.
pub struct PassFallback;

#[async_trait]
impl FallbackPolicy for PassFallback {
    async fn decide(&self, _state: &BattleState) -> Option<Decision> {
        None
    }
}
