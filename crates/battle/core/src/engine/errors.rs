use crate::state::CombatantId;

/// Errors that can occur during turn operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    /// Scheduling was invoked with nobody left to act. The pipeline evaluates
    /// the outcome before scheduling, so reaching this is a logic error.
    #[error("no living combatants to schedule")]
    NoLivingCombatants,

    #[error("combatant {0} is not registered")]
    UnknownCombatant(CombatantId),
}
