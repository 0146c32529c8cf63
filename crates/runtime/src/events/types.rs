//! Event types for different topics.

use battle_core::{ActionOutcome, CombatantId, Decision, MatchOutcome, ParticipantId, SkipReason};
use serde::{Deserialize, Serialize};

/// Events related to activations (lightweight)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEvent {
    /// A combatant became active.
    ActiveCombatantChanged {
        combatant: CombatantId,
        activation: u64,
    },

    /// The activation needed no decision and resolved as a no-op.
    TurnSkipped {
        combatant: Option<CombatantId>,
        activation: u64,
        reason: SkipReason,
    },

    /// The decision window closed without a decision. On the authority a
    /// fallback decision follows; followers only observe it.
    DecisionExpired {
        combatant: CombatantId,
        activation: u64,
    },
}

/// Events related to decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionEvent {
    /// A decision was applied to the local state.
    ActionResolved {
        activation: u64,
        decision: Decision,
        outcome: ActionOutcome,
    },

    /// A decision was refused without any state change.
    DecisionRejected {
        activation: u64,
        decision: Decision,
        sender: ParticipantId,
        reason: String,
    },
}

/// Events related to the match lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    MatchEnded { outcome: MatchOutcome },
}

/// Events related to state reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncEvent {
    /// A snapshot was applied to the local registry.
    SnapshotApplied {
        activation: u64,
        /// Hex SHA-256 of the applied snapshot.
        digest: Option<String>,
        /// Snapshot combatants missing from the local registry.
        unknown_combatants: Vec<CombatantId>,
    },

    /// A resync was requested from the authority (on followers) or served
    /// to a follower (on the authority).
    ResyncRequested {
        activation: u64,
        participant: ParticipantId,
    },
}
