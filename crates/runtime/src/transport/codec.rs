//! Wire messages exchanged between participants.

use battle_core::{CombatantId, Decision, GameplaySnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every message a match sends over the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMessage {
    /// Authority → followers: `combatant` is active for `activation`.
    TurnStarted {
        combatant: CombatantId,
        activation: u64,
    },
    /// Follower → authority: a submission for the current activation.
    /// Authority → followers: the decision that resolved `activation`.
    Decision { activation: u64, decision: Decision },
    /// Authority → followers: canonical state after `activation`.
    Snapshot {
        activation: u64,
        snapshot: GameplaySnapshot,
    },
    /// Follower → authority: the local registry diverged.
    ResyncRequest { activation: u64 },
    /// Authority → one follower: canonical state in answer to a resync
    /// request. Unlike `Snapshot` it does not close the activation in
    /// progress.
    Resync {
        activation: u64,
        snapshot: GameplaySnapshot,
    },
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode wire message")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode wire message")]
    Decode(#[source] bincode::Error),
}

impl WireMessage {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(CodecError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(CodecError::Decode)
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::TurnStarted { .. } => "turn_started",
            WireMessage::Decision { .. } => "decision",
            WireMessage::Snapshot { .. } => "snapshot",
            WireMessage::ResyncRequest { .. } => "resync_request",
            WireMessage::Resync { .. } => "resync",
        }
    }
}
