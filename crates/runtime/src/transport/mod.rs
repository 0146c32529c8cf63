//! Message transport seam.
//!
//! The runtime never talks to a network directly. It encodes [`WireMessage`]s
//! and hands the bytes to a [`Transport`]; inbound bytes and departures are
//! pushed back through [`crate::MatchHandle::deliver`] and
//! [`crate::MatchHandle::participant_left`] by whoever owns the connection.
mod codec;
mod local;

pub use codec::{CodecError, WireMessage};
pub use local::{LocalHub, LocalTransport};

use async_trait::async_trait;
use battle_core::ParticipantId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("participant {0} is not connected")]
    UnknownParticipant(ParticipantId),

    #[error("transport closed")]
    Closed,
}

/// Outbound side of a match connection.
///
/// Delivery must preserve per-sender ordering: a follower relies on seeing
/// the authority's messages in the order they were sent.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Participant id of this endpoint.
    fn local_participant(&self) -> ParticipantId;

    /// Every participant currently in the match, including the local one.
    fn participants(&self) -> Vec<ParticipantId>;

    /// The participant that computes truth for the match.
    fn authority(&self) -> ParticipantId;

    /// Sends `bytes` to every other participant.
    async fn broadcast(&self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Sends `bytes` to one participant.
    async fn send_to(&self, participant: ParticipantId, bytes: Vec<u8>)
    -> Result<(), TransportError>;
}
