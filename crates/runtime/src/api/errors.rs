//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, the transport, the wire codec and
//! the battle rules so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use battle_core::{ResolveError, TurnError, UnauthorizedDecision};

use crate::transport::{CodecError, TransportError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("match worker command channel closed")]
    CommandChannelClosed,

    #[error("match worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("match worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("only the authority may {operation}")]
    NotAuthority { operation: &'static str },

    #[error("the match has already ended")]
    MatchEnded,

    #[error("decision for activation {received} arrived during activation {current}")]
    StaleActivation { received: u64, current: u64 },

    #[error("runtime requires a transport before building")]
    MissingTransport,

    #[error("runtime requires a combatant registry before building")]
    MissingRegistry,

    #[error(transparent)]
    Unauthorized(#[from] UnauthorizedDecision),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
