//! Cloneable façade for issuing commands to a match.
//!
//! [`MatchHandle`] hides channel plumbing and offers async helpers for
//! submitting decisions, feeding the transport's inbound traffic, and
//! streaming events from specific topics.
use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};

use battle_core::{BattleState, Decision, GameplaySnapshot, ParticipantId};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to one match.
#[derive(Clone)]
pub struct MatchHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl MatchHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Starts the turn loop. Authority only.
    pub async fn start(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Start { reply: reply_tx }).await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Submits the local participant's decision for the current activation.
    ///
    /// On the authority an accepted decision resolves immediately. On a
    /// follower it is checked locally and forwarded to the authority; the
    /// resolution arrives later through the `Action` topic.
    pub async fn submit_decision(&self, decision: Decision) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::SubmitDecision {
            decision,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Hands inbound transport bytes from `from` to the match.
    pub async fn deliver(&self, from: ParticipantId, bytes: Vec<u8>) -> Result<()> {
        self.send(Command::Inbound { from, bytes }).await
    }

    /// Reports that `participant` left the match.
    pub async fn participant_left(&self, participant: ParticipantId) -> Result<()> {
        self.send(Command::ParticipantLeft { participant }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Turn` - Active combatant changes, skipped turns, expiry
    /// - `Topic::Action` - Resolved and rejected decisions
    /// - `Topic::Match` - Match end with winner and loser
    /// - `Topic::Sync` - Snapshot application and resync requests
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Query the current battle state (read-only copy)
    pub async fn query_state(&self) -> Result<BattleState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::QueryState { reply: reply_tx }).await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Captures a snapshot of the local registry, including the outcome once
    /// the match has ended.
    pub async fn snapshot(&self) -> Result<GameplaySnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::QuerySnapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
