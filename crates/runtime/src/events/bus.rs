//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{ActionEvent, MatchEvent, SyncEvent, TurnEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Activation changes and decision expiry
    Turn,
    /// Resolved and rejected decisions
    Action,
    /// Match end
    Match,
    /// Snapshot application and resync requests
    Sync,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Turn(TurnEvent),
    Action(ActionEvent),
    Match(MatchEvent),
    Sync(SyncEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Turn(_) => Topic::Turn,
            Event::Action(_) => Topic::Action,
            Event::Match(_) => Topic::Match,
            Event::Sync(_) => Topic::Sync,
        }
    }
}

/// One broadcast channel per topic, created up front.
struct Channels {
    turn: broadcast::Sender<Event>,
    action: broadcast::Sender<Event>,
    outcome: broadcast::Sender<Event>,
    sync: broadcast::Sender<Event>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Turn => &self.turn,
            Topic::Action => &self.action,
            Topic::Match => &self.outcome,
            Topic::Sync => &self.sync,
        }
    }
}

/// Topic-based event bus
///
/// Consumers subscribe to the topics they care about. Dropping a receiver is
/// the only teardown needed.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                turn: broadcast::channel(capacity).0,
                action: broadcast::channel(capacity).0,
                outcome: broadcast::channel(capacity).0,
                sync: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channels.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::MatchOutcome;

    #[tokio::test]
    async fn events_reach_only_their_topic() {
        let bus = EventBus::with_capacity(4);
        let mut receivers = bus.subscribe_multiple(&[Topic::Match, Topic::Turn]);

        bus.publish(Event::Match(MatchEvent::MatchEnded {
            outcome: MatchOutcome {
                winner: None,
                loser: None,
            },
        }));

        let received = receivers
            .get_mut(&Topic::Match)
            .unwrap()
            .recv()
            .await
            .unwrap();
        assert_eq!(received.topic(), Topic::Match);
        assert!(receivers.get_mut(&Topic::Turn).unwrap().try_recv().is_err());
    }
}
