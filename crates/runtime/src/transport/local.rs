//! In-memory transport connecting several runtimes in one process.
//!
//! Each joined participant gets an unbounded inbox, so sends never block the
//! sending worker and per-sender ordering is preserved. Once a runtime is
//! built, [`LocalHub::connect`] spawns a forwarder that drains the inbox into
//! its [`MatchHandle`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use battle_core::ParticipantId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{Transport, TransportError};
use crate::api::MatchHandle;

enum Envelope {
    Message { from: ParticipantId, bytes: Vec<u8> },
    Left(ParticipantId),
}

struct Endpoint {
    inbox: mpsc::UnboundedSender<Envelope>,
    /// Taken by [`LocalHub::connect`].
    pending: Option<mpsc::UnboundedReceiver<Envelope>>,
}

struct HubState {
    authority: ParticipantId,
    endpoints: BTreeMap<ParticipantId, Endpoint>,
}

/// Shared in-memory room.
#[derive(Clone)]
pub struct LocalHub {
    state: Arc<Mutex<HubState>>,
}

impl LocalHub {
    pub fn new(authority: ParticipantId) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                authority,
                endpoints: BTreeMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `participant` and returns its transport endpoint.
    ///
    /// Join every participant before building the runtimes: seats are fixed
    /// from the participant list at build time.
    pub fn join(&self, participant: ParticipantId) -> LocalTransport {
        let (inbox, pending) = mpsc::unbounded_channel();
        self.lock().endpoints.insert(
            participant,
            Endpoint {
                inbox,
                pending: Some(pending),
            },
        );
        LocalTransport {
            hub: self.clone(),
            local: participant,
        }
    }

    /// Starts forwarding `participant`'s inbox into `handle`. Messages sent
    /// before this call are buffered and delivered first.
    ///
    /// Returns `None` when the participant never joined or is already connected.
    pub fn connect(&self, participant: ParticipantId, handle: MatchHandle) -> Option<JoinHandle<()>> {
        let mut inbox = self.lock().endpoints.get_mut(&participant)?.pending.take()?;

        Some(tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                let delivered = match envelope {
                    Envelope::Message { from, bytes } => handle.deliver(from, bytes).await,
                    Envelope::Left(left) => handle.participant_left(left).await,
                };
                if delivered.is_err() {
                    debug!(
                        target: "runtime::transport",
                        %participant,
                        "Match worker gone, stopping local forwarder"
                    );
                    break;
                }
            }
        }))
    }

    /// Removes `participant` and tells everyone else it left.
    pub fn leave(&self, participant: ParticipantId) {
        let mut state = self.lock();
        if state.endpoints.remove(&participant).is_none() {
            return;
        }
        for endpoint in state.endpoints.values() {
            let _ = endpoint.inbox.send(Envelope::Left(participant));
        }
    }

    pub fn participants(&self) -> Vec<ParticipantId> {
        self.lock().endpoints.keys().copied().collect()
    }
}

/// One participant's endpoint on a [`LocalHub`].
#[derive(Clone)]
pub struct LocalTransport {
    hub: LocalHub,
    local: ParticipantId,
}

#[async_trait]
impl Transport for LocalTransport {
    fn local_participant(&self) -> ParticipantId {
        self.local
    }

    fn participants(&self) -> Vec<ParticipantId> {
        self.hub.participants()
    }

    fn authority(&self) -> ParticipantId {
        self.hub.lock().authority
    }

    async fn broadcast(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        let state = self.hub.lock();
        if !state.endpoints.contains_key(&self.local) {
            return Err(TransportError::Closed);
        }
        for (&participant, endpoint) in &state.endpoints {
            if participant == self.local {
                continue;
            }
            let _ = endpoint.inbox.send(Envelope::Message {
                from: self.local,
                bytes: bytes.clone(),
            });
        }
        Ok(())
    }

    async fn send_to(
        &self,
        participant: ParticipantId,
        bytes: Vec<u8>,
    ) -> Result<(), TransportError> {
        let state = self.hub.lock();
        if !state.endpoints.contains_key(&self.local) {
            return Err(TransportError::Closed);
        }
        let endpoint = state
            .endpoints
            .get(&participant)
            .ok_or(TransportError::UnknownParticipant(participant))?;
        endpoint
            .inbox
            .send(Envelope::Message {
                from: self.local,
                bytes,
            })
            .map_err(|_| TransportError::Closed)
    }
}
