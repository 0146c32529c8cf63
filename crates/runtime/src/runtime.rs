//! High-level match orchestrator.
//!
//! The runtime owns the match worker, wires up the command channel and event
//! bus, and exposes a builder-based API for clients to join a match.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use battle_core::{BattleConfig, BattleState, Registry, Seats, Side};

use crate::api::{AutoFallback, FallbackPolicy, MatchHandle, Result, RuntimeError};
use crate::events::EventBus;
use crate::transport::Transport;
use crate::workers::{Command, MatchContext, MatchWorker};

/// Whether this participant computes truth or mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Authority,
    Follower,
}

impl Role {
    /// The transport's authority is the authority; everyone else follows.
    pub fn from_transport(transport: &dyn Transport) -> Self {
        if transport.local_participant() == transport.authority() {
            Role::Authority
        } else {
            Role::Follower
        }
    }

    /// Default seat: the authority controls side A.
    pub fn default_side(self) -> Side {
        match self {
            Role::Authority => Side::A,
            Role::Follower => Side::B,
        }
    }
}

/// Runtime configuration shared across the orchestrator and the worker.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    /// Overrides the role derived from the transport.
    pub role: Option<Role>,
    /// Overrides the side derived from the role.
    pub local_side: Option<Side>,
    /// How long an activation waits for a decision.
    pub decision_timeout: Duration,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Submit automatic decisions for the local side's turns.
    pub auto_play: bool,
    /// Seeds fallback and auto-play decisions. Must match on every participant.
    pub match_seed: u64,
}

impl RuntimeConfig {
    pub const DEFAULT_DECISION_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = timeout;
        self
    }

    pub fn with_auto_play(mut self, enable: bool) -> Self {
        self.auto_play = enable;
        self
    }

    pub fn with_match_seed(mut self, seed: u64) -> Self {
        self.match_seed = seed;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_local_side(mut self, side: Side) -> Self {
        self.local_side = Some(side);
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            role: None,
            local_side: None,
            decision_timeout: Self::DEFAULT_DECISION_TIMEOUT,
            event_buffer_size: 100,
            command_buffer_size: 32,
            auto_play: false,
            match_seed: 0,
        }
    }
}

/// One participant's view of a running match.
///
/// Design: the runtime owns the worker task. [`MatchHandle`] provides a
/// cloneable façade for presentation layers and transports.
pub struct MatchRuntime {
    handle: MatchHandle,
    role: Role,
    command_tx: mpsc::Sender<Command>,
    worker_handle: JoinHandle<()>,
}

impl MatchRuntime {
    /// Create a new runtime builder
    pub fn builder() -> MatchRuntimeBuilder {
        MatchRuntimeBuilder::new()
    }

    /// Get a cloneable handle to this match
    pub fn handle(&self) -> MatchHandle {
        self.handle.clone()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// Handles held elsewhere (for example by a transport forwarder) stay
    /// valid but every call on them fails with `CommandChannelClosed`.
    pub async fn shutdown(self) -> Result<()> {
        // A closed channel means the worker is already gone.
        let _ = self.command_tx.send(Command::Shutdown).await;
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`MatchRuntime`].
pub struct MatchRuntimeBuilder {
    config: RuntimeConfig,
    registry: Option<Registry>,
    transport: Option<Arc<dyn Transport>>,
    fallback: Option<Arc<dyn FallbackPolicy>>,
}

impl MatchRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            registry: None,
            transport: None,
            fallback: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide the combatant roster (required). Every participant must
    /// register the same combatants in the same order.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the match transport (required)
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set the fallback policy (default: [`AutoFallback`])
    pub fn fallback(mut self, fallback: impl FallbackPolicy + 'static) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Build the runtime and spawn its worker
    pub async fn build(self) -> Result<MatchRuntime> {
        let transport = self.transport.ok_or(RuntimeError::MissingTransport)?;
        let registry = self.registry.ok_or(RuntimeError::MissingRegistry)?;
        let fallback = self.fallback.unwrap_or_else(|| Arc::new(AutoFallback));

        let role = self
            .config
            .role
            .unwrap_or_else(|| Role::from_transport(transport.as_ref()));
        let local_side = self.config.local_side.unwrap_or(role.default_side());

        let participants = transport.participants();
        let extra = Seats::extra_participants(&participants);
        if extra > 0 {
            warn!(
                target: "runtime::builder",
                participants = participants.len(),
                ignored = extra,
                "Only two-participant matches are supported; extra participants are not seated"
            );
        }
        let seats = Seats::two_party(transport.local_participant(), local_side, participants);

        let state = BattleState::new(registry).with_match_seed(self.config.match_seed);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size.max(1));
        let handle = MatchHandle::new(command_tx.clone(), event_bus.clone());

        let ctx = MatchContext {
            role,
            seats,
            battle: self.config.battle,
            decision_timeout: self.config.decision_timeout,
            auto_play: self.config.auto_play,
            transport,
            fallback,
            event_bus,
        };
        let worker = MatchWorker::new(state, ctx, command_rx);
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(MatchRuntime {
            handle,
            role,
            command_tx,
            worker_handle,
        })
    }
}
