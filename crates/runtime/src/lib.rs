//! Runtime orchestration for networked battle matches.
//!
//! This crate wires the deterministic rules from `battle-core` to a transport,
//! a decision timeout and an event bus. Consumers build a [`MatchRuntime`] per
//! match, feed it inbound traffic and local decisions through
//! [`MatchHandle`], and subscribe to events by topic.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator, builder and configuration
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`transport`] defines the transport seam, wire codec and in-memory hub
//! - `workers` keeps the match task internal to the crate
pub mod api;
pub mod events;
pub mod runtime;
pub mod transport;

mod workers;

pub use api::{AutoFallback, FallbackPolicy, MatchHandle, PassFallback, Result, RuntimeError};
pub use events::{ActionEvent, Event, EventBus, MatchEvent, SyncEvent, Topic, TurnEvent};
pub use runtime::{MatchRuntime, MatchRuntimeBuilder, Role, RuntimeConfig};
pub use transport::{CodecError, LocalHub, LocalTransport, Transport, TransportError, WireMessage};
