//! Authoritative battle state representation.
//!
//! The registry owns every combatant; turn bookkeeping and seat assignment
//! refer to combatants and participants by identifier only. Runtime layers
//! clone or query this state but mutate it exclusively through the engine or
//! the reconciler.
pub mod combatant;
pub mod common;
pub mod registry;
pub mod seats;
pub mod turn;

pub use combatant::{Buff, BuffEffect, BuffSpec, Combatant, Skill, TargetRule, Timed};
pub use common::{CombatantId, ParticipantId, Side};
pub use registry::{Formation, Registry, RegistryError};
pub use seats::Seats;
pub use turn::TurnState;

/// Complete state of one match as seen by one participant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BattleState {
    /// Seed mixed into fallback decisions. Fixed for the life of a match.
    pub match_seed: u64,
    pub registry: Registry,
    pub turn: TurnState,
}

impl BattleState {
    pub fn new(registry: Registry) -> Self {
        Self {
            match_seed: 0,
            registry,
            turn: TurnState::new(),
        }
    }

    pub fn with_match_seed(mut self, seed: u64) -> Self {
        self.match_seed = seed;
        self
    }

    /// The currently active combatant, if any.
    pub fn active_combatant(&self) -> Option<&Combatant> {
        self.turn
            .active
            .as_ref()
            .and_then(|id| self.registry.get(id))
    }
}
