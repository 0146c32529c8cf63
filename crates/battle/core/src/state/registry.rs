//! Combatant registry and formation views.
//!
//! The registry owns every combatant for the life of a match. Iteration order
//! is insertion order; the turn scheduler relies on it for tie-breaking.

use std::collections::HashMap;

use super::combatant::Combatant;
use super::common::{CombatantId, Side};

/// Errors raised while building a registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("combatant {0} is already registered")]
    DuplicateCombatant(CombatantId),
}

/// Insertion-ordered store of all combatants in a match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registry {
    combatants: Vec<Combatant>,
    index: HashMap<CombatantId, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a roster, rejecting duplicate identifiers.
    pub fn from_roster(
        roster: impl IntoIterator<Item = Combatant>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for combatant in roster {
            registry.insert(combatant)?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, combatant: Combatant) -> Result<(), RegistryError> {
        if self.index.contains_key(&combatant.id) {
            return Err(RegistryError::DuplicateCombatant(combatant.id));
        }
        self.index
            .insert(combatant.id.clone(), self.combatants.len());
        self.combatants.push(combatant);
        Ok(())
    }

    pub fn get(&self, id: &CombatantId) -> Option<&Combatant> {
        self.lookup(id).map(|slot| &self.combatants[slot])
    }

    pub fn get_mut(&mut self, id: &CombatantId) -> Option<&mut Combatant> {
        self.lookup(id).map(|slot| &mut self.combatants[slot])
    }

    pub fn contains(&self, id: &CombatantId) -> bool {
        self.lookup(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Combatants in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.iter_mut()
    }

    /// Borrowed view of one side's formation.
    pub fn formation(&self, side: Side) -> Formation<'_> {
        Formation {
            registry: self,
            side,
        }
    }

    fn lookup(&self, id: &CombatantId) -> Option<usize> {
        self.index.get(id).copied()
    }
}

/// Non-owning view of the combatants of one side.
#[derive(Clone, Copy, Debug)]
pub struct Formation<'a> {
    registry: &'a Registry,
    side: Side,
}

impl<'a> Formation<'a> {
    pub fn side(&self) -> Side {
        self.side
    }

    /// The opposing formation, borrowed from the same registry.
    pub fn foe(&self) -> Formation<'a> {
        Formation {
            registry: self.registry,
            side: self.side.foe(),
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &'a Combatant> + 'a {
        let side = self.side;
        self.registry.iter().filter(move |c| c.side == side)
    }

    pub fn living(&self) -> impl Iterator<Item = &'a Combatant> + 'a {
        self.members().filter(|c| c.is_alive())
    }

    pub fn is_any_alive(&self) -> bool {
        self.living().next().is_some()
    }
}
