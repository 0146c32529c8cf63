use super::CombatantId;

/// Whose turn it is.
///
/// The activation counter increments every time a combatant becomes active and
/// is the key that ties a decision or a timeout to exactly one turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnState {
    /// Combatant currently taking its turn, `None` between turns.
    pub active: Option<CombatantId>,

    /// Number of activations so far. The current activation is this value.
    pub activation: u64,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, id: &CombatantId) -> bool {
        self.active.as_ref() == Some(id)
    }
}
