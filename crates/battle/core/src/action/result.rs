use super::ActionKind;
use crate::state::CombatantId;

/// What a resolved action did. Published to presentation as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionOutcome {
    pub actor: CombatantId,
    pub kind: ActionKind,
    pub target: CombatantId,
    pub damage: u32,
    /// Buff id applied or refreshed on the target.
    pub buff: Option<String>,
    pub target_hp: u32,
    pub defeated: bool,
}
