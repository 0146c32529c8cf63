//! Errors raised while validating or resolving a decision.

use crate::state::{CombatantId, TargetRule};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResolveError {
    #[error("{actor} is not the active combatant (active: {active:?})")]
    NotActive {
        actor: CombatantId,
        active: Option<CombatantId>,
    },

    #[error("combatant {0} is not registered")]
    UnknownCombatant(CombatantId),

    #[error("combatant {0} cannot act at 0 hp")]
    ActorDown(CombatantId),

    #[error("action requires a target")]
    MissingTarget,

    #[error("target {0} is not registered")]
    UnknownTarget(CombatantId),

    #[error("target {0} is already down")]
    TargetDown(CombatantId),

    #[error("target {target} is not a valid {rule} target")]
    InvalidTarget { target: CombatantId, rule: TargetRule },

    #[error("{actor} has no skill at index {index}")]
    InvalidSkill { actor: CombatantId, index: u32 },

    #[error("{actor} skill {index} is on cooldown for {remaining} more turns")]
    SkillOnCooldown {
        actor: CombatantId,
        index: u32,
        remaining: u32,
    },
}
