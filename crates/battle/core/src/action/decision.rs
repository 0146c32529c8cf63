use std::fmt;

use crate::state::CombatantId;

/// What the acting combatant does with its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    Attack,
    /// Cast the skill at this index of the actor's skill list.
    Skill(u32),
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Attack => f.write_str("attack"),
            ActionKind::Skill(index) => write!(f, "skill[{index}]"),
        }
    }
}

/// A (combatant, target?, action, seed) tuple resolving one activation.
///
/// The seed is chosen by whoever makes the decision and drives every random
/// roll of the resolution, so all participants resolve it identically.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decision {
    pub actor: CombatantId,
    pub target: Option<CombatantId>,
    pub kind: ActionKind,
    pub seed: u64,
}

impl Decision {
    pub fn attack(actor: impl Into<CombatantId>, target: impl Into<CombatantId>, seed: u64) -> Self {
        Self {
            actor: actor.into(),
            target: Some(target.into()),
            kind: ActionKind::Attack,
            seed,
        }
    }

    pub fn skill(
        actor: impl Into<CombatantId>,
        index: u32,
        target: Option<CombatantId>,
        seed: u64,
    ) -> Self {
        Self {
            actor: actor.into(),
            target,
            kind: ActionKind::Skill(index),
            seed,
        }
    }
}
