//! Automatic decisions for timeouts and auto-play.

use super::{ActionKind, Decision};
use crate::combat::{Roller, fallback_seed};
use crate::state::{BattleState, Combatant, CombatantId, TargetRule};

/// Builds a decision for the active combatant without outside input.
///
/// The choice between attacking and each ready skill, and the target among
/// the living candidates, are drawn from a roller seeded by the match seed and
/// the activation number, so the same activation always yields the same
/// decision. Options without a valid target are skipped. Returns `None` when
/// no combatant is active or it has nothing it can do.
pub fn auto_decision(state: &BattleState) -> Option<Decision> {
    let actor = state.active_combatant()?;
    if !actor.is_alive() {
        return None;
    }

    let seed = fallback_seed(state.match_seed, state.turn.activation);
    let mut roller = Roller::new(seed);

    let mut options: Vec<(ActionKind, TargetRule)> = vec![(ActionKind::Attack, TargetRule::Foe)];
    options.extend(
        actor
            .skills
            .iter()
            .enumerate()
            .filter(|(_, skill)| skill.is_ready())
            .map(|(index, skill)| (ActionKind::Skill(index as u32), skill.target)),
    );

    let mut viable: Vec<(ActionKind, Vec<CombatantId>)> = options
        .into_iter()
        .map(|(kind, rule)| (kind, candidates(state, actor, rule)))
        .filter(|(_, targets)| !targets.is_empty())
        .collect();
    if viable.is_empty() {
        return None;
    }

    let (kind, mut targets) = viable.swap_remove(roller.pick(viable.len()));
    let target = targets.swap_remove(roller.pick(targets.len()));

    Some(Decision {
        actor: actor.id.clone(),
        target: Some(target),
        kind,
        seed: roller.next_u32() as u64 | ((roller.next_u32() as u64) << 32),
    })
}

fn candidates(state: &BattleState, actor: &Combatant, rule: TargetRule) -> Vec<CombatantId> {
    let formation = state.registry.formation(actor.side);
    match rule {
        TargetRule::Foe => formation.foe().living().map(|c| c.id.clone()).collect(),
        TargetRule::Ally => formation.living().map(|c| c.id.clone()).collect(),
        TargetRule::Caster => vec![actor.id.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::engine::BattleEngine;
    use crate::state::{Registry, Side, Skill};

    fn state(match_seed: u64) -> BattleState {
        let registry = Registry::from_roster([
            Combatant::new("mage", Side::A, 20)
                .with_skill(Skill::new("bolt", 2, 150, TargetRule::Foe))
                .with_skill(Skill::new("ward", 3, 0, TargetRule::Ally)),
            Combatant::new("wolf", Side::B, 15),
            Combatant::new("bear", Side::B, 0),
        ])
        .unwrap();
        let mut state = BattleState::new(registry).with_match_seed(match_seed);
        state.turn.active = Some("mage".into());
        state.turn.activation = 4;
        state
    }

    #[test]
    fn auto_decision_is_deterministic_and_valid() {
        let config = BattleConfig::default();
        for seed in 0..64 {
            let mut state = state(seed);
            let first = auto_decision(&state).unwrap();
            assert_eq!(auto_decision(&state), Some(first.clone()));

            let engine = BattleEngine::new(&mut state, &config);
            assert!(engine.validate_decision(&first).is_ok(), "{first:?}");
        }
    }

    #[test]
    fn never_targets_fallen_foes() {
        for seed in 0..64 {
            let decision = auto_decision(&state(seed)).unwrap();
            assert_ne!(decision.target.as_ref().map(|t| t.as_str()), Some("bear"));
        }
    }

    #[test]
    fn skips_skills_on_cooldown() {
        for seed in 0..64 {
            let mut state = state(seed);
            let mage = state.registry.get_mut(&"mage".into()).unwrap();
            mage.skills[0].trigger();
            mage.skills[1].trigger();
            let decision = auto_decision(&state).unwrap();
            assert_eq!(decision.kind, ActionKind::Attack);
        }
    }

    #[test]
    fn nothing_to_do_without_active_combatant() {
        let mut state = state(1);
        state.turn.active = None;
        assert_eq!(auto_decision(&state), None);
    }
}
