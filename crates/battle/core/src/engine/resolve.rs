//! Action resolution for BattleEngine.
//!
//! Resolution is split in two: [`BattleEngine::validate_decision`] checks a
//! decision against the current state without touching it, and
//! [`BattleEngine::resolve_action`] validates then applies. A rejected
//! decision therefore never leaves a partial mutation behind.

use crate::action::{ActionKind, ActionOutcome, Decision, ResolveError};
use crate::combat::{Roller, calculate_damage};
use crate::state::{BuffSpec, Combatant, CombatantId, TargetRule, Timed};

use super::BattleEngine;

/// Everything needed to apply a validated decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvePlan {
    pub target: CombatantId,
    pub power: u32,
    pub buff: Option<BuffSpec>,
    pub skill: Option<usize>,
}

impl<'a> BattleEngine<'a> {
    /// Checks that `decision` can be resolved right now.
    pub fn validate_decision(&self, decision: &Decision) -> Result<ResolvePlan, ResolveError> {
        let registry = &self.state.registry;

        if !self.state.turn.is_active(&decision.actor) {
            return Err(ResolveError::NotActive {
                actor: decision.actor.clone(),
                active: self.state.turn.active.clone(),
            });
        }

        let actor = registry
            .get(&decision.actor)
            .ok_or_else(|| ResolveError::UnknownCombatant(decision.actor.clone()))?;
        if !actor.is_alive() {
            return Err(ResolveError::ActorDown(actor.id.clone()));
        }

        let (rule, power, buff, skill) = match decision.kind {
            ActionKind::Attack => (TargetRule::Foe, 100, None, None),
            ActionKind::Skill(index) => {
                let skill = actor.skills.get(index as usize).ok_or_else(|| {
                    ResolveError::InvalidSkill {
                        actor: actor.id.clone(),
                        index,
                    }
                })?;
                if !skill.is_ready() {
                    return Err(ResolveError::SkillOnCooldown {
                        actor: actor.id.clone(),
                        index,
                        remaining: skill.remaining_turns(),
                    });
                }
                (
                    skill.target,
                    skill.power,
                    skill.buff.clone(),
                    Some(index as usize),
                )
            }
        };

        let target = self.resolve_target(actor, decision.target.as_ref(), rule)?;

        Ok(ResolvePlan {
            target,
            power,
            buff,
            skill,
        })
    }

    fn resolve_target(
        &self,
        actor: &Combatant,
        requested: Option<&CombatantId>,
        rule: TargetRule,
    ) -> Result<CombatantId, ResolveError> {
        let id = match (rule, requested) {
            (TargetRule::Caster, _) => return Ok(actor.id.clone()),
            (TargetRule::Ally, None) => return Ok(actor.id.clone()),
            (TargetRule::Foe, None) => return Err(ResolveError::MissingTarget),
            (_, Some(id)) => id,
        };

        let target = self
            .state
            .registry
            .get(id)
            .ok_or_else(|| ResolveError::UnknownTarget(id.clone()))?;

        let allowed = match rule {
            TargetRule::Foe => target.side != actor.side,
            TargetRule::Ally => target.side == actor.side,
            TargetRule::Caster => target.id == actor.id,
        };
        if !allowed {
            return Err(ResolveError::InvalidTarget {
                target: id.clone(),
                rule,
            });
        }
        if !target.is_alive() {
            return Err(ResolveError::TargetDown(id.clone()));
        }

        Ok(target.id.clone())
    }

    /// Validates and applies `decision` for the active combatant.
    ///
    /// Damage rolls are drawn from the decision's seed. Casting a skill puts
    /// it on cooldown and applies or refreshes its buff on the target.
    pub fn resolve_action(&mut self, decision: &Decision) -> Result<ActionOutcome, ResolveError> {
        let plan = self.validate_decision(decision)?;
        let mut roller = Roller::new(decision.seed);

        let (attack, defense) = {
            let registry = &self.state.registry;
            let actor = registry
                .get(&decision.actor)
                .ok_or_else(|| ResolveError::UnknownCombatant(decision.actor.clone()))?;
            let target = registry
                .get(&plan.target)
                .ok_or_else(|| ResolveError::UnknownTarget(plan.target.clone()))?;
            (actor.effective_attack(), target.effective_defense())
        };

        let damage = if plan.power > 0 {
            calculate_damage(attack, defense, plan.power, &mut roller, self.config)
        } else {
            0
        };

        if let Some(index) = plan.skill
            && let Some(actor) = self.state.registry.get_mut(&decision.actor)
        {
            actor.skills[index].trigger();
        }

        let target = self
            .state
            .registry
            .get_mut(&plan.target)
            .ok_or_else(|| ResolveError::UnknownTarget(plan.target.clone()))?;
        let target_hp = target.take_damage(damage);
        let defeated = target_hp == 0;

        let mut applied_buff = None;
        if let Some(spec) = &plan.buff
            && !defeated
        {
            target.apply_buff(spec);
            applied_buff = Some(spec.id.clone());
        }

        Ok(ActionOutcome {
            actor: decision.actor.clone(),
            kind: decision.kind,
            target: plan.target,
            damage,
            buff: applied_buff,
            target_hp,
            defeated,
        })
    }
}
