//! Combatant state: vitals, turn timer, skills and buffs.
//!
//! Skills and buffs both count down in turns. They expose that counter through
//! the [`Timed`] trait so reconciliation and activation bookkeeping can treat
//! them uniformly.

use std::collections::BTreeMap;

use super::common::{CombatantId, Side};
use crate::config::BattleConfig;

/// Anything that counts down once per activation of its owner.
pub trait Timed {
    fn remaining_turns(&self) -> u32;

    fn set_remaining_turns(&mut self, turns: u32);

    /// Counts down one turn, saturating at zero. Returns true when the counter
    /// reached zero on this tick.
    fn tick(&mut self) -> bool {
        let remaining = self.remaining_turns();
        if remaining == 0 {
            return false;
        }
        self.set_remaining_turns(remaining - 1);
        remaining == 1
    }
}

/// Who a skill may be aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetRule {
    /// A living member of the opposing formation.
    Foe,
    /// A living member of the caster's own formation (including the caster).
    Ally,
    /// The caster only; no target id is needed.
    Caster,
}

/// Effect carried by an active buff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuffEffect {
    /// The holder skips its turns.
    Stun,
    /// Flat attack modifier (negative for debuffs).
    AttackUp(i32),
    /// Flat defense modifier (negative for debuffs).
    DefenseUp(i32),
    /// Flat speed modifier (negative for debuffs).
    SpeedUp(i32),
}

/// Template a skill uses to apply a buff.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffSpec {
    pub id: String,
    pub effect: BuffEffect,
    pub duration: u32,
}

/// An active buff on a combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Buff {
    pub effect: BuffEffect,
    remaining: u32,
}

impl Buff {
    pub fn new(effect: BuffEffect, duration: u32) -> Self {
        Self {
            effect,
            remaining: duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }
}

impl Timed for Buff {
    fn remaining_turns(&self) -> u32 {
        self.remaining
    }

    fn set_remaining_turns(&mut self, turns: u32) {
        self.remaining = turns;
    }
}

/// A skill slot. The definition is static; only the cooldown counter changes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Skill {
    pub name: String,
    /// Turns the skill is unavailable after a cast.
    pub cooldown: u32,
    /// Damage as a percentage of the caster's attack. Zero means no damage.
    pub power: u32,
    pub target: TargetRule,
    pub buff: Option<BuffSpec>,
    remaining: u32,
}

impl Skill {
    pub fn new(name: impl Into<String>, cooldown: u32, power: u32, target: TargetRule) -> Self {
        Self {
            name: name.into(),
            cooldown,
            power,
            target,
            buff: None,
            remaining: 0,
        }
    }

    pub fn with_buff(mut self, buff: BuffSpec) -> Self {
        self.buff = Some(buff);
        self
    }

    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }

    /// Puts the skill on cooldown after a cast.
    pub fn trigger(&mut self) {
        self.remaining = self.cooldown;
    }
}

impl Timed for Skill {
    fn remaining_turns(&self) -> u32 {
        self.remaining
    }

    fn set_remaining_turns(&mut self, turns: u32) {
        self.remaining = turns;
    }
}

/// Full mutable state of one combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub side: Side,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: i32,
    pub defense: i32,
    /// Base speed before buffs. May be zero or negative; scheduling clamps it.
    pub speed: i32,
    /// Accumulated speed since this combatant last acted.
    pub turn_timer: u64,
    pub skills: Vec<Skill>,
    /// Ordered by buff id so iteration (and therefore snapshots) is stable.
    pub buffs: BTreeMap<String, Buff>,
}

impl Combatant {
    pub fn new(id: impl Into<CombatantId>, side: Side, hp: u32) -> Self {
        Self {
            id: id.into(),
            side,
            hp,
            max_hp: hp,
            attack: 10,
            defense: 0,
            speed: 1,
            turn_timer: 0,
            skills: Vec::new(),
            buffs: BTreeMap::new(),
        }
    }

    pub fn with_attack(mut self, attack: i32) -> Self {
        self.attack = attack;
        self
    }

    pub fn with_defense(mut self, defense: i32) -> Self {
        self.defense = defense;
        self
    }

    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_stunned(&self) -> bool {
        self.buffs
            .values()
            .any(|buff| buff.effect == BuffEffect::Stun && !buff.is_expired())
    }

    fn buff_total(&self, pick: impl Fn(BuffEffect) -> Option<i32>) -> i32 {
        self.buffs.values().filter_map(|buff| pick(buff.effect)).sum()
    }

    pub fn effective_attack(&self) -> i32 {
        self.attack
            + self.buff_total(|effect| match effect {
                BuffEffect::AttackUp(amount) => Some(amount),
                _ => None,
            })
    }

    pub fn effective_defense(&self) -> i32 {
        self.defense
            + self.buff_total(|effect| match effect {
                BuffEffect::DefenseUp(amount) => Some(amount),
                _ => None,
            })
    }

    pub fn effective_speed(&self) -> i32 {
        self.speed
            + self.buff_total(|effect| match effect {
                BuffEffect::SpeedUp(amount) => Some(amount),
                _ => None,
            })
    }

    /// Amount added to the turn timer per scheduling pass.
    pub fn timer_step(&self) -> u64 {
        self.effective_speed().max(BattleConfig::MIN_TIMER_STEP) as u64
    }

    /// Applies damage, clamping at zero. A combatant brought to zero hp loses
    /// its accumulated timer.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 {
            self.turn_timer = 0;
        }
        self.hp
    }

    /// Inserts or refreshes a buff. Refreshing keeps the longer duration.
    pub fn apply_buff(&mut self, spec: &BuffSpec) {
        if spec.duration == 0 {
            return;
        }
        self.buffs
            .entry(spec.id.clone())
            .and_modify(|buff| {
                buff.effect = spec.effect;
                let turns = buff.remaining_turns().max(spec.duration);
                buff.set_remaining_turns(turns);
            })
            .or_insert_with(|| Buff::new(spec.effect, spec.duration));
    }

    /// Activation bookkeeping: buffs and cooldowns count down one turn and
    /// expired buffs are dropped.
    pub fn tick_timers(&mut self) {
        for buff in self.buffs.values_mut() {
            buff.tick();
        }
        self.buffs.retain(|_, buff| !buff.is_expired());
        for skill in &mut self.skills {
            skill.tick();
        }
    }
}
