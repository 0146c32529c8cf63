//! Canonical state snapshots and their reconciliation.
//!
//! The authority captures a [`GameplaySnapshot`] after every resolved action
//! and every participant, the authority included, applies it. Applying
//! overwrites local values; references the local registry cannot satisfy are
//! reported in the [`ApplyReport`] rather than failing the whole snapshot.

use crate::outcome::MatchOutcome;
use crate::state::{CombatantId, ParticipantId, Registry, Timed};

/// Cooldown of one skill slot, addressed by its index in the skill list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillCooldown {
    pub index: u32,
    pub cooldown: u32,
}

/// Remaining duration of one active buff.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffDuration {
    pub id: String,
    pub duration: u32,
}

/// Mutable state of one combatant as carried by a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantRecord {
    pub id: CombatantId,
    pub hp: u32,
    pub turn_timer: u64,
    pub skills: Vec<SkillCooldown>,
    pub buffs: Vec<BuffDuration>,
}

/// Authoritative dump of every combatant plus the outcome, if decided.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameplaySnapshot {
    pub winner: Option<ParticipantId>,
    pub loser: Option<ParticipantId>,
    pub combatants: Vec<CombatantRecord>,
}

/// What happened while applying a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Records written to a local combatant.
    pub applied: usize,
    /// Ids present in the snapshot but not in the local registry.
    pub unknown_combatants: Vec<CombatantId>,
    /// Skill entries whose index is out of range locally.
    pub skipped_skills: Vec<(CombatantId, u32)>,
    /// Buff entries naming a buff the combatant does not have locally.
    pub skipped_buffs: Vec<(CombatantId, String)>,
}

impl ApplyReport {
    /// True when the local registry could not hold part of the snapshot and
    /// a fresh one should be requested.
    pub fn needs_resync(&self) -> bool {
        !self.unknown_combatants.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.unknown_combatants.is_empty()
            && self.skipped_skills.is_empty()
            && self.skipped_buffs.is_empty()
    }
}

impl GameplaySnapshot {
    /// Captures every combatant in registry order.
    pub fn capture(registry: &Registry, outcome: Option<MatchOutcome>) -> Self {
        let combatants = registry
            .iter()
            .map(|combatant| CombatantRecord {
                id: combatant.id.clone(),
                hp: combatant.hp,
                turn_timer: combatant.turn_timer,
                skills: combatant
                    .skills
                    .iter()
                    .enumerate()
                    .map(|(index, skill)| SkillCooldown {
                        index: index as u32,
                        cooldown: skill.remaining_turns(),
                    })
                    .collect(),
                buffs: combatant
                    .buffs
                    .iter()
                    .map(|(id, buff)| BuffDuration {
                        id: id.clone(),
                        duration: buff.remaining_turns(),
                    })
                    .collect(),
            })
            .collect();

        let (winner, loser) = match outcome {
            Some(outcome) => (outcome.winner, outcome.loser),
            None => (None, None),
        };

        Self {
            winner,
            loser,
            combatants,
        }
    }

    /// The match outcome, when the snapshot carries one.
    pub fn outcome(&self) -> Option<MatchOutcome> {
        if self.winner.is_none() && self.loser.is_none() {
            return None;
        }
        Some(MatchOutcome {
            winner: self.winner,
            loser: self.loser,
        })
    }

    /// Overwrites the matching combatants in `registry`.
    pub fn apply_to(&self, registry: &mut Registry) -> ApplyReport {
        let mut report = ApplyReport::default();

        for record in &self.combatants {
            let Some(combatant) = registry.get_mut(&record.id) else {
                report.unknown_combatants.push(record.id.clone());
                continue;
            };

            combatant.hp = record.hp;
            combatant.turn_timer = if record.hp == 0 { 0 } else { record.turn_timer };

            for entry in &record.skills {
                match combatant.skills.get_mut(entry.index as usize) {
                    Some(skill) => skill.set_remaining_turns(entry.cooldown),
                    None => report
                        .skipped_skills
                        .push((record.id.clone(), entry.index)),
                }
            }

            for entry in &record.buffs {
                if entry.duration == 0 {
                    combatant.buffs.remove(&entry.id);
                    continue;
                }
                match combatant.buffs.get_mut(&entry.id) {
                    Some(buff) => buff.set_remaining_turns(entry.duration),
                    None => report
                        .skipped_buffs
                        .push((record.id.clone(), entry.id.clone())),
                }
            }

            report.applied += 1;
        }

        report
    }
}

#[cfg(feature = "serde")]
impl GameplaySnapshot {
    /// Canonical bincode encoding.
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    /// Hex SHA-256 of the canonical encoding. Two participants holding equal
    /// snapshots always report the same digest.
    pub fn digest(&self) -> Result<String, bincode::Error> {
        use sha2::{Digest, Sha256};

        let bytes = self.encode()?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BuffEffect, BuffSpec, Combatant, Side, Skill, TargetRule};

    fn registry() -> Registry {
        let mut mage = Combatant::new("mage", Side::A, 30)
            .with_skill(Skill::new("bolt", 2, 150, TargetRule::Foe))
            .with_skill(Skill::new("ward", 3, 0, TargetRule::Ally));
        mage.apply_buff(&BuffSpec {
            id: "haste".into(),
            effect: BuffEffect::SpeedUp(2),
            duration: 2,
        });
        Registry::from_roster([mage, Combatant::new("wolf", Side::B, 25)]).unwrap()
    }

    fn mutated() -> Registry {
        let mut registry = registry();
        let mage = registry.get_mut(&"mage".into()).unwrap();
        mage.hp = 12;
        mage.turn_timer = 7;
        mage.skills[1].trigger();
        let wolf = registry.get_mut(&"wolf".into()).unwrap();
        wolf.take_damage(25);
        registry
    }

    #[test]
    fn apply_converges_and_is_idempotent() {
        let authority = mutated();
        let snapshot = GameplaySnapshot::capture(&authority, None);

        let mut follower = registry();
        let report = snapshot.apply_to(&mut follower);
        assert!(report.is_clean());
        assert_eq!(report.applied, 2);
        assert_eq!(follower, authority);

        snapshot.apply_to(&mut follower);
        assert_eq!(follower, authority);
    }

    #[test]
    fn zero_hp_forces_zero_timer() {
        let mut snapshot = GameplaySnapshot::capture(&registry(), None);
        snapshot.combatants[1].hp = 0;
        snapshot.combatants[1].turn_timer = 40;

        let mut local = registry();
        snapshot.apply_to(&mut local);
        assert_eq!(local.get(&"wolf".into()).unwrap().turn_timer, 0);
    }

    #[test]
    fn unresolvable_entries_are_reported_not_applied() {
        let mut snapshot = GameplaySnapshot::capture(&registry(), None);
        snapshot.combatants[0].skills.push(SkillCooldown {
            index: 2,
            cooldown: 9,
        });
        snapshot.combatants[0].buffs.push(BuffDuration {
            id: "curse".into(),
            duration: 4,
        });
        snapshot.combatants.push(CombatantRecord {
            id: "ghost".into(),
            hp: 1,
            turn_timer: 0,
            skills: Vec::new(),
            buffs: Vec::new(),
        });

        let mut local = registry();
        let report = snapshot.apply_to(&mut local);

        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped_skills, vec![(CombatantId::from("mage"), 2)]);
        assert_eq!(
            report.skipped_buffs,
            vec![(CombatantId::from("mage"), String::from("curse"))]
        );
        assert_eq!(report.unknown_combatants, vec![CombatantId::from("ghost")]);
        assert!(report.needs_resync());
        assert!(!local.get(&"mage".into()).unwrap().buffs.contains_key("curse"));
    }

    #[test]
    fn zero_duration_removes_buff() {
        let mut snapshot = GameplaySnapshot::capture(&registry(), None);
        snapshot.combatants[0].buffs[0].duration = 0;

        let mut local = registry();
        let report = snapshot.apply_to(&mut local);
        assert!(report.is_clean());
        assert!(local.get(&"mage".into()).unwrap().buffs.is_empty());
    }

    #[test]
    fn outcome_surfaces_from_snapshot() {
        let outcome = MatchOutcome {
            winner: Some(ParticipantId(2)),
            loser: Some(ParticipantId(1)),
        };
        let snapshot = GameplaySnapshot::capture(&registry(), Some(outcome));
        assert_eq!(snapshot.outcome(), Some(outcome));
        assert_eq!(GameplaySnapshot::capture(&registry(), None).outcome(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let first = GameplaySnapshot::capture(&mutated(), None);
        let second = GameplaySnapshot::capture(&mutated(), None);
        assert_eq!(first.digest().unwrap(), second.digest().unwrap());
        assert_eq!(first.digest().unwrap().len(), 64);

        let other = GameplaySnapshot::capture(&registry(), None);
        assert_ne!(first.digest().unwrap(), other.digest().unwrap());

        let decoded = GameplaySnapshot::decode(&first.encode().unwrap()).unwrap();
        assert_eq!(decoded, first);
    }
}
