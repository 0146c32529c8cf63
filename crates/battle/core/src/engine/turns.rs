use crate::state::CombatantId;

use super::{BattleEngine, TurnError};

/// One combatant becoming the active actor.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Activation {
    pub combatant: CombatantId,
    pub activation: u64,
}

/// Turn scheduling methods for BattleEngine.
impl<'a> BattleEngine<'a> {
    /// Returns the combatant currently taking its turn.
    pub fn current_actor(&self) -> Option<&CombatantId> {
        self.state.turn.active.as_ref()
    }

    /// Advances the speed timeline and activates the next actor.
    ///
    /// Every living combatant's timer grows by its clamped speed; dead
    /// combatants are pinned at zero. The strictly greatest timer wins and
    /// ties go to the combatant registered first. The previously active
    /// combatant, if still set, restarts from zero before the pass.
    ///
    /// With speeds 5 and 3 the second advance yields timers (5, 6), not
    /// (0, 6): the reset actor accrues its speed in the same pass.
    ///
    /// Leaves the state untouched when nobody is alive.
    pub fn advance_turn(&mut self) -> Result<Activation, TurnError> {
        if !self.state.registry.iter().any(|c| c.is_alive()) {
            return Err(TurnError::NoLivingCombatants);
        }

        if let Some(previous) = self.state.turn.active.take()
            && let Some(combatant) = self.state.registry.get_mut(&previous)
        {
            combatant.turn_timer = 0;
        }

        let mut selected: Option<(u64, CombatantId)> = None;
        for combatant in self.state.registry.iter_mut() {
            if !combatant.is_alive() {
                combatant.turn_timer = 0;
                continue;
            }
            combatant.turn_timer = combatant.turn_timer.saturating_add(combatant.timer_step());
            let leads = match &selected {
                Some((best, _)) => combatant.turn_timer > *best,
                None => true,
            };
            if leads {
                selected = Some((combatant.turn_timer, combatant.id.clone()));
            }
        }

        let (_, combatant) = selected.ok_or(TurnError::NoLivingCombatants)?;
        let activation = self.state.turn.activation + 1;
        self.activate(combatant, activation)
    }

    /// Makes `combatant` the active actor for `activation`.
    ///
    /// Followers call this directly with the activation number broadcast by
    /// the authority. The newly active combatant's buffs and skill cooldowns
    /// count down one turn.
    pub fn activate(
        &mut self,
        combatant: CombatantId,
        activation: u64,
    ) -> Result<Activation, TurnError> {
        let actor = self
            .state
            .registry
            .get_mut(&combatant)
            .ok_or_else(|| TurnError::UnknownCombatant(combatant.clone()))?;
        actor.tick_timers();

        self.state.turn.active = Some(combatant.clone());
        self.state.turn.activation = activation;

        Ok(Activation {
            combatant,
            activation,
        })
    }

    /// Ends the current activation: the actor's timer restarts from zero and
    /// no combatant is active until the next advance.
    pub fn end_activation(&mut self) -> Option<CombatantId> {
        let previous = self.state.turn.active.take()?;
        if let Some(combatant) = self.state.registry.get_mut(&previous) {
            combatant.turn_timer = 0;
        }
        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::state::{BattleState, Combatant, Registry, Side};

    fn state(roster: Vec<Combatant>) -> BattleState {
        BattleState::new(Registry::from_roster(roster).unwrap())
    }

    fn timers(state: &BattleState) -> Vec<u64> {
        state.registry.iter().map(|c| c.turn_timer).collect()
    }

    #[test]
    fn faster_combatant_acts_first_then_slower_catches_up() {
        let config = BattleConfig::default();
        let mut state = state(vec![
            Combatant::new("fast", Side::A, 10).with_speed(5),
            Combatant::new("slow", Side::B, 10).with_speed(3),
        ]);

        let mut engine = BattleEngine::new(&mut state, &config);
        let first = engine.advance_turn().unwrap();
        assert_eq!(first.combatant.as_str(), "fast");
        assert_eq!(first.activation, 1);
        assert_eq!(timers(&state), [5, 3]);

        let mut engine = BattleEngine::new(&mut state, &config);
        engine.end_activation();
        assert_eq!(timers(&state), [0, 3]);

        let mut engine = BattleEngine::new(&mut state, &config);
        let second = engine.advance_turn().unwrap();
        assert_eq!(second.combatant.as_str(), "slow");
        assert_eq!(second.activation, 2);
        assert_eq!(timers(&state), [5, 6]);
    }

    #[test]
    fn unselected_timers_grow_by_speed_and_selected_resets() {
        let config = BattleConfig::default();
        let mut state = state(vec![
            Combatant::new("a", Side::A, 10).with_speed(4),
            Combatant::new("b", Side::B, 10).with_speed(2),
            Combatant::new("c", Side::B, 10).with_speed(3),
        ]);

        for _ in 0..12 {
            let before = timers(&state);
            let mut engine = BattleEngine::new(&mut state, &config);
            let selected = engine.advance_turn().unwrap().combatant;
            let after = timers(&state);
            let speeds = [4, 2, 3];
            for (i, combatant) in state.registry.iter().enumerate() {
                assert_eq!(after[i], before[i] + speeds[i]);
                if combatant.id == selected {
                    assert_eq!(after[i], *after.iter().max().unwrap());
                }
            }
            let mut engine = BattleEngine::new(&mut state, &config);
            engine.end_activation();
            let reset = state.registry.get(&selected).unwrap().turn_timer;
            assert_eq!(reset, 0);
        }
    }

    #[test]
    fn dead_combatants_are_never_selected() {
        let config = BattleConfig::default();
        let mut fallen = Combatant::new("fallen", Side::A, 0).with_speed(100);
        fallen.turn_timer = 40;
        let mut state = state(vec![
            fallen,
            Combatant::new("alive", Side::B, 10).with_speed(1),
        ]);

        for _ in 0..5 {
            let mut engine = BattleEngine::new(&mut state, &config);
            let next = engine.advance_turn().unwrap();
            assert_eq!(next.combatant.as_str(), "alive");
            assert_eq!(state.registry.get(&"fallen".into()).unwrap().turn_timer, 0);
        }
    }

    #[test]
    fn ties_go_to_first_registered() {
        let config = BattleConfig::default();
        let mut state = state(vec![
            Combatant::new("first", Side::A, 10).with_speed(4),
            Combatant::new("second", Side::B, 10).with_speed(4),
        ]);
        let mut engine = BattleEngine::new(&mut state, &config);
        assert_eq!(engine.advance_turn().unwrap().combatant.as_str(), "first");
    }

    #[test]
    fn zero_speed_still_progresses() {
        let config = BattleConfig::default();
        let mut state = state(vec![Combatant::new("idle", Side::A, 10).with_speed(0)]);
        let mut engine = BattleEngine::new(&mut state, &config);
        engine.advance_turn().unwrap();
        assert_eq!(timers(&state), [1]);
    }

    #[test]
    fn no_living_combatants_is_a_no_op() {
        let config = BattleConfig::default();
        let mut dead = Combatant::new("a", Side::A, 0);
        dead.turn_timer = 3;
        let mut state = state(vec![dead]);
        let before = state.clone();

        let mut engine = BattleEngine::new(&mut state, &config);
        assert_eq!(engine.advance_turn(), Err(TurnError::NoLivingCombatants));
        assert_eq!(state, before);
    }

    #[test]
    fn activation_ticks_the_actor_only() {
        use crate::state::{BuffEffect, BuffSpec, Timed};

        let config = BattleConfig::default();
        let slow = BuffSpec {
            id: "slow".into(),
            effect: BuffEffect::SpeedUp(-1),
            duration: 2,
        };
        let mut a = Combatant::new("a", Side::A, 10).with_speed(9);
        a.apply_buff(&slow);
        let mut b = Combatant::new("b", Side::B, 10).with_speed(1);
        b.apply_buff(&slow);
        let mut state = state(vec![a, b]);

        let mut engine = BattleEngine::new(&mut state, &config);
        engine.advance_turn().unwrap();

        let a = state.registry.get(&"a".into()).unwrap();
        let b = state.registry.get(&"b".into()).unwrap();
        assert_eq!(a.buffs["slow"].remaining_turns(), 1);
        assert_eq!(b.buffs["slow"].remaining_turns(), 2);
    }
}
