//! Decision gate: the per-activation state machine deciding whether a turn
//! needs a decision and accepting at most one resolution for it.
//!
//! ```text
//!            open (alive, not stunned)
//!   Idle ──────────────────────────────▶ AwaitingDecision
//!    │                                      │        │
//!    │ open (down or stunned)       accept  │        │ expire
//!    ▼                                      ▼        ▼
//!  Resolved ◀───────────────────────────────┴────────┘
//! ```
//!
//! Every wait is keyed by its activation number. A decision or timeout for
//! any other activation, or arriving outside `AwaitingDecision`, is rejected
//! and leaves the gate unchanged. The gate owns no clock: the runtime races
//! its own timer against incoming decisions and reports whichever wins.

use crate::action::Decision;
use crate::state::{BattleState, CombatantId, ParticipantId, Seats, Side};

/// Gate phase for the current activation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum GatePhase {
    #[default]
    Idle,
    AwaitingDecision {
        actor: CombatantId,
        side: Side,
        activation: u64,
    },
    Resolved {
        activation: u64,
    },
}

/// Result of opening the gate for a new activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateOpen {
    /// The actor must decide; start the decision timer.
    Awaiting,
    /// The turn is a no-op and already resolved.
    Skip(SkipReason),
}

/// Why an activation needs no decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkipReason {
    #[strum(serialize = "down")]
    Down,
    #[strum(serialize = "stunned")]
    Stunned,
    #[strum(serialize = "no active combatant")]
    NoActor,
}

/// A decision that must be rejected without any state change.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UnauthorizedDecision {
    #[error("no decision is outstanding")]
    NotAwaiting,

    #[error("{actor} is not the combatant awaiting a decision ({expected})")]
    NotActive {
        actor: CombatantId,
        expected: CombatantId,
    },

    #[error("{participant} does not control side {side}")]
    WrongController { participant: ParticipantId, side: Side },
}

/// Per-match decision gate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecisionGate {
    phase: GatePhase,
}

impl DecisionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &GatePhase {
        &self.phase
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.phase, GatePhase::AwaitingDecision { .. })
    }

    /// Activation currently awaiting a decision, if any.
    pub fn awaiting_activation(&self) -> Option<u64> {
        match self.phase {
            GatePhase::AwaitingDecision { activation, .. } => Some(activation),
            _ => None,
        }
    }

    /// Opens the gate for the activation recorded in `state.turn`.
    pub fn open(&mut self, state: &BattleState) -> GateOpen {
        let activation = state.turn.activation;
        let Some(actor) = state.active_combatant() else {
            self.phase = GatePhase::Resolved { activation };
            return GateOpen::Skip(SkipReason::NoActor);
        };

        let skip = if !actor.is_alive() {
            Some(SkipReason::Down)
        } else if actor.is_stunned() {
            Some(SkipReason::Stunned)
        } else {
            None
        };

        match skip {
            Some(reason) => {
                self.phase = GatePhase::Resolved { activation };
                GateOpen::Skip(reason)
            }
            None => {
                self.phase = GatePhase::AwaitingDecision {
                    actor: actor.id.clone(),
                    side: actor.side,
                    activation,
                };
                GateOpen::Awaiting
            }
        }
    }

    /// Checks whether `sender` may submit `decision` now. Does not transition.
    pub fn check(
        &self,
        decision: &Decision,
        sender: ParticipantId,
        seats: &Seats,
    ) -> Result<(), UnauthorizedDecision> {
        let GatePhase::AwaitingDecision { actor, side, .. } = &self.phase else {
            return Err(UnauthorizedDecision::NotAwaiting);
        };
        if &decision.actor != actor {
            return Err(UnauthorizedDecision::NotActive {
                actor: decision.actor.clone(),
                expected: actor.clone(),
            });
        }
        if !seats.controls(sender, *side) {
            return Err(UnauthorizedDecision::WrongController {
                participant: sender,
                side: *side,
            });
        }
        Ok(())
    }

    /// Accepts `decision`, resolving the activation. Only the first accepted
    /// decision or expiry per activation succeeds.
    pub fn accept(
        &mut self,
        decision: &Decision,
        sender: ParticipantId,
        seats: &Seats,
    ) -> Result<u64, UnauthorizedDecision> {
        self.check(decision, sender, seats)?;
        let activation = self
            .awaiting_activation()
            .ok_or(UnauthorizedDecision::NotAwaiting)?;
        self.phase = GatePhase::Resolved { activation };
        Ok(activation)
    }

    /// Marks the activation's decision window as expired. Returns false, with
    /// no state change, when `activation` is not the one awaiting a decision.
    pub fn expire(&mut self, activation: u64) -> bool {
        if self.awaiting_activation() != Some(activation) {
            return false;
        }
        self.phase = GatePhase::Resolved { activation };
        true
    }

    /// Records a resolution the authority already performed (followers).
    pub fn mark_resolved(&mut self, activation: u64) {
        self.phase = GatePhase::Resolved { activation };
    }

    /// Returns to `Idle` between activations.
    pub fn reset(&mut self) {
        self.phase = GatePhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BuffEffect, BuffSpec, Combatant, Registry};

    const HOST: ParticipantId = ParticipantId(1);
    const GUEST: ParticipantId = ParticipantId(2);

    fn seats() -> Seats {
        Seats::two_party(HOST, Side::A, [HOST, GUEST])
    }

    fn state(active: &str, activation: u64) -> BattleState {
        let mut stunned = Combatant::new("dazed", Side::A, 10);
        stunned.apply_buff(&BuffSpec {
            id: "stun".into(),
            effect: BuffEffect::Stun,
            duration: 1,
        });
        let registry = Registry::from_roster([
            Combatant::new("hero", Side::A, 10),
            Combatant::new("rogue", Side::B, 10),
            Combatant::new("corpse", Side::B, 0),
            stunned,
        ])
        .unwrap();
        let mut state = BattleState::new(registry);
        state.turn.active = Some(active.into());
        state.turn.activation = activation;
        state
    }

    #[test]
    fn down_or_stunned_actors_skip() {
        let mut gate = DecisionGate::new();
        assert_eq!(
            gate.open(&state("corpse", 1)),
            GateOpen::Skip(SkipReason::Down)
        );
        assert_eq!(gate.phase(), &GatePhase::Resolved { activation: 1 });
        assert_eq!(
            gate.open(&state("dazed", 2)),
            GateOpen::Skip(SkipReason::Stunned)
        );
    }

    #[test]
    fn first_resolution_wins() {
        let mut gate = DecisionGate::new();
        assert_eq!(gate.open(&state("hero", 3)), GateOpen::Awaiting);

        let decision = Decision::attack("hero", "rogue", 0);
        assert_eq!(gate.accept(&decision, HOST, &seats()), Ok(3));

        assert!(!gate.expire(3), "timeout after acceptance must not fire");
        assert_eq!(
            gate.accept(&decision, HOST, &seats()),
            Err(UnauthorizedDecision::NotAwaiting)
        );
    }

    #[test]
    fn expiry_blocks_late_decisions() {
        let mut gate = DecisionGate::new();
        gate.open(&state("rogue", 5));
        assert!(!gate.expire(4), "stale activation");
        assert!(gate.expire(5));
        let late = Decision::attack("rogue", "hero", 0);
        assert_eq!(
            gate.accept(&late, GUEST, &seats()),
            Err(UnauthorizedDecision::NotAwaiting)
        );
    }

    #[test]
    fn rejects_wrong_actor_or_controller_without_transition() {
        let mut gate = DecisionGate::new();
        gate.open(&state("rogue", 7));
        let before = gate.clone();

        let wrong_actor = Decision::attack("hero", "rogue", 0);
        assert_eq!(
            gate.accept(&wrong_actor, HOST, &seats()),
            Err(UnauthorizedDecision::NotActive {
                actor: "hero".into(),
                expected: "rogue".into(),
            })
        );

        let hijack = Decision::attack("rogue", "hero", 0);
        assert_eq!(
            gate.accept(&hijack, HOST, &seats()),
            Err(UnauthorizedDecision::WrongController {
                participant: HOST,
                side: Side::B,
            })
        );
        assert_eq!(gate, before);

        assert_eq!(gate.accept(&hijack, GUEST, &seats()), Ok(7));
    }

    #[test]
    fn idle_gate_rejects_everything() {
        let mut gate = DecisionGate::new();
        let decision = Decision::attack("hero", "rogue", 0);
        assert_eq!(
            gate.accept(&decision, HOST, &seats()),
            Err(UnauthorizedDecision::NotAwaiting)
        );
        assert!(!gate.expire(0));
    }
}
