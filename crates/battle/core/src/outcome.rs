//! Match-end detection.

use crate::state::{ParticipantId, Registry, Seats, Side};

/// Winner and loser of a finished match.
///
/// Either id may be absent when the side is unseated (a solo match, or an
/// opponent that never joined).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchOutcome {
    pub winner: Option<ParticipantId>,
    pub loser: Option<ParticipantId>,
}

impl MatchOutcome {
    /// Outcome in which `losing_side` lost.
    pub fn for_losing_side(losing_side: Side, seats: &Seats) -> Self {
        Self {
            winner: seats.controller(losing_side.foe()),
            loser: seats.controller(losing_side),
        }
    }
}

/// Result of evaluating the board after a resolved action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evaluation {
    Continue,
    Ended {
        losing_side: Side,
        outcome: MatchOutcome,
    },
}

impl Evaluation {
    pub fn is_ended(&self) -> bool {
        matches!(self, Evaluation::Ended { .. })
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        match self {
            Evaluation::Continue => None,
            Evaluation::Ended { outcome, .. } => Some(*outcome),
        }
    }
}

/// Checks whether the match ended after a combatant of `acting_side` acted.
///
/// The acting side is checked first: an action that wipes out its own
/// formation loses even if the opposing formation also fell.
pub fn evaluate(registry: &Registry, acting_side: Side, seats: &Seats) -> Evaluation {
    let acting = registry.formation(acting_side);
    let losing_side = if !acting.is_any_alive() {
        acting.side()
    } else if !acting.foe().is_any_alive() {
        acting.foe().side()
    } else {
        return Evaluation::Continue;
    };

    Evaluation::Ended {
        losing_side,
        outcome: MatchOutcome::for_losing_side(losing_side, seats),
    }
}

/// Outcome when the participant controlling `side` leaves the match: its
/// side is treated as having no living members.
pub fn forfeit(side: Side, seats: &Seats) -> Evaluation {
    Evaluation::Ended {
        losing_side: side,
        outcome: MatchOutcome::for_losing_side(side, seats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Combatant;

    const LOCAL: ParticipantId = ParticipantId(1);
    const REMOTE: ParticipantId = ParticipantId(2);

    fn seats() -> Seats {
        Seats::two_party(LOCAL, Side::A, [LOCAL, REMOTE])
    }

    fn registry(a_hp: u32, b_hp: u32) -> Registry {
        Registry::from_roster([
            Combatant::new("a1", Side::A, a_hp),
            Combatant::new("a2", Side::A, 0),
            Combatant::new("b1", Side::B, b_hp),
        ])
        .unwrap()
    }

    #[test]
    fn continues_while_both_sides_stand() {
        assert_eq!(
            evaluate(&registry(5, 5), Side::A, &seats()),
            Evaluation::Continue
        );
    }

    #[test]
    fn fallen_acting_side_loses() {
        let evaluation = evaluate(&registry(0, 5), Side::A, &seats());
        assert_eq!(
            evaluation,
            Evaluation::Ended {
                losing_side: Side::A,
                outcome: MatchOutcome {
                    winner: Some(REMOTE),
                    loser: Some(LOCAL),
                },
            }
        );
    }

    #[test]
    fn fallen_opposing_side_loses() {
        let evaluation = evaluate(&registry(5, 0), Side::A, &seats());
        assert_eq!(
            evaluation.outcome(),
            Some(MatchOutcome {
                winner: Some(LOCAL),
                loser: Some(REMOTE),
            })
        );
    }

    #[test]
    fn acting_side_checked_first_when_both_fall() {
        let evaluation = evaluate(&registry(0, 0), Side::B, &seats());
        assert!(matches!(
            evaluation,
            Evaluation::Ended {
                losing_side: Side::B,
                ..
            }
        ));
    }

    #[test]
    fn forfeit_makes_leaver_the_loser() {
        let evaluation = forfeit(Side::B, &seats());
        assert_eq!(
            evaluation.outcome(),
            Some(MatchOutcome {
                winner: Some(LOCAL),
                loser: Some(REMOTE),
            })
        );
    }

    #[test]
    fn unseated_opponent_yields_missing_winner() {
        let solo = Seats::two_party(LOCAL, Side::A, [LOCAL]);
        let evaluation = evaluate(&registry(0, 5), Side::A, &solo);
        assert_eq!(
            evaluation.outcome(),
            Some(MatchOutcome {
                winner: None,
                loser: Some(LOCAL),
            })
        );
    }
}
