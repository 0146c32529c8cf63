//! Mapping between sides and the participants controlling them.

use super::{ParticipantId, Side};

/// Who controls each side of a two-participant match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Seats {
    local: ParticipantId,
    local_side: Side,
    opponent: Option<ParticipantId>,
}

impl Seats {
    /// Seats the local participant on `local_side` and the first other known
    /// participant on the opposing side.
    ///
    /// Only two-participant matches are supported: additional participants are
    /// ignored. [`Seats::extra_participants`] reports how many were dropped so
    /// callers can log it.
    pub fn two_party(
        local: ParticipantId,
        local_side: Side,
        participants: impl IntoIterator<Item = ParticipantId>,
    ) -> Self {
        let opponent = participants.into_iter().find(|&p| p != local);
        Self {
            local,
            local_side,
            opponent,
        }
    }

    /// Number of known participants beyond the two this match can seat.
    pub fn extra_participants(participants: &[ParticipantId]) -> usize {
        let mut distinct = participants.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len().saturating_sub(2)
    }

    pub fn local(&self) -> ParticipantId {
        self.local
    }

    pub fn local_side(&self) -> Side {
        self.local_side
    }

    pub fn opponent(&self) -> Option<ParticipantId> {
        self.opponent
    }

    /// Participant controlling `side`, if seated.
    pub fn controller(&self, side: Side) -> Option<ParticipantId> {
        if side == self.local_side {
            Some(self.local)
        } else {
            self.opponent
        }
    }

    /// Side controlled by `participant`, if seated.
    pub fn side_of(&self, participant: ParticipantId) -> Option<Side> {
        if participant == self.local {
            Some(self.local_side)
        } else if Some(participant) == self.opponent {
            Some(self.local_side.foe())
        } else {
            None
        }
    }

    pub fn controls(&self, participant: ParticipantId, side: Side) -> bool {
        self.controller(side) == Some(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_is_first_other_participant() {
        let seats = Seats::two_party(
            ParticipantId(2),
            Side::B,
            [ParticipantId(2), ParticipantId(7), ParticipantId(9)],
        );
        assert_eq!(seats.opponent(), Some(ParticipantId(7)));
        assert_eq!(seats.controller(Side::A), Some(ParticipantId(7)));
        assert_eq!(seats.controller(Side::B), Some(ParticipantId(2)));
        assert_eq!(seats.side_of(ParticipantId(9)), None);
    }

    #[test]
    fn counts_participants_beyond_two() {
        let list = [ParticipantId(1), ParticipantId(2), ParticipantId(3)];
        assert_eq!(Seats::extra_participants(&list), 1);
        assert_eq!(Seats::extra_participants(&list[..2]), 0);
    }

    #[test]
    fn solo_match_has_no_opponent() {
        let seats = Seats::two_party(ParticipantId(1), Side::A, [ParticipantId(1)]);
        assert_eq!(seats.opponent(), None);
        assert!(seats.controls(ParticipantId(1), Side::A));
        assert!(!seats.controls(ParticipantId(1), Side::B));
    }
}
