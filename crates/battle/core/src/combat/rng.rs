//! Seeded random rolls for action resolution.
//!
//! Every random component of a resolved action is drawn from a [`Roller`]
//! seeded with the decision's seed. The authority and every follower that
//! resolves the same decision therefore draw identical values.

/// PCG-XSH-RR stream (64-bit state, 32-bit output).
///
/// Reference: <https://www.pcg-random.org/>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roller {
    state: u64,
}

impl Roller {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    fn step(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        self.state
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    pub fn next_u32(&mut self) -> u32 {
        let state = self.step();
        Self::output(state)
    }

    /// Value in `[min, max]` inclusive.
    pub fn range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        match (max - min).checked_add(1) {
            Some(span) => min + self.next_u32() % span,
            // Full u32 range.
            None => self.next_u32(),
        }
    }

    /// Index in `[0, len)`. `len` must be non-zero.
    pub fn pick(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "pick from an empty set");
        (self.next_u32() as usize) % len
    }
}

/// Seed for a decision the authority synthesizes itself (timeout fallback or
/// auto-play), derived from the match seed and the activation number.
pub fn fallback_seed(match_seed: u64, activation: u64) -> u64 {
    let mut hash = match_seed;
    hash ^= activation.wrapping_mul(0x9e3779b97f4a7c15);

    // SplitMix64 finalizer
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xc4ceb9fe1a85ec53);
    hash ^= hash >> 33;

    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Roller::new(42);
        let mut b = Roller::new(42);
        let left: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let right: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn range_stays_in_bounds() {
        let mut roller = Roller::new(7);
        for _ in 0..1000 {
            let value = roller.range(90, 110);
            assert!((90..=110).contains(&value));
        }
        assert_eq!(roller.range(5, 5), 5);
    }

    #[test]
    fn full_range_does_not_overflow() {
        let mut roller = Roller::new(3);
        let expected = Roller::new(3).next_u32();
        assert_eq!(roller.range(0, u32::MAX), expected);
        assert!(roller.range(1, u32::MAX) >= 1);
    }

    #[test]
    fn fallback_seed_varies_by_activation() {
        assert_ne!(fallback_seed(1, 1), fallback_seed(1, 2));
        assert_eq!(fallback_seed(9, 3), fallback_seed(9, 3));
    }
}
