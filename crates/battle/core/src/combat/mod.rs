//! Combat math.
//!
//! Pure functions used by the action resolver. Randomness comes only from a
//! [`Roller`] seeded by the decision being resolved.

pub mod damage;
pub mod rng;

pub use damage::calculate_damage;
pub use rng::{Roller, fallback_seed};
