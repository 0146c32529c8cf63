//! Damage calculation.

use super::rng::Roller;
use crate::config::BattleConfig;

/// Calculate damage from a hit.
///
/// # Formula
///
/// ```text
/// raw     = attack × power% × roll%          (roll drawn from the config range)
/// reduced = raw - defense / defense_divisor
/// final   = max(reduced, minimum_damage)
/// ```
///
/// Negative attack or defense values are treated as zero.
pub fn calculate_damage(
    attack: i32,
    defense: i32,
    power: u32,
    roller: &mut Roller,
    config: &BattleConfig,
) -> u32 {
    let roll = roller.range(config.damage_roll_min, config.damage_roll_max);

    let attack = attack.max(0) as u64;
    let raw = attack
        .saturating_mul(power as u64)
        .saturating_mul(roll as u64)
        / 10_000;

    let divisor = config.defense_divisor.max(1) as u64;
    let reduction = defense.max(0) as u64 / divisor;

    let reduced = raw.saturating_sub(reduction);
    reduced.max(config.minimum_damage as u64).min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_roll_subtracts_half_defense() {
        let config = BattleConfig::default().without_variance();
        let mut roller = Roller::new(0);
        assert_eq!(calculate_damage(20, 6, 100, &mut roller, &config), 17);
        assert_eq!(calculate_damage(20, 0, 150, &mut roller, &config), 30);
    }

    #[test]
    fn never_below_minimum() {
        let config = BattleConfig::default().without_variance();
        let mut roller = Roller::new(0);
        assert_eq!(calculate_damage(1, 100, 100, &mut roller, &config), 1);
        assert_eq!(calculate_damage(-5, 0, 100, &mut roller, &config), 1);
    }

    #[test]
    fn extreme_inputs_saturate() {
        let config = BattleConfig {
            damage_roll_min: u32::MAX,
            damage_roll_max: u32::MAX,
            ..BattleConfig::default()
        };
        let mut roller = Roller::new(0);
        assert_eq!(
            calculate_damage(i32::MAX, 0, u32::MAX, &mut roller, &config),
            u32::MAX
        );
    }

    #[test]
    fn variance_is_seed_determined() {
        let config = BattleConfig::default();
        let first = calculate_damage(50, 0, 100, &mut Roller::new(11), &config);
        let second = calculate_damage(50, 0, 100, &mut Roller::new(11), &config);
        assert_eq!(first, second);
        assert!((45..=55).contains(&first));
    }
}
