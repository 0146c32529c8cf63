/// Battle rules constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// Damage roll range as a percentage of attack, inclusive.
    pub damage_roll_min: u32,
    pub damage_roll_max: u32,
    /// Defense is divided by this before being subtracted from raw damage.
    pub defense_divisor: u32,
    /// Floor for any damaging hit.
    pub minimum_damage: u32,
}

impl BattleConfig {
    // ===== compile-time constants =====
    /// Smallest amount a living combatant's turn timer grows per pass.
    pub const MIN_TIMER_STEP: i32 = 1;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_DAMAGE_ROLL_MIN: u32 = 90;
    pub const DEFAULT_DAMAGE_ROLL_MAX: u32 = 110;
    pub const DEFAULT_DEFENSE_DIVISOR: u32 = 2;
    pub const DEFAULT_MINIMUM_DAMAGE: u32 = 1;

    pub fn new() -> Self {
        Self {
            damage_roll_min: Self::DEFAULT_DAMAGE_ROLL_MIN,
            damage_roll_max: Self::DEFAULT_DAMAGE_ROLL_MAX,
            defense_divisor: Self::DEFAULT_DEFENSE_DIVISOR,
            minimum_damage: Self::DEFAULT_MINIMUM_DAMAGE,
        }
    }

    /// Disables damage variance; every hit rolls exactly 100%.
    pub fn without_variance(mut self) -> Self {
        self.damage_roll_min = 100;
        self.damage_roll_max = 100;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
