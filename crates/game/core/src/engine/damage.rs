//! Damage formula.
//!
//! Kept free of session state so it can be checked in isolation:
//!
//! ```text
//! floor(((2*L/5 + 2) * P * A / D / 50 + 2) * eff * crit * rand * weather)
//! ```
//!
//! A move with power > 0 always deals at least 1 damage, even against a
//! type that takes no damage from it (`eff == 0`).

use crate::config::BattleConfig;

/// Inputs to [`calculate_damage`], already scaled by stages and forms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageInput {
    pub level: u32,
    pub power: u32,
    pub attack: f64,
    pub defense: f64,
    pub effectiveness: f64,
    pub critical: bool,
    /// In `[RANDOM_FACTOR_MIN, RANDOM_FACTOR_MAX]`.
    pub random_factor: f64,
    pub weather: f64,
}

pub fn calculate_damage(input: DamageInput) -> u32 {
    if input.power == 0 {
        return 0;
    }

    let level = f64::from(input.level);
    let power = f64::from(input.power);
    let defense = input.defense.max(1.0);

    let base = (2.0 * level / 5.0 + 2.0) * power * input.attack / defense / 50.0 + 2.0;
    let critical = if input.critical {
        BattleConfig::CRITICAL_MULTIPLIER
    } else {
        1.0
    };
    let random = input
        .random_factor
        .clamp(BattleConfig::RANDOM_FACTOR_MIN, BattleConfig::RANDOM_FACTOR_MAX);

    let effectiveness = input.effectiveness.max(0.0);
    let damage = (base * effectiveness * critical * random * input.weather).floor();
    (damage as u32).max(1)
}

/// Maps a unit roll in `[0, 1)` onto the random damage factor range.
pub fn random_factor(unit: f64) -> f64 {
    BattleConfig::RANDOM_FACTOR_MIN
        + unit * (BattleConfig::RANDOM_FACTOR_MAX - BattleConfig::RANDOM_FACTOR_MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> DamageInput {
        DamageInput {
            level: 50,
            power: 80,
            attack: 100.0,
            defense: 100.0,
            effectiveness: 1.0,
            critical: false,
            random_factor: 1.0,
            weather: 1.0,
        }
    }

    #[test]
    fn matches_reference_formula() {
        // (22 * 80 * 1 / 50 + 2) = 37.2
        assert_eq!(calculate_damage(input()), 37);
    }

    #[test]
    fn critical_and_effectiveness_multiply() {
        let dmg = calculate_damage(DamageInput {
            critical: true,
            effectiveness: 2.0,
            ..input()
        });
        assert_eq!(dmg, (37.2_f64 * 2.0 * 1.5).floor() as u32);
    }

    #[test]
    fn damaging_moves_always_deal_at_least_one() {
        let weak = DamageInput {
            level: 1,
            power: 1,
            attack: 1.0,
            defense: 500.0,
            effectiveness: 0.25,
            random_factor: 0.85,
            ..input()
        };
        assert_eq!(calculate_damage(weak), 1);
        assert_eq!(
            calculate_damage(DamageInput {
                power: 90,
                effectiveness: 0.0,
                ..input()
            }),
            1
        );
        assert_eq!(calculate_damage(DamageInput { power: 0, ..input() }), 0);
    }

    #[test]
    fn random_factor_spans_range() {
        assert_eq!(random_factor(0.0), BattleConfig::RANDOM_FACTOR_MIN);
        assert!(random_factor(0.999_999) < BattleConfig::RANDOM_FACTOR_MAX);
    }
}
