//! Weather and field-wide conditions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::env::ElementType;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Sun,
    Sandstorm,
    Fog,
}

impl Weather {
    /// Damage multiplier for a move of `element` under this weather.
    pub fn damage_modifier(self, element: ElementType) -> f64 {
        match (self, element) {
            (Weather::Rain, ElementType::Water) | (Weather::Sun, ElementType::Fire) => 1.5,
            (Weather::Rain, ElementType::Fire) | (Weather::Sun, ElementType::Water) => 0.5,
            _ => 1.0,
        }
    }

    pub fn flee_modifier(self) -> f64 {
        match self {
            Weather::Fog => 1.25,
            _ => 1.0,
        }
    }

    /// End-of-round chip damage divisor for a combatant with `types`.
    pub fn chip_divisor(self, types: &[ElementType]) -> Option<u32> {
        let immune = types
            .iter()
            .any(|t| matches!(t, ElementType::Earth | ElementType::Metal));
        match self {
            Weather::Sandstorm if !immune => Some(16),
            _ => None,
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FieldConditionKind {
    /// Everyone moves faster.
    Tailwind,
    /// Escaping is easier.
    Mist,
    /// Escaping is harder.
    Gravity,
}

impl FieldConditionKind {
    fn modifiers(self) -> (Option<f64>, Option<f64>) {
        // (flee, speed)
        match self {
            FieldConditionKind::Tailwind => (None, Some(1.5)),
            FieldConditionKind::Mist => (Some(1.5), None),
            FieldConditionKind::Gravity => (Some(0.5), None),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub kind: FieldConditionKind,
    pub turns_remaining: u32,
    pub flee_modifier: Option<f64>,
    pub speed_modifier: Option<f64>,
}

impl FieldCondition {
    pub fn new(kind: FieldConditionKind, turns: u32) -> Self {
        let (flee_modifier, speed_modifier) = kind.modifiers();
        Self {
            kind,
            turns_remaining: turns.max(1),
            flee_modifier,
            speed_modifier,
        }
    }
}

/// What expired during one end-of-round tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldTick {
    pub weather_ended: Option<Weather>,
    pub expired: Vec<FieldConditionKind>,
}

/// Weather plus active field conditions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    pub weather: Weather,
    /// Rounds left before the weather clears; unused while `Clear`.
    pub weather_turns: u32,
    pub conditions: Vec<FieldCondition>,
}

impl FieldState {
    pub fn set_weather(&mut self, weather: Weather, turns: u32) {
        self.weather = weather;
        self.weather_turns = if weather == Weather::Clear {
            0
        } else {
            turns.max(1)
        };
    }

    /// Adds a condition, refreshing the duration if it is already present.
    pub fn add_condition(&mut self, kind: FieldConditionKind, turns: u32) {
        match self.conditions.iter_mut().find(|c| c.kind == kind) {
            Some(existing) => existing.turns_remaining = turns.max(1),
            None => self.conditions.push(FieldCondition::new(kind, turns)),
        }
    }

    pub fn has_condition(&self, kind: FieldConditionKind) -> bool {
        self.conditions.iter().any(|c| c.kind == kind)
    }

    pub fn flee_modifier(&self) -> f64 {
        self.weather.flee_modifier()
            * self
                .conditions
                .iter()
                .filter_map(|c| c.flee_modifier)
                .product::<f64>()
    }

    pub fn speed_modifier(&self) -> f64 {
        self.conditions
            .iter()
            .filter_map(|c| c.speed_modifier)
            .product()
    }

    /// Counts down weather and conditions by one round.
    pub fn tick(&mut self) -> FieldTick {
        let mut tick = FieldTick::default();

        if self.weather != Weather::Clear {
            self.weather_turns = self.weather_turns.saturating_sub(1);
            if self.weather_turns == 0 {
                tick.weather_ended = Some(self.weather);
                self.weather = Weather::Clear;
            }
        }

        for condition in &mut self.conditions {
            condition.turns_remaining = condition.turns_remaining.saturating_sub(1);
            if condition.turns_remaining == 0 {
                tick.expired.push(condition.kind);
            }
        }
        self.conditions.retain(|c| c.turns_remaining > 0);

        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_scales_fire_and_water() {
        assert_eq!(Weather::Rain.damage_modifier(ElementType::Water), 1.5);
        assert_eq!(Weather::Rain.damage_modifier(ElementType::Fire), 0.5);
        assert_eq!(Weather::Sun.damage_modifier(ElementType::Fire), 1.5);
        assert_eq!(Weather::Sun.damage_modifier(ElementType::Nature), 1.0);
    }

    #[test]
    fn sandstorm_spares_earth_and_metal() {
        assert_eq!(
            Weather::Sandstorm.chip_divisor(&[ElementType::Fire]),
            Some(16)
        );
        assert_eq!(
            Weather::Sandstorm.chip_divisor(&[ElementType::Fire, ElementType::Metal]),
            None
        );
        assert_eq!(Weather::Rain.chip_divisor(&[ElementType::Fire]), None);
    }

    #[test]
    fn tick_expires_weather_and_conditions() {
        let mut field = FieldState::default();
        field.set_weather(Weather::Rain, 2);
        field.add_condition(FieldConditionKind::Mist, 1);

        let first = field.tick();
        assert_eq!(first.weather_ended, None);
        assert_eq!(first.expired, vec![FieldConditionKind::Mist]);
        assert!(field.conditions.is_empty());

        let second = field.tick();
        assert_eq!(second.weather_ended, Some(Weather::Rain));
        assert_eq!(field.weather, Weather::Clear);
    }

    #[test]
    fn modifiers_combine() {
        let mut field = FieldState::default();
        field.set_weather(Weather::Fog, 3);
        field.add_condition(FieldConditionKind::Gravity, 3);
        assert_eq!(field.flee_modifier(), 1.25 * 0.5);
        assert_eq!(field.speed_modifier(), 1.0);
    }
}
