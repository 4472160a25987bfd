/// Battle rule constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Percent chance for a damaging hit to be critical.
    pub critical_chance: u32,
    /// Base probability of a successful flee before modifiers.
    pub base_flee_chance: f64,
    /// Weather duration when a move changes the weather.
    pub weather_turns: u32,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    /// Roster slots per participant.
    pub const MAX_SLOTS: usize = 6;
    /// Moves a combatant can know at once.
    pub const MAX_MOVES: usize = 4;
    pub const MAX_STATUS_EFFECTS: usize = 8;

    // ===== rule constants =====
    pub const CRITICAL_MULTIPLIER: f64 = 1.5;
    pub const RANDOM_FACTOR_MIN: f64 = 0.85;
    pub const RANDOM_FACTOR_MAX: f64 = 1.0;
    /// Stat stages are clamped to `[-MAX_STAGE, MAX_STAGE]`.
    pub const MAX_STAGE: i8 = 6;
    /// Oldest log entries are dropped past this length.
    pub const MAX_LOG_ENTRIES: usize = 200;
    /// Winner id recorded when no team survives.
    pub const DRAW: &'static str = "draw";

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_CRITICAL_CHANCE: u32 = 10;
    pub const DEFAULT_BASE_FLEE_CHANCE: f64 = 0.5;
    pub const DEFAULT_WEATHER_TURNS: u32 = 5;

    pub fn new() -> Self {
        Self {
            critical_chance: Self::DEFAULT_CRITICAL_CHANCE,
            base_flee_chance: Self::DEFAULT_BASE_FLEE_CHANCE,
            weather_turns: Self::DEFAULT_WEATHER_TURNS,
        }
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
