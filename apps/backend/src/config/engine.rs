use std::env;
use std::str::FromStr;

use crate::domain::settings::Settings;
use crate::error::EngineError;

/// Process-wide engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Settings every new session starts with.
    pub default_settings: Settings,
    /// Base seed for deterministic sessions. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl EngineConfig {
    /// Build the configuration from `PARTY_*` environment variables.
    ///
    /// Every variable is optional; unset or empty values keep the default.
    /// Values that fail to parse are a configuration error.
    pub fn from_env() -> Result<Self, EngineError> {
        let defaults = Settings::default();
        let default_settings = Settings {
            max_players: opt_var("PARTY_MAX_PLAYERS")?.unwrap_or(defaults.max_players),
            max_spectators: opt_var("PARTY_MAX_SPECTATORS")?.unwrap_or(defaults.max_spectators),
            max_score: opt_var("PARTY_MAX_SCORE")?.unwrap_or(defaults.max_score),
            round_intermission_seconds: opt_var("PARTY_ROUND_INTERMISSION_SECS")?
                .unwrap_or(defaults.round_intermission_seconds),
            game_win_intermission_seconds: opt_var("PARTY_GAME_WIN_INTERMISSION_SECS")?
                .unwrap_or(defaults.game_win_intermission_seconds),
            playing_timeout_seconds: opt_var("PARTY_PLAYING_TIMEOUT_SECS")?
                .unwrap_or(defaults.playing_timeout_seconds),
            judging_timeout_seconds: opt_var("PARTY_JUDGING_TIMEOUT_SECS")?
                .unwrap_or(defaults.judging_timeout_seconds),
            allow_players_to_join_mid_game: opt_flag("PARTY_ALLOW_MID_GAME_JOIN")?
                .unwrap_or(defaults.allow_players_to_join_mid_game),
        }
        .clamped();

        Ok(Self {
            default_settings,
            rng_seed: opt_var("PARTY_RNG_SEED")?,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

/// Read and parse an optional environment variable.
fn opt_var<T: FromStr>(name: &str) -> Result<Option<T>, EngineError> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| {
        EngineError::config(format!(
            "Environment variable '{name}' has invalid value '{raw}'"
        ))
    })
}

/// Booleans accept true/false, 1/0, yes/no in any case.
fn opt_flag(name: &str) -> Result<Option<bool>, EngineError> {
    let Some(raw) = opt_var::<String>(name)? else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(EngineError::config(format!(
            "Environment variable '{name}' must be a boolean, got '{raw}'"
        ))),
    }
}
