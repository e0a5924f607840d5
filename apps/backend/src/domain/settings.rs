//! Per-session settings and partial updates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const MINIMUM_PLAYERS: usize = 3;
pub const MINIMUM_PROMPT_CARDS: usize = 50;
pub const MINIMUM_RESPONSE_CARDS_PER_PLAYER: usize = 20;
pub const HAND_SIZE: usize = 10;

const MAX_PLAYERS_LIMIT: u32 = 20;
const MAX_SPECTATORS_LIMIT: u32 = 50;
const MAX_SCORE_LIMIT: u32 = 50;
const MIN_INTERMISSION_SECS: u64 = 1;
const MIN_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub max_players: u32,
    pub max_spectators: u32,
    pub max_score: u32,
    pub round_intermission_seconds: u64,
    pub game_win_intermission_seconds: u64,
    pub playing_timeout_seconds: u64,
    pub judging_timeout_seconds: u64,
    pub allow_players_to_join_mid_game: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_players: 10,
            max_spectators: 10,
            max_score: 7,
            round_intermission_seconds: 8,
            game_win_intermission_seconds: 10,
            playing_timeout_seconds: 90,
            judging_timeout_seconds: 60,
            allow_players_to_join_mid_game: false,
        }
    }
}

impl Settings {
    /// Clamp every field into its sane range.
    pub fn clamped(mut self) -> Self {
        self.max_players = self
            .max_players
            .clamp(MINIMUM_PLAYERS as u32, MAX_PLAYERS_LIMIT);
        self.max_spectators = self.max_spectators.min(MAX_SPECTATORS_LIMIT);
        self.max_score = self.max_score.clamp(1, MAX_SCORE_LIMIT);
        self.round_intermission_seconds = self.round_intermission_seconds.max(MIN_INTERMISSION_SECS);
        self.game_win_intermission_seconds = self
            .game_win_intermission_seconds
            .max(MIN_INTERMISSION_SECS);
        self.playing_timeout_seconds = self.playing_timeout_seconds.max(MIN_TIMEOUT_SECS);
        self.judging_timeout_seconds = self.judging_timeout_seconds.max(MIN_TIMEOUT_SECS);
        self
    }

    pub fn round_intermission(&self) -> Duration {
        Duration::from_secs(self.round_intermission_seconds)
    }

    pub fn game_win_intermission(&self) -> Duration {
        Duration::from_secs(self.game_win_intermission_seconds)
    }

    pub fn playing_timeout(&self) -> Duration {
        Duration::from_secs(self.playing_timeout_seconds)
    }

    pub fn judging_timeout(&self) -> Duration {
        Duration::from_secs(self.judging_timeout_seconds)
    }

    /// Apply a patch and clamp the result. Caller checks lobby-only fields.
    pub fn apply(&self, patch: &SettingsPatch) -> Settings {
        Settings {
            max_players: patch.max_players.unwrap_or(self.max_players),
            max_spectators: patch.max_spectators.unwrap_or(self.max_spectators),
            max_score: patch.max_score.unwrap_or(self.max_score),
            round_intermission_seconds: patch
                .round_intermission_seconds
                .unwrap_or(self.round_intermission_seconds),
            game_win_intermission_seconds: patch
                .game_win_intermission_seconds
                .unwrap_or(self.game_win_intermission_seconds),
            playing_timeout_seconds: patch
                .playing_timeout_seconds
                .unwrap_or(self.playing_timeout_seconds),
            judging_timeout_seconds: patch
                .judging_timeout_seconds
                .unwrap_or(self.judging_timeout_seconds),
            allow_players_to_join_mid_game: patch
                .allow_players_to_join_mid_game
                .unwrap_or(self.allow_players_to_join_mid_game),
        }
        .clamped()
    }
}

/// Partial settings update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub max_players: Option<u32>,
    pub max_spectators: Option<u32>,
    pub max_score: Option<u32>,
    pub round_intermission_seconds: Option<u64>,
    pub game_win_intermission_seconds: Option<u64>,
    pub playing_timeout_seconds: Option<u64>,
    pub judging_timeout_seconds: Option<u64>,
    pub allow_players_to_join_mid_game: Option<bool>,
}

impl SettingsPatch {
    /// True when the patch touches a field that may only change in Lobby.
    pub fn touches_lobby_only_fields(&self) -> bool {
        self.max_players.is_some()
            || self.max_spectators.is_some()
            || self.max_score.is_some()
            || self.allow_players_to_join_mid_game.is_some()
    }
}
