//! Public snapshot API for observing a session without exposing internals.
//!
//! Hands are private: the snapshot carries only their sizes. A player's own
//! cards are read through `GameSession::hand`.

use serde::{Deserialize, Serialize};

use crate::domain::cards_types::{DeckRef, PromptCard, SessionId, UserId};
use crate::domain::roster::{Player, PlayerRole, Spectator};
use crate::domain::session::GameSession;
use crate::domain::settings::Settings;
use crate::domain::state::SessionState;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerPublic {
    pub id: UserId,
    pub nickname: String,
    pub role: PlayerRole,
    pub score: u32,
    pub need_to_play: bool,
    pub hand_size: usize,
}

impl From<&Player> for PlayerPublic {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            nickname: p.nickname.clone(),
            role: p.role,
            score: p.score,
            need_to_play: p.need_to_play,
            hand_size: p.hand().len(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub host_id: UserId,
    pub state: SessionState,
    pub round: u32,
    pub settings: Settings,
    pub decks: Vec<DeckRef>,
    pub players: Vec<PlayerPublic>,
    pub spectators: Vec<Spectator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_prompt: Option<PromptCard>,
    /// Number of played sets waiting for (or already given) a verdict.
    pub played_count: usize,
}

impl SessionSnapshot {
    pub fn judge(&self) -> Option<&PlayerPublic> {
        self.players.iter().find(|p| p.role == PlayerRole::Judge)
    }

    pub fn player(&self, id: UserId) -> Option<&PlayerPublic> {
        self.players.iter().find(|p| p.id == id)
    }
}

impl GameSession {
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id(),
            host_id: self.roster().host_id(),
            state: self.state(),
            round: self.round(),
            settings: self.settings().clone(),
            decks: self.decks().to_vec(),
            players: self.roster().players().iter().map(PlayerPublic::from).collect(),
            spectators: self.roster().spectators().to_vec(),
            current_prompt: self.current_prompt().cloned(),
            played_count: self.played_sets().len(),
        }
    }
}
