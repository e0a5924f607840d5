//! Outbound event vocabulary and the sink the engine publishes to.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::domain::cards_types::{PromptCard, ResponseCard, SessionId, UserId};
use crate::domain::settings::Settings;
use crate::domain::state::SessionState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerJoined {
        player_id: UserId,
        nickname: String,
    },
    PlayerLeft {
        player_id: UserId,
    },
    SpectatorJoined {
        spectator_id: UserId,
        nickname: String,
    },
    SpectatorLeft {
        spectator_id: UserId,
    },
    SessionEmpty,
    SystemMessage {
        message: String,
    },
    RoundBegan {
        judge_id: UserId,
        round: u32,
    },
    CardDealt {
        player_id: UserId,
        card: ResponseCard,
    },
    PromptCardDealt {
        card: PromptCard,
    },
    CardsToJudge {
        played: Vec<Vec<ResponseCard>>,
    },
    RoundWinner {
        player_id: UserId,
        nickname: String,
        winning_cards: Vec<ResponseCard>,
    },
    GameWinner {
        player_id: UserId,
        nickname: String,
    },
    ResetScheduled {
        in_seconds: u64,
    },
    SettingsUpdated {
        settings: Settings,
    },
    StateTransition {
        from: SessionState,
        to: SessionState,
    },
    IllegalStateTransition {
        from: SessionState,
        to: SessionState,
    },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::PlayerJoined { .. } => "player_joined",
            GameEvent::PlayerLeft { .. } => "player_left",
            GameEvent::SpectatorJoined { .. } => "spectator_joined",
            GameEvent::SpectatorLeft { .. } => "spectator_left",
            GameEvent::SessionEmpty => "session_empty",
            GameEvent::SystemMessage { .. } => "system_message",
            GameEvent::RoundBegan { .. } => "round_began",
            GameEvent::CardDealt { .. } => "card_dealt",
            GameEvent::PromptCardDealt { .. } => "prompt_card_dealt",
            GameEvent::CardsToJudge { .. } => "cards_to_judge",
            GameEvent::RoundWinner { .. } => "round_winner",
            GameEvent::GameWinner { .. } => "game_winner",
            GameEvent::ResetScheduled { .. } => "reset_scheduled",
            GameEvent::SettingsUpdated { .. } => "settings_updated",
            GameEvent::StateTransition { .. } => "state_transition",
            GameEvent::IllegalStateTransition { .. } => "illegal_state_transition",
        }
    }
}

/// An event tagged with the session it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: SessionId,
    pub event: GameEvent,
}

/// Outward notification channel. Implemented by the transport layer.
///
/// Called from inside the session's single writer, so implementations must
/// not block.
pub trait EventSink: Send + Sync {
    fn publish(&self, session_id: SessionId, event: GameEvent);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _session_id: SessionId, _event: GameEvent) {}
}

/// Sink that keeps every event in memory, for tests and simulations.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    /// Drain and return the bare events recorded so far.
    pub fn take(&self) -> Vec<GameEvent> {
        self.events
            .lock()
            .drain(..)
            .map(|envelope| envelope.event)
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event.name() == name)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn publish(&self, session_id: SessionId, event: GameEvent) {
        self.events.lock().push(SessionEvent { session_id, event });
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn publish(&self, session_id: SessionId, event: GameEvent) {
        (**self).publish(session_id, event)
    }
}
