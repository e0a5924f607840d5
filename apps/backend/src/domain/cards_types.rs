//! Core identity and card types: ids, Identity, DeckRef, PromptCard, ResponseCard.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

pub type UserId = Uuid;
pub type SessionId = Uuid;
pub type DeckId = Uuid;
pub type CardId = Uuid;

/// Caller-supplied identity for hosts, players and spectators.
///
/// Authentication happens upstream; the engine trusts these values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub nickname: String,
}

impl Identity {
    /// Build an identity, trimming and NFKC-normalizing the nickname.
    pub fn new(id: UserId, nickname: impl AsRef<str>) -> Self {
        Self {
            id,
            nickname: normalize_nickname(nickname.as_ref()),
        }
    }
}

pub fn normalize_nickname(raw: &str) -> String {
    raw.trim().nfkc().collect::<String>()
}

/// A deck reference as resolved by the card catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckRef {
    pub id: DeckId,
    pub name: String,
}

impl DeckRef {
    pub fn new(id: DeckId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The single active card of a round ("black card").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptCard {
    pub id: CardId,
    pub text: String,
    /// Number of response cards required to answer this prompt.
    pub pick: u8,
}

impl PromptCard {
    pub fn new(text: impl Into<String>, pick: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            pick: pick.max(1),
        }
    }

    pub fn pick_count(&self) -> usize {
        self.pick as usize
    }
}

/// An answer card held in hand ("white card").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseCard {
    pub id: CardId,
    pub text: String,
}

impl ResponseCard {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }
}

/// Anything stored in a card pool must expose a stable identifier.
pub trait Identified {
    fn card_id(&self) -> CardId;
}

impl Identified for PromptCard {
    fn card_id(&self) -> CardId {
        self.id
    }
}

impl Identified for ResponseCard {
    fn card_id(&self) -> CardId {
        self.id
    }
}
