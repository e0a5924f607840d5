//! Read-only deck and card lookup consumed by the registry.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::cards_types::{DeckId, DeckRef, PromptCard, ResponseCard};
use crate::error::EngineError;

/// Prompt and response cards resolved from a set of decks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCards {
    pub prompts: Vec<PromptCard>,
    pub responses: Vec<ResponseCard>,
}

/// Deck storage collaborator. Implementations may do I/O; the engine awaits
/// them only outside the session actor.
#[async_trait]
pub trait CardCatalog: Send + Sync {
    /// Look up one deck. `Ok(None)` means the deck does not exist.
    async fn deck(&self, deck_id: DeckId) -> Result<Option<DeckRef>, EngineError>;

    /// All cards of the given decks, concatenated in deck order.
    async fn resolve(&self, deck_ids: &[DeckId]) -> Result<ResolvedCards, EngineError>;
}

#[derive(Debug, Clone)]
struct StoredDeck {
    deck: DeckRef,
    cards: ResolvedCards,
}

/// In-memory catalog for tests, the simulator and embedding.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    decks: RwLock<HashMap<DeckId, StoredDeck>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new deck and return its reference.
    pub fn insert_deck(
        &self,
        name: impl Into<String>,
        prompts: Vec<PromptCard>,
        responses: Vec<ResponseCard>,
    ) -> DeckRef {
        let deck = DeckRef::new(Uuid::new_v4(), name);
        debug!(
            deck_id = %deck.id,
            prompts = prompts.len(),
            responses = responses.len(),
            "Deck stored"
        );
        self.decks.write().insert(
            deck.id,
            StoredDeck {
                deck: deck.clone(),
                cards: ResolvedCards { prompts, responses },
            },
        );
        deck
    }

    pub fn len(&self) -> usize {
        self.decks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.decks.read().is_empty()
    }
}

#[async_trait]
impl CardCatalog for InMemoryCatalog {
    async fn deck(&self, deck_id: DeckId) -> Result<Option<DeckRef>, EngineError> {
        Ok(self.decks.read().get(&deck_id).map(|d| d.deck.clone()))
    }

    async fn resolve(&self, deck_ids: &[DeckId]) -> Result<ResolvedCards, EngineError> {
        let decks = self.decks.read();
        let mut resolved = ResolvedCards::default();
        for id in deck_ids {
            let stored = decks
                .get(id)
                .ok_or_else(|| EngineError::catalog(format!("deck {id} not found")))?;
            resolved.prompts.extend(stored.cards.prompts.iter().cloned());
            resolved.responses.extend(stored.cards.responses.iter().cloned());
        }
        Ok(resolved)
    }
}
