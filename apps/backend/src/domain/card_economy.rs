//! Draw/discard pools for the two card kinds used by a match.
//!
//! Cards are never created or destroyed once a match starts; they only move
//! between the available pile, the discard pile, player hands, the round's
//! played sets and the active prompt slot.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::domain::cards_types::{PromptCard, ResponseCard};

/// One available/discarded pair.
#[derive(Debug, Clone)]
pub struct CardPool<T> {
    available: VecDeque<T>,
    discarded: VecDeque<T>,
}

impl<T> Default for CardPool<T> {
    fn default() -> Self {
        Self {
            available: VecDeque::new(),
            discarded: VecDeque::new(),
        }
    }
}

impl<T> CardPool<T> {
    pub fn from_cards(cards: Vec<T>) -> Self {
        Self {
            available: cards.into(),
            discarded: VecDeque::new(),
        }
    }

    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    pub fn discarded_len(&self) -> usize {
        self.discarded.len()
    }

    pub fn len(&self) -> usize {
        self.available.len() + self.discarded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draw from the front of the available pile.
    ///
    /// When the available pile is empty the whole discard pile is moved over
    /// and shuffled first. Returns `None` only when both piles are empty.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<T> {
        if self.available.is_empty() {
            if self.discarded.is_empty() {
                return None;
            }
            debug!(
                recycled = self.discarded.len(),
                "Available pile exhausted, reshuffling discards"
            );
            self.available.append(&mut self.discarded);
            self.shuffle(rng);
        }
        self.available.pop_front()
    }

    pub fn discard(&mut self, card: T) {
        self.discarded.push_back(card);
    }

    pub fn discard_all(&mut self, cards: impl IntoIterator<Item = T>) {
        self.discarded.extend(cards);
    }

    fn restore(&mut self, card: T) {
        self.available.push_back(card);
    }

    pub fn restore_all(&mut self, cards: impl IntoIterator<Item = T>) {
        self.available.extend(cards);
    }

    /// Move every discard back into the available pile and shuffle.
    pub fn recollect<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.available.append(&mut self.discarded);
        self.shuffle(rng);
    }

    /// Uniform Fisher-Yates shuffle of the available pile.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.available.make_contiguous().shuffle(rng);
    }
}

/// Per-kind totals, used to check conservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardCounts {
    pub prompt: usize,
    pub response: usize,
}

/// Owns both card kinds plus the single active prompt card.
#[derive(Debug, Clone, Default)]
pub struct CardEconomy {
    pub(crate) responses: CardPool<ResponseCard>,
    pub(crate) prompts: CardPool<PromptCard>,
    current_prompt: Option<PromptCard>,
}

impl CardEconomy {
    /// Replace both pools wholesale. Any active prompt is dropped.
    pub fn load(&mut self, prompts: Vec<PromptCard>, responses: Vec<ResponseCard>) {
        self.prompts = CardPool::from_cards(prompts);
        self.responses = CardPool::from_cards(responses);
        self.current_prompt = None;
    }

    pub fn responses(&self) -> &CardPool<ResponseCard> {
        &self.responses
    }

    pub fn prompts(&self) -> &CardPool<PromptCard> {
        &self.prompts
    }

    pub fn current_prompt(&self) -> Option<&PromptCard> {
        self.current_prompt.as_ref()
    }

    pub fn draw_response<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<ResponseCard> {
        self.responses.draw(rng)
    }

    pub fn discard_responses(&mut self, cards: impl IntoIterator<Item = ResponseCard>) {
        self.responses.discard_all(cards);
    }

    /// Discard the active prompt (if any) and draw the next one.
    pub fn replace_prompt<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&PromptCard> {
        self.discard_prompt();
        self.current_prompt = self.prompts.draw(rng);
        self.current_prompt.as_ref()
    }

    pub fn discard_prompt(&mut self) {
        if let Some(prompt) = self.current_prompt.take() {
            self.prompts.discard(prompt);
        }
    }

    /// Return the active prompt and every discard to the available piles,
    /// together with any extra response cards the caller collected (hands,
    /// played sets), then shuffle both piles.
    pub fn collect_all<R: Rng + ?Sized>(
        &mut self,
        outstanding: impl IntoIterator<Item = ResponseCard>,
        rng: &mut R,
    ) {
        if let Some(prompt) = self.current_prompt.take() {
            self.prompts.restore(prompt);
        }
        self.prompts.recollect(rng);

        self.responses.restore_all(outstanding);
        self.responses.recollect(rng);
    }

    /// Cards held by the pools and the active prompt slot.
    pub fn pooled_counts(&self) -> CardCounts {
        CardCounts {
            prompt: self.prompts.len() + usize::from(self.current_prompt.is_some()),
            response: self.responses.len(),
        }
    }
}
