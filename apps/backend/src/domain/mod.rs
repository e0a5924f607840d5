//! Domain layer: the synchronous session engine and its parts.

pub mod card_economy;
pub mod cards_types;
pub mod events;
pub mod roster;
pub mod round_timer;
pub mod seed_derivation;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod state;

#[cfg(test)]
mod test_gens;
#[cfg(test)]
mod test_prelude;
#[cfg(test)]
mod tests_session;

// Re-exports for ergonomics
pub use card_economy::{CardCounts, CardEconomy, CardPool};
pub use cards_types::{
    normalize_nickname, CardId, DeckId, DeckRef, Identity, PromptCard, ResponseCard, SessionId,
    UserId,
};
pub use events::{EventSink, GameEvent, MemorySink, NullSink, SessionEvent};
pub use roster::{Player, PlayerRole, Roster, Spectator};
pub use round_timer::{RoundTimer, TimerCallback, TimerKind, TimerTicket};
pub use seed_derivation::derive_session_seed;
pub use session::{GameSession, PlayedSet};
pub use settings::{Settings, SettingsPatch};
pub use snapshot::{PlayerPublic, SessionSnapshot};
pub use state::SessionState;
