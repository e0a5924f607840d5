//! Result codes for every session command.
//!
//! Add new codes here; never return ad-hoc strings from a command.
//!
//! All codes are SCREAMING_SNAKE_CASE and each carries one fixed,
//! human-readable message for the transport layer to surface.

use core::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Command applied
    ActionOk,

    // Session state
    NotInLobbyState,
    NotInProgress,
    NotInPlayingState,
    NotInJudgingState,

    // Start requirements
    NotEnoughPlayers,
    NotEnoughPromptCards,
    NotEnoughResponseCards,

    // Lookup
    UnknownSession,
    UnknownDeck,

    // Membership
    AlreadyInSession,
    AlreadySpectating,
    NotInSession,
    NotSpectating,
    MaxPlayersReached,
    MaxSpectatorsReached,

    // Round actions
    IsTheJudge,
    IsNotTheJudge,
    DoNotNeedToPlay,
    NotEnoughCards,
    TooManyCards,
    InvalidCards,

    // Decks
    DeckAlreadyAdded,
    DeckNotInSession,
}

impl StatusCode {
    pub const ALL: [StatusCode; 24] = [
        StatusCode::ActionOk,
        StatusCode::NotInLobbyState,
        StatusCode::NotInProgress,
        StatusCode::NotInPlayingState,
        StatusCode::NotInJudgingState,
        StatusCode::NotEnoughPlayers,
        StatusCode::NotEnoughPromptCards,
        StatusCode::NotEnoughResponseCards,
        StatusCode::UnknownSession,
        StatusCode::UnknownDeck,
        StatusCode::AlreadyInSession,
        StatusCode::AlreadySpectating,
        StatusCode::NotInSession,
        StatusCode::NotSpectating,
        StatusCode::MaxPlayersReached,
        StatusCode::MaxSpectatorsReached,
        StatusCode::IsTheJudge,
        StatusCode::IsNotTheJudge,
        StatusCode::DoNotNeedToPlay,
        StatusCode::NotEnoughCards,
        StatusCode::TooManyCards,
        StatusCode::InvalidCards,
        StatusCode::DeckAlreadyAdded,
        StatusCode::DeckNotInSession,
    ];

    pub fn is_ok(self) -> bool {
        self == StatusCode::ActionOk
    }

    /// Canonical SCREAMING_SNAKE_CASE string for this code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ActionOk => "ACTION_OK",
            Self::NotInLobbyState => "NOT_IN_LOBBY_STATE",
            Self::NotInProgress => "NOT_IN_PROGRESS",
            Self::NotInPlayingState => "NOT_IN_PLAYING_STATE",
            Self::NotInJudgingState => "NOT_IN_JUDGING_STATE",
            Self::NotEnoughPlayers => "NOT_ENOUGH_PLAYERS",
            Self::NotEnoughPromptCards => "NOT_ENOUGH_PROMPT_CARDS",
            Self::NotEnoughResponseCards => "NOT_ENOUGH_RESPONSE_CARDS",
            Self::UnknownSession => "UNKNOWN_SESSION",
            Self::UnknownDeck => "UNKNOWN_DECK",
            Self::AlreadyInSession => "ALREADY_IN_SESSION",
            Self::AlreadySpectating => "ALREADY_SPECTATING",
            Self::NotInSession => "NOT_IN_SESSION",
            Self::NotSpectating => "NOT_SPECTATING",
            Self::MaxPlayersReached => "MAX_PLAYERS_REACHED",
            Self::MaxSpectatorsReached => "MAX_SPECTATORS_REACHED",
            Self::IsTheJudge => "IS_THE_JUDGE",
            Self::IsNotTheJudge => "IS_NOT_THE_JUDGE",
            Self::DoNotNeedToPlay => "DO_NOT_NEED_TO_PLAY",
            Self::NotEnoughCards => "NOT_ENOUGH_CARDS",
            Self::TooManyCards => "TOO_MANY_CARDS",
            Self::InvalidCards => "INVALID_CARDS",
            Self::DeckAlreadyAdded => "DECK_ALREADY_ADDED",
            Self::DeckNotInSession => "DECK_NOT_IN_SESSION",
        }
    }

    /// Fixed human-readable message. `ActionOk` has none.
    pub const fn message(&self) -> Option<&'static str> {
        let msg = match self {
            Self::ActionOk => return None,
            Self::NotInLobbyState => "The game must be in the lobby state for that action.",
            Self::NotInProgress => "The game is not in progress. That action has no effect.",
            Self::NotInPlayingState => "The game must be in the playing state for that action.",
            Self::NotInJudgingState => "The game must be in the judging state for that action.",
            Self::NotEnoughPlayers => {
                "There are not enough players in the game. Minimum players required is 3."
            }
            Self::NotEnoughPromptCards => {
                "There are not enough prompt cards to start the game. There must be at least 50 total prompt cards."
            }
            Self::NotEnoughResponseCards => {
                "There are not enough response cards to start the game. There must be at least 20 response cards per player."
            }
            Self::UnknownSession => "The specified game cannot be found.",
            Self::UnknownDeck => "The specified deck cannot be found.",
            Self::AlreadyInSession => {
                "You are already playing in a game. You cannot join or spectate another game."
            }
            Self::AlreadySpectating => {
                "You are already spectating a game. You cannot join or spectate another game."
            }
            Self::NotInSession => "You are not playing in that game.",
            Self::NotSpectating => "You are not spectating that game.",
            Self::MaxPlayersReached => {
                "There are too many players in the game. You cannot join that game."
            }
            Self::MaxSpectatorsReached => {
                "There are too many spectators in the game. You cannot spectate that game."
            }
            Self::IsTheJudge => "As the judge for this round, you cannot perform that action.",
            Self::IsNotTheJudge => {
                "You are not the judge for this round. You cannot perform that action."
            }
            Self::DoNotNeedToPlay => "You do not need to play any cards right now.",
            Self::NotEnoughCards => "You have not played enough cards. Please choose more cards.",
            Self::TooManyCards => "You have tried to play too many cards. Please reduce your cards.",
            Self::InvalidCards => "The cards you specified are not valid.",
            Self::DeckAlreadyAdded => "The specified deck is already in the game.",
            Self::DeckNotInSession => "The specified deck is not in the game.",
        };
        Some(msg)
    }
}

impl From<Result<(), StatusCode>> for StatusCode {
    fn from(result: Result<(), StatusCode>) -> Self {
        match result {
            Ok(()) => StatusCode::ActionOk,
            Err(code) => code,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
