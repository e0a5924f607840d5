use core::fmt;

use serde::{Deserialize, Serialize};

/// Session lifecycle states.
///
/// Lobby -> Dealing -> Playing -> Judging -> {Dealing, Win}
/// Win -> Reset -> Lobby
///
/// Any in-progress state falls back to Reset when the roster drops below the
/// player minimum. Abandoned is entered when the host leaves and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Lobby,
    Dealing,
    Playing,
    Judging,
    Win,
    Reset,
    Abandoned,
}

impl SessionState {
    /// States in which exactly one player holds the Judge role.
    pub fn has_judge(self) -> bool {
        matches!(self, SessionState::Playing | SessionState::Judging)
    }

    /// States in which a match is running (cards dealt or being dealt).
    pub fn in_progress(self) -> bool {
        matches!(
            self,
            SessionState::Dealing | SessionState::Playing | SessionState::Judging | SessionState::Win
        )
    }

    /// States from which the internal phase `to` may be entered.
    ///
    /// Reset and Abandoned are forced transitions and are not checked here.
    pub fn can_enter(self, to: SessionState) -> bool {
        match to {
            // Playing -> Dealing only happens when a round restarts (judge left or nothing played).
            SessionState::Dealing => matches!(
                self,
                SessionState::Lobby | SessionState::Playing | SessionState::Judging
            ),
            SessionState::Playing => self == SessionState::Dealing,
            SessionState::Judging => self == SessionState::Playing,
            SessionState::Win => self == SessionState::Judging,
            SessionState::Lobby => self == SessionState::Reset,
            SessionState::Reset | SessionState::Abandoned => true,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SessionState::Lobby => "lobby",
            SessionState::Dealing => "dealing",
            SessionState::Playing => "playing",
            SessionState::Judging => "judging",
            SessionState::Win => "win",
            SessionState::Reset => "reset",
            SessionState::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
