//! Single-writer actor around one `GameSession`.
//!
//! Every mutation, including timer firings, travels through one unbounded
//! mpsc queue and is applied in arrival order by a dedicated tokio task.
//! Callers talk to the task through a cloneable [`SessionHandle`].

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, Instrument};

use crate::domain::cards_types::{
    CardId, DeckId, DeckRef, Identity, PromptCard, ResponseCard, SessionId, UserId,
};
use crate::domain::round_timer::{RoundTimer, TimerTicket};
use crate::domain::session::GameSession;
use crate::domain::settings::SettingsPatch;
use crate::domain::snapshot::SessionSnapshot;
use crate::error::EngineError;
use crate::errors::StatusCode;

type Reply<T> = oneshot::Sender<T>;

/// Commands accepted by a session actor.
#[derive(Debug)]
pub enum SessionCommand {
    AddDeck {
        deck: DeckRef,
        reply: Reply<StatusCode>,
    },
    RemoveDeck {
        deck_id: DeckId,
        reply: Reply<StatusCode>,
    },
    SetCards {
        prompts: Vec<PromptCard>,
        responses: Vec<ResponseCard>,
        reply: Reply<StatusCode>,
    },
    Start {
        reply: Reply<StatusCode>,
    },
    Stop {
        reply: Reply<StatusCode>,
    },
    AddPlayer {
        identity: Identity,
        reply: Reply<StatusCode>,
    },
    RemovePlayer {
        player_id: UserId,
        reply: Reply<StatusCode>,
    },
    AddSpectator {
        identity: Identity,
        reply: Reply<StatusCode>,
    },
    RemoveSpectator {
        spectator_id: UserId,
        reply: Reply<StatusCode>,
    },
    PlayCards {
        player_id: UserId,
        card_ids: Vec<CardId>,
        reply: Reply<StatusCode>,
    },
    JudgeCards {
        player_id: UserId,
        card_ids: Vec<CardId>,
        reply: Reply<StatusCode>,
    },
    UpdateSettings {
        patch: SettingsPatch,
        reply: Reply<StatusCode>,
    },
    Snapshot {
        reply: Reply<SessionSnapshot>,
    },
    Hand {
        player_id: UserId,
        reply: Reply<Option<Vec<ResponseCard>>>,
    },
    TimerFired(TimerTicket),
    Shutdown,
}

impl SessionCommand {
    fn name(&self) -> &'static str {
        match self {
            SessionCommand::AddDeck { .. } => "add_deck",
            SessionCommand::RemoveDeck { .. } => "remove_deck",
            SessionCommand::SetCards { .. } => "set_cards",
            SessionCommand::Start { .. } => "start",
            SessionCommand::Stop { .. } => "stop",
            SessionCommand::AddPlayer { .. } => "add_player",
            SessionCommand::RemovePlayer { .. } => "remove_player",
            SessionCommand::AddSpectator { .. } => "add_spectator",
            SessionCommand::RemoveSpectator { .. } => "remove_spectator",
            SessionCommand::PlayCards { .. } => "play_cards",
            SessionCommand::JudgeCards { .. } => "judge_cards",
            SessionCommand::UpdateSettings { .. } => "update_settings",
            SessionCommand::Snapshot { .. } => "snapshot",
            SessionCommand::Hand { .. } => "hand",
            SessionCommand::TimerFired(_) => "timer_fired",
            SessionCommand::Shutdown => "shutdown",
        }
    }
}

/// Cloneable address of a running session actor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    tx: mpsc::UnboundedSender<SessionCommand>,
}

/// Move `session` onto its own task and return its handle.
///
/// The session's timer is replaced with one that feeds firings back into the
/// actor's queue. Must be called from within a tokio runtime.
pub fn spawn_session(session: GameSession) -> (SessionHandle, JoinHandle<()>) {
    let id = session.id();
    let (tx, rx) = mpsc::unbounded_channel();

    // The timer only holds a weak sender so a dropped handle still closes the queue.
    let weak = tx.downgrade();
    let timer = RoundTimer::driven(Arc::new(move |ticket: TimerTicket| {
        if let Some(tx) = weak.upgrade() {
            let _ = tx.send(SessionCommand::TimerFired(ticket));
        }
    }));
    let session = session.with_timer(timer);

    let span = tracing::info_span!("session", session_id = %id);
    let task = tokio::spawn(run(session, rx).instrument(span));
    (SessionHandle { id, tx }, task)
}

async fn run(mut session: GameSession, mut rx: mpsc::UnboundedReceiver<SessionCommand>) {
    info!(state = %session.state(), "Session actor started");
    while let Some(command) = rx.recv().await {
        let name = command.name();
        if !apply(&mut session, command) {
            break;
        }
        debug!(command = name, state = %session.state(), round = session.round(), "Command applied");
    }
    session.shutdown();
    info!(state = %session.state(), "Session actor stopped");
}

/// Apply one command. Returns false when the actor should stop.
fn apply(session: &mut GameSession, command: SessionCommand) -> bool {
    // A dropped reply receiver means the caller gave up; the command still applies.
    match command {
        SessionCommand::AddDeck { deck, reply } => {
            let _ = reply.send(logged(session.add_deck(deck), "add_deck"));
        }
        SessionCommand::RemoveDeck { deck_id, reply } => {
            let _ = reply.send(logged(session.remove_deck(deck_id), "remove_deck"));
        }
        SessionCommand::SetCards {
            prompts,
            responses,
            reply,
        } => {
            let _ = reply.send(logged(session.set_cards(prompts, responses), "set_cards"));
        }
        SessionCommand::Start { reply } => {
            let _ = reply.send(logged(session.start(), "start"));
        }
        SessionCommand::Stop { reply } => {
            let _ = reply.send(logged(session.stop(), "stop"));
        }
        SessionCommand::AddPlayer { identity, reply } => {
            let _ = reply.send(logged(session.add_player(identity), "add_player"));
        }
        SessionCommand::RemovePlayer { player_id, reply } => {
            let _ = reply.send(logged(session.remove_player(player_id), "remove_player"));
        }
        SessionCommand::AddSpectator { identity, reply } => {
            let _ = reply.send(logged(session.add_spectator(identity), "add_spectator"));
        }
        SessionCommand::RemoveSpectator {
            spectator_id,
            reply,
        } => {
            let _ = reply.send(logged(
                session.remove_spectator(spectator_id),
                "remove_spectator",
            ));
        }
        SessionCommand::PlayCards {
            player_id,
            card_ids,
            reply,
        } => {
            let _ = reply.send(logged(session.play_cards(player_id, &card_ids), "play_cards"));
        }
        SessionCommand::JudgeCards {
            player_id,
            card_ids,
            reply,
        } => {
            let _ = reply.send(logged(
                session.judge_cards(player_id, &card_ids),
                "judge_cards",
            ));
        }
        SessionCommand::UpdateSettings { patch, reply } => {
            let _ = reply.send(logged(session.update_settings(&patch), "update_settings"));
        }
        SessionCommand::Snapshot { reply } => {
            let _ = reply.send(session.snapshot());
        }
        SessionCommand::Hand { player_id, reply } => {
            let _ = reply.send(session.hand(player_id).map(<[ResponseCard]>::to_vec));
        }
        SessionCommand::TimerFired(ticket) => {
            session.timer_fired(ticket);
        }
        SessionCommand::Shutdown => return false,
    }
    true
}

fn logged(status: StatusCode, command: &'static str) -> StatusCode {
    if status.is_ok() {
        debug!(command, status = %status, "Command accepted");
    } else {
        debug!(command, status = %status, "Command rejected");
    }
    status
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// True once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .map_err(|_| EngineError::SessionClosed)?;
        rx.await.map_err(|_| EngineError::SessionClosed)
    }

    pub async fn add_deck(&self, deck: DeckRef) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::AddDeck { deck, reply })
            .await
    }

    pub async fn remove_deck(&self, deck_id: DeckId) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::RemoveDeck { deck_id, reply })
            .await
    }

    pub async fn set_cards(
        &self,
        prompts: Vec<PromptCard>,
        responses: Vec<ResponseCard>,
    ) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::SetCards {
            prompts,
            responses,
            reply,
        })
        .await
    }

    pub async fn start(&self) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::Start { reply }).await
    }

    pub async fn stop(&self) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::Stop { reply }).await
    }

    pub async fn add_player(&self, identity: Identity) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::AddPlayer { identity, reply })
            .await
    }

    pub async fn remove_player(&self, player_id: UserId) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::RemovePlayer { player_id, reply })
            .await
    }

    pub async fn add_spectator(&self, identity: Identity) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::AddSpectator { identity, reply })
            .await
    }

    pub async fn remove_spectator(&self, spectator_id: UserId) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::RemoveSpectator {
            spectator_id,
            reply,
        })
        .await
    }

    pub async fn play_cards(
        &self,
        player_id: UserId,
        card_ids: Vec<CardId>,
    ) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::PlayCards {
            player_id,
            card_ids,
            reply,
        })
        .await
    }

    pub async fn judge_cards(
        &self,
        player_id: UserId,
        card_ids: Vec<CardId>,
    ) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::JudgeCards {
            player_id,
            card_ids,
            reply,
        })
        .await
    }

    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<StatusCode, EngineError> {
        self.request(|reply| SessionCommand::UpdateSettings { patch, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, EngineError> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    pub async fn hand(&self, player_id: UserId) -> Result<Option<Vec<ResponseCard>>, EngineError> {
        self.request(|reply| SessionCommand::Hand { player_id, reply })
            .await
    }

    /// Ask the actor to stop after the commands already queued.
    pub fn shutdown(&self) {
        let _ = self.tx.send(SessionCommand::Shutdown);
    }
}
