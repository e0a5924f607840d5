//! Multi-session command surface.
//!
//! Owns every live session actor, the user → session membership index and
//! the catalog lookups that must finish before a session can start. Sessions
//! are dropped when their engine reports `SessionEmpty` or abandonment.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::domain::cards_types::{CardId, DeckId, Identity, ResponseCard, SessionId, UserId};
use crate::domain::events::{EventSink, GameEvent};
use crate::domain::seed_derivation::derive_session_seed;
use crate::domain::session::GameSession;
use crate::domain::settings::SettingsPatch;
use crate::domain::snapshot::SessionSnapshot;
use crate::domain::state::SessionState;
use crate::error::EngineError;
use crate::errors::StatusCode;
use crate::services::catalog::CardCatalog;
use crate::services::session_actor::{spawn_session, SessionHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    Player,
    Spectator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub session_id: SessionId,
    pub role: MembershipRole,
}

impl Membership {
    fn conflict(&self) -> StatusCode {
        match self.role {
            MembershipRole::Player => StatusCode::AlreadyInSession,
            MembershipRole::Spectator => StatusCode::AlreadySpectating,
        }
    }
}

/// Lightweight row for a session browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub host_nickname: String,
    pub state: SessionState,
    pub players: usize,
    pub max_players: u32,
    pub spectators: usize,
    pub max_spectators: u32,
    pub decks: usize,
}

impl From<&SessionSnapshot> for SessionSummary {
    fn from(snap: &SessionSnapshot) -> Self {
        let host_nickname = snap
            .player(snap.host_id)
            .map(|p| p.nickname.clone())
            .unwrap_or_default();
        Self {
            id: snap.id,
            host_nickname,
            state: snap.state,
            players: snap.players.len(),
            max_players: snap.settings.max_players,
            spectators: snap.spectators.len(),
            max_spectators: snap.settings.max_spectators,
            decks: snap.decks.len(),
        }
    }
}

type Memberships = Arc<DashMap<UserId, Membership>>;

/// Sink installed in every session: keeps the membership index in step with
/// departures the engine decides on its own (kicks), requests teardown, and
/// forwards everything downstream.
struct RegistrySink {
    memberships: Memberships,
    closing: mpsc::UnboundedSender<SessionId>,
    downstream: Arc<dyn EventSink>,
}

impl RegistrySink {
    fn release(&self, user_id: UserId, session_id: SessionId) {
        self.memberships
            .remove_if(&user_id, |_, m| m.session_id == session_id);
    }
}

impl EventSink for RegistrySink {
    fn publish(&self, session_id: SessionId, event: GameEvent) {
        match &event {
            GameEvent::PlayerLeft { player_id } => self.release(*player_id, session_id),
            GameEvent::SpectatorLeft { spectator_id } => self.release(*spectator_id, session_id),
            GameEvent::SessionEmpty
            | GameEvent::StateTransition {
                to: SessionState::Abandoned,
                ..
            } => {
                let _ = self.closing.send(session_id);
            }
            _ => {}
        }
        self.downstream.publish(session_id, event);
    }
}

pub struct SessionRegistry {
    sessions: Arc<DashMap<SessionId, SessionHandle>>,
    memberships: Memberships,
    catalog: Arc<dyn CardCatalog>,
    sink: Arc<RegistrySink>,
    config: EngineConfig,
}

impl SessionRegistry {
    /// Create a registry. Spawns the teardown task, so this must run inside
    /// a tokio runtime.
    pub fn new(
        config: EngineConfig,
        catalog: Arc<dyn CardCatalog>,
        downstream: Arc<dyn EventSink>,
    ) -> Self {
        let sessions: Arc<DashMap<SessionId, SessionHandle>> = Arc::new(DashMap::new());
        let memberships: Memberships = Arc::new(DashMap::new());
        let (closing, rx) = mpsc::unbounded_channel();

        tokio::spawn(reap_sessions(
            rx,
            Arc::clone(&sessions),
            Arc::clone(&memberships),
        ));

        let sink = Arc::new(RegistrySink {
            memberships: Arc::clone(&memberships),
            closing,
            downstream,
        });

        Self {
            sessions,
            memberships,
            catalog,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self, session_id: SessionId) -> Option<SessionHandle> {
        self.sessions.get(&session_id).map(|h| h.value().clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn membership(&self, user_id: UserId) -> Option<Membership> {
        self.memberships.get(&user_id).map(|m| *m.value())
    }

    /// Open a new session with `host` as its first player.
    pub fn create_session(&self, host: Identity) -> Result<SessionHandle, EngineError> {
        let sink: Arc<dyn EventSink> = self.sink.clone();
        let session = GameSession::new(host.clone(), self.config.default_settings.clone(), sink);
        let session_id = session.id();
        let session = match self.config.rng_seed {
            Some(base) => session.with_rng_seed(derive_session_seed(base, session_id)),
            None => session,
        };

        match self.memberships.entry(host.id) {
            Entry::Occupied(existing) => return Err(existing.get().conflict().into()),
            Entry::Vacant(slot) => {
                slot.insert(Membership {
                    session_id,
                    role: MembershipRole::Player,
                });
            }
        }

        let (handle, _task) = spawn_session(session);
        self.sessions.insert(session_id, handle.clone());
        info!(session_id = %session_id, player_id = %host.id, "Session created");
        Ok(handle)
    }

    pub async fn add_deck(
        &self,
        session_id: SessionId,
        deck_id: DeckId,
    ) -> Result<StatusCode, EngineError> {
        let Some(handle) = self.session(session_id) else {
            return Ok(StatusCode::UnknownSession);
        };
        let Some(deck) = self.catalog.deck(deck_id).await? else {
            return Ok(StatusCode::UnknownDeck);
        };
        handle.add_deck(deck).await
    }

    pub async fn remove_deck(
        &self,
        session_id: SessionId,
        deck_id: DeckId,
    ) -> Result<StatusCode, EngineError> {
        match self.session(session_id) {
            Some(handle) => handle.remove_deck(deck_id).await,
            None => Ok(StatusCode::UnknownSession),
        }
    }

    /// Resolve the session's decks, load the cards, then start the match.
    pub async fn start(&self, session_id: SessionId) -> Result<StatusCode, EngineError> {
        let Some(handle) = self.session(session_id) else {
            return Ok(StatusCode::UnknownSession);
        };
        let snapshot = handle.snapshot().await?;
        if snapshot.state != SessionState::Lobby {
            return Ok(StatusCode::NotInLobbyState);
        }

        let deck_ids: Vec<DeckId> = snapshot.decks.iter().map(|d| d.id).collect();
        let cards = self.catalog.resolve(&deck_ids).await?;
        debug!(
            session_id = %session_id,
            decks = deck_ids.len(),
            prompts = cards.prompts.len(),
            responses = cards.responses.len(),
            "Decks resolved"
        );

        let loaded = handle.set_cards(cards.prompts, cards.responses).await?;
        if !loaded.is_ok() {
            return Ok(loaded);
        }
        handle.start().await
    }

    pub async fn stop(&self, session_id: SessionId) -> Result<StatusCode, EngineError> {
        match self.session(session_id) {
            Some(handle) => handle.stop().await,
            None => Ok(StatusCode::UnknownSession),
        }
    }

    pub async fn join_as_player(
        &self,
        session_id: SessionId,
        identity: Identity,
    ) -> Result<StatusCode, EngineError> {
        self.join(session_id, identity, MembershipRole::Player).await
    }

    pub async fn join_as_spectator(
        &self,
        session_id: SessionId,
        identity: Identity,
    ) -> Result<StatusCode, EngineError> {
        self.join(session_id, identity, MembershipRole::Spectator)
            .await
    }

    async fn join(
        &self,
        session_id: SessionId,
        identity: Identity,
        role: MembershipRole,
    ) -> Result<StatusCode, EngineError> {
        let Some(handle) = self.session(session_id) else {
            return Ok(StatusCode::UnknownSession);
        };
        let user_id = identity.id;

        // Reserve the membership first so one user cannot join two sessions at once.
        match self.memberships.entry(user_id) {
            Entry::Occupied(existing) => return Ok(existing.get().conflict()),
            Entry::Vacant(slot) => {
                slot.insert(Membership { session_id, role });
            }
        }

        let result = match role {
            MembershipRole::Player => handle.add_player(identity).await,
            MembershipRole::Spectator => handle.add_spectator(identity).await,
        };
        if !matches!(&result, Ok(code) if code.is_ok()) {
            self.memberships
                .remove_if(&user_id, |_, m| m.session_id == session_id);
        }
        result
    }

    /// Remove a user from whatever session they are in.
    pub async fn leave(&self, user_id: UserId) -> Result<StatusCode, EngineError> {
        let Some(membership) = self.membership(user_id) else {
            return Ok(StatusCode::NotInSession);
        };
        let Some(handle) = self.session(membership.session_id) else {
            self.memberships.remove(&user_id);
            return Ok(StatusCode::UnknownSession);
        };
        let code = match membership.role {
            MembershipRole::Player => handle.remove_player(user_id).await?,
            MembershipRole::Spectator => handle.remove_spectator(user_id).await?,
        };
        self.memberships
            .remove_if(&user_id, |_, m| m.session_id == membership.session_id);
        Ok(code)
    }

    pub async fn play_cards(
        &self,
        session_id: SessionId,
        player_id: UserId,
        card_ids: Vec<CardId>,
    ) -> Result<StatusCode, EngineError> {
        match self.session(session_id) {
            Some(handle) => handle.play_cards(player_id, card_ids).await,
            None => Ok(StatusCode::UnknownSession),
        }
    }

    pub async fn judge_cards(
        &self,
        session_id: SessionId,
        player_id: UserId,
        card_ids: Vec<CardId>,
    ) -> Result<StatusCode, EngineError> {
        match self.session(session_id) {
            Some(handle) => handle.judge_cards(player_id, card_ids).await,
            None => Ok(StatusCode::UnknownSession),
        }
    }

    pub async fn update_settings(
        &self,
        session_id: SessionId,
        patch: SettingsPatch,
    ) -> Result<StatusCode, EngineError> {
        match self.session(session_id) {
            Some(handle) => handle.update_settings(patch).await,
            None => Ok(StatusCode::UnknownSession),
        }
    }

    pub async fn snapshot(&self, session_id: SessionId) -> Result<SessionSnapshot, EngineError> {
        let handle = self
            .session(session_id)
            .ok_or(EngineError::Rejected(StatusCode::UnknownSession))?;
        handle.snapshot().await
    }

    pub async fn hand(
        &self,
        session_id: SessionId,
        player_id: UserId,
    ) -> Result<Option<Vec<ResponseCard>>, EngineError> {
        let handle = self
            .session(session_id)
            .ok_or(EngineError::Rejected(StatusCode::UnknownSession))?;
        handle.hand(player_id).await
    }

    /// Summaries of every live session. Sessions closing concurrently are skipped.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = self.sessions.iter().map(|h| h.value().clone()).collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.snapshot().await {
                Ok(snapshot) => summaries.push(SessionSummary::from(&snapshot)),
                Err(err) => debug!(session_id = %handle.id(), error = %err, "Skipping closed session"),
            }
        }
        summaries
    }

    /// Stop every session actor.
    pub fn shutdown(&self) {
        for handle in self.sessions.iter() {
            handle.value().shutdown();
        }
        self.sessions.clear();
        self.memberships.clear();
    }
}

async fn reap_sessions(
    mut closing: mpsc::UnboundedReceiver<SessionId>,
    sessions: Arc<DashMap<SessionId, SessionHandle>>,
    memberships: Memberships,
) {
    while let Some(session_id) = closing.recv().await {
        let Some((_, handle)) = sessions.remove(&session_id) else {
            continue;
        };
        handle.shutdown();
        memberships.retain(|_, m| m.session_id != session_id);
        info!(session_id = %session_id, "Session dropped");
    }
    debug!("Session reaper stopped");
}
