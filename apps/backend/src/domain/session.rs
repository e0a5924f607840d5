//! The per-match state machine.
//!
//! `GameSession` is synchronous and assumes a single writer: every mutating
//! method (player commands, roster changes, timer firings) must be applied
//! one at a time. `services::session_actor` provides that serialization.
//!
//! Internal phases are entered through [`GameSession::enter`]; an unexpected
//! source state is a defect, reported as `IllegalStateTransition` followed by
//! a forced reset instead of a panic.

use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::card_economy::{CardCounts, CardEconomy};
use crate::domain::cards_types::{
    CardId, DeckId, DeckRef, Identity, PromptCard, ResponseCard, SessionId, UserId,
};
use crate::domain::events::{EventSink, GameEvent};
use crate::domain::roster::Roster;
use crate::domain::round_timer::{RoundTimer, TimerKind, TimerTicket};
use crate::domain::settings::{
    Settings, SettingsPatch, HAND_SIZE, MINIMUM_PLAYERS, MINIMUM_PROMPT_CARDS,
    MINIMUM_RESPONSE_CARDS_PER_PLAYER,
};
use crate::domain::state::SessionState;
use crate::errors::StatusCode;

/// Cards one player submitted this round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedSet {
    pub player_id: UserId,
    pub cards: Vec<ResponseCard>,
}

impl PlayedSet {
    fn contains_all(&self, ids: &[CardId]) -> bool {
        ids.iter().all(|id| self.cards.iter().any(|c| c.id == *id))
    }
}

pub struct GameSession {
    id: SessionId,
    state: SessionState,
    round: u32,
    decks: Vec<DeckRef>,
    settings: Settings,
    roster: Roster,
    economy: CardEconomy,
    played: Vec<PlayedSet>,
    /// A winner was chosen this round; the next deal is pending.
    round_decided: bool,
    timer: RoundTimer,
    rng: ChaCha8Rng,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("round", &self.round)
            .field("players", &self.roster.player_count())
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Create a session in Lobby with `host` seated as the first player.
    pub fn new(host: Identity, settings: Settings, sink: Arc<dyn EventSink>) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Lobby,
            round: 0,
            decks: Vec::new(),
            settings: settings.clamped(),
            roster: Roster::new(host),
            economy: CardEconomy::default(),
            played: Vec::new(),
            round_decided: false,
            timer: RoundTimer::detached(),
            rng: ChaCha8Rng::from_rng(&mut rand::rng()),
            sink,
        }
    }

    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn with_timer(mut self, timer: RoundTimer) -> Self {
        self.timer = timer;
        self
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn decks(&self) -> &[DeckRef] {
        &self.decks
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn economy(&self) -> &CardEconomy {
        &self.economy
    }

    pub fn played_sets(&self) -> &[PlayedSet] {
        &self.played
    }

    pub fn current_prompt(&self) -> Option<&PromptCard> {
        self.economy.current_prompt()
    }

    pub fn hand(&self, player_id: UserId) -> Option<&[ResponseCard]> {
        self.roster.player(player_id).map(|p| p.hand())
    }

    pub fn pending_timer(&self) -> Option<TimerTicket> {
        self.timer.pending_ticket()
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    /// Every card the session accounts for, wherever it currently sits.
    pub fn card_counts(&self) -> CardCounts {
        let pooled = self.economy.pooled_counts();
        let played: usize = self.played.iter().map(|s| s.cards.len()).sum();
        CardCounts {
            prompt: pooled.prompt,
            response: pooled.response + self.roster.hand_card_count() + played,
        }
    }

    // ---------------------------------------------------------------------
    // Lobby configuration
    // ---------------------------------------------------------------------

    pub fn add_deck(&mut self, deck: DeckRef) -> StatusCode {
        if self.state != SessionState::Lobby {
            return StatusCode::NotInLobbyState;
        }
        if self.decks.iter().any(|d| d.id == deck.id) {
            return StatusCode::DeckAlreadyAdded;
        }
        debug!(session_id = %self.id, deck_id = %deck.id, "Deck added");
        self.decks.push(deck);
        StatusCode::ActionOk
    }

    pub fn remove_deck(&mut self, deck_id: DeckId) -> StatusCode {
        if self.state != SessionState::Lobby {
            return StatusCode::NotInLobbyState;
        }
        let Some(pos) = self.decks.iter().position(|d| d.id == deck_id) else {
            return StatusCode::DeckNotInSession;
        };
        self.decks.remove(pos);
        debug!(session_id = %self.id, deck_id = %deck_id, "Deck removed");
        StatusCode::ActionOk
    }

    /// Load the card supply resolved from the session's decks.
    pub fn set_cards(
        &mut self,
        prompts: Vec<PromptCard>,
        responses: Vec<ResponseCard>,
    ) -> StatusCode {
        if self.state != SessionState::Lobby {
            return StatusCode::NotInLobbyState;
        }
        info!(
            session_id = %self.id,
            prompts = prompts.len(),
            responses = responses.len(),
            "Cards loaded"
        );
        self.economy.load(prompts, responses);
        self.economy.prompts.shuffle(&mut self.rng);
        self.economy.responses.shuffle(&mut self.rng);
        StatusCode::ActionOk
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) -> StatusCode {
        if patch.touches_lobby_only_fields() && self.state != SessionState::Lobby {
            return StatusCode::NotInLobbyState;
        }
        self.settings = self.settings.apply(patch);
        debug!(session_id = %self.id, settings = ?self.settings, "Settings updated");
        self.emit(GameEvent::SettingsUpdated {
            settings: self.settings.clone(),
        });
        StatusCode::ActionOk
    }

    // ---------------------------------------------------------------------
    // Roster
    // ---------------------------------------------------------------------

    pub fn add_player(&mut self, identity: Identity) -> StatusCode {
        let accepting = match self.state {
            SessionState::Lobby => true,
            SessionState::Abandoned | SessionState::Reset => false,
            _ => self.settings.allow_players_to_join_mid_game,
        };
        let player_id = identity.id;
        let nickname = identity.nickname.clone();

        if let Err(code) = self
            .roster
            .add_player(identity, self.settings.max_players, accepting)
        {
            return code;
        }

        info!(session_id = %self.id, player_id = %player_id, state = %self.state, "Player joined");
        self.emit(GameEvent::PlayerJoined {
            player_id,
            nickname,
        });
        StatusCode::ActionOk
    }

    pub fn remove_player(&mut self, player_id: UserId) -> StatusCode {
        let removed = match self.roster.remove_player(player_id) {
            Ok(removed) => removed,
            Err(code) => return code,
        };

        let mut player = removed.player;
        self.economy.discard_responses(player.clear_hand());
        let had_played = match self.played.iter().position(|s| s.player_id == player_id) {
            Some(pos) => {
                let set = self.played.remove(pos);
                self.economy.discard_responses(set.cards);
                true
            }
            None => false,
        };

        info!(
            session_id = %self.id,
            player_id = %player_id,
            was_judge = removed.was_judge,
            state = %self.state,
            "Player left"
        );
        self.emit(GameEvent::PlayerLeft { player_id });

        if player_id == self.roster.host_id() && self.state != SessionState::Abandoned {
            self.abandon();
        } else if self.state != SessionState::Abandoned {
            self.after_player_departure(removed.was_judge, had_played);
        }

        self.check_empty();
        StatusCode::ActionOk
    }

    fn after_player_departure(&mut self, was_judge: bool, had_played: bool) {
        if self.state.in_progress() && self.roster.player_count() < MINIMUM_PLAYERS {
            warn!(
                session_id = %self.id,
                players = self.roster.player_count(),
                "Dropped below minimum players, resetting"
            );
            self.emit(GameEvent::SystemMessage {
                message: format!(
                    "Not enough players to continue (minimum is {MINIMUM_PLAYERS}). The game has been reset."
                ),
            });
            self.reset();
            return;
        }

        match self.state {
            SessionState::Playing | SessionState::Judging if was_judge && !self.round_decided => {
                self.emit(GameEvent::SystemMessage {
                    message: "The judge left the game. The round will restart.".to_string(),
                });
                self.restart_round();
            }
            SessionState::Playing if self.roster.all_players_have_played() => {
                self.timer.cancel();
                self.begin_judging();
            }
            SessionState::Judging if had_played && !self.round_decided => {
                if self.played.is_empty() {
                    self.restart_without_plays();
                } else {
                    self.emit_cards_to_judge();
                }
            }
            _ => {}
        }
    }

    pub fn add_spectator(&mut self, identity: Identity) -> StatusCode {
        if self.state == SessionState::Abandoned {
            return StatusCode::NotInLobbyState;
        }
        let spectator_id = identity.id;
        let nickname = identity.nickname.clone();
        if let Err(code) = self
            .roster
            .add_spectator(identity, self.settings.max_spectators)
        {
            return code;
        }
        debug!(session_id = %self.id, spectator_id = %spectator_id, "Spectator joined");
        self.emit(GameEvent::SpectatorJoined {
            spectator_id,
            nickname,
        });
        StatusCode::ActionOk
    }

    pub fn remove_spectator(&mut self, spectator_id: UserId) -> StatusCode {
        if let Err(code) = self.roster.remove_spectator(spectator_id) {
            return code;
        }
        debug!(session_id = %self.id, spectator_id = %spectator_id, "Spectator left");
        self.emit(GameEvent::SpectatorLeft { spectator_id });
        self.check_empty();
        StatusCode::ActionOk
    }

    // ---------------------------------------------------------------------
    // Match lifecycle
    // ---------------------------------------------------------------------

    pub fn start(&mut self) -> StatusCode {
        if self.state != SessionState::Lobby {
            return StatusCode::NotInLobbyState;
        }
        let players = self.roster.player_count();
        if players < MINIMUM_PLAYERS {
            return StatusCode::NotEnoughPlayers;
        }
        if self.economy.prompts().len() < MINIMUM_PROMPT_CARDS {
            return StatusCode::NotEnoughPromptCards;
        }
        if self.economy.responses().len() < MINIMUM_RESPONSE_CARDS_PER_PLAYER * players {
            return StatusCode::NotEnoughResponseCards;
        }

        let first_judge = self.rng.random_range(0..players);
        self.roster.assign_judge(first_judge);
        info!(session_id = %self.id, players, first_judge, "Match started");

        self.begin_round(false);
        StatusCode::ActionOk
    }

    pub fn stop(&mut self) -> StatusCode {
        match self.state {
            SessionState::Lobby | SessionState::Abandoned => StatusCode::NotInProgress,
            _ => {
                info!(session_id = %self.id, state = %self.state, "Match stopped");
                self.reset();
                StatusCode::ActionOk
            }
        }
    }

    // ---------------------------------------------------------------------
    // Round actions
    // ---------------------------------------------------------------------

    pub fn play_cards(&mut self, player_id: UserId, card_ids: &[CardId]) -> StatusCode {
        if self.state != SessionState::Playing {
            return StatusCode::NotInPlayingState;
        }
        let Some(pick) = self.economy.current_prompt().map(PromptCard::pick_count) else {
            return StatusCode::NotInPlayingState;
        };
        let Some(player) = self.roster.player_mut(player_id) else {
            return StatusCode::NotInSession;
        };
        if player.is_judge() {
            return StatusCode::IsTheJudge;
        }
        if !player.need_to_play {
            return StatusCode::DoNotNeedToPlay;
        }
        if let Err(code) = check_pick(card_ids, pick) {
            return code;
        }
        if !player.holds_all(card_ids) {
            return StatusCode::InvalidCards;
        }

        let cards = player.take_cards(card_ids);
        player.need_to_play = false;
        debug!(session_id = %self.id, player_id = %player_id, cards = cards.len(), "Cards played");
        self.played.push(PlayedSet { player_id, cards });

        if self.roster.all_players_have_played() {
            self.timer.cancel();
            self.begin_judging();
        }
        StatusCode::ActionOk
    }

    pub fn judge_cards(&mut self, judge_id: UserId, card_ids: &[CardId]) -> StatusCode {
        if self.state != SessionState::Judging {
            return StatusCode::NotInJudgingState;
        }
        let Some(pick) = self.economy.current_prompt().map(PromptCard::pick_count) else {
            return StatusCode::NotInJudgingState;
        };
        let Some(judge) = self.roster.player(judge_id) else {
            return StatusCode::NotInSession;
        };
        if !judge.is_judge() {
            return StatusCode::IsNotTheJudge;
        }
        if !judge.need_to_play {
            return StatusCode::DoNotNeedToPlay;
        }
        if let Err(code) = check_pick(card_ids, pick) {
            return code;
        }
        let Some(winning) = self.played.iter().find(|s| s.contains_all(card_ids)).cloned() else {
            return StatusCode::InvalidCards;
        };

        self.timer.cancel();
        self.round_decided = true;
        if let Some(judge) = self.roster.player_mut(judge_id) {
            judge.need_to_play = false;
        }

        let Some(winner) = self.roster.player_mut(winning.player_id) else {
            self.illegal_transition(SessionState::Win);
            return StatusCode::ActionOk;
        };
        winner.score += 1;
        let (winner_id, nickname, score) = (winner.id, winner.nickname.clone(), winner.score);

        info!(
            session_id = %self.id,
            round = self.round,
            winner = %winner_id,
            score,
            "Round decided"
        );
        self.emit(GameEvent::RoundWinner {
            player_id: winner_id,
            nickname,
            winning_cards: winning.cards,
        });

        if score >= self.settings.max_score {
            self.enter_win(winner_id);
        } else {
            self.timer.start(
                TimerKind::RoundIntermission,
                self.settings.round_intermission(),
            );
        }
        StatusCode::ActionOk
    }

    /// Apply a timer firing. Stale tickets are ignored and return false.
    pub fn timer_fired(&mut self, ticket: TimerTicket) -> bool {
        if !self.timer.accept(ticket) {
            debug!(session_id = %self.id, ?ticket, "Ignoring stale timer");
            return false;
        }
        debug!(session_id = %self.id, kind = ?ticket.kind, state = %self.state, "Timer fired");

        match ticket.kind {
            TimerKind::Playing => self.on_playing_timeout(),
            TimerKind::Judging => self.on_judging_timeout(),
            TimerKind::RoundIntermission => self.on_round_intermission(),
            TimerKind::GameWinIntermission => self.on_win_intermission(),
        }
        true
    }

    /// Cancel any pending timer. Used when the session is torn down.
    pub fn shutdown(&mut self) {
        self.timer.cancel();
    }

    // ---------------------------------------------------------------------
    // Internal phases
    // ---------------------------------------------------------------------

    fn begin_round(&mut self, rotate_judge: bool) {
        if rotate_judge {
            self.roster.rotate_judge();
        }
        self.round += 1;
        self.deal_round();
    }

    /// Dealing: clear last round's cards, refill hands, draw a prompt.
    fn deal_round(&mut self) {
        if !self.enter(SessionState::Dealing) {
            return;
        }
        self.round_decided = false;

        let played: Vec<ResponseCard> = self.played.drain(..).flat_map(|s| s.cards).collect();
        self.economy.discard_responses(played);
        self.economy.discard_prompt();

        let Some(judge_id) = self.roster.judge().map(|p| p.id) else {
            self.illegal_transition(SessionState::Playing);
            return;
        };
        self.emit(GameEvent::RoundBegan {
            judge_id,
            round: self.round,
        });

        for player in self.roster.players_mut() {
            while player.hand().len() < HAND_SIZE {
                let Some(card) = self.economy.draw_response(&mut self.rng) else {
                    warn!(
                        session_id = %self.id,
                        player_id = %player.id,
                        hand = player.hand().len(),
                        "Response cards exhausted while dealing"
                    );
                    break;
                };
                self.sink.publish(
                    self.id,
                    GameEvent::CardDealt {
                        player_id: player.id,
                        card: card.clone(),
                    },
                );
                player.deal(card);
            }
        }

        let Some(prompt) = self.economy.replace_prompt(&mut self.rng).cloned() else {
            warn!(session_id = %self.id, "No prompt card available");
            self.illegal_transition(SessionState::Playing);
            return;
        };
        debug!(session_id = %self.id, round = self.round, pick = prompt.pick, "Prompt dealt");
        self.emit(GameEvent::PromptCardDealt { card: prompt });

        self.begin_playing();
    }

    fn begin_playing(&mut self) {
        if !self.enter(SessionState::Playing) {
            return;
        }
        for player in self.roster.players_mut() {
            player.need_to_play = !player.is_judge();
        }
        self.timer
            .start(TimerKind::Playing, self.settings.playing_timeout());
    }

    fn begin_judging(&mut self) {
        if self.played.is_empty() {
            self.restart_without_plays();
            return;
        }
        if !self.enter(SessionState::Judging) {
            return;
        }
        let Some(judge) = self.roster.judge_index() else {
            self.illegal_transition(SessionState::Judging);
            return;
        };
        self.roster.players_mut()[judge].need_to_play = true;
        self.emit_cards_to_judge();
        self.timer
            .start(TimerKind::Judging, self.settings.judging_timeout());
    }

    fn emit_cards_to_judge(&mut self) {
        let mut played: Vec<Vec<ResponseCard>> =
            self.played.iter().map(|s| s.cards.clone()).collect();
        played.shuffle(&mut self.rng);
        self.emit(GameEvent::CardsToJudge { played });
    }

    fn enter_win(&mut self, winner_id: UserId) {
        if !self.enter(SessionState::Win) {
            return;
        }
        self.roster.clear_roles();

        let nickname = self
            .roster
            .player(winner_id)
            .map(|p| p.nickname.clone())
            .unwrap_or_default();
        info!(session_id = %self.id, winner = %winner_id, rounds = self.round, "Game won");
        self.emit(GameEvent::GameWinner {
            player_id: winner_id,
            nickname,
        });
        self.emit(GameEvent::ResetScheduled {
            in_seconds: self.settings.game_win_intermission_seconds,
        });
        self.timer.start(
            TimerKind::GameWinIntermission,
            self.settings.game_win_intermission(),
        );
    }

    /// Restart the current round without scoring: played cards go back to
    /// their owners and a fresh prompt is dealt.
    fn restart_round(&mut self) {
        self.timer.cancel();
        for set in std::mem::take(&mut self.played) {
            match self.roster.player_mut(set.player_id) {
                Some(owner) => owner.return_to_hand(set.cards),
                None => self.economy.discard_responses(set.cards),
            }
        }
        for player in self.roster.players_mut() {
            player.need_to_play = false;
        }
        info!(session_id = %self.id, round = self.round, "Round restarting");
        self.deal_round();
    }

    /// Nothing left to judge: deal the round again rather than judging an
    /// empty table.
    fn restart_without_plays(&mut self) {
        info!(session_id = %self.id, round = self.round, "No cards to judge");
        self.emit(GameEvent::SystemMessage {
            message: "Nobody played any cards. The round will restart.".to_string(),
        });
        self.restart_round();
    }

    fn on_playing_timeout(&mut self) {
        if self.state != SessionState::Playing {
            self.illegal_transition(SessionState::Judging);
            return;
        }
        let late = self.roster.pending_players();
        info!(session_id = %self.id, late = late.len(), "Playing time expired");
        for player_id in late {
            self.kick(player_id);
        }
        if self.state == SessionState::Playing && self.roster.all_players_have_played() {
            self.begin_judging();
        }
    }

    fn on_judging_timeout(&mut self) {
        if self.state != SessionState::Judging || self.round_decided {
            self.illegal_transition(SessionState::Dealing);
            return;
        }
        info!(session_id = %self.id, round = self.round, "Judging time expired");
        if let Some(judge_id) = self.roster.judge().map(|p| p.id) {
            self.kick(judge_id);
        }
    }

    fn on_round_intermission(&mut self) {
        if self.state != SessionState::Judging || !self.round_decided {
            self.illegal_transition(SessionState::Dealing);
            return;
        }
        self.begin_round(true);
    }

    fn on_win_intermission(&mut self) {
        if self.state != SessionState::Win {
            self.illegal_transition(SessionState::Reset);
            return;
        }
        self.reset();
    }

    fn kick(&mut self, player_id: UserId) {
        if let Some(player) = self.roster.player(player_id) {
            let message = format!("{} was removed for inactivity.", player.nickname);
            self.emit(GameEvent::SystemMessage { message });
        }
        self.remove_player(player_id);
    }

    /// Reset: every outstanding card back to the available piles, scores and
    /// roles cleared, then Lobby.
    fn reset(&mut self) {
        if self.state == SessionState::Abandoned {
            return;
        }
        self.timer.cancel();
        let from = self.state;
        self.state = SessionState::Reset;
        self.emit(GameEvent::StateTransition {
            from,
            to: SessionState::Reset,
        });

        let mut outstanding: Vec<ResponseCard> =
            self.played.drain(..).flat_map(|s| s.cards).collect();
        for player in self.roster.players_mut() {
            outstanding.extend(player.clear_hand());
            player.score = 0;
        }
        self.roster.clear_roles();
        self.economy.collect_all(outstanding, &mut self.rng);

        self.round = 0;
        self.round_decided = false;
        info!(session_id = %self.id, from = %from, "Session reset");
        self.enter(SessionState::Lobby);
    }

    fn abandon(&mut self) {
        self.timer.cancel();
        self.roster.clear_roles();
        let from = self.state;
        self.state = SessionState::Abandoned;
        info!(session_id = %self.id, from = %from, "Host left, session abandoned");
        self.emit(GameEvent::StateTransition {
            from,
            to: SessionState::Abandoned,
        });
    }

    fn check_empty(&mut self) {
        if self.roster.is_empty() {
            info!(session_id = %self.id, "Session is empty");
            self.emit(GameEvent::SessionEmpty);
        }
    }

    /// Move to `to` if legal from the current state, otherwise report the
    /// defect and reset. Returns whether the transition happened.
    fn enter(&mut self, to: SessionState) -> bool {
        if !self.state.can_enter(to) {
            self.illegal_transition(to);
            return false;
        }
        let from = self.state;
        self.state = to;
        debug!(session_id = %self.id, from = %from, to = %to, "State transition");
        self.emit(GameEvent::StateTransition { from, to });
        true
    }

    fn illegal_transition(&mut self, to: SessionState) {
        let from = self.state;
        warn!(session_id = %self.id, from = %from, to = %to, "Illegal state transition, forcing reset");
        self.emit(GameEvent::IllegalStateTransition { from, to });
        self.reset();
    }

    fn emit(&self, event: GameEvent) {
        self.sink.publish(self.id, event);
    }
}

/// Validate a submission against the prompt's pick count.
fn check_pick(card_ids: &[CardId], pick: usize) -> Result<(), StatusCode> {
    if card_ids.len() < pick {
        return Err(StatusCode::NotEnoughCards);
    }
    if card_ids.len() > pick {
        return Err(StatusCode::TooManyCards);
    }
    let unique: HashSet<&CardId> = card_ids.iter().collect();
    if unique.len() != card_ids.len() {
        return Err(StatusCode::InvalidCards);
    }
    Ok(())
}
