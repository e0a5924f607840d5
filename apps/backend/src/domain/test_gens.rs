// Fixtures and proptest generators for session tests.

use std::sync::Arc;

use proptest::prelude::*;
use uuid::Uuid;

use crate::domain::cards_types::{CardId, Identity, PromptCard, ResponseCard, UserId};
use crate::domain::events::MemorySink;
use crate::domain::session::GameSession;
use crate::domain::settings::Settings;
use crate::domain::state::SessionState;
use crate::errors::StatusCode;

pub const TEST_SEED: u64 = 0x5EED;

pub fn prompts(count: usize, pick: u8) -> Vec<PromptCard> {
    (0..count)
        .map(|i| PromptCard::new(format!("Prompt {i} ____"), pick))
        .collect()
}

pub fn responses(count: usize) -> Vec<ResponseCard> {
    (0..count)
        .map(|i| ResponseCard::new(format!("Response {i}")))
        .collect()
}

pub fn identities(count: usize) -> Vec<Identity> {
    (0..count)
        .map(|i| Identity::new(Uuid::new_v4(), format!("Player {i}")))
        .collect()
}

/// A Lobby session with `players` seated (host first) and exactly the
/// minimum card supply loaded, prompts picking one card.
pub fn fixture_session(players: usize, sink: &MemorySink) -> (GameSession, Vec<Identity>) {
    fixture_session_with(players, 1, Settings::default(), sink)
}

pub fn fixture_session_with(
    players: usize,
    pick: u8,
    settings: Settings,
    sink: &MemorySink,
) -> (GameSession, Vec<Identity>) {
    let ids = identities(players.max(1));
    let mut session = GameSession::new(ids[0].clone(), settings, Arc::new(sink.clone()))
        .with_rng_seed(TEST_SEED);
    for identity in &ids[1..] {
        assert_eq!(session.add_player(identity.clone()), StatusCode::ActionOk);
    }
    assert_eq!(
        session.set_cards(prompts(50, pick), responses(20 * players.max(3))),
        StatusCode::ActionOk
    );
    (session, ids)
}

/// A session that has been started and sits in Playing for round 1.
pub fn started_session(players: usize, sink: &MemorySink) -> (GameSession, Vec<Identity>) {
    let (mut session, ids) = fixture_session(players, sink);
    assert_eq!(session.start(), StatusCode::ActionOk);
    assert_eq!(session.state(), SessionState::Playing);
    (session, ids)
}

/// The first `pick` cards of a player's hand.
pub fn first_cards(session: &GameSession, player: UserId) -> Vec<CardId> {
    let pick = session.current_prompt().map_or(1, PromptCard::pick_count);
    session
        .hand(player)
        .map(|hand| hand.iter().take(pick).map(|c| c.id).collect())
        .unwrap_or_default()
}

/// Every non-judge player plays their first cards.
pub fn play_all(session: &mut GameSession) {
    let pending = session.roster().pending_players();
    for player in pending {
        let cards = first_cards(session, player);
        assert_eq!(session.play_cards(player, &cards), StatusCode::ActionOk);
    }
}

/// The judge picks the played set at `choice` (modulo the number of sets).
pub fn judge_choice(session: &mut GameSession, choice: usize) -> StatusCode {
    let Some(judge) = session.roster().judge().map(|p| p.id) else {
        return StatusCode::IsNotTheJudge;
    };
    let sets = session.played_sets();
    if sets.is_empty() {
        return StatusCode::InvalidCards;
    }
    let ids: Vec<CardId> = sets[choice % sets.len()].cards.iter().map(|c| c.id).collect();
    session.judge_cards(judge, &ids)
}

/// Fire whatever timer is pending. Returns false if none was.
pub fn fire_pending(session: &mut GameSession) -> bool {
    match session.pending_timer() {
        Some(ticket) => session.timer_fired(ticket),
        None => false,
    }
}

/// Play full rounds until someone other than the host is judging.
pub fn rotate_judge_off_host(session: &mut GameSession) {
    while session.roster().judge().map(|p| p.id) == Some(session.roster().host_id()) {
        play_all(session);
        assert_eq!(judge_choice(session, 0), StatusCode::ActionOk);
        assert!(fire_pending(session));
    }
}

/// One external stimulus applied to a running session.
#[derive(Debug, Clone)]
pub enum Stimulus {
    PlayFirst(usize),
    PlayWrongCount(usize),
    Judge(usize),
    JudgeAsPlayer(usize),
    Leave(usize),
    Join,
    Spectate,
    FireTimer,
    Stop,
    Start,
}

pub fn stimulus() -> impl Strategy<Value = Stimulus> {
    prop_oneof![
        6 => (0usize..12).prop_map(Stimulus::PlayFirst),
        1 => (0usize..12).prop_map(Stimulus::PlayWrongCount),
        3 => (0usize..12).prop_map(Stimulus::Judge),
        1 => (0usize..12).prop_map(Stimulus::JudgeAsPlayer),
        1 => (1usize..12).prop_map(Stimulus::Leave),
        1 => Just(Stimulus::Join),
        1 => Just(Stimulus::Spectate),
        3 => Just(Stimulus::FireTimer),
        1 => Just(Stimulus::Stop),
        1 => Just(Stimulus::Start),
    ]
}

pub fn stimuli(max_len: usize) -> impl Strategy<Value = Vec<Stimulus>> {
    prop::collection::vec(stimulus(), 1..max_len)
}

/// Apply a stimulus, resolving player indices against the current roster.
/// Index 0 (the host) is never asked to leave so the session stays alive.
pub fn apply(session: &mut GameSession, stimulus: &Stimulus) -> StatusCode {
    let ids: Vec<UserId> = session.roster().players().iter().map(|p| p.id).collect();
    if ids.is_empty() {
        return StatusCode::NotInSession;
    }
    let pick = |i: usize| ids[i % ids.len()];
    match *stimulus {
        Stimulus::PlayFirst(i) => {
            let player = pick(i);
            let cards = first_cards(session, player);
            session.play_cards(player, &cards)
        }
        Stimulus::PlayWrongCount(i) => {
            let player = pick(i);
            let cards: Vec<CardId> = session
                .hand(player)
                .map(|h| h.iter().take(3).map(|c| c.id).collect())
                .unwrap_or_default();
            session.play_cards(player, &cards)
        }
        Stimulus::Judge(choice) => judge_choice(session, choice),
        Stimulus::JudgeAsPlayer(i) => {
            let player = pick(i);
            let cards = first_cards(session, player);
            session.judge_cards(player, &cards)
        }
        Stimulus::Leave(i) => {
            if ids.len() <= 1 {
                return StatusCode::NotInSession;
            }
            let index = 1 + i % (ids.len() - 1);
            session.remove_player(ids[index])
        }
        Stimulus::Join => session.add_player(Identity::new(Uuid::new_v4(), "Late")),
        Stimulus::Spectate => session.add_spectator(Identity::new(Uuid::new_v4(), "Watcher")),
        Stimulus::FireTimer => {
            fire_pending(session);
            StatusCode::ActionOk
        }
        Stimulus::Stop => session.stop(),
        Stimulus::Start => session.start(),
    }
}
