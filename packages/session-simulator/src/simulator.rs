//! Headless match runner.
//!
//! Bots drive a `GameSession` directly, without the actor or any runtime:
//! every player plays random legal cards, the judge picks a random set, and
//! intermission timers are fired as soon as they are scheduled.

use std::error::Error;
use std::sync::Arc;

use party_backend::domain::{
    CardId, GameEvent, GameSession, Identity, MemorySink, PromptCard, ResponseCard, SessionState,
    Settings,
};
use party_backend::EngineError;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, trace};
use uuid::Uuid;

type SimResult<T> = Result<T, Box<dyn Error>>;

/// Give up on a match that runs this many rounds.
const MAX_ROUNDS: u32 = 1_000;

/// Every n-th prompt asks for two cards.
const DOUBLE_PICK_EVERY: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct GameResult {
    pub game: u32,
    pub seed: u64,
    pub rounds: u32,
    pub winner_seat: usize,
    pub final_scores: Vec<u32>,
}

pub struct Simulator {
    seed: u64,
    players: usize,
    max_score: u32,
}

impl Simulator {
    pub fn new(seed: u64, players: usize, max_score: u32) -> Self {
        Self {
            seed,
            players,
            max_score,
        }
    }

    /// Play one match from Lobby to Win and back to Lobby.
    pub fn simulate_game(&self, game: u32) -> SimResult<GameResult> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let sink = MemorySink::new();
        let seats: Vec<Identity> = (0..self.players)
            .map(|seat| {
                Identity::new(
                    Uuid::from_u64_pair(self.seed, seat as u64),
                    format!("bot-{seat}"),
                )
            })
            .collect();

        let settings = Settings {
            max_score: self.max_score,
            ..Settings::default()
        };
        let mut session = GameSession::new(seats[0].clone(), settings, Arc::new(sink.clone()))
            .with_rng_seed(self.seed);
        for seat in &seats[1..] {
            EngineError::check(session.add_player(seat.clone()))?;
        }
        let (prompts, responses) = build_deck(self.players);
        EngineError::check(session.set_cards(prompts, responses))?;
        EngineError::check(session.start())?;

        loop {
            if session.round() > MAX_ROUNDS {
                return Err(format!("game {game} did not finish within {MAX_ROUNDS} rounds").into());
            }
            match session.state() {
                SessionState::Playing => {
                    sink.clear();
                    play_cards(&mut session, &mut rng)?;
                }
                SessionState::Judging => {
                    if !judge(&mut session, &mut rng)? {
                        fire_pending(&mut session)?;
                    }
                }
                SessionState::Win => {
                    let final_scores: Vec<u32> = seats
                        .iter()
                        .map(|s| session.roster().player(s.id).map_or(0, |p| p.score))
                        .collect();
                    let winner = sink
                        .take()
                        .into_iter()
                        .find_map(|event| match event {
                            GameEvent::GameWinner { player_id, .. } => Some(player_id),
                            _ => None,
                        })
                        .ok_or("match won without a winner event")?;
                    let winner_seat = seats
                        .iter()
                        .position(|s| s.id == winner)
                        .ok_or("winner is not seated")?;
                    let rounds = session.round();

                    fire_pending(&mut session)?;
                    if session.state() != SessionState::Lobby {
                        return Err(format!("expected Lobby after win, got {}", session.state()).into());
                    }
                    debug!(game, rounds, winner_seat, "Match finished");
                    return Ok(GameResult {
                        game,
                        seed: self.seed,
                        rounds,
                        winner_seat,
                        final_scores,
                    });
                }
                other => {
                    return Err(
                        format!("unexpected state {other} in round {}", session.round()).into(),
                    );
                }
            }
        }
    }
}

/// Every pending player submits random cards from their hand.
fn play_cards(session: &mut GameSession, rng: &mut ChaCha8Rng) -> SimResult<()> {
    let pick = session
        .current_prompt()
        .map(PromptCard::pick_count)
        .ok_or("playing without a prompt")?;
    for player_id in session.roster().pending_players() {
        let cards: Vec<CardId> = session
            .hand(player_id)
            .ok_or("pending player has no hand")?
            .choose_multiple(rng, pick)
            .map(|card| card.id)
            .collect();
        trace!(%player_id, cards = cards.len(), "Bot plays");
        EngineError::check(session.play_cards(player_id, &cards))?;
    }
    Ok(())
}

/// The judge picks a random played set. Returns false once the round is
/// already decided.
fn judge(session: &mut GameSession, rng: &mut ChaCha8Rng) -> SimResult<bool> {
    let Some(judge_id) = session
        .roster()
        .judge()
        .filter(|judge| judge.need_to_play)
        .map(|judge| judge.id)
    else {
        return Ok(false);
    };
    let choice: Vec<CardId> = session
        .played_sets()
        .choose(rng)
        .map(|set| set.cards.iter().map(|card| card.id).collect())
        .ok_or("nothing to judge")?;
    EngineError::check(session.judge_cards(judge_id, &choice))?;
    Ok(true)
}

fn fire_pending(session: &mut GameSession) -> SimResult<()> {
    let ticket = session.pending_timer().ok_or("no timer pending")?;
    session.timer_fired(ticket);
    Ok(())
}

/// Enough cards for a match at `players`, with a share of two-card prompts.
fn build_deck(players: usize) -> (Vec<PromptCard>, Vec<ResponseCard>) {
    let prompts = (0..100)
        .map(|i| {
            let pick = if i % DOUBLE_PICK_EVERY == 0 { 2 } else { 1 };
            PromptCard::new(format!("Prompt {i}"), pick)
        })
        .collect();
    let responses = (0..players * 40)
        .map(|i| ResponseCard::new(format!("Response {i}")))
        .collect();
    (prompts, responses)
}
