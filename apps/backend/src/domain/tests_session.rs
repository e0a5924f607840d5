use uuid::Uuid;

use crate::domain::cards_types::{CardId, DeckRef, Identity};
use crate::domain::events::{GameEvent, MemorySink};
use crate::domain::roster::PlayerRole;
use crate::domain::round_timer::TimerKind;
use crate::domain::settings::{Settings, SettingsPatch, HAND_SIZE};
use crate::domain::state::SessionState;
use crate::domain::test_gens::{
    fire_pending, first_cards, fixture_session, fixture_session_with, judge_choice, play_all,
    prompts, responses, rotate_judge_off_host, started_session,
};
use crate::errors::StatusCode;

fn non_judge(session: &crate::domain::session::GameSession) -> Uuid {
    session
        .roster()
        .players()
        .iter()
        .find(|p| !p.is_judge())
        .map(|p| p.id)
        .unwrap()
}

#[test]
fn start_with_minimum_supply_succeeds() {
    let sink = MemorySink::new();
    let (mut session, _) = fixture_session(3, &sink);
    assert_eq!(session.start(), StatusCode::ActionOk);
}

#[test]
fn start_with_49_prompts_fails() {
    let sink = MemorySink::new();
    let (mut session, _) = fixture_session(3, &sink);
    session.set_cards(prompts(49, 1), responses(60));
    assert_eq!(session.start(), StatusCode::NotEnoughPromptCards);
    assert_eq!(session.state(), SessionState::Lobby);
}

#[test]
fn start_rejects_short_response_supply() {
    let sink = MemorySink::new();
    let (mut session, _) = fixture_session(3, &sink);
    session.set_cards(prompts(50, 1), responses(59));
    assert_eq!(session.start(), StatusCode::NotEnoughResponseCards);
}

#[test]
fn start_rejects_two_players() {
    let sink = MemorySink::new();
    let (mut session, _) = fixture_session(2, &sink);
    assert_eq!(session.start(), StatusCode::NotEnoughPlayers);
}

#[test]
fn start_twice_is_rejected() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(3, &sink);
    assert_eq!(session.start(), StatusCode::NotInLobbyState);
}

#[test]
fn start_deals_full_hands_and_one_judge() {
    let sink = MemorySink::new();
    let (mut session, _) = fixture_session(3, &sink);
    sink.clear();

    assert_eq!(session.start(), StatusCode::ActionOk);
    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(session.round(), 1);
    assert_eq!(session.roster().judge_count(), 1);
    for player in session.roster().players() {
        assert_eq!(player.hand().len(), HAND_SIZE);
        assert_eq!(player.need_to_play, !player.is_judge());
    }

    let events = sink.take();
    assert!(events.contains(&GameEvent::StateTransition {
        from: SessionState::Lobby,
        to: SessionState::Dealing,
    }));
    assert!(events.contains(&GameEvent::StateTransition {
        from: SessionState::Dealing,
        to: SessionState::Playing,
    }));
    let dealt = events
        .iter()
        .filter(|e| matches!(e, GameEvent::CardDealt { .. }))
        .count();
    assert_eq!(dealt, 3 * HAND_SIZE);
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::RoundBegan { round: 1, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::PromptCardDealt { .. })));
    assert_eq!(session.pending_timer().map(|t| t.kind), Some(TimerKind::Playing));
}

#[test]
fn play_cards_validates_pick_count_and_ownership() {
    let sink = MemorySink::new();
    let (mut session, _) = fixture_session_with(3, 2, Settings::default(), &sink);
    assert_eq!(session.start(), StatusCode::ActionOk);

    let player = non_judge(&session);
    let hand: Vec<CardId> = session.hand(player).unwrap().iter().map(|c| c.id).collect();

    assert_eq!(session.play_cards(player, &hand[..1]), StatusCode::NotEnoughCards);
    assert_eq!(session.play_cards(player, &hand[..3]), StatusCode::TooManyCards);
    assert_eq!(
        session.play_cards(player, &[Uuid::new_v4(), Uuid::new_v4()]),
        StatusCode::InvalidCards
    );
    assert_eq!(
        session.play_cards(player, &[hand[0], hand[0]]),
        StatusCode::InvalidCards
    );
    assert_eq!(session.play_cards(player, &hand[..2]), StatusCode::ActionOk);
    assert!(!session.roster().player(player).unwrap().need_to_play);
    assert_eq!(session.hand(player).unwrap().len(), HAND_SIZE - 2);

    assert_eq!(
        session.play_cards(player, &hand[2..4]),
        StatusCode::DoNotNeedToPlay
    );
}

#[test]
fn judge_cannot_play_and_strangers_are_rejected() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(3, &sink);
    let judge = session.roster().judge().unwrap().id;
    let cards = first_cards(&session, judge);

    assert_eq!(session.play_cards(judge, &cards), StatusCode::IsTheJudge);
    assert_eq!(
        session.play_cards(Uuid::new_v4(), &cards),
        StatusCode::NotInSession
    );
    assert_eq!(
        session.judge_cards(judge, &cards),
        StatusCode::NotInJudgingState
    );
}

#[test]
fn all_played_advances_to_judging() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(4, &sink);
    sink.clear();

    play_all(&mut session);

    assert_eq!(session.state(), SessionState::Judging);
    assert_eq!(session.pending_timer().map(|t| t.kind), Some(TimerKind::Judging));
    assert!(session.roster().judge().unwrap().need_to_play);

    let events = sink.take();
    let played = events.iter().find_map(|e| match e {
        GameEvent::CardsToJudge { played } => Some(played.clone()),
        _ => None,
    });
    assert_eq!(played.map(|p| p.len()), Some(3));
}

#[test]
fn judging_rejects_non_judge_and_unknown_sets() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(3, &sink);
    play_all(&mut session);

    let player = non_judge(&session);
    let judge = session.roster().judge().unwrap().id;
    let played = session.played_sets()[0].cards[0].id;

    assert_eq!(session.judge_cards(player, &[played]), StatusCode::IsNotTheJudge);
    assert_eq!(
        session.judge_cards(judge, &[Uuid::new_v4()]),
        StatusCode::InvalidCards
    );
    assert_eq!(session.judge_cards(judge, &[]), StatusCode::NotEnoughCards);
    assert_eq!(
        session.play_cards(player, &[played]),
        StatusCode::NotInPlayingState
    );
}

#[test]
fn judging_scores_winner_and_schedules_next_round() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(3, &sink);
    let first_judge = session.roster().judge_index().unwrap();
    play_all(&mut session);
    sink.clear();

    let winner = session.played_sets()[0].player_id;
    assert_eq!(judge_choice(&mut session, 0), StatusCode::ActionOk);

    assert_eq!(session.roster().player(winner).unwrap().score, 1);
    assert!(sink.take().iter().any(|e| matches!(
        e,
        GameEvent::RoundWinner { player_id, .. } if *player_id == winner
    )));
    assert_eq!(session.state(), SessionState::Judging);
    assert_eq!(judge_choice(&mut session, 0), StatusCode::DoNotNeedToPlay);
    assert_eq!(
        session.pending_timer().map(|t| t.kind),
        Some(TimerKind::RoundIntermission)
    );

    assert!(fire_pending(&mut session));
    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(session.round(), 2);
    assert_eq!(session.roster().judge_index(), Some((first_judge + 1) % 3));
    for player in session.roster().players() {
        assert_eq!(player.hand().len(), HAND_SIZE);
    }
}

#[test]
fn reaching_max_score_wins_then_resets() {
    let sink = MemorySink::new();
    let settings = Settings {
        max_score: 1,
        ..Settings::default()
    };
    let (mut session, _) = fixture_session_with(3, 1, settings, &sink);
    let total = session.card_counts();
    assert_eq!(session.start(), StatusCode::ActionOk);
    play_all(&mut session);
    sink.clear();

    assert_eq!(judge_choice(&mut session, 0), StatusCode::ActionOk);
    assert_eq!(session.state(), SessionState::Win);
    assert_eq!(session.roster().judge_count(), 0);
    let events = sink.take();
    assert!(events.iter().any(|e| matches!(e, GameEvent::GameWinner { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::ResetScheduled { in_seconds: 10 })));
    assert_eq!(
        session.pending_timer().map(|t| t.kind),
        Some(TimerKind::GameWinIntermission)
    );

    assert!(fire_pending(&mut session));
    assert_eq!(session.state(), SessionState::Lobby);
    assert_eq!(session.round(), 0);
    assert!(session.current_prompt().is_none());
    for player in session.roster().players() {
        assert_eq!(player.score, 0);
        assert!(player.hand().is_empty());
        assert_eq!(player.role, PlayerRole::Player);
    }
    assert_eq!(session.card_counts(), total);
    assert_eq!(session.economy().responses().discarded_len(), 0);
    assert_eq!(session.economy().prompts().discarded_len(), 0);

    let events = sink.take();
    assert!(events.contains(&GameEvent::StateTransition {
        from: SessionState::Win,
        to: SessionState::Reset,
    }));
    assert!(events.contains(&GameEvent::StateTransition {
        from: SessionState::Reset,
        to: SessionState::Lobby,
    }));
}

#[test]
fn playing_timeout_kicks_late_players_and_resets_below_minimum() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(3, &sink);
    let late = session.roster().pending_players();
    let on_time = late[0];
    let cards = first_cards(&session, on_time);
    assert_eq!(session.play_cards(on_time, &cards), StatusCode::ActionOk);
    sink.clear();

    assert!(fire_pending(&mut session));

    assert!(!session.roster().has_player(late[1]));
    assert_eq!(session.state(), SessionState::Lobby);
    let events = sink.take();
    assert!(events.contains(&GameEvent::PlayerLeft { player_id: late[1] }));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::SystemMessage { .. })));
}

#[test]
fn playing_timeout_with_enough_players_advances_to_judging() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(5, &sink);
    let pending = session.roster().pending_players();
    for player in &pending[..3] {
        let cards = first_cards(&session, *player);
        assert_eq!(session.play_cards(*player, &cards), StatusCode::ActionOk);
    }

    assert!(fire_pending(&mut session));

    assert_eq!(session.roster().player_count(), 4);
    assert_eq!(session.state(), SessionState::Judging);
    assert_eq!(session.played_sets().len(), 3);
}

#[test]
fn judging_timeout_kicks_judge_and_restarts_round() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(4, &sink);
    let total = session.card_counts();
    rotate_judge_off_host(&mut session);
    play_all(&mut session);
    let judge = session.roster().judge().unwrap().id;
    let judge_index = session.roster().judge_index().unwrap();
    let round = session.round();
    let old_prompt = session.current_prompt().unwrap().id;

    assert_eq!(
        session.pending_timer().map(|t| t.kind),
        Some(TimerKind::Judging)
    );
    assert!(fire_pending(&mut session));

    assert!(!session.roster().has_player(judge));
    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(session.round(), round);
    assert_eq!(session.roster().judge_count(), 1);
    assert_eq!(session.roster().judge_index(), Some(judge_index % 3));
    assert_ne!(session.current_prompt().unwrap().id, old_prompt);
    assert!(session.played_sets().is_empty());
    for player in session.roster().players() {
        assert_eq!(player.hand().len(), HAND_SIZE);
        assert_eq!(player.score, 0);
    }
    assert_eq!(session.card_counts(), total);
}

#[test]
fn judge_leaving_mid_play_restarts_round_with_successor() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(4, &sink);
    rotate_judge_off_host(&mut session);
    let judge_index = session.roster().judge_index().unwrap();
    let successor = session.roster().players()[(judge_index + 1) % 4].id;
    let judge = session.roster().judge().unwrap().id;
    let round = session.round();

    assert_eq!(session.remove_player(judge), StatusCode::ActionOk);
    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(session.roster().judge().unwrap().id, successor);
    assert_eq!(session.round(), round);
    assert_eq!(sink.count("round_began"), round as usize + 1);
}

#[test]
fn host_leaving_abandons_session() {
    let sink = MemorySink::new();
    let (mut session, ids) = started_session(4, &sink);
    sink.clear();

    assert_eq!(session.remove_player(ids[0].id), StatusCode::ActionOk);
    assert_eq!(session.state(), SessionState::Abandoned);
    assert_eq!(session.roster().judge_count(), 0);
    assert!(session.pending_timer().is_none());
    assert!(sink.take().contains(&GameEvent::StateTransition {
        from: SessionState::Playing,
        to: SessionState::Abandoned,
    }));

    assert_eq!(session.stop(), StatusCode::NotInProgress);
    assert_eq!(
        session.add_player(Identity::new(Uuid::new_v4(), "Late")),
        StatusCode::NotInLobbyState
    );
    assert_eq!(
        session.add_spectator(Identity::new(Uuid::new_v4(), "Watcher")),
        StatusCode::NotInLobbyState
    );
    assert!(session.roster().spectators().is_empty());
    assert_eq!(session.remove_player(ids[1].id), StatusCode::ActionOk);
}

#[test]
fn last_departure_signals_empty_session() {
    let sink = MemorySink::new();
    let (mut session, ids) = fixture_session(2, &sink);
    assert_eq!(
        session.add_spectator(Identity::new(Uuid::new_v4(), "Watcher")),
        StatusCode::ActionOk
    );
    let watcher = session.roster().spectators()[0].id;

    session.remove_player(ids[1].id);
    session.remove_player(ids[0].id);
    assert_eq!(sink.count("session_empty"), 0);

    assert_eq!(session.remove_spectator(watcher), StatusCode::ActionOk);
    assert_eq!(sink.count("session_empty"), 1);
    assert_eq!(session.remove_spectator(watcher), StatusCode::NotSpectating);
}

#[test]
fn stop_resets_running_match_and_rejects_lobby() {
    let sink = MemorySink::new();
    let (mut session, _) = fixture_session(3, &sink);
    assert_eq!(session.stop(), StatusCode::NotInProgress);

    let total = session.card_counts();
    assert_eq!(session.start(), StatusCode::ActionOk);
    assert_eq!(session.stop(), StatusCode::ActionOk);
    assert_eq!(session.state(), SessionState::Lobby);
    assert!(session.pending_timer().is_none());
    assert_eq!(session.card_counts(), total);
    assert_eq!(session.start(), StatusCode::ActionOk);
}

#[test]
fn decks_are_lobby_only_and_unique() {
    let sink = MemorySink::new();
    let (mut session, _) = fixture_session(3, &sink);
    let deck = DeckRef::new(Uuid::new_v4(), "Base");

    assert_eq!(session.add_deck(deck.clone()), StatusCode::ActionOk);
    assert_eq!(session.add_deck(deck.clone()), StatusCode::DeckAlreadyAdded);
    assert_eq!(session.remove_deck(Uuid::new_v4()), StatusCode::DeckNotInSession);

    session.start();
    assert_eq!(session.remove_deck(deck.id), StatusCode::NotInLobbyState);
    assert_eq!(
        session.set_cards(prompts(50, 1), responses(60)),
        StatusCode::NotInLobbyState
    );
    session.stop();
    assert_eq!(session.remove_deck(deck.id), StatusCode::ActionOk);
    assert!(session.decks().is_empty());
}

#[test]
fn capacity_limits_are_enforced() {
    let sink = MemorySink::new();
    let settings = Settings {
        max_players: 3,
        max_spectators: 0,
        ..Settings::default()
    };
    let (mut session, ids) = fixture_session_with(3, 1, settings, &sink);

    assert_eq!(
        session.add_player(Identity::new(Uuid::new_v4(), "Fourth")),
        StatusCode::MaxPlayersReached
    );
    assert_eq!(session.add_player(ids[1].clone()), StatusCode::AlreadyInSession);
    assert_eq!(
        session.add_spectator(Identity::new(Uuid::new_v4(), "Watcher")),
        StatusCode::MaxSpectatorsReached
    );
    assert_eq!(session.add_spectator(ids[1].clone()), StatusCode::AlreadyInSession);
}

#[test]
fn mid_game_join_follows_setting() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(3, &sink);
    let late = Identity::new(Uuid::new_v4(), "Late");
    assert_eq!(session.add_player(late.clone()), StatusCode::NotInLobbyState);

    let patch = SettingsPatch {
        allow_players_to_join_mid_game: Some(true),
        ..SettingsPatch::default()
    };
    assert_eq!(session.update_settings(&patch), StatusCode::NotInLobbyState);
    session.stop();
    assert_eq!(session.update_settings(&patch), StatusCode::ActionOk);
    assert_eq!(session.start(), StatusCode::ActionOk);

    assert_eq!(session.add_player(late.clone()), StatusCode::ActionOk);
    let joined = session.roster().player(late.id).unwrap();
    assert!(!joined.need_to_play);
    assert!(joined.hand().is_empty());

    play_all(&mut session);
    assert_eq!(session.state(), SessionState::Judging);
}

#[test]
fn playing_timeout_with_no_plays_left_restarts_round() {
    let sink = MemorySink::new();
    let settings = Settings {
        allow_players_to_join_mid_game: true,
        ..Settings::default()
    };
    let (mut session, ids) = fixture_session_with(3, 1, settings, &sink);
    assert_eq!(session.start(), StatusCode::ActionOk);
    assert_eq!(session.roster().judge().map(|p| p.id), Some(ids[0].id));
    let total = session.card_counts();
    let old_prompt = session.current_prompt().unwrap().id;

    let joiners = [
        Identity::new(Uuid::new_v4(), "Late One"),
        Identity::new(Uuid::new_v4(), "Late Two"),
    ];
    for joiner in &joiners {
        assert_eq!(session.add_player(joiner.clone()), StatusCode::ActionOk);
    }
    sink.clear();

    // Both original players miss the deadline; the joiners owe nothing.
    assert!(fire_pending(&mut session));

    assert!(!session.roster().has_player(ids[1].id));
    assert!(!session.roster().has_player(ids[2].id));
    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(session.round(), 1);
    assert_eq!(session.roster().judge().map(|p| p.id), Some(ids[0].id));
    assert!(session.played_sets().is_empty());
    assert_ne!(session.current_prompt().unwrap().id, old_prompt);
    assert_eq!(
        session.pending_timer().map(|t| t.kind),
        Some(TimerKind::Playing)
    );
    for joiner in &joiners {
        let player = session.roster().player(joiner.id).unwrap();
        assert!(player.need_to_play);
        assert_eq!(player.hand().len(), HAND_SIZE);
    }
    assert_eq!(session.card_counts(), total);

    assert_eq!(sink.count("cards_to_judge"), 0);
    assert!(sink.take().iter().any(|e| matches!(
        e,
        GameEvent::SystemMessage { message } if message.contains("Nobody played")
    )));

    play_all(&mut session);
    assert_eq!(session.state(), SessionState::Judging);
    assert_eq!(judge_choice(&mut session, 0), StatusCode::ActionOk);
}

#[test]
fn timing_settings_update_at_any_time() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(3, &sink);
    let patch = SettingsPatch {
        judging_timeout_seconds: Some(1),
        ..SettingsPatch::default()
    };

    assert_eq!(session.update_settings(&patch), StatusCode::ActionOk);
    assert_eq!(session.settings().judging_timeout_seconds, 10);
    assert_eq!(sink.count("settings_updated"), 1);
}

#[test]
fn stale_timer_ticket_is_ignored() {
    let sink = MemorySink::new();
    let (mut session, _) = started_session(3, &sink);
    let stale = session.pending_timer().unwrap();
    play_all(&mut session);

    assert!(!session.timer_fired(stale));
    assert_eq!(session.state(), SessionState::Judging);
}
