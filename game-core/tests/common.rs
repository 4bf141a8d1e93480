#![allow(dead_code)]

use game_core::{PlayerRegistry, Session, TurnChange, TurnCoordinator, TurnEndCause, TurnSignal};
use game_types::{Phase, Player, PlayerId, TurnKey, TurnUpdatedPayload};
use uuid::Uuid;

/// Creates a test player with the given name
pub fn create_test_player(name: &str) -> Player {
    Player::new(Uuid::new_v4(), name, format!("avatars/{}", name.to_lowercase()))
}

/// Creates a lobby session seated in the given order
pub fn create_seated_session(names: &[&str]) -> (Session, Vec<PlayerId>) {
    let mut registry = PlayerRegistry::new();
    let mut ids = Vec::new();
    for name in names {
        let player = create_test_player(name);
        ids.push(player.id);
        registry.join(player).unwrap();
    }
    (Session::new("test-room", registry), ids)
}

/// Creates a lobby session with `count` anonymous players
pub fn create_session_of(count: usize) -> (Session, Vec<PlayerId>) {
    let names: Vec<String> = (0..count).map(|i| format!("Player{}", i + 1)).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    create_seated_session(&names)
}

pub fn create_coordinator(round_limit: u32) -> TurnCoordinator {
    TurnCoordinator::new(round_limit).unwrap()
}

/// Applies a timeout for whatever turn is currently active
pub fn time_out(coordinator: &TurnCoordinator, session: &mut Session) -> TurnChange {
    let turn = session
        .current_turn()
        .expect("time_out called without an active turn");
    coordinator
        .apply(
            session,
            TurnSignal::TurnEnded {
                turn,
                cause: TurnEndCause::Timeout,
            },
        )
        .unwrap()
}

pub fn depart(coordinator: &TurnCoordinator, session: &mut Session, player_id: PlayerId) -> TurnChange {
    coordinator
        .apply(session, TurnSignal::PlayerDeparted { player_id })
        .unwrap()
}

/// Ends turns (and begins rounds) until the session sits at `(round, describer_order)`
pub fn advance_to(
    coordinator: &TurnCoordinator,
    session: &mut Session,
    round: u32,
    describer_order: usize,
) {
    if session.phase() == Phase::Lobby {
        coordinator.apply(session, TurnSignal::Start).unwrap();
    }
    while session.position() != (round, describer_order) || session.phase() != Phase::InTurn {
        match session.phase() {
            Phase::InTurn => {
                time_out(coordinator, session);
            }
            Phase::RoundTransition => {
                coordinator.apply(session, TurnSignal::RoundReady).unwrap();
            }
            phase => panic!("cannot reach ({}, {}) from {}", round, describer_order, phase),
        }
    }
}

/// The canonical broadcast an authority would send after timing out the current turn
pub fn turn_updated_by_authority(
    coordinator: &TurnCoordinator,
    session: &Session,
) -> TurnUpdatedPayload {
    let mut authority_view = session.clone();
    let ended: TurnKey = authority_view.current_turn().unwrap();
    time_out(coordinator, &mut authority_view);
    coordinator.turn_updated_payload(&authority_view, ended)
}

/// `(round, describer_order, player_count, phase)`
pub fn fingerprint(session: &Session) -> (u32, usize, usize, Phase) {
    (
        session.round(),
        session.describer_order(),
        session.player_count(),
        session.phase(),
    )
}

pub fn orders(session: &Session, ids: &[PlayerId]) -> Vec<Option<usize>> {
    ids.iter()
        .map(|id| session.registry().get(id).map(|p| p.order))
        .collect()
}
