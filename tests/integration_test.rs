use std::collections::HashMap;
use std::sync::Arc;

use susword::engine::GameService;
use susword::protocol::{ClientMessage, ServerMessage};
use susword::store::MemoryStore;
use susword::types::{GamePhase, PlayerId, RoomId};
use susword::ws::handlers::{handle_message, ConnContext};

fn service(seed: u64) -> Arc<GameService> {
    Arc::new(GameService::with_seed(Arc::new(MemoryStore::new()), seed))
}

async fn say(
    service: &Arc<GameService>,
    conn: &mut ConnContext,
    msg: ClientMessage,
) -> ServerMessage {
    handle_message(msg, conn, service)
        .await
        .expect("every request should get a reply")
}

async fn phase_of(service: &Arc<GameService>, room_id: &str) -> GamePhase {
    service
        .store()
        .room(room_id)
        .await
        .unwrap()
        .unwrap()
        .phase
}

async fn score_of(service: &Arc<GameService>, room_id: &str, player_id: &str) -> u32 {
    service
        .store()
        .membership(room_id, player_id)
        .await
        .unwrap()
        .unwrap()
        .score
}

/// One simulated table: a connection context per seated player, in join order.
struct Table {
    room_id: RoomId,
    conns: Vec<ConnContext>,
    ids: Vec<PlayerId>,
}

async fn seated_table(
    service: &Arc<GameService>,
    names: &[&str],
    total_rounds: Option<u32>,
) -> Table {
    let mut conns: Vec<ConnContext> = names.iter().map(|_| ConnContext::default()).collect();
    let mut ids = Vec::new();

    let reply = say(
        service,
        &mut conns[0],
        ClientMessage::CreateRoom {
            name: "Friday Night".to_string(),
            host_name: names[0].to_string(),
            total_rounds,
        },
    )
    .await;
    let room_id = match reply {
        ServerMessage::RoomCreated { room, player_id } => {
            ids.push(player_id);
            room.id
        }
        other => panic!("Expected RoomCreated, got {other:?}"),
    };

    for (i, name) in names.iter().enumerate().skip(1) {
        let reply = say(
            service,
            &mut conns[i],
            ClientMessage::JoinRoom {
                room_id: room_id.clone(),
                player_name: name.to_string(),
            },
        )
        .await;
        match reply {
            ServerMessage::RoomJoined { player_id, .. } => ids.push(player_id),
            other => panic!("Expected RoomJoined, got {other:?}"),
        }
    }

    for conn in conns.iter_mut() {
        let reply = say(
            service,
            conn,
            ClientMessage::ToggleReady {
                room_id: room_id.clone(),
                ready: true,
            },
        )
        .await;
        assert!(matches!(reply, ServerMessage::ReadyUpdated { ready: true }));
    }

    Table {
        room_id,
        conns,
        ids,
    }
}

/// Confirms the word for every seat, then submits clues in rank order.
/// Returns player indexes in clue order and the index of the faker.
async fn play_clues(
    service: &Arc<GameService>,
    table: &mut Table,
    clue_prefix: &str,
) -> (Vec<usize>, usize) {
    for conn in table.conns.iter_mut() {
        let reply = say(
            service,
            conn,
            ClientMessage::ToggleClueReady {
                room_id: table.room_id.clone(),
                ready: true,
            },
        )
        .await;
        assert!(matches!(
            reply,
            ServerMessage::ClueReadyUpdated { ready: true }
        ));
    }
    assert_eq!(phase_of(service, &table.room_id).await, GamePhase::ClueGiving);

    let members = service
        .store()
        .memberships_for_room(&table.room_id)
        .await
        .unwrap();
    let mut by_rank: Vec<(u32, PlayerId)> = members
        .iter()
        .map(|m| (m.turn_order.unwrap(), m.player_id.clone()))
        .collect();
    by_rank.sort_unstable();
    let order: Vec<usize> = by_rank
        .iter()
        .map(|(_, id)| table.ids.iter().position(|p| p == id).unwrap())
        .collect();

    for (n, idx) in order.iter().enumerate() {
        let reply = say(
            service,
            &mut table.conns[*idx],
            ClientMessage::SubmitClue {
                room_id: table.room_id.clone(),
                text: format!("{clue_prefix}{n}"),
            },
        )
        .await;
        assert!(matches!(reply, ServerMessage::ClueAccepted));
    }
    assert_eq!(phase_of(service, &table.room_id).await, GamePhase::Voting);

    let current_round = service
        .store()
        .room(&table.room_id)
        .await
        .unwrap()
        .unwrap()
        .current_round;
    let record = service
        .store()
        .round(&table.room_id, current_round)
        .await
        .unwrap()
        .unwrap();
    let faker = table
        .ids
        .iter()
        .position(|p| *p == record.faker_id)
        .unwrap();
    (order, faker)
}

/// End-to-end flow: two full rounds with both vote outcomes, final scores,
/// and a restart back to the lobby.
#[tokio::test]
async fn test_full_game_flow() {
    let service = service(1234);

    // 1. Setup: lobby with three ready players
    let mut table = seated_table(&service, &["Alice", "Bora", "Chen"], Some(2)).await;
    assert_eq!(phase_of(&service, &table.room_id).await, GamePhase::Lobby);

    // 2. Only the host can start
    let reply = say(
        &service,
        &mut table.conns[1],
        ClientMessage::StartGame {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    match reply {
        ServerMessage::Error { code, .. } => assert_eq!(code, "NOT_HOST"),
        other => panic!("Expected error, got {other:?}"),
    }

    let reply = say(
        &service,
        &mut table.conns[0],
        ClientMessage::StartGame {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    match reply {
        ServerMessage::GameStarted { room } => {
            assert_eq!(room.phase, GamePhase::WordReveal);
            assert_eq!(room.current_round, 1);
            assert_eq!(room.word_grid.len(), 16);
        }
        other => panic!("Expected GameStarted, got {other:?}"),
    }

    // 3. A started game takes no new players
    let mut late = ConnContext::default();
    let reply = say(
        &service,
        &mut late,
        ClientMessage::JoinRoom {
            room_id: table.room_id.clone(),
            player_name: "Dana".to_string(),
        },
    )
    .await;
    match reply {
        ServerMessage::Error { code, .. } => assert_eq!(code, "GAME_IN_PROGRESS"),
        other => panic!("Expected error, got {other:?}"),
    }

    // 4. Round one: clues in rank order, then everyone votes the faker
    let (_, faker) = play_clues(&service, &mut table, "alpha").await;
    let faker_id = table.ids[faker].clone();
    for i in 0..table.conns.len() {
        let reply = say(
            &service,
            &mut table.conns[i],
            ClientMessage::SubmitVote {
                room_id: table.room_id.clone(),
                voted_for_id: faker_id.clone(),
            },
        )
        .await;
        assert!(matches!(reply, ServerMessage::VoteAccepted));
    }
    assert_eq!(phase_of(&service, &table.room_id).await, GamePhase::FakerGuess);

    // 5. The caught faker guesses right, sloppily typed
    let secret = service
        .store()
        .round(&table.room_id, 1)
        .await
        .unwrap()
        .unwrap()
        .secret_word;
    let reply = say(
        &service,
        &mut table.conns[faker],
        ClientMessage::SubmitFakerGuess {
            room_id: table.room_id.clone(),
            guess: format!("  {}  ", secret.to_uppercase()),
        },
    )
    .await;
    assert!(matches!(
        reply,
        ServerMessage::GuessAccepted { correct: true }
    ));
    assert_eq!(phase_of(&service, &table.room_id).await, GamePhase::Results);

    let mut expected: HashMap<PlayerId, u32> =
        table.ids.iter().map(|id| (id.clone(), 0)).collect();
    *expected.get_mut(&faker_id).unwrap() += 1;
    for id in &table.ids {
        assert_eq!(score_of(&service, &table.room_id, id).await, expected[id]);
    }

    // 6. Next round rotates the button
    let reply = say(
        &service,
        &mut table.conns[0],
        ClientMessage::StartNextRound {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    match reply {
        ServerMessage::RoundAdvanced { room } => {
            assert_eq!(room.current_round, 2);
            assert_eq!(room.button_holder_index, 1);
            assert_eq!(room.phase, GamePhase::WordReveal);
        }
        other => panic!("Expected RoundAdvanced, got {other:?}"),
    }
    assert!(service
        .store()
        .clues_for_round(&table.room_id, 1)
        .await
        .unwrap()
        .is_empty());

    // 7. Round two: the table misses and the faker escapes
    let (_, faker) = play_clues(&service, &mut table, "beta").await;
    let faker_id = table.ids[faker].clone();
    let scapegoat = table
        .ids
        .iter()
        .find(|id| **id != faker_id)
        .unwrap()
        .clone();
    for i in 0..table.conns.len() {
        let reply = say(
            &service,
            &mut table.conns[i],
            ClientMessage::SubmitVote {
                room_id: table.room_id.clone(),
                voted_for_id: scapegoat.clone(),
            },
        )
        .await;
        assert!(matches!(reply, ServerMessage::VoteAccepted));
    }
    assert_eq!(phase_of(&service, &table.room_id).await, GamePhase::Results);
    *expected.get_mut(&faker_id).unwrap() += 2;
    for id in &table.ids {
        assert_eq!(score_of(&service, &table.room_id, id).await, expected[id]);
    }

    // 8. The host closes out the final round
    let reply = say(
        &service,
        &mut table.conns[2],
        ClientMessage::ViewFinalScores {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    match reply {
        ServerMessage::Error { code, .. } => assert_eq!(code, "NOT_HOST"),
        other => panic!("Expected error, got {other:?}"),
    }
    let reply = say(
        &service,
        &mut table.conns[0],
        ClientMessage::ViewFinalScores {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    match reply {
        ServerMessage::GameFinished { room } => assert_eq!(room.phase, GamePhase::Finished),
        other => panic!("Expected GameFinished, got {other:?}"),
    }

    // 9. Restart puts everyone back in the lobby, unready and at zero
    let reply = say(
        &service,
        &mut table.conns[0],
        ClientMessage::RestartGame {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    match reply {
        ServerMessage::GameRestarted { room } => {
            assert_eq!(room.phase, GamePhase::Lobby);
            assert_eq!(room.current_round, 1);
            assert!(room.secret_word.is_none());
            assert!(room.word_grid.is_empty());
        }
        other => panic!("Expected GameRestarted, got {other:?}"),
    }
    for id in &table.ids {
        let seat = service
            .store()
            .membership(&table.room_id, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seat.score, 0);
        assert!(!seat.is_ready);
        assert!(seat.role.is_none());
    }
    assert!(service
        .store()
        .round(&table.room_id, 2)
        .await
        .unwrap()
        .is_none());

    // 10. The lobby works again after a restart
    let reply = say(
        &service,
        &mut table.conns[1],
        ClientMessage::ToggleReady {
            room_id: table.room_id.clone(),
            ready: true,
        },
    )
    .await;
    assert!(matches!(reply, ServerMessage::ReadyUpdated { ready: true }));
}

/// Leaving mid-game: host promotion, turn handoff, and the below-minimum
/// reset back to the lobby.
#[tokio::test]
async fn test_leaving_repairs_the_game() {
    let service = service(77);
    let mut table = seated_table(&service, &["Alice", "Bora", "Chen", "Dana"], Some(3)).await;
    say(
        &service,
        &mut table.conns[0],
        ClientMessage::StartGame {
            room_id: table.room_id.clone(),
        },
    )
    .await;

    // 1. The host walks out mid-reveal
    let old_host = table.ids[0].clone();
    let reply = say(
        &service,
        &mut table.conns[0],
        ClientMessage::LeaveGame {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    assert!(matches!(reply, ServerMessage::LeftRoom));

    let room = service
        .store()
        .room(&table.room_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(room.phase, GamePhase::WordReveal);
    assert_eq!(room.host_id, table.ids[1]);
    let holder = room.current_turn_player_id.clone().unwrap();
    assert_ne!(holder, old_host);
    assert!(table.ids[1..].contains(&holder));

    // 2. A cleared connection is back to square one
    let reply = say(
        &service,
        &mut table.conns[0],
        ClientMessage::ToggleClueReady {
            room_id: table.room_id.clone(),
            ready: true,
        },
    )
    .await;
    match reply {
        ServerMessage::Error { code, .. } => assert_eq!(code, "NOT_IN_ROOM"),
        other => panic!("Expected error, got {other:?}"),
    }

    // 3. Dropping below three seats resets the game to the lobby
    let reply = say(
        &service,
        &mut table.conns[3],
        ClientMessage::LeaveGame {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    assert!(matches!(reply, ServerMessage::LeftRoom));

    let room = service
        .store()
        .room(&table.room_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(room.phase, GamePhase::Lobby);
    assert!(room.current_turn_player_id.is_none());
    assert!(service
        .store()
        .round(&table.room_id, 1)
        .await
        .unwrap()
        .is_none());
    for id in &table.ids[1..3] {
        let seat = service
            .store()
            .membership(&table.room_id, id)
            .await
            .unwrap()
            .unwrap();
        assert!(seat.role.is_none());
        assert!(seat.turn_order.is_none());
        // ready flags survive a forced reset
        assert!(seat.is_ready);
    }
}

/// A leaver during voting can be the last missing ballot. The round must
/// resolve for the seats still at the table.
#[tokio::test]
async fn test_vote_resolves_when_the_last_holdout_leaves() {
    let service = service(4242);
    let mut table = seated_table(&service, &["Alice", "Bora", "Chen", "Dana"], Some(3)).await;
    say(
        &service,
        &mut table.conns[0],
        ClientMessage::StartGame {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    let (_, faker) = play_clues(&service, &mut table, "gamma").await;
    let faker_id = table.ids[faker].clone();

    // pick a holdout who is neither the faker nor anyone's target
    let holdout = table
        .ids
        .iter()
        .position(|id| *id != faker_id)
        .unwrap();
    for i in 0..table.conns.len() {
        if i == holdout {
            continue;
        }
        let reply = say(
            &service,
            &mut table.conns[i],
            ClientMessage::SubmitVote {
                room_id: table.room_id.clone(),
                voted_for_id: faker_id.clone(),
            },
        )
        .await;
        assert!(matches!(reply, ServerMessage::VoteAccepted));
    }
    assert_eq!(phase_of(&service, &table.room_id).await, GamePhase::Voting);

    let reply = say(
        &service,
        &mut table.conns[holdout],
        ClientMessage::LeaveGame {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    assert!(matches!(reply, ServerMessage::LeftRoom));
    assert_eq!(phase_of(&service, &table.room_id).await, GamePhase::FakerGuess);
}

/// Ending a game closes the room for good.
#[tokio::test]
async fn test_ended_rooms_stay_closed() {
    let service = service(9);
    let mut table = seated_table(&service, &["Alice", "Bora", "Chen"], None).await;

    let reply = say(
        &service,
        &mut table.conns[0],
        ClientMessage::EndGame {
            room_id: table.room_id.clone(),
        },
    )
    .await;
    match reply {
        ServerMessage::GameEnded { room } => {
            assert_eq!(room.phase, GamePhase::Ended);
            assert!(!room.is_active);
        }
        other => panic!("Expected GameEnded, got {other:?}"),
    }

    let mut late = ConnContext::default();
    let reply = say(
        &service,
        &mut late,
        ClientMessage::JoinRoom {
            room_id: table.room_id.clone(),
            player_name: "Dana".to_string(),
        },
    )
    .await;
    match reply {
        ServerMessage::Error { code, .. } => assert_eq!(code, "ROOM_CLOSED"),
        other => panic!("Expected error, got {other:?}"),
    }

    // the room is still readable for final standings
    let reply = say(
        &service,
        &mut table.conns[1],
        ClientMessage::Resume {
            room_id: table.room_id.clone(),
            player_id: table.ids[1].clone(),
        },
    )
    .await;
    match reply {
        ServerMessage::RoomJoined { room, .. } => assert_eq!(room.phase, GamePhase::Ended),
        other => panic!("Expected RoomJoined, got {other:?}"),
    }
}

/// Phase and turn guards reject actions sent at the wrong moment.
#[tokio::test]
async fn test_misplaced_actions_are_rejected() {
    let service = service(31);
    let mut table = seated_table(&service, &["Alice", "Bora", "Chen"], Some(3)).await;

    // clue before the game starts
    let reply = say(
        &service,
        &mut table.conns[0],
        ClientMessage::SubmitClue {
            room_id: table.room_id.clone(),
            text: "early".to_string(),
        },
    )
    .await;
    match reply {
        ServerMessage::Error { code, .. } => assert_eq!(code, "WRONG_PHASE"),
        other => panic!("Expected error, got {other:?}"),
    }

    say(
        &service,
        &mut table.conns[0],
        ClientMessage::StartGame {
            room_id: table.room_id.clone(),
        },
    )
    .await;

    // vote during the reveal
    let reply = say(
        &service,
        &mut table.conns[1],
        ClientMessage::SubmitVote {
            room_id: table.room_id.clone(),
            voted_for_id: table.ids[0].clone(),
        },
    )
    .await;
    match reply {
        ServerMessage::Error { code, .. } => assert_eq!(code, "WRONG_PHASE"),
        other => panic!("Expected error, got {other:?}"),
    }

    // a two-word clue from the right seat at the right time
    for conn in table.conns.iter_mut() {
        say(
            &service,
            conn,
            ClientMessage::ToggleClueReady {
                room_id: table.room_id.clone(),
                ready: true,
            },
        )
        .await;
    }
    let holder_id = service
        .store()
        .room(&table.room_id)
        .await
        .unwrap()
        .unwrap()
        .current_turn_player_id
        .unwrap();
    let holder = table.ids.iter().position(|id| *id == holder_id).unwrap();
    let reply = say(
        &service,
        &mut table.conns[holder],
        ClientMessage::SubmitClue {
            room_id: table.room_id.clone(),
            text: "two words".to_string(),
        },
    )
    .await;
    match reply {
        ServerMessage::Error { code, .. } => assert_eq!(code, "INVALID_INPUT"),
        other => panic!("Expected error, got {other:?}"),
    }
}
