//! WebSocket message dispatch
//!
//! Connections are anonymous until they create, join, or resume into a room.
//! The connection context remembers the seat, and every later message acts
//! on its behalf.

use crate::engine::GameService;
use crate::error::GameError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::types::{GamePhase, PlayerId, RoomId};
use std::sync::Arc;

/// What this connection has told us about itself
#[derive(Debug, Clone, Default)]
pub struct ConnContext {
    pub player_id: Option<PlayerId>,
    pub room_id: Option<RoomId>,
}

fn error_reply(e: GameError) -> ServerMessage {
    ServerMessage::Error {
        code: e.code().to_string(),
        msg: e.to_string(),
    }
}

/// Macro to resolve the connection's seat or return early
macro_rules! require_player {
    ($conn:expr) => {
        match &$conn.player_id {
            Some(player_id) => player_id.clone(),
            None => {
                return Some(ServerMessage::Error {
                    code: "NOT_IN_ROOM".to_string(),
                    msg: "join a room first".to_string(),
                })
            }
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    conn: &mut ConnContext,
    service: &Arc<GameService>,
) -> Option<ServerMessage> {
    match msg {
        // Messages that bind the connection to a seat
        ClientMessage::CreateRoom {
            name,
            host_name,
            total_rounds,
        } => match service.create_room(&name, &host_name, total_rounds).await {
            Ok((room, player)) => {
                conn.player_id = Some(player.id.clone());
                conn.room_id = Some(room.id.clone());
                Some(ServerMessage::RoomCreated {
                    room,
                    player_id: player.id,
                })
            }
            Err(e) => Some(error_reply(e)),
        },

        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => match service.join_room(&room_id, &player_name).await {
            Ok((room, player)) => {
                conn.player_id = Some(player.id.clone());
                conn.room_id = Some(room.id.clone());
                Some(ServerMessage::RoomJoined {
                    room,
                    player_id: player.id,
                })
            }
            Err(e) => Some(error_reply(e)),
        },

        ClientMessage::Resume { room_id, player_id } => {
            match service.resume(&room_id, &player_id).await {
                Ok(room) => {
                    conn.player_id = Some(player_id.clone());
                    conn.room_id = Some(room.id.clone());
                    Some(ServerMessage::RoomJoined { room, player_id })
                }
                Err(e) => Some(error_reply(e)),
            }
        }

        // Lobby
        ClientMessage::ToggleReady { room_id, ready } => {
            let player_id = require_player!(conn);
            match service.toggle_ready(&room_id, &player_id, ready).await {
                Ok(()) => Some(ServerMessage::ReadyUpdated { ready }),
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::StartGame { room_id } => {
            let player_id = require_player!(conn);
            match service.start_game(&room_id, &player_id).await {
                Ok(room) => Some(ServerMessage::GameStarted { room }),
                Err(e) => Some(error_reply(e)),
            }
        }

        // Round play
        ClientMessage::ToggleClueReady { room_id, ready } => {
            let player_id = require_player!(conn);
            match service.toggle_clue_ready(&room_id, &player_id, ready).await {
                Ok(()) => Some(ServerMessage::ClueReadyUpdated { ready }),
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::SubmitClue { room_id, text } => {
            let player_id = require_player!(conn);
            match service.submit_clue(&room_id, &player_id, &text).await {
                Ok(()) => Some(ServerMessage::ClueAccepted),
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::SubmitVote {
            room_id,
            voted_for_id,
        } => {
            let player_id = require_player!(conn);
            match service.submit_vote(&room_id, &player_id, &voted_for_id).await {
                Ok(()) => Some(ServerMessage::VoteAccepted),
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::SubmitFakerGuess { room_id, guess } => {
            let player_id = require_player!(conn);
            match service.submit_faker_guess(&room_id, &player_id, &guess).await {
                Ok(correct) => Some(ServerMessage::GuessAccepted { correct }),
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::StartNextRound { room_id } => {
            let player_id = require_player!(conn);
            match service.start_next_round(&room_id, &player_id).await {
                Ok(room) => {
                    if room.phase == GamePhase::Finished {
                        Some(ServerMessage::GameFinished { room })
                    } else {
                        Some(ServerMessage::RoundAdvanced { room })
                    }
                }
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::ViewFinalScores { room_id } => {
            let player_id = require_player!(conn);
            match service.view_final_scores(&room_id, &player_id).await {
                Ok(room) => Some(ServerMessage::GameFinished { room }),
                Err(e) => Some(error_reply(e)),
            }
        }

        // Room lifecycle
        ClientMessage::RestartGame { room_id } => {
            let player_id = require_player!(conn);
            match service.restart_game(&room_id, &player_id).await {
                Ok(room) => Some(ServerMessage::GameRestarted { room }),
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::LeaveGame { room_id } => {
            let player_id = require_player!(conn);
            match service.leave_game(&room_id, &player_id).await {
                Ok(()) => {
                    conn.player_id = None;
                    conn.room_id = None;
                    Some(ServerMessage::LeftRoom)
                }
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::EndGame { room_id } => {
            let player_id = require_player!(conn);
            match service.end_game(&room_id, &player_id).await {
                Ok(room) => Some(ServerMessage::GameEnded { room }),
                Err(e) => Some(error_reply(e)),
            }
        }
    }
}
