use crate::projection::{DerivedFlags, RoomView};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        name: String,
        host_name: String,
        total_rounds: Option<u32>,
    },
    JoinRoom {
        room_id: RoomId,
        player_name: String,
    },
    ToggleReady {
        room_id: RoomId,
        ready: bool,
    },
    StartGame {
        room_id: RoomId,
    },
    ToggleClueReady {
        room_id: RoomId,
        ready: bool,
    },
    SubmitClue {
        room_id: RoomId,
        text: String,
    },
    SubmitVote {
        room_id: RoomId,
        voted_for_id: PlayerId,
    },
    /// Caught faker picks a word off the grid
    SubmitFakerGuess {
        room_id: RoomId,
        guess: String,
    },
    StartNextRound {
        room_id: RoomId,
    },
    ViewFinalScores {
        room_id: RoomId,
    },
    RestartGame {
        room_id: RoomId,
    },
    LeaveGame {
        room_id: RoomId,
    },
    EndGame {
        room_id: RoomId,
    },
    /// Re-attach a known player to their seat after a reconnect
    Resume {
        room_id: RoomId,
        player_id: PlayerId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomCreated {
        room: Room,
        player_id: PlayerId,
    },
    RoomJoined {
        room: Room,
        player_id: PlayerId,
    },
    ReadyUpdated {
        ready: bool,
    },
    ClueReadyUpdated {
        ready: bool,
    },
    GameStarted {
        room: Room,
    },
    ClueAccepted,
    VoteAccepted,
    GuessAccepted {
        correct: bool,
    },
    RoundAdvanced {
        room: Room,
    },
    GameFinished {
        room: Room,
    },
    GameRestarted {
        room: Room,
    },
    GameEnded {
        room: Room,
    },
    LeftRoom,
    /// Pushed after every change to the room the connection follows
    RoomState {
        view: RoomView,
        flags: DerivedFlags,
    },
    Error {
        code: String,
        msg: String,
    },
}
