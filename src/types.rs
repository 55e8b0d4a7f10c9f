use serde::{Deserialize, Serialize};

pub type RoomId = String;
pub type PlayerId = String;
pub type CategoryId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Lobby,
    WordReveal,
    ClueGiving,
    Voting,
    FakerGuess,
    Results,
    Finished,
    Ended,
}

impl GamePhase {
    /// Phases during which per-round rows (clues, votes, round records) may exist
    /// and membership changes must cascade into them.
    pub fn in_progress(&self) -> bool {
        matches!(
            self,
            GamePhase::WordReveal
                | GamePhase::ClueGiving
                | GamePhase::Voting
                | GamePhase::FakerGuess
                | GamePhase::Results
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    Faker,
    Regular,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub version: u64,
    pub name: String,
    pub host_id: PlayerId,
    pub phase: GamePhase,
    pub current_round: u32,
    pub total_rounds: u32,
    pub game_mode: String,
    pub is_active: bool,
    pub category: Option<String>,
    pub word_grid: Vec<String>,
    pub secret_word: Option<String>,
    pub button_holder_index: usize,
    pub current_turn_player_id: Option<PlayerId>,
    pub turn_started_at: Option<String>, // ISO timestamp, refreshed whenever the clue turn passes
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

/// A player's seat in one room. Score and per-round flags live here, not on Player,
/// so the same player could sit in several rooms without state bleeding over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub is_host: bool,
    pub is_ready: bool,
    pub is_clue_ready: bool,
    pub role: Option<PlayerRole>,
    pub score: u32,
    pub turn_order: Option<u32>,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub room_id: RoomId,
    pub round_number: u32,
    pub secret_word: String,
    pub faker_id: PlayerId,
    pub faker_guess: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clue {
    pub room_id: RoomId,
    pub round_number: u32,
    pub player_id: PlayerId,
    pub text: String,
    pub submission_order: u32, // 1-based, in the order clues arrived
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub room_id: RoomId,
    pub round_number: u32,
    pub voter_id: PlayerId,
    pub voted_for_id: PlayerId,
    pub ts: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

// ========== Game Tuning ==========

/// Minimum players needed to start a game or keep one going
pub const MIN_PLAYERS: usize = 3;

/// Words shown on the grid each round; categories below this size are unplayable
pub const GRID_SIZE: usize = 16;

pub const MAX_NAME_CHARS: usize = 40;
pub const MAX_CLUE_CHARS: usize = 30;

pub const DEFAULT_TOTAL_ROUNDS: u32 = 3;
pub const MAX_TOTAL_ROUNDS: u32 = 10;
