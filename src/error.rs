use crate::store::StoreError;
use crate::types::GamePhase;

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors that can occur during game actions. Every variant maps to a stable
/// machine-readable code so clients can branch without parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("room not found")]
    RoomNotFound,

    #[error("room is closed")]
    RoomInactive,

    #[error("game has already started")]
    GameAlreadyStarted,

    #[error("player is not in this room")]
    NotInRoom,

    #[error("only the host can {0}")]
    NotHost(&'static str),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("action not allowed during the {0:?} phase")]
    WrongPhase(GamePhase),

    #[error("at least 3 players are required, room has {0}")]
    NotEnoughPlayers(usize),

    #[error("not all players are ready")]
    PlayersNotReady,

    #[error("only the faker can guess the secret word")]
    NotFaker,

    #[error("all rounds must finish before final scores")]
    NotFinalRound,

    #[error("vote target is not in this room")]
    UnknownVoteTarget,

    #[error("{0}")]
    InvalidInput(String),

    #[error("no word categories are available")]
    NoCategories,

    #[error("category {0} does not have enough words")]
    NotEnoughWords(String),

    #[error("no record for the current round")]
    RoundMissing,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GameError {
    /// Stable code for the wire protocol.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::RoomNotFound => "ROOM_NOT_FOUND",
            GameError::RoomInactive => "ROOM_CLOSED",
            GameError::GameAlreadyStarted => "GAME_IN_PROGRESS",
            GameError::NotInRoom => "NOT_IN_ROOM",
            GameError::NotHost(_) => "NOT_HOST",
            GameError::NotYourTurn => "NOT_YOUR_TURN",
            GameError::WrongPhase(_) => "WRONG_PHASE",
            GameError::NotEnoughPlayers(_) => "NOT_ENOUGH_PLAYERS",
            GameError::PlayersNotReady => "PLAYERS_NOT_READY",
            GameError::NotFaker => "NOT_FAKER",
            GameError::NotFinalRound => "NOT_FINAL_ROUND",
            GameError::UnknownVoteTarget => "UNKNOWN_VOTE_TARGET",
            GameError::InvalidInput(_) => "INVALID_INPUT",
            GameError::NoCategories => "NO_CATEGORIES",
            GameError::NotEnoughWords(_) => "NOT_ENOUGH_WORDS",
            GameError::RoundMissing => "ROUND_MISSING",
            GameError::Store(StoreError::VersionConflict(_)) => "CONFLICT",
            GameError::Store(StoreError::DuplicateKey) => "CONFLICT",
            GameError::Store(StoreError::NotFound) => "NOT_FOUND",
            GameError::Store(StoreError::Unavailable(_)) => "STORE_UNAVAILABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(GameError::RoomNotFound.code(), "ROOM_NOT_FOUND");
        assert_eq!(
            GameError::WrongPhase(GamePhase::Voting).code(),
            "WRONG_PHASE"
        );
        assert_eq!(
            GameError::Store(StoreError::VersionConflict("r".to_string())).code(),
            "CONFLICT"
        );
    }

    #[test]
    fn test_not_host_message_names_the_action() {
        let err = GameError::NotHost("start the game");
        assert_eq!(err.to_string(), "only the host can start the game");
    }
}
