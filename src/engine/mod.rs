//! Game engine.
//!
//! Every game action funnels through [`GameService`]. The service holds no
//! game state of its own: each action reads rows from the store, validates,
//! and writes back. Room writes go through a small retry loop around the
//! store's version check, and the closure re-validates on every attempt.

mod rooms;
mod rounds;
mod scoring;
mod turns;
mod votes;

pub use scoring::{faker_caught, score_round, tally_votes};

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;

use crate::error::{GameError, GameResult};
use crate::store::{Store, StoreError};
use crate::types::{GamePhase, Membership, Room};

/// Attempts for an optimistic room write before giving up
const CAS_RETRIES: usize = 3;

pub struct GameService {
    store: Arc<dyn Store>,
    rng: Mutex<StdRng>,
}

impl GameService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic variant for tests and reproducible runs.
    pub fn with_seed(store: Arc<dyn Store>, seed: u64) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub(crate) async fn room_or_err(&self, room_id: &str) -> GameResult<Room> {
        self.store
            .room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)
    }

    pub(crate) async fn member_or_err(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> GameResult<Membership> {
        self.store
            .membership(room_id, player_id)
            .await?
            .ok_or(GameError::NotInRoom)
    }

    /// Read-modify-write on a room, retried on version conflicts.
    pub(crate) async fn update_room_with<F>(&self, room_id: &str, mut apply: F) -> GameResult<Room>
    where
        F: FnMut(&mut Room) -> GameResult<()>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut room = self.room_or_err(room_id).await?;
            apply(&mut room)?;
            match self.store.update_room(room).await {
                Ok(updated) => return Ok(updated),
                Err(StoreError::VersionConflict(_)) if attempts < CAS_RETRIES => {
                    tracing::debug!(room_id, attempts, "room write conflicted, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Legal phase moves. Everything the engine does to a room's phase has to
/// pass through here via [`transition`].
pub fn is_valid_phase_transition(from: &GamePhase, to: &GamePhase) -> bool {
    use GamePhase::*;
    match (from, to) {
        // The host can end the game from anywhere
        (_, Ended) => true,
        // Restarts and below-minimum resets return to the lobby
        (WordReveal, Lobby)
        | (ClueGiving, Lobby)
        | (Voting, Lobby)
        | (FakerGuess, Lobby)
        | (Results, Lobby)
        | (Finished, Lobby) => true,
        // The round loop
        (Lobby, WordReveal) => true,
        (WordReveal, ClueGiving) => true,
        (ClueGiving, Voting) => true,
        (Voting, FakerGuess) | (Voting, Results) => true,
        (FakerGuess, Results) => true,
        (Results, WordReveal) | (Results, Finished) => true,
        _ => false,
    }
}

pub(crate) fn transition(room: &mut Room, to: GamePhase) -> GameResult<()> {
    if !is_valid_phase_transition(&room.phase, &to) {
        return Err(GameError::WrongPhase(room.phase.clone()));
    }
    room.phase = to;
    Ok(())
}
