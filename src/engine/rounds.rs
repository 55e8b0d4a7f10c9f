use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use crate::engine::{transition, GameService};
use crate::error::{GameError, GameResult};
use crate::types::{
    GamePhase, Membership, PlayerId, PlayerRole, Room, RoundRecord, GRID_SIZE, MIN_PLAYERS,
};

impl GameService {
    /// Start the first round once the whole lobby is ready.
    pub async fn start_game(&self, room_id: &str, player_id: &str) -> GameResult<Room> {
        let room = self.room_or_err(room_id).await?;
        if !room.is_active {
            return Err(GameError::RoomInactive);
        }
        self.member_or_err(room_id, player_id).await?;
        if room.host_id != player_id {
            return Err(GameError::NotHost("start the game"));
        }
        if room.phase != GamePhase::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }

        let members = self.store().memberships_for_room(room_id).await?;
        if members.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers(members.len()));
        }
        if !members.iter().all(|m| m.is_ready) {
            return Err(GameError::PlayersNotReady);
        }

        let updated = self.begin_round(room_id, members, 1, 0).await?;
        tracing::info!(room_id, "game started");
        Ok(updated)
    }

    /// Deal a fresh round: pick a category and grid, choose the secret word
    /// and the faker, shuffle the clue order, and open the word reveal.
    pub(crate) async fn begin_round(
        &self,
        room_id: &str,
        members: Vec<Membership>,
        round_number: u32,
        button_index: usize,
    ) -> GameResult<Room> {
        let categories = self.store().categories().await?;

        let mut rng = self.rng.lock().await;
        let category = categories
            .choose(&mut *rng)
            .cloned()
            .ok_or(GameError::NoCategories)?;
        let mut words = self.store().words_in_category(&category.id).await?;
        if words.len() < GRID_SIZE {
            return Err(GameError::NotEnoughWords(category.name));
        }
        words.shuffle(&mut *rng);
        words.truncate(GRID_SIZE);
        let secret_word = words[rng.random_range(0..words.len())].clone();
        let faker_id = members[rng.random_range(0..members.len())].player_id.clone();
        let mut rank_order: Vec<PlayerId> =
            members.iter().map(|m| m.player_id.clone()).collect();
        rank_order.shuffle(&mut *rng);
        drop(rng);

        let first_player = rank_order[button_index % rank_order.len()].clone();

        for member in &members {
            let mut seat = member.clone();
            seat.role = Some(if seat.player_id == faker_id {
                PlayerRole::Faker
            } else {
                PlayerRole::Regular
            });
            seat.turn_order = rank_order
                .iter()
                .position(|id| *id == seat.player_id)
                .map(|i| i as u32);
            seat.is_clue_ready = false;
            self.store().update_membership(seat).await?;
        }

        self.store()
            .insert_round(RoundRecord {
                room_id: room_id.to_string(),
                round_number,
                secret_word: secret_word.clone(),
                faker_id,
                faker_guess: None,
                created_at: chrono::Utc::now().to_rfc3339(),
            })
            .await?;

        let updated = self
            .update_room_with(room_id, |r| {
                transition(r, GamePhase::WordReveal)?;
                r.current_round = round_number;
                r.category = Some(category.name.clone());
                r.word_grid = words.clone();
                r.secret_word = Some(secret_word.clone());
                r.button_holder_index = button_index;
                r.current_turn_player_id = Some(first_player.clone());
                r.turn_started_at = Some(chrono::Utc::now().to_rfc3339());
                Ok(())
            })
            .await?;

        self.store().purge_rounds_before(room_id, round_number).await?;

        tracing::info!(room_id, round = round_number, category = %category.name, "round set up");
        Ok(updated)
    }

    /// Move from the round results into the next round, rotating the button
    /// so a different seat opens the clues. Past the last round this flips
    /// the room to its finished state instead.
    pub async fn start_next_round(&self, room_id: &str, player_id: &str) -> GameResult<Room> {
        let room = self.room_or_err(room_id).await?;
        if !room.is_active {
            return Err(GameError::RoomInactive);
        }
        self.member_or_err(room_id, player_id).await?;
        if room.host_id != player_id {
            return Err(GameError::NotHost("start the next round"));
        }
        if room.phase != GamePhase::Results {
            return Err(GameError::WrongPhase(room.phase));
        }

        let next_round = room.current_round + 1;
        if next_round > room.total_rounds {
            let updated = self
                .update_room_with(room_id, |r| transition(r, GamePhase::Finished))
                .await?;
            tracing::info!(room_id, "all rounds played, game finished");
            return Ok(updated);
        }

        let members = self.store().memberships_for_room(room_id).await?;
        if members.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers(members.len()));
        }
        let button_index = (room.button_holder_index + 1) % members.len();
        self.begin_round(room_id, members, next_round, button_index).await
    }

    /// Close out the last round and show the final standings.
    pub async fn view_final_scores(&self, room_id: &str, player_id: &str) -> GameResult<Room> {
        let room = self.room_or_err(room_id).await?;
        if !room.is_active {
            return Err(GameError::RoomInactive);
        }
        self.member_or_err(room_id, player_id).await?;
        if room.host_id != player_id {
            return Err(GameError::NotHost("show the final scores"));
        }
        if room.current_round < room.total_rounds {
            return Err(GameError::NotFinalRound);
        }
        if room.phase != GamePhase::Results {
            return Err(GameError::WrongPhase(room.phase));
        }

        let updated = self
            .update_room_with(room_id, |r| transition(r, GamePhase::Finished))
            .await?;
        tracing::info!(room_id, "final scores on the board");
        Ok(updated)
    }
}
