use std::collections::HashSet;

use crate::engine::turns::next_by_rank;
use crate::engine::{transition, GameService};
use crate::error::{GameError, GameResult};
use crate::types::{
    GamePhase, Membership, Player, PlayerId, Room, DEFAULT_TOTAL_ROUNDS, MAX_NAME_CHARS,
    MAX_TOTAL_ROUNDS, MIN_PLAYERS,
};

/// Trimmed, non-empty, bounded display name for rooms and players.
pub(crate) fn validate_name(name: &str) -> GameResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidInput("name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(GameError::InvalidInput("name is too long".to_string()));
    }
    Ok(trimmed.to_string())
}

impl GameService {
    /// Open a room with its host already seated and ready.
    pub async fn create_room(
        &self,
        name: &str,
        host_name: &str,
        total_rounds: Option<u32>,
    ) -> GameResult<(Room, Player)> {
        let name = validate_name(name)?;
        let host_name = validate_name(host_name)?;
        let total_rounds = total_rounds.unwrap_or(DEFAULT_TOTAL_ROUNDS);
        if total_rounds == 0 || total_rounds > MAX_TOTAL_ROUNDS {
            return Err(GameError::InvalidInput(
                "total rounds must be between 1 and 10".to_string(),
            ));
        }

        let host = Player {
            id: ulid::Ulid::new().to_string(),
            name: host_name,
        };
        self.store().insert_player(host.clone()).await?;

        let room = Room {
            id: ulid::Ulid::new().to_string(),
            version: 0,
            name,
            host_id: host.id.clone(),
            phase: GamePhase::Lobby,
            current_round: 1,
            total_rounds,
            game_mode: "classic".to_string(),
            is_active: true,
            category: None,
            word_grid: Vec::new(),
            secret_word: None,
            button_holder_index: 0,
            current_turn_player_id: None,
            turn_started_at: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.store().insert_room(room.clone()).await?;

        self.store()
            .insert_membership(Membership {
                room_id: room.id.clone(),
                player_id: host.id.clone(),
                is_host: true,
                is_ready: true,
                is_clue_ready: false,
                role: None,
                score: 0,
                turn_order: None,
                joined_at: chrono::Utc::now().to_rfc3339(),
            })
            .await?;

        tracing::info!(room_id = %room.id, host = %host.id, "room created");
        Ok((room, host))
    }

    /// Seat a new player in an open lobby.
    pub async fn join_room(&self, room_id: &str, player_name: &str) -> GameResult<(Room, Player)> {
        let room = self.room_or_err(room_id).await?;
        if !room.is_active {
            return Err(GameError::RoomInactive);
        }
        if room.phase != GamePhase::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }
        let player_name = validate_name(player_name)?;

        let player = Player {
            id: ulid::Ulid::new().to_string(),
            name: player_name,
        };
        self.store().insert_player(player.clone()).await?;
        self.store()
            .insert_membership(Membership {
                room_id: room.id.clone(),
                player_id: player.id.clone(),
                is_host: false,
                is_ready: false,
                is_clue_ready: false,
                role: None,
                score: 0,
                turn_order: None,
                joined_at: chrono::Utc::now().to_rfc3339(),
            })
            .await?;

        tracing::info!(room_id, player = %player.id, "player joined");
        Ok((room, player))
    }

    /// Re-attach a returning player to their seat.
    pub async fn resume(&self, room_id: &str, player_id: &str) -> GameResult<Room> {
        let room = self.room_or_err(room_id).await?;
        self.member_or_err(room_id, player_id).await?;
        Ok(room)
    }

    pub async fn toggle_ready(
        &self,
        room_id: &str,
        player_id: &str,
        ready: bool,
    ) -> GameResult<()> {
        let room = self.room_or_err(room_id).await?;
        if room.phase != GamePhase::Lobby {
            return Err(GameError::WrongPhase(room.phase));
        }
        let mut member = self.member_or_err(room_id, player_id).await?;
        member.is_ready = ready;
        self.store().update_membership(member).await?;
        Ok(())
    }

    /// Remove a player and repair whatever their absence breaks: empty rooms
    /// are torn down, short-handed games reset to the lobby, the host role
    /// and the clue turn move on to someone still seated.
    pub async fn leave_game(&self, room_id: &str, player_id: &str) -> GameResult<()> {
        let room = self.room_or_err(room_id).await?;
        let leaver = self.member_or_err(room_id, player_id).await?;
        let in_progress = room.phase.in_progress();

        self.store().delete_membership(room_id, player_id).await?;
        if in_progress {
            self.store().delete_clues_by_player(room_id, player_id).await?;
        }
        // ballots only feed the tally while the vote is still open; after
        // that they are the record the scoring reads
        if room.phase == GamePhase::Voting {
            self.store().delete_votes_involving(room_id, player_id).await?;
        }

        let remaining = self.store().memberships_for_room(room_id).await?;
        if remaining.is_empty() {
            self.store().purge_round_data(room_id).await?;
            self.store().delete_room(room_id).await?;
            tracing::info!(room_id, "last player left, room removed");
            return Ok(());
        }

        let new_host_id = if leaver.is_host {
            Some(remaining[0].player_id.clone())
        } else {
            None
        };
        if let Some(host_id) = &new_host_id {
            let mut promoted = remaining[0].clone();
            promoted.is_host = true;
            self.store().update_membership(promoted).await?;
            tracing::info!(room_id, new_host = %host_id, "host left, promoted the longest-seated player");
        }

        if in_progress && remaining.len() < MIN_PLAYERS {
            self.reset_room(room_id, false, new_host_id).await?;
            tracing::info!(room_id, "not enough players to continue, back to the lobby");
            return Ok(());
        }

        let leaver_held_turn = room.current_turn_player_id.as_deref() == Some(player_id);
        if new_host_id.is_some() || leaver_held_turn {
            let submitted: HashSet<PlayerId> = if in_progress {
                self.store()
                    .clues_for_round(room_id, room.current_round)
                    .await?
                    .into_iter()
                    .map(|c| c.player_id)
                    .collect()
            } else {
                HashSet::new()
            };
            let leaver_rank = leaver.turn_order;
            self.update_room_with(room_id, |r| {
                if let Some(host_id) = &new_host_id {
                    r.host_id = host_id.clone();
                }
                if r.current_turn_player_id.as_deref() == Some(player_id) {
                    match next_by_rank(&remaining, leaver_rank, &submitted) {
                        Some(next) => {
                            r.current_turn_player_id = Some(next);
                            r.turn_started_at = Some(chrono::Utc::now().to_rfc3339());
                        }
                        None => {
                            // the leaver was the only seat without a clue
                            if r.phase == GamePhase::ClueGiving {
                                transition(r, GamePhase::Voting)?;
                            }
                            r.current_turn_player_id = None;
                            r.turn_started_at = None;
                        }
                    }
                }
                Ok(())
            })
            .await?;
        }

        // the departed seat may have been the last thing blocking a gate
        if in_progress {
            self.reconcile_after_leave(room_id).await?;
        }
        Ok(())
    }

    async fn reconcile_after_leave(&self, room_id: &str) -> GameResult<()> {
        let room = match self.store().room(room_id).await? {
            Some(room) => room,
            None => return Ok(()),
        };
        match room.phase {
            GamePhase::WordReveal => {
                self.maybe_begin_clue_giving(room_id).await?;
            }
            GamePhase::Voting => {
                self.maybe_resolve_votes(room_id).await?;
            }
            GamePhase::FakerGuess => {
                self.maybe_skip_faker_guess(room_id).await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Close the room for good. The row stays readable so clients can show
    /// the final state, but nothing can join or act on it again.
    pub async fn end_game(&self, room_id: &str, player_id: &str) -> GameResult<Room> {
        let room = self.room_or_err(room_id).await?;
        if !room.is_active {
            return Err(GameError::RoomInactive);
        }
        self.member_or_err(room_id, player_id).await?;
        if room.host_id != player_id {
            return Err(GameError::NotHost("end the game"));
        }
        let updated = self
            .update_room_with(room_id, |r| {
                transition(r, GamePhase::Ended)?;
                r.is_active = false;
                Ok(())
            })
            .await?;
        tracing::info!(room_id, "game ended by host");
        Ok(updated)
    }

    /// Send everyone back to the lobby for another game.
    pub async fn restart_game(&self, room_id: &str, player_id: &str) -> GameResult<Room> {
        let room = self.room_or_err(room_id).await?;
        if !room.is_active {
            return Err(GameError::RoomInactive);
        }
        self.member_or_err(room_id, player_id).await?;
        if room.host_id != player_id {
            return Err(GameError::NotHost("restart the game"));
        }
        if room.phase != GamePhase::Finished {
            return Err(GameError::WrongPhase(room.phase));
        }
        let updated = self.reset_room(room_id, true, None).await?;
        tracing::info!(room_id, "game restarted, everyone back in the lobby");
        Ok(updated)
    }

    /// Wind the room back to a clean lobby. Seats keep their ready flags on a
    /// below-minimum reset but lose them on a restart.
    pub(crate) async fn reset_room(
        &self,
        room_id: &str,
        clear_ready: bool,
        new_host_id: Option<PlayerId>,
    ) -> GameResult<Room> {
        let members = self.store().memberships_for_room(room_id).await?;
        for mut member in members {
            member.score = 0;
            member.role = None;
            member.turn_order = None;
            member.is_clue_ready = false;
            if clear_ready {
                member.is_ready = false;
            }
            self.store().update_membership(member).await?;
        }
        self.store().purge_round_data(room_id).await?;

        let updated = self
            .update_room_with(room_id, |r| {
                transition(r, GamePhase::Lobby)?;
                if let Some(host_id) = &new_host_id {
                    r.host_id = host_id.clone();
                }
                r.current_round = 1;
                r.button_holder_index = 0;
                r.category = None;
                r.word_grid.clear();
                r.secret_word = None;
                r.current_turn_player_id = None;
                r.turn_started_at = None;
                Ok(())
            })
            .await?;
        Ok(updated)
    }
}
