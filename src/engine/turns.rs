use std::collections::HashSet;

use crate::engine::{transition, GameService};
use crate::error::{GameError, GameResult};
use crate::store::StoreError;
use crate::types::{Clue, GamePhase, Membership, PlayerId, Room, MAX_CLUE_CHARS};

/// Clues are one word, trimmed, and bounded.
pub(crate) fn validate_clue(text: &str) -> GameResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidInput("clue must not be empty".to_string()));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(GameError::InvalidInput(
            "clue must be a single word".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_CLUE_CHARS {
        return Err(GameError::InvalidInput("clue is too long".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Next seat in rank order after `after_rank` that has not submitted yet,
/// wrapping around the table. Seats without a rank are skipped.
pub(crate) fn next_by_rank(
    members: &[Membership],
    after_rank: Option<u32>,
    submitted: &HashSet<PlayerId>,
) -> Option<PlayerId> {
    let mut ranked: Vec<&Membership> = members.iter().filter(|m| m.turn_order.is_some()).collect();
    if ranked.is_empty() {
        return None;
    }
    ranked.sort_by_key(|m| m.turn_order);

    let start = match after_rank {
        Some(after) => ranked
            .iter()
            .position(|m| m.turn_order > Some(after))
            .unwrap_or(0),
        None => 0,
    };
    for offset in 0..ranked.len() {
        let seat = ranked[(start + offset) % ranked.len()];
        if !submitted.contains(&seat.player_id) {
            return Some(seat.player_id.clone());
        }
    }
    None
}

impl GameService {
    /// Mark a player as done looking at the word grid. When the last seat
    /// confirms, the clue phase opens.
    pub async fn toggle_clue_ready(
        &self,
        room_id: &str,
        player_id: &str,
        ready: bool,
    ) -> GameResult<()> {
        let room = self.room_or_err(room_id).await?;
        if room.phase != GamePhase::WordReveal {
            return Err(GameError::WrongPhase(room.phase));
        }
        let mut member = self.member_or_err(room_id, player_id).await?;
        member.is_clue_ready = ready;
        self.store().update_membership(member).await?;

        if ready {
            self.maybe_begin_clue_giving(room_id).await?;
        }
        Ok(())
    }

    /// Flip to clue giving once every seat has confirmed the word. A no-op
    /// when the gate is not met or someone else already flipped the room.
    pub(crate) async fn maybe_begin_clue_giving(
        &self,
        room_id: &str,
    ) -> GameResult<Option<Room>> {
        let room = match self.store().room(room_id).await? {
            Some(room) => room,
            None => return Ok(None),
        };
        if room.phase != GamePhase::WordReveal {
            return Ok(None);
        }
        let members = self.store().memberships_for_room(room_id).await?;
        if members.is_empty() || !members.iter().all(|m| m.is_clue_ready) {
            return Ok(None);
        }

        let flipped = self
            .update_room_with(room_id, |r| {
                transition(r, GamePhase::ClueGiving)?;
                r.turn_started_at = Some(chrono::Utc::now().to_rfc3339());
                Ok(())
            })
            .await;
        match flipped {
            Ok(room) => {
                tracing::info!(room_id, "everyone has the word, clues begin");
                Ok(Some(room))
            }
            Err(GameError::WrongPhase(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Take the clue of the seat whose turn it is, then pass the turn on.
    pub async fn submit_clue(
        &self,
        room_id: &str,
        player_id: &str,
        text: &str,
    ) -> GameResult<()> {
        let room = self.room_or_err(room_id).await?;
        if room.phase != GamePhase::ClueGiving {
            return Err(GameError::WrongPhase(room.phase));
        }
        self.member_or_err(room_id, player_id).await?;
        if room.current_turn_player_id.as_deref() != Some(player_id) {
            return Err(GameError::NotYourTurn);
        }
        let text = validate_clue(text)?;

        let existing = self.store().clues_for_round(room_id, room.current_round).await?;
        let clue = Clue {
            room_id: room_id.to_string(),
            round_number: room.current_round,
            player_id: player_id.to_string(),
            text,
            submission_order: existing.len() as u32 + 1,
            submitted_at: chrono::Utc::now().to_rfc3339(),
        };
        match self.store().insert_clue(clue).await {
            Ok(()) => {}
            // an earlier attempt already filed this clue, only the turn
            // hand-off is left to do
            Err(StoreError::DuplicateKey) => {}
            Err(e) => return Err(e.into()),
        }

        self.advance_turn(room_id).await?;
        Ok(())
    }

    /// Hand the turn to the next seat without a clue, or open voting when
    /// the round has heard from everyone. A no-op when a concurrent call
    /// already passed the turn on.
    async fn advance_turn(&self, room_id: &str) -> GameResult<()> {
        let room = self.room_or_err(room_id).await?;
        let members = self.store().memberships_for_room(room_id).await?;
        let clues = self.store().clues_for_round(room_id, room.current_round).await?;
        let submitted: HashSet<PlayerId> = clues.into_iter().map(|c| c.player_id).collect();

        if submitted.len() >= members.len() {
            let flipped = self
                .update_room_with(room_id, |r| {
                    transition(r, GamePhase::Voting)?;
                    r.current_turn_player_id = None;
                    r.turn_started_at = None;
                    Ok(())
                })
                .await;
            return match flipped {
                Ok(_) => {
                    tracing::info!(room_id, "all clues in, voting opens");
                    Ok(())
                }
                Err(GameError::WrongPhase(_)) => Ok(()),
                Err(e) => Err(e),
            };
        }

        let holder_rank = room
            .current_turn_player_id
            .as_deref()
            .and_then(|id| members.iter().find(|m| m.player_id == id))
            .and_then(|m| m.turn_order);
        let next = next_by_rank(&members, holder_rank, &submitted);

        let moved = self
            .update_room_with(room_id, |r| {
                // only move off a seat whose clue is on file; anything else
                // means the turn was already handed on
                let holder_done = match r.current_turn_player_id.as_deref() {
                    Some(id) => submitted.contains(id),
                    None => false,
                };
                if !holder_done {
                    return Err(GameError::NotYourTurn);
                }
                match &next {
                    Some(next_player) => {
                        r.current_turn_player_id = Some(next_player.clone());
                        r.turn_started_at = Some(chrono::Utc::now().to_rfc3339());
                    }
                    None => {
                        // nobody left without a clue, same as the full-count case
                        transition(r, GamePhase::Voting)?;
                        r.current_turn_player_id = None;
                        r.turn_started_at = None;
                    }
                }
                Ok(())
            })
            .await;
        match moved {
            Ok(_) => Ok(()),
            Err(GameError::NotYourTurn | GameError::WrongPhase(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
