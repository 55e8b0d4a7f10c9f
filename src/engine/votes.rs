use crate::engine::{faker_caught, tally_votes, transition, GameService};
use crate::error::{GameError, GameResult};
use crate::types::{GamePhase, Room, Vote};

impl GameService {
    /// Cast or change a ballot. The round resolves on its own once every
    /// seat has voted.
    pub async fn submit_vote(
        &self,
        room_id: &str,
        voter_id: &str,
        voted_for_id: &str,
    ) -> GameResult<()> {
        let room = self.room_or_err(room_id).await?;
        if room.phase != GamePhase::Voting {
            return Err(GameError::WrongPhase(room.phase));
        }
        self.member_or_err(room_id, voter_id).await?;
        if self.store().membership(room_id, voted_for_id).await?.is_none() {
            return Err(GameError::UnknownVoteTarget);
        }

        self.store()
            .upsert_vote(Vote {
                room_id: room_id.to_string(),
                round_number: room.current_round,
                voter_id: voter_id.to_string(),
                voted_for_id: voted_for_id.to_string(),
                ts: chrono::Utc::now().to_rfc3339(),
            })
            .await?;

        self.maybe_resolve_votes(room_id).await?;
        Ok(())
    }

    /// Resolve the vote once every seat has a ballot in. A caught faker gets
    /// a shot at the word first, an escaped one keeps the round. A no-op
    /// while ballots are missing or when someone else already resolved.
    pub(crate) async fn maybe_resolve_votes(&self, room_id: &str) -> GameResult<Option<Room>> {
        let room = match self.store().room(room_id).await? {
            Some(room) => room,
            None => return Ok(None),
        };
        if room.phase != GamePhase::Voting {
            return Ok(None);
        }
        let members = self.store().memberships_for_room(room_id).await?;
        let votes = self.store().votes_for_round(room_id, room.current_round).await?;
        if members.is_empty() || votes.len() < members.len() {
            return Ok(None);
        }

        let round = self
            .store()
            .round(room_id, room.current_round)
            .await?
            .ok_or(GameError::RoundMissing)?;
        let tally = tally_votes(&votes);

        if faker_caught(&tally, &round.faker_id) {
            let flipped = self
                .update_room_with(room_id, |r| transition(r, GamePhase::FakerGuess))
                .await;
            match flipped {
                Ok(updated) => {
                    tracing::info!(room_id, "faker caught, awaiting their guess");
                    Ok(Some(updated))
                }
                Err(GameError::WrongPhase(_)) => Ok(None),
                Err(e) => Err(e),
            }
        } else {
            let flipped = self
                .update_room_with(room_id, |r| transition(r, GamePhase::Results))
                .await;
            match flipped {
                Ok(updated) => {
                    self.apply_round_scores(room_id, room.current_round, None).await?;
                    tracing::info!(room_id, "faker escaped the vote");
                    Ok(Some(updated))
                }
                Err(GameError::WrongPhase(_)) => Ok(None),
                Err(e) => Err(e),
            }
        }
    }

    /// Score the round right away when the caught faker has left instead of
    /// guessing. A missing guess pays out like a wrong one. A no-op while
    /// the faker is still seated.
    pub(crate) async fn maybe_skip_faker_guess(&self, room_id: &str) -> GameResult<Option<Room>> {
        let room = match self.store().room(room_id).await? {
            Some(room) => room,
            None => return Ok(None),
        };
        if room.phase != GamePhase::FakerGuess {
            return Ok(None);
        }
        let round = match self.store().round(room_id, room.current_round).await? {
            Some(round) => round,
            None => return Ok(None),
        };
        if self.store().membership(room_id, &round.faker_id).await?.is_some() {
            return Ok(None);
        }

        let flipped = self
            .update_room_with(room_id, |r| transition(r, GamePhase::Results))
            .await;
        match flipped {
            Ok(updated) => {
                self.apply_round_scores(room_id, room.current_round, None).await?;
                tracing::info!(room_id, "faker left without guessing, round scored");
                Ok(Some(updated))
            }
            Err(GameError::WrongPhase(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// A caught faker picks a word off the grid. Matching the secret word is
    /// checked loosely, ignoring case and surrounding whitespace. Returns
    /// whether the guess was right.
    pub async fn submit_faker_guess(
        &self,
        room_id: &str,
        player_id: &str,
        guess: &str,
    ) -> GameResult<bool> {
        let room = self.room_or_err(room_id).await?;
        if room.phase != GamePhase::FakerGuess {
            return Err(GameError::WrongPhase(room.phase));
        }
        self.member_or_err(room_id, player_id).await?;
        let mut round = self
            .store()
            .round(room_id, room.current_round)
            .await?
            .ok_or(GameError::RoundMissing)?;
        if round.faker_id != player_id {
            return Err(GameError::NotFaker);
        }

        let correct = guess.trim().to_lowercase() == round.secret_word.trim().to_lowercase();
        round.faker_guess = Some(guess.trim().to_string());
        self.store().update_round(round).await?;

        self.update_room_with(room_id, |r| transition(r, GamePhase::Results))
            .await?;
        self.apply_round_scores(room_id, room.current_round, Some(correct)).await?;
        tracing::info!(room_id, correct, "faker guessed the word");
        Ok(correct)
    }
}
