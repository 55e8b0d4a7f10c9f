use std::collections::HashMap;

use crate::engine::GameService;
use crate::error::{GameError, GameResult};
use crate::types::{Membership, PlayerId, Vote};

/// Count votes per target.
pub fn tally_votes(votes: &[Vote]) -> HashMap<PlayerId, u32> {
    let mut tally = HashMap::new();
    for vote in votes {
        *tally.entry(vote.voted_for_id.clone()).or_insert(0) += 1;
    }
    tally
}

/// The faker is caught when they sit at the top of the tally, alone or tied.
pub fn faker_caught(tally: &HashMap<PlayerId, u32>, faker_id: &str) -> bool {
    let max = tally.values().copied().max().unwrap_or(0);
    max > 0 && tally.get(faker_id).copied().unwrap_or(0) == max
}

/// Point deltas for one round.
///
/// An escaped faker earns 2. A caught faker earns 1 back by guessing the
/// secret word; otherwise everyone who voted for the faker earns 2, except
/// the faker voting for themselves. Players who already left the room earn
/// nothing.
pub fn score_round(
    members: &[Membership],
    votes: &[Vote],
    faker_id: &str,
    guess_correct: Option<bool>,
) -> HashMap<PlayerId, u32> {
    let tally = tally_votes(votes);
    let caught = faker_caught(&tally, faker_id);

    let mut points: HashMap<PlayerId, u32> = HashMap::new();
    if caught {
        if guess_correct == Some(true) {
            points.insert(faker_id.to_string(), 1);
        } else {
            for vote in votes {
                if vote.voted_for_id == faker_id && vote.voter_id != faker_id {
                    points.insert(vote.voter_id.clone(), 2);
                }
            }
        }
    } else {
        points.insert(faker_id.to_string(), 2);
    }

    points.retain(|id, _| members.iter().any(|m| m.player_id == *id));
    points
}

impl GameService {
    /// Fold the round's point deltas into the seats still in the room.
    pub(crate) async fn apply_round_scores(
        &self,
        room_id: &str,
        round_number: u32,
        guess_correct: Option<bool>,
    ) -> GameResult<()> {
        let round = self
            .store()
            .round(room_id, round_number)
            .await?
            .ok_or(GameError::RoundMissing)?;
        let members = self.store().memberships_for_room(room_id).await?;
        let votes = self.store().votes_for_round(room_id, round_number).await?;

        let points = score_round(&members, &votes, &round.faker_id, guess_correct);
        for mut member in members {
            if let Some(delta) = points.get(&member.player_id).copied() {
                member.score += delta;
                self.store().update_membership(member).await?;
            }
        }
        Ok(())
    }
}
