//! Read-side projection of a room.
//!
//! A [`RoomView`] is the join of everything a client needs to render a room.
//! [`RoomWatcher`] keeps one fresh by listening to the store's change feed
//! and re-reading the slice of rows each event touches. Events carry no
//! payload, so a missed or lagged event never leaves a watcher with stale
//! data: it simply re-reads.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::error::GameResult;
use crate::store::{ChangeEvent, ChangeKind, Store, Table};
use crate::types::{Clue, PlayerId, PlayerRole, Room, RoomId, RoundRecord, Vote};

const BACKOFF_BASE: Duration = Duration::from_millis(250);
const BACKOFF_MAX: Duration = Duration::from_secs(8);

/// One seat as clients see it, the membership row joined with the
/// player's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub is_clue_ready: bool,
    pub role: Option<PlayerRole>,
    pub score: u32,
    pub turn_order: Option<u32>,
    pub joined_at: String,
}

/// Everything about one room in a single snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomView {
    pub room: Room,
    pub players: Vec<PlayerView>,
    pub clues: Vec<Clue>,
    pub votes: Vec<Vote>,
    pub round: Option<RoundRecord>,
}

/// Per-connection conveniences derived from a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedFlags {
    pub is_faker: bool,
    pub has_submitted_clue: bool,
    pub has_voted: bool,
    pub all_players_ready: bool,
    pub all_clue_ready: bool,
}

impl RoomView {
    pub fn flags_for(&self, player_id: Option<&str>) -> DerivedFlags {
        let is_faker = match (player_id, &self.round) {
            (Some(id), Some(round)) => round.faker_id == id,
            _ => false,
        };
        let has_submitted_clue = player_id
            .map(|id| self.clues.iter().any(|c| c.player_id == id))
            .unwrap_or(false);
        let has_voted = player_id
            .map(|id| self.votes.iter().any(|v| v.voter_id == id))
            .unwrap_or(false);
        let all_players_ready =
            !self.players.is_empty() && self.players.iter().all(|p| p.is_ready);
        let all_clue_ready =
            !self.players.is_empty() && self.players.iter().all(|p| p.is_clue_ready);
        DerivedFlags {
            is_faker,
            has_submitted_clue,
            has_voted,
            all_players_ready,
            all_clue_ready,
        }
    }
}

async fn player_views(store: &dyn Store, room_id: &str) -> GameResult<Vec<PlayerView>> {
    let members = store.memberships_for_room(room_id).await?;
    let ids: Vec<PlayerId> = members.iter().map(|m| m.player_id.clone()).collect();
    let names: HashMap<PlayerId, String> = store
        .players(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    Ok(members
        .into_iter()
        .map(|m| PlayerView {
            name: names.get(&m.player_id).cloned().unwrap_or_default(),
            player_id: m.player_id,
            is_host: m.is_host,
            is_ready: m.is_ready,
            is_clue_ready: m.is_clue_ready,
            role: m.role,
            score: m.score,
            turn_order: m.turn_order,
            joined_at: m.joined_at,
        })
        .collect())
}

/// Assemble a full snapshot of one room, or `None` when the room is gone.
pub async fn room_view(store: &dyn Store, room_id: &str) -> GameResult<Option<RoomView>> {
    let room = match store.room(room_id).await? {
        Some(room) => room,
        None => return Ok(None),
    };
    let players = player_views(store, room_id).await?;
    let clues = store.clues_for_round(room_id, room.current_round).await?;
    let votes = store.votes_for_round(room_id, room.current_round).await?;
    let round = store.round(room_id, room.current_round).await?;
    Ok(Some(RoomView {
        room,
        players,
        clues,
        votes,
        round,
    }))
}

async fn apply(store: &dyn Store, view: &mut RoomView, event: &ChangeEvent) -> GameResult<bool> {
    match event.table {
        Table::Rooms => {
            let room = match store.room(&view.room.id).await? {
                Some(room) => room,
                None => return Ok(false),
            };
            view.room = room;
            // a room write can move the round pointer, so round-scoped rows follow it
            view.clues = store
                .clues_for_round(&view.room.id, view.room.current_round)
                .await?;
            view.votes = store
                .votes_for_round(&view.room.id, view.room.current_round)
                .await?;
            view.round = store.round(&view.room.id, view.room.current_round).await?;
        }
        Table::RoomPlayers => {
            view.players = player_views(store, &view.room.id).await?;
        }
        Table::Clues => {
            view.clues = store
                .clues_for_round(&view.room.id, view.room.current_round)
                .await?;
        }
        Table::Votes => {
            view.votes = store
                .votes_for_round(&view.room.id, view.room.current_round)
                .await?;
        }
        Table::GameRounds => {
            view.round = store.round(&view.room.id, view.room.current_round).await?;
        }
    }
    Ok(true)
}

/// Follows one room on the change feed and pushes a fresh [`RoomView`]
/// down the channel after every relevant write. Ends when the room is
/// deleted or the receiver goes away.
pub struct RoomWatcher {
    store: Arc<dyn Store>,
    room_id: RoomId,
}

impl RoomWatcher {
    pub fn new(store: Arc<dyn Store>, room_id: RoomId) -> Self {
        Self { store, room_id }
    }

    pub async fn run(self, tx: mpsc::Sender<RoomView>) {
        let mut events = self.store.subscribe();
        let mut backoff = BACKOFF_BASE;

        let mut view = loop {
            match room_view(self.store.as_ref(), &self.room_id).await {
                Ok(Some(view)) => break view,
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(room_id = %self.room_id, error = %e, "room snapshot failed, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(BACKOFF_MAX);
                }
            }
        };
        backoff = BACKOFF_BASE;
        if tx.send(view.clone()).await.is_err() {
            return;
        }

        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(room_id = %self.room_id, skipped, "change feed lagged, resyncing");
                    match room_view(self.store.as_ref(), &self.room_id).await {
                        Ok(Some(fresh)) => {
                            view = fresh;
                            if tx.send(view.clone()).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => return,
                        Err(e) => {
                            tracing::warn!(room_id = %self.room_id, error = %e, "resync failed, backing off");
                            tokio::time::sleep(backoff).await;
                            backoff = (backoff * 2).min(BACKOFF_MAX);
                        }
                    }
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return,
            };
            if event.room_id != self.room_id {
                continue;
            }
            if event.table == Table::Rooms && event.kind == ChangeKind::Delete {
                return;
            }

            match apply(self.store.as_ref(), &mut view, &event).await {
                Ok(true) => {
                    backoff = BACKOFF_BASE;
                    if tx.send(view.clone()).await.is_err() {
                        return;
                    }
                }
                Ok(false) => return,
                Err(e) => {
                    tracing::warn!(room_id = %self.room_id, error = %e, "view refresh failed, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(BACKOFF_MAX);
                }
            }
        }
    }
}
