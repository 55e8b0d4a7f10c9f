//! In-memory store.
//!
//! Tables are plain maps behind async locks, keyed the way a relational
//! schema would key them. Every mutation emits a [`ChangeEvent`] after the
//! lock is released, so watchers always re-read at least as much state as
//! the event describes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use super::{ChangeEvent, ChangeKind, Store, StoreError, StoreResult, Table};
use crate::types::{
    Category, CategoryId, Clue, Membership, Player, PlayerId, Room, RoomId, RoundRecord, Vote,
};
use crate::words;

/// Store backed by process memory, seeded with the built-in word catalog
#[derive(Clone)]
pub struct MemoryStore {
    rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
    players: Arc<RwLock<HashMap<PlayerId, Player>>>,
    memberships: Arc<RwLock<HashMap<(RoomId, PlayerId), Membership>>>,
    rounds: Arc<RwLock<HashMap<(RoomId, u32), RoundRecord>>>,
    clues: Arc<RwLock<HashMap<(RoomId, u32, PlayerId), Clue>>>,
    votes: Arc<RwLock<HashMap<(RoomId, u32, PlayerId), Vote>>>,
    categories: Arc<RwLock<Vec<Category>>>,
    words: Arc<RwLock<HashMap<CategoryId, Vec<String>>>>,
    feed: broadcast::Sender<ChangeEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);

        let mut categories = Vec::new();
        let mut words_by_category = HashMap::new();
        for (name, pool) in words::CATALOG {
            let id = ulid::Ulid::new().to_string();
            categories.push(Category {
                id: id.clone(),
                name: name.to_string(),
            });
            words_by_category.insert(id, pool.iter().map(|w| w.to_string()).collect());
        }

        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            players: Arc::new(RwLock::new(HashMap::new())),
            memberships: Arc::new(RwLock::new(HashMap::new())),
            rounds: Arc::new(RwLock::new(HashMap::new())),
            clues: Arc::new(RwLock::new(HashMap::new())),
            votes: Arc::new(RwLock::new(HashMap::new())),
            categories: Arc::new(RwLock::new(categories)),
            words: Arc::new(RwLock::new(words_by_category)),
            feed: tx,
        }
    }

    fn emit(&self, table: Table, kind: ChangeKind, room_id: &str) {
        let _ = self.feed.send(ChangeEvent {
            table,
            kind,
            room_id: room_id.to_string(),
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_room(&self, room: Room) -> StoreResult<()> {
        let room_id = room.id.clone();
        self.rooms.write().await.insert(room_id.clone(), room);
        self.emit(Table::Rooms, ChangeKind::Insert, &room_id);
        Ok(())
    }

    async fn room(&self, room_id: &str) -> StoreResult<Option<Room>> {
        Ok(self.rooms.read().await.get(room_id).cloned())
    }

    async fn update_room(&self, mut room: Room) -> StoreResult<Room> {
        {
            let mut rooms = self.rooms.write().await;
            let stored = rooms.get(&room.id).ok_or(StoreError::NotFound)?;
            if stored.version != room.version {
                return Err(StoreError::VersionConflict(room.id.clone()));
            }
            room.version += 1;
            rooms.insert(room.id.clone(), room.clone());
        }
        self.emit(Table::Rooms, ChangeKind::Update, &room.id);
        Ok(room)
    }

    async fn delete_room(&self, room_id: &str) -> StoreResult<()> {
        let removed = self.rooms.write().await.remove(room_id).is_some();
        if removed {
            self.emit(Table::Rooms, ChangeKind::Delete, room_id);
        }
        Ok(())
    }

    async fn insert_player(&self, player: Player) -> StoreResult<()> {
        // Players are global rows, not scoped to a room, so no event is emitted.
        self.players.write().await.insert(player.id.clone(), player);
        Ok(())
    }

    async fn player(&self, player_id: &str) -> StoreResult<Option<Player>> {
        Ok(self.players.read().await.get(player_id).cloned())
    }

    async fn players(&self, ids: &[PlayerId]) -> StoreResult<Vec<Player>> {
        let players = self.players.read().await;
        Ok(ids.iter().filter_map(|id| players.get(id).cloned()).collect())
    }

    async fn insert_membership(&self, membership: Membership) -> StoreResult<()> {
        let room_id = membership.room_id.clone();
        let key = (membership.room_id.clone(), membership.player_id.clone());
        self.memberships.write().await.insert(key, membership);
        self.emit(Table::RoomPlayers, ChangeKind::Insert, &room_id);
        Ok(())
    }

    async fn membership(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> StoreResult<Option<Membership>> {
        let key = (room_id.to_string(), player_id.to_string());
        Ok(self.memberships.read().await.get(&key).cloned())
    }

    async fn memberships_for_room(&self, room_id: &str) -> StoreResult<Vec<Membership>> {
        let memberships = self.memberships.read().await;
        let mut rows: Vec<Membership> = memberships
            .values()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (a.joined_at.as_str(), a.player_id.as_str())
                .cmp(&(b.joined_at.as_str(), b.player_id.as_str()))
        });
        Ok(rows)
    }

    async fn update_membership(&self, membership: Membership) -> StoreResult<()> {
        let room_id = membership.room_id.clone();
        let key = (membership.room_id.clone(), membership.player_id.clone());
        let written = {
            let mut memberships = self.memberships.write().await;
            if memberships.contains_key(&key) {
                memberships.insert(key, membership);
                true
            } else {
                false
            }
        };
        if written {
            self.emit(Table::RoomPlayers, ChangeKind::Update, &room_id);
        }
        Ok(())
    }

    async fn delete_membership(&self, room_id: &str, player_id: &str) -> StoreResult<()> {
        let key = (room_id.to_string(), player_id.to_string());
        let removed = self.memberships.write().await.remove(&key).is_some();
        if removed {
            self.emit(Table::RoomPlayers, ChangeKind::Delete, room_id);
        }
        Ok(())
    }

    async fn insert_round(&self, round: RoundRecord) -> StoreResult<()> {
        let room_id = round.room_id.clone();
        let key = (round.room_id.clone(), round.round_number);
        self.rounds.write().await.insert(key, round);
        self.emit(Table::GameRounds, ChangeKind::Insert, &room_id);
        Ok(())
    }

    async fn round(&self, room_id: &str, round_number: u32) -> StoreResult<Option<RoundRecord>> {
        let key = (room_id.to_string(), round_number);
        Ok(self.rounds.read().await.get(&key).cloned())
    }

    async fn update_round(&self, round: RoundRecord) -> StoreResult<()> {
        let room_id = round.room_id.clone();
        let key = (round.room_id.clone(), round.round_number);
        let written = {
            let mut rounds = self.rounds.write().await;
            if rounds.contains_key(&key) {
                rounds.insert(key, round);
                true
            } else {
                false
            }
        };
        if written {
            self.emit(Table::GameRounds, ChangeKind::Update, &room_id);
        }
        Ok(())
    }

    async fn insert_clue(&self, clue: Clue) -> StoreResult<()> {
        let room_id = clue.room_id.clone();
        let key = (clue.room_id.clone(), clue.round_number, clue.player_id.clone());
        {
            let mut clues = self.clues.write().await;
            if clues.contains_key(&key) {
                return Err(StoreError::DuplicateKey);
            }
            clues.insert(key, clue);
        }
        self.emit(Table::Clues, ChangeKind::Insert, &room_id);
        Ok(())
    }

    async fn clues_for_round(&self, room_id: &str, round_number: u32) -> StoreResult<Vec<Clue>> {
        let clues = self.clues.read().await;
        let mut rows: Vec<Clue> = clues
            .values()
            .filter(|c| c.room_id == room_id && c.round_number == round_number)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.submission_order);
        Ok(rows)
    }

    async fn delete_clues_by_player(&self, room_id: &str, player_id: &str) -> StoreResult<()> {
        let removed = {
            let mut clues = self.clues.write().await;
            let before = clues.len();
            clues.retain(|(r, _, p), _| !(r == room_id && p == player_id));
            before != clues.len()
        };
        if removed {
            self.emit(Table::Clues, ChangeKind::Delete, room_id);
        }
        Ok(())
    }

    async fn upsert_vote(&self, vote: Vote) -> StoreResult<()> {
        let room_id = vote.room_id.clone();
        let key = (vote.room_id.clone(), vote.round_number, vote.voter_id.clone());
        let replaced = {
            let mut votes = self.votes.write().await;
            votes.insert(key, vote).is_some()
        };
        let kind = if replaced {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        self.emit(Table::Votes, kind, &room_id);
        Ok(())
    }

    async fn votes_for_round(&self, room_id: &str, round_number: u32) -> StoreResult<Vec<Vote>> {
        let votes = self.votes.read().await;
        let mut rows: Vec<Vote> = votes
            .values()
            .filter(|v| v.room_id == room_id && v.round_number == round_number)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (a.ts.as_str(), a.voter_id.as_str()).cmp(&(b.ts.as_str(), b.voter_id.as_str()))
        });
        Ok(rows)
    }

    async fn delete_votes_involving(&self, room_id: &str, player_id: &str) -> StoreResult<()> {
        let removed = {
            let mut votes = self.votes.write().await;
            let before = votes.len();
            votes.retain(|(r, _, _), v| {
                !(r == room_id && (v.voter_id == player_id || v.voted_for_id == player_id))
            });
            before != votes.len()
        };
        if removed {
            self.emit(Table::Votes, ChangeKind::Delete, room_id);
        }
        Ok(())
    }

    async fn purge_rounds_before(&self, room_id: &str, round_number: u32) -> StoreResult<()> {
        let clues_removed = {
            let mut clues = self.clues.write().await;
            let before = clues.len();
            clues.retain(|(r, rn, _), _| !(r == room_id && *rn < round_number));
            before != clues.len()
        };
        if clues_removed {
            self.emit(Table::Clues, ChangeKind::Delete, room_id);
        }

        let votes_removed = {
            let mut votes = self.votes.write().await;
            let before = votes.len();
            votes.retain(|(r, rn, _), _| !(r == room_id && *rn < round_number));
            before != votes.len()
        };
        if votes_removed {
            self.emit(Table::Votes, ChangeKind::Delete, room_id);
        }
        Ok(())
    }

    async fn purge_round_data(&self, room_id: &str) -> StoreResult<()> {
        let clues_removed = {
            let mut clues = self.clues.write().await;
            let before = clues.len();
            clues.retain(|(r, _, _), _| r != room_id);
            before != clues.len()
        };
        if clues_removed {
            self.emit(Table::Clues, ChangeKind::Delete, room_id);
        }

        let votes_removed = {
            let mut votes = self.votes.write().await;
            let before = votes.len();
            votes.retain(|(r, _, _), _| r != room_id);
            before != votes.len()
        };
        if votes_removed {
            self.emit(Table::Votes, ChangeKind::Delete, room_id);
        }

        let rounds_removed = {
            let mut rounds = self.rounds.write().await;
            let before = rounds.len();
            rounds.retain(|(r, _), _| r != room_id);
            before != rounds.len()
        };
        if rounds_removed {
            self.emit(Table::GameRounds, ChangeKind::Delete, room_id);
        }
        Ok(())
    }

    async fn categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.categories.read().await.clone())
    }

    async fn words_in_category(&self, category_id: &str) -> StoreResult<Vec<String>> {
        self.words
            .read()
            .await
            .get(category_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}
