//! Durable keyed-record store abstraction.
//!
//! Game logic talks to the [`Store`] trait rather than a concrete database.
//! Implementations persist whole rows per key, expose a row-level change feed
//! scoped by room, and guard room writes with optimistic versioning. The
//! in-memory implementation backs tests and single-process deployments.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{Category, Clue, Membership, Player, PlayerId, Room, RoomId, RoundRecord, Vote};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the record store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    /// The optimistic concurrency check failed for the given room.
    #[error("version conflict on room {0}")]
    VersionConflict(RoomId),

    #[error("duplicate key")]
    DuplicateKey,

    #[error("store unavailable: {0}")]
    #[allow(dead_code)] // Reserved for durable backends
    Unavailable(String),
}

/// Logical tables that emit change events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Rooms,
    RoomPlayers,
    GameRounds,
    Clues,
    Votes,
}

/// Row change kinds, named the way a database replication feed reports them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row-level change, scoped to the room whose data changed.
///
/// Events carry no row payload. Consumers re-read whatever they care about,
/// which keeps the feed cheap and makes dropped events recoverable by a
/// full re-fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub room_id: RoomId,
}

/// Keyed-record storage with a change feed.
///
/// Single-row writes are last-write-wins. [`Store::update_room`] is the one
/// guarded write: it compares the version carried by the row against the
/// stored one and rejects stale writers, since every phase transition funnels
/// through a room update. Bulk deletes collapse into a single event per table.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_room(&self, room: Room) -> StoreResult<()>;
    async fn room(&self, room_id: &str) -> StoreResult<Option<Room>>;
    /// Compare-and-swap on `room.version`. On success the stored row gets
    /// `version + 1` and the bumped row is returned; on mismatch nothing is
    /// written and [`StoreError::VersionConflict`] comes back.
    async fn update_room(&self, room: Room) -> StoreResult<Room>;
    async fn delete_room(&self, room_id: &str) -> StoreResult<()>;

    async fn insert_player(&self, player: Player) -> StoreResult<()>;
    async fn player(&self, player_id: &str) -> StoreResult<Option<Player>>;
    /// Fetch several players at once, in input order, skipping unknown ids.
    async fn players(&self, ids: &[PlayerId]) -> StoreResult<Vec<Player>>;

    async fn insert_membership(&self, membership: Membership) -> StoreResult<()>;
    async fn membership(&self, room_id: &str, player_id: &str)
        -> StoreResult<Option<Membership>>;
    /// All seats in a room, ordered by join time.
    async fn memberships_for_room(&self, room_id: &str) -> StoreResult<Vec<Membership>>;
    /// Updating a seat that was deleted concurrently is a no-op.
    async fn update_membership(&self, membership: Membership) -> StoreResult<()>;
    async fn delete_membership(&self, room_id: &str, player_id: &str) -> StoreResult<()>;

    async fn insert_round(&self, round: RoundRecord) -> StoreResult<()>;
    async fn round(&self, room_id: &str, round_number: u32) -> StoreResult<Option<RoundRecord>>;
    async fn update_round(&self, round: RoundRecord) -> StoreResult<()>;

    /// Rejects a second clue for the same (room, round, player) key with
    /// [`StoreError::DuplicateKey`].
    async fn insert_clue(&self, clue: Clue) -> StoreResult<()>;
    /// Clues for one round, ordered by submission.
    async fn clues_for_round(&self, room_id: &str, round_number: u32) -> StoreResult<Vec<Clue>>;
    async fn delete_clues_by_player(&self, room_id: &str, player_id: &str) -> StoreResult<()>;

    /// Insert or replace the vote keyed by (room, round, voter).
    async fn upsert_vote(&self, vote: Vote) -> StoreResult<()>;
    async fn votes_for_round(&self, room_id: &str, round_number: u32) -> StoreResult<Vec<Vote>>;
    /// Remove every vote the player cast or received in this room.
    async fn delete_votes_involving(&self, room_id: &str, player_id: &str) -> StoreResult<()>;

    /// Drop clues and votes from rounds earlier than `round_number`. Round
    /// records stay as history until [`Store::purge_round_data`] wipes them.
    async fn purge_rounds_before(&self, room_id: &str, round_number: u32) -> StoreResult<()>;
    /// Drop all clues, votes and round records for the room.
    async fn purge_round_data(&self, room_id: &str) -> StoreResult<()>;

    async fn categories(&self) -> StoreResult<Vec<Category>>;
    async fn words_in_category(&self, category_id: &str) -> StoreResult<Vec<String>>;

    /// Subscribe to the row-level change feed. Slow consumers may observe
    /// lag; they are expected to re-fetch rather than replay.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
