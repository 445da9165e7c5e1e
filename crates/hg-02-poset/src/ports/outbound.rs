//! Driven ports (Outbound dependencies)

use crate::domain::{Block, Event, Frame, Root, RoundInfo};
use hg_01_peers::PeerId;
use shared_types::{Hash, PublicKey, StoreResult};
use std::collections::HashMap;

/// Persistence for events, rounds, roots, frames and blocks.
///
/// Every lookup reports a missing record as `StoreError::KeyNotFound`; the
/// poset falls back to checkpoint roots on that kind and aborts the pass on
/// anything else. Implementations synchronize internally: the poset is the
/// only writer, but status readers may hold the same store concurrently.
pub trait Store: Send + Sync {
    /// Capacity the poset sizes its memoization caches with.
    fn cache_size(&self) -> usize;

    fn get_event(&self, hash: &Hash) -> StoreResult<Event>;

    /// Insert or overwrite. A first insertion also appends the event to its
    /// creator's chain.
    fn set_event(&self, event: Event) -> StoreResult<()>;

    fn get_round(&self, index: i64) -> StoreResult<RoundInfo>;

    fn set_round(&self, index: i64, round: RoundInfo) -> StoreResult<()>;

    /// Highest round index ever stored, -1 when none.
    fn last_round(&self) -> i64;

    /// Witnesses of a round; empty when the round is unknown.
    fn round_witnesses(&self, index: i64) -> Vec<Hash>;

    fn get_root(&self, creator: &PublicKey) -> StoreResult<Root>;

    /// Roots keyed by the hash of their self-parent.
    fn roots_by_self_parent(&self) -> StoreResult<HashMap<Hash, Root>>;

    fn get_frame(&self, round_received: i64) -> StoreResult<Frame>;

    fn set_frame(&self, frame: Frame) -> StoreResult<()>;

    fn get_block(&self, index: i64) -> StoreResult<Block>;

    fn set_block(&self, block: Block) -> StoreResult<()>;

    /// Highest block index stored, -1 when none.
    fn last_block_index(&self) -> i64;

    /// Creator's head and whether it is only the root's self-parent.
    fn last_event_from(&self, creator: &PublicKey) -> StoreResult<(Hash, bool)>;

    /// Creator's last committed event and whether it is only the root's
    /// self-parent.
    fn last_consensus_event_from(&self, creator: &PublicKey) -> StoreResult<(Hash, bool)>;

    /// Hash of the creator's event at `index`, including the root's own
    /// self-parent index.
    fn participant_event(&self, creator: &PublicKey, index: i64) -> StoreResult<Hash>;

    fn add_consensus_event(&self, event: &Event) -> StoreResult<()>;

    /// Creator id → highest known index (root index when nothing newer).
    fn known_events(&self) -> HashMap<PeerId, i64>;

    /// Install new roots and forget all events, rounds and indexes.
    fn reset(&self, roots: HashMap<PublicKey, Root>) -> StoreResult<()>;

    /// Events persisted by a previous process, in topological order, for
    /// bootstrap. A volatile store returns an empty list.
    fn durable_events(&self) -> StoreResult<Vec<Event>>;
}
