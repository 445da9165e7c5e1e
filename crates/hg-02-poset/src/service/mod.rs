//! Poset Service - the consensus pipeline
//!
//! # Architecture
//! - Single writer: one driver task owns the `Poset` and calls the stages
//!   in order (`insert_event`, `divide_rounds`, `decide_fame`,
//!   `decide_round_received`, `process_decided_rounds`, `process_sig_pool`).
//! - The store is shared (`Arc<S>`) so status readers can query it.
//! - Finalized blocks leave through a single-slot channel; a slow consumer
//!   stalls `process_decided_rounds`.

mod checkpoint;
mod fame;
mod frames;
mod insert;
mod reachability;
mod rounds;
mod signatures;


use crate::domain::{
    Block, BlockSignature, Event, FlagTable, Frame, PendingRound, PosetCacheStats, PosetCaches,
    PosetError, PosetResult, Root, Thresholds, WireEvent,
};
use crate::metrics;
use crate::ports::{PosetApi, Store};
use async_trait::async_trait;
use hg_01_peers::{PeerId, Peers};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use shared_types::{short_hex, Hash, PublicKey};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Single-slot commit channel between the engine and the application.
pub fn commit_channel() -> (mpsc::Sender<Block>, mpsc::Receiver<Block>) {
    mpsc::channel(1)
}

/// Dependencies for Poset
pub struct PosetDependencies<S: Store> {
    pub participants: Arc<RwLock<Peers>>,
    pub store: Arc<S>,
    pub commit_tx: Option<mpsc::Sender<Block>>,
}

pub struct Poset<S: Store> {
    participants: Arc<RwLock<Peers>>,
    peer_changes: watch::Receiver<usize>,
    store: Arc<S>,
    commit_tx: Option<mpsc::Sender<Block>>,

    undetermined_events: Vec<Hash>,
    pending_rounds: VecDeque<PendingRound>,
    sig_pool: Vec<BlockSignature>,

    last_consensus_round: Option<i64>,
    first_consensus_round: Option<i64>,
    anchor_block: Option<i64>,
    consensus_transactions: u64,
    pending_loaded_events: i64,
    topological_index: u64,

    thresholds: Thresholds,
    local_creator: Option<PublicKey>,
    roots_by_self_parent: HashMap<Hash, Root>,
    caches: PosetCaches,
}

impl<S: Store> Poset<S> {
    /// Fails only if the store's cache size is zero.
    pub fn new(deps: PosetDependencies<S>) -> PosetResult<Self> {
        let (peer_changes, participant_count) = {
            let peers = deps.participants.read();
            (peers.subscribe(), peers.len())
        };
        let caches = PosetCaches::new(deps.store.cache_size())?;
        let roots_by_self_parent = deps.store.roots_by_self_parent()?;
        Ok(Self {
            participants: deps.participants,
            peer_changes,
            store: deps.store,
            commit_tx: deps.commit_tx,
            undetermined_events: Vec::new(),
            pending_rounds: VecDeque::new(),
            sig_pool: Vec::new(),
            last_consensus_round: None,
            first_consensus_round: None,
            anchor_block: None,
            consensus_transactions: 0,
            pending_loaded_events: 0,
            topological_index: 0,
            thresholds: Thresholds::for_participants(participant_count),
            local_creator: None,
            roots_by_self_parent,
            caches,
        })
    }

    /// Designate the participant whose head witnesses receive flag-table and
    /// witness-proof snapshots in `divide_rounds`.
    pub fn set_local_creator(&mut self, creator: PublicKey) {
        self.local_creator = Some(creator);
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn participants(&self) -> &Arc<RwLock<Peers>> {
        &self.participants
    }

    pub fn undetermined_events(&self) -> &[Hash] {
        &self.undetermined_events
    }

    pub fn pending_rounds(&self) -> Vec<PendingRound> {
        self.pending_rounds.iter().copied().collect()
    }

    pub fn sig_pool_len(&self) -> usize {
        self.sig_pool.len()
    }

    pub fn last_consensus_round(&self) -> Option<i64> {
        self.last_consensus_round
    }

    pub fn first_consensus_round(&self) -> Option<i64> {
        self.first_consensus_round
    }

    pub fn anchor_block(&self) -> Option<i64> {
        self.anchor_block
    }

    pub fn consensus_transactions(&self) -> u64 {
        self.consensus_transactions
    }

    pub fn pending_loaded_events(&self) -> i64 {
        self.pending_loaded_events
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn super_majority(&self) -> usize {
        self.thresholds.super_majority
    }

    pub fn trust_count(&self) -> usize {
        self.thresholds.trust_count
    }

    pub fn cache_stats(&self) -> PosetCacheStats {
        self.caches.stats()
    }

    /// Pick up a participant-set change published since the last call:
    /// thresholds are recomputed and the root index reloaded so newcomers'
    /// base roots resolve.
    pub(crate) fn sync_participants(&mut self) -> PosetResult<()> {
        if !self.peer_changes.has_changed().unwrap_or(false) {
            return Ok(());
        }
        let participants = *self.peer_changes.borrow_and_update();
        self.thresholds = Thresholds::for_participants(participants);
        self.roots_by_self_parent = self.store.roots_by_self_parent()?;
        info!(
            participants,
            super_majority = self.thresholds.super_majority,
            trust_count = self.thresholds.trust_count,
            "[poset] Participant set changed, thresholds recomputed"
        );
        Ok(())
    }

    pub(crate) fn participant_count(&self) -> usize {
        self.thresholds.participants
    }

    pub(crate) fn creator_id(&self, creator: &PublicKey) -> PosetResult<PeerId> {
        self.participants
            .read()
            .by_pub_key(creator)
            .map(|p| p.id())
            .ok_or_else(|| PosetError::UnknownParticipant(short_hex(creator)))
    }

    pub(crate) fn creator_key(&self, id: PeerId) -> PosetResult<PublicKey> {
        self.participants
            .read()
            .by_id(id)
            .map(|p| p.pub_key)
            .ok_or_else(|| PosetError::UnknownParticipant(format!("id {}", id)))
    }

    pub(crate) fn set_last_consensus_round(&mut self, round: i64) {
        self.last_consensus_round = Some(round);
        if self.first_consensus_round.is_none() {
            self.first_consensus_round = Some(round);
        }
        metrics::set_last_consensus_round(round);
    }

    /// Flag table of a uniformly chosen undetermined event. Events the
    /// store cannot return are skipped.
    pub fn flag_table_of_random_undetermined_event(&self) -> PosetResult<FlagTable> {
        let mut candidates = self.undetermined_events.clone();
        candidates.shuffle(&mut rand::thread_rng());
        for hash in &candidates {
            match self.store.get_event(hash) {
                Ok(event) => return Ok(event.flag_table().clone()),
                Err(e) => debug!(
                    event = %short_hex(hash),
                    error = %e,
                    "[poset] Skipping unreadable undetermined event"
                ),
            }
        }
        Err(PosetError::NoUndeterminedEvents)
    }

    /// Log known events per participant and queue sizes.
    pub fn print_stat(&self) {
        let known = self.store.known_events();
        for (id, index) in &known {
            debug!(peer_id = id, last_index = index, "[poset] Known events");
        }
        let stats = self.caches.stats();
        info!(
            participants = known.len(),
            undetermined = self.undetermined_events.len(),
            pending_rounds = self.pending_rounds.len(),
            sig_pool = self.sig_pool.len(),
            last_consensus_round = ?self.last_consensus_round,
            anchor_block = ?self.anchor_block,
            consensus_transactions = self.consensus_transactions,
            interned = stats.interned,
            ancestor_hit_rate = stats.ancestor.hit_rate(),
            "[poset] Stats"
        );
    }

    /// Run every consensus stage once.
    pub async fn run_consensus_pass(&mut self) -> PosetResult<()> {
        self.divide_rounds()?;
        self.decide_fame()?;
        self.decide_round_received()?;
        self.process_decided_rounds().await?;
        self.process_sig_pool()
    }
}

#[async_trait]
impl<S: Store + 'static> PosetApi for Poset<S> {
    fn insert_event(&mut self, event: Event, set_wire_info: bool) -> PosetResult<()> {
        Poset::insert_event(self, event, set_wire_info)
    }

    fn read_wire_info(&self, wire: &WireEvent) -> PosetResult<Event> {
        Poset::read_wire_info(self, wire)
    }

    async fn run_consensus_pass(&mut self) -> PosetResult<()> {
        Poset::run_consensus_pass(self).await
    }

    fn check_block(&mut self, block: &Block) -> PosetResult<()> {
        Poset::check_block(self, block)
    }

    fn reset(&mut self, block: Block, frame: Frame) -> PosetResult<()> {
        Poset::reset(self, block, frame)
    }

    async fn bootstrap(&mut self) -> PosetResult<()> {
        Poset::bootstrap(self).await
    }

    fn anchor_block_with_frame(&mut self) -> PosetResult<(Block, Frame)> {
        Poset::anchor_block_with_frame(self)
    }

    fn flag_table_of_random_undetermined_event(&self) -> PosetResult<FlagTable> {
        Poset::flag_table_of_random_undetermined_event(self)
    }
}
