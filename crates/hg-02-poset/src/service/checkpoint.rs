//! Reset from a block and its frame, and bootstrap from a durable store.

use super::Poset;
use crate::domain::{consensus_order, Block, Frame, PosetCaches, PosetError, PosetResult};
use crate::ports::Store;
use shared_types::Hash;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

impl<S: Store> Poset<S> {
    /// Discard all local history and restart from `block` and the frame it
    /// was built from.
    ///
    /// Frame roots are matched to participants in id order. The frame's
    /// events are replayed on top of the new roots and recorded as already
    /// committed in `block.round_received()`.
    pub fn reset(&mut self, block: Block, frame: Frame) -> PosetResult<()> {
        self.sync_participants()?;
        info!(
            index = block.index(),
            round_received = block.round_received(),
            events = frame.events.len(),
            "[poset] Resetting"
        );

        if frame.round != block.round_received() {
            return Err(PosetError::InvalidFrame(format!(
                "frame round {} does not match block round {}",
                frame.round,
                block.round_received()
            )));
        }
        let participants = self.participants.read().pub_keys();
        if frame.roots.len() != participants.len() {
            return Err(PosetError::InvalidFrame(format!(
                "{} roots for {} participants",
                frame.roots.len(),
                participants.len()
            )));
        }

        self.last_consensus_round = None;
        self.first_consensus_round = None;
        self.anchor_block = None;
        self.undetermined_events = Vec::new();
        self.pending_rounds = VecDeque::new();
        self.pending_loaded_events = 0;
        self.topological_index = 0;
        self.caches = PosetCaches::new(self.store.cache_size())?;

        let roots: HashMap<_, _> = participants.into_iter().zip(frame.roots).collect();
        self.store.reset(roots)?;
        self.roots_by_self_parent = self.store.roots_by_self_parent()?;

        let round_received = block.round_received();
        self.store.set_block(block)?;
        self.set_last_consensus_round(round_received);

        let replayed: HashSet<_> = frame.events.iter().map(|e| *e.hash()).collect();
        for mut event in frame.events {
            event.clear_consensus_metadata();
            self.insert_event(event, false)?;
        }
        self.divide_rounds()?;
        self.settle_replayed(&replayed, round_received)
    }

    /// Mark replayed frame events as committed and drop them from the
    /// undetermined queue.
    fn settle_replayed(&mut self, replayed: &HashSet<Hash>, round: i64) -> PosetResult<()> {
        let mut committed = Vec::new();
        for hash in &self.undetermined_events {
            if replayed.contains(hash) {
                let mut event = self.store.get_event(hash)?;
                event.set_round_received(round);
                committed.push(event);
            }
        }
        committed.sort_by(consensus_order);
        for event in committed {
            if event.is_loaded() {
                self.pending_loaded_events -= 1;
            }
            self.store.set_event(event.clone())?;
            self.store.add_consensus_event(&event)?;
        }
        self.undetermined_events.retain(|h| !replayed.contains(h));
        debug!(
            replayed = replayed.len(),
            undetermined = self.undetermined_events.len(),
            "[poset] Frame events replayed"
        );
        Ok(())
    }

    /// Replay events persisted by a previous process, then run one full
    /// consensus pass.
    pub async fn bootstrap(&mut self) -> PosetResult<()> {
        let events = self.store.durable_events()?;
        if events.is_empty() {
            return Ok(());
        }
        info!(events = events.len(), "[poset] Bootstrapping from store");
        for event in events {
            self.insert_event(event, true)?;
        }
        self.run_consensus_pass().await
    }
}
