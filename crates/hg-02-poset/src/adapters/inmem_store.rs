//! In-memory store.
//!
//! Holds every record in `parking_lot`-guarded maps. Participants without an
//! explicit root get the base root for their id, so peers added at runtime
//! need no store-side registration.

use crate::config::PosetConfig;
use crate::domain::{Block, Event, Frame, Root, RoundInfo};
use crate::ports::Store;
use hg_01_peers::{PeerId, Peers};
use parking_lot::RwLock;
use shared_types::{short_hex, Hash, PublicKey, StoreError, StoreKind, StoreResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Default)]
struct InmemState {
    events: HashMap<Hash, Event>,
    topological: Vec<Hash>,
    rounds: BTreeMap<i64, RoundInfo>,
    roots: HashMap<PublicKey, Root>,
    participant_events: HashMap<PublicKey, BTreeMap<i64, Hash>>,
    heads: HashMap<PublicKey, Hash>,
    consensus_events: Vec<Hash>,
    last_consensus: HashMap<PublicKey, Hash>,
    frames: HashMap<i64, Frame>,
    blocks: BTreeMap<i64, Block>,
    last_block: i64,
}

pub struct InmemStore {
    cache_size: usize,
    participants: Arc<RwLock<Peers>>,
    state: RwLock<InmemState>,
    durable: Vec<Event>,
}

impl InmemStore {
    pub fn new(participants: Arc<RwLock<Peers>>, cache_size: usize) -> Self {
        Self::with_durable_events(participants, cache_size, Vec::new())
    }

    pub fn from_config(participants: Arc<RwLock<Peers>>, config: &PosetConfig) -> Self {
        Self::new(participants, config.cache_size)
    }

    /// Store seeded with events a previous process persisted, replayed by
    /// bootstrap. Locally derived consensus metadata is stripped.
    pub fn with_durable_events(
        participants: Arc<RwLock<Peers>>,
        cache_size: usize,
        events: Vec<Event>,
    ) -> Self {
        let durable = events
            .into_iter()
            .map(|mut e| {
                e.clear_consensus_metadata();
                e
            })
            .collect();
        Self {
            cache_size,
            participants,
            state: RwLock::new(InmemState {
                last_block: -1,
                ..InmemState::default()
            }),
            durable,
        }
    }

    /// Events inserted into this store, in insertion order.
    pub fn topological_events(&self) -> Vec<Event> {
        let state = self.state.read();
        state
            .topological
            .iter()
            .filter_map(|h| state.events.get(h).cloned())
            .collect()
    }

    /// Hashes of committed events, in commit order.
    pub fn consensus_events(&self) -> Vec<Hash> {
        self.state.read().consensus_events.clone()
    }

    pub fn event_count(&self) -> usize {
        self.state.read().events.len()
    }

    fn creator_id(&self, creator: &PublicKey) -> StoreResult<PeerId> {
        self.participants
            .read()
            .by_pub_key(creator)
            .map(|p| p.id())
            .ok_or_else(|| StoreError::not_found(StoreKind::Root, short_hex(creator)))
    }

    fn root_of(&self, state: &InmemState, creator: &PublicKey) -> StoreResult<Root> {
        if let Some(root) = state.roots.get(creator) {
            return Ok(root.clone());
        }
        Ok(Root::base(self.creator_id(creator)?))
    }
}

impl Store for InmemStore {
    fn cache_size(&self) -> usize {
        self.cache_size
    }

    fn get_event(&self, hash: &Hash) -> StoreResult<Event> {
        self.state
            .read()
            .events
            .get(hash)
            .cloned()
            .ok_or_else(|| StoreError::not_found(StoreKind::Event, short_hex(hash)))
    }

    fn set_event(&self, event: Event) -> StoreResult<()> {
        let mut state = self.state.write();
        let hash = *event.hash();
        if !state.events.contains_key(&hash) {
            let creator = *event.creator();
            state.topological.push(hash);
            state
                .participant_events
                .entry(creator)
                .or_default()
                .insert(event.index(), hash);
            state.heads.insert(creator, hash);
        }
        state.events.insert(hash, event);
        Ok(())
    }

    fn get_round(&self, index: i64) -> StoreResult<RoundInfo> {
        self.state
            .read()
            .rounds
            .get(&index)
            .cloned()
            .ok_or_else(|| StoreError::not_found(StoreKind::Round, index))
    }

    fn set_round(&self, index: i64, round: RoundInfo) -> StoreResult<()> {
        self.state.write().rounds.insert(index, round);
        Ok(())
    }

    fn last_round(&self) -> i64 {
        self.state
            .read()
            .rounds
            .keys()
            .next_back()
            .copied()
            .unwrap_or(-1)
    }

    fn round_witnesses(&self, index: i64) -> Vec<Hash> {
        self.state
            .read()
            .rounds
            .get(&index)
            .map(RoundInfo::witnesses)
            .unwrap_or_default()
    }

    fn get_root(&self, creator: &PublicKey) -> StoreResult<Root> {
        let state = self.state.read();
        self.root_of(&state, creator)
    }

    fn roots_by_self_parent(&self) -> StoreResult<HashMap<Hash, Root>> {
        let keys = self.participants.read().pub_keys();
        let state = self.state.read();
        let mut roots = HashMap::with_capacity(keys.len());
        for key in &keys {
            let root = self.root_of(&state, key)?;
            roots.insert(root.self_parent.hash, root);
        }
        Ok(roots)
    }

    fn get_frame(&self, round_received: i64) -> StoreResult<Frame> {
        self.state
            .read()
            .frames
            .get(&round_received)
            .cloned()
            .ok_or_else(|| StoreError::not_found(StoreKind::Frame, round_received))
    }

    fn set_frame(&self, frame: Frame) -> StoreResult<()> {
        self.state.write().frames.insert(frame.round, frame);
        Ok(())
    }

    fn get_block(&self, index: i64) -> StoreResult<Block> {
        self.state
            .read()
            .blocks
            .get(&index)
            .cloned()
            .ok_or_else(|| StoreError::not_found(StoreKind::Block, index))
    }

    fn set_block(&self, block: Block) -> StoreResult<()> {
        let mut state = self.state.write();
        state.last_block = state.last_block.max(block.index());
        state.blocks.insert(block.index(), block);
        Ok(())
    }

    fn last_block_index(&self) -> i64 {
        self.state.read().last_block
    }

    fn last_event_from(&self, creator: &PublicKey) -> StoreResult<(Hash, bool)> {
        let state = self.state.read();
        if let Some(head) = state.heads.get(creator) {
            return Ok((*head, false));
        }
        Ok((self.root_of(&state, creator)?.self_parent.hash, true))
    }

    fn last_consensus_event_from(&self, creator: &PublicKey) -> StoreResult<(Hash, bool)> {
        let state = self.state.read();
        if let Some(last) = state.last_consensus.get(creator) {
            return Ok((*last, false));
        }
        Ok((self.root_of(&state, creator)?.self_parent.hash, true))
    }

    fn participant_event(&self, creator: &PublicKey, index: i64) -> StoreResult<Hash> {
        let state = self.state.read();
        if let Some(hash) = state
            .participant_events
            .get(creator)
            .and_then(|chain| chain.get(&index))
        {
            return Ok(*hash);
        }
        let root = self.root_of(&state, creator)?;
        if root.self_parent.index == index {
            return Ok(root.self_parent.hash);
        }
        Err(StoreError::not_found(
            StoreKind::ParticipantEvent,
            format!("{}#{}", short_hex(creator), index),
        ))
    }

    fn add_consensus_event(&self, event: &Event) -> StoreResult<()> {
        let mut state = self.state.write();
        state.consensus_events.push(*event.hash());
        state.last_consensus.insert(*event.creator(), *event.hash());
        Ok(())
    }

    fn known_events(&self) -> HashMap<PeerId, i64> {
        let peers: Vec<(PublicKey, PeerId)> = self
            .participants
            .read()
            .peers()
            .iter()
            .map(|p| (p.pub_key, p.id()))
            .collect();
        let state = self.state.read();
        peers
            .into_iter()
            .map(|(key, id)| {
                let last = state
                    .participant_events
                    .get(&key)
                    .and_then(|chain| chain.keys().next_back().copied());
                let index = match last {
                    Some(index) => index,
                    None => state
                        .roots
                        .get(&key)
                        .map(|r| r.self_parent.index)
                        .unwrap_or(-1),
                };
                (id, index)
            })
            .collect()
    }

    fn reset(&self, roots: HashMap<PublicKey, Root>) -> StoreResult<()> {
        let mut state = self.state.write();
        state.roots = roots;
        state.events.clear();
        state.topological.clear();
        state.rounds.clear();
        state.participant_events.clear();
        state.heads.clear();
        state.consensus_events.clear();
        state.last_consensus.clear();
        state.last_block = -1;
        Ok(())
    }

    fn durable_events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.durable.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{root_self_parent, FlagTable, RootEvent};
    use hg_01_peers::Peer;

    fn store() -> (InmemStore, Vec<Peer>) {
        let peers: Vec<Peer> = (1..=3u8).map(|s| Peer::new([s; 32], "")).collect();
        let set = Arc::new(RwLock::new(Peers::from_peers(peers.clone()).unwrap()));
        (InmemStore::new(set, 100), peers)
    }

    fn event(creator: &Peer, self_parent: Hash, index: i64) -> Event {
        Event::new(
            vec![],
            vec![],
            vec![],
            self_parent,
            None,
            creator.pub_key,
            index,
            FlagTable::new(),
        )
    }

    #[test]
    fn test_base_roots_and_heads() {
        let (store, peers) = store();
        let (head, is_root) = store.last_event_from(&peers[0].pub_key).unwrap();
        assert!(is_root);
        assert_eq!(head, root_self_parent(peers[0].id()));
        assert_eq!(store.roots_by_self_parent().unwrap().len(), 3);
        assert_eq!(store.last_round(), -1);
        assert_eq!(store.last_block_index(), -1);
    }

    #[test]
    fn test_set_event_tracks_chain() {
        let (store, peers) = store();
        let e0 = event(&peers[0], root_self_parent(peers[0].id()), 0);
        let e1 = event(&peers[0], *e0.hash(), 1);
        store.set_event(e0.clone()).unwrap();
        store.set_event(e1.clone()).unwrap();
        store.set_event(e1.clone()).unwrap();

        assert_eq!(
            store.last_event_from(&peers[0].pub_key).unwrap(),
            (*e1.hash(), false)
        );
        assert_eq!(store.participant_event(&peers[0].pub_key, 0).unwrap(), *e0.hash());
        assert_eq!(
            store.participant_event(&peers[0].pub_key, -1).unwrap(),
            root_self_parent(peers[0].id())
        );
        assert_eq!(store.known_events().get(&peers[0].id()), Some(&1));
        assert_eq!(store.known_events().get(&peers[1].id()), Some(&-1));
        assert_eq!(store.topological_events().len(), 2);
    }

    #[test]
    fn test_missing_keys_are_distinguished() {
        let (store, peers) = store();
        assert!(store.get_event(&[0u8; 32]).unwrap_err().is_key_not_found());
        assert!(store.get_round(0).unwrap_err().is_key_not_found());
        assert!(store.get_block(0).unwrap_err().is_key_not_found());
        assert!(store.get_frame(0).unwrap_err().is_key_not_found());
        assert!(store
            .participant_event(&peers[1].pub_key, 4)
            .unwrap_err()
            .is_key_not_found());
        assert!(store.get_root(&[9u8; 32]).unwrap_err().is_key_not_found());
        assert!(store.round_witnesses(3).is_empty());
    }

    #[test]
    fn test_reset_installs_roots() {
        let (store, peers) = store();
        let e0 = event(&peers[0], root_self_parent(peers[0].id()), 0);
        store.set_event(e0.clone()).unwrap();
        store.set_round(0, RoundInfo::new()).unwrap();

        let root = Root {
            next_round: 2,
            self_parent: RootEvent {
                hash: *e0.hash(),
                creator_id: peers[0].id(),
                index: 0,
                lamport_timestamp: 0,
                round: 1,
            },
            others: BTreeMap::new(),
        };
        store
            .reset(HashMap::from([(peers[0].pub_key, root.clone())]))
            .unwrap();

        assert!(store.get_event(e0.hash()).is_err());
        assert_eq!(store.last_round(), -1);
        assert_eq!(store.get_root(&peers[0].pub_key).unwrap(), root);
        assert_eq!(
            store.last_event_from(&peers[0].pub_key).unwrap(),
            (*e0.hash(), true)
        );
        assert_eq!(store.participant_event(&peers[0].pub_key, 0).unwrap(), *e0.hash());
        assert_eq!(store.known_events().get(&peers[0].id()), Some(&0));
    }

    #[test]
    fn test_blocks_track_last_index() {
        let (store, _) = store();
        store.set_block(Block::new(0, 1, vec![b"a".to_vec()])).unwrap();
        store.set_block(Block::new(1, 2, vec![b"b".to_vec()])).unwrap();
        assert_eq!(store.last_block_index(), 1);
        assert_eq!(store.get_block(0).unwrap().round_received(), 1);
    }
}
