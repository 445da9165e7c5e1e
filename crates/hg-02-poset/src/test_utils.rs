//! Test utilities for the poset engine.
//!
//! [`TestDag`] owns a participant set of deterministic keys, an in-memory
//! store and a poset, and builds signed events by name. Enable with the
//! `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use hg_02_poset::test_utils::TestDag;
//!
//! let mut dag = TestDag::new(3);
//! dag.add_event("e0", 0, None, vec![]).unwrap();
//! dag.add_event("e1", 1, None, vec![]).unwrap();
//! dag.add_event("e10", 1, Some("e0"), vec![b"tx".to_vec()]).unwrap();
//!
//! let e10 = dag.hash("e10");
//! let e0 = dag.hash("e0");
//! assert!(dag.poset.ancestor(&e10, &e0).unwrap());
//! ```

use crate::adapters::InmemStore;
use crate::domain::{Block, BlockSignature, Event, FlagTable, PosetResult};
use crate::ports::Store;
use crate::service::{commit_channel, Poset, PosetDependencies};
use hg_01_peers::{Peer, PeerId, Peers};
use parking_lot::RwLock;
use shared_crypto::Ed25519KeyPair;
use shared_types::{Hash, PublicKey};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const TEST_CACHE_SIZE: usize = 1000;

/// A participant with its signing key.
pub struct TestNode {
    pub key: Ed25519KeyPair,
    pub pub_key: PublicKey,
    pub id: PeerId,
}

impl TestNode {
    /// Key derived from seed `[seed; 32]`.
    pub fn from_seed(seed: u8) -> Self {
        let key = Ed25519KeyPair::from_seed([seed; 32]);
        let pub_key = key.public_key_bytes();
        let id = Peer::new(pub_key, "").id();
        Self { key, pub_key, id }
    }

    pub fn peer(&self) -> Peer {
        Peer::new(self.pub_key, format!("node{}", self.id))
    }
}

/// Named-event DAG builder over a live poset.
pub struct TestDag {
    /// Nodes in seed order (node `i` has seed `i + 1`), not id order.
    pub nodes: Vec<TestNode>,
    pub participants: Arc<RwLock<Peers>>,
    pub store: Arc<InmemStore>,
    pub poset: Poset<InmemStore>,
    names: HashMap<String, Hash>,
    gossiped: usize,
    flag_tables: HashMap<Hash, FlagTable>,
}

impl TestDag {
    pub fn new(n: usize) -> Self {
        Self::build(n, None, Vec::new())
    }

    /// DAG whose poset publishes committed blocks on the returned receiver.
    pub fn with_commit_channel(n: usize) -> (Self, mpsc::Receiver<Block>) {
        let (tx, rx) = commit_channel();
        (Self::build(n, Some(tx), Vec::new()), rx)
    }

    /// DAG whose store holds `events` for bootstrap.
    pub fn with_durable_events(n: usize, events: Vec<Event>) -> Self {
        Self::build(n, None, events)
    }

    fn build(n: usize, commit_tx: Option<mpsc::Sender<Block>>, durable: Vec<Event>) -> Self {
        let nodes: Vec<TestNode> = (0..n).map(|i| TestNode::from_seed(i as u8 + 1)).collect();
        let peers = Peers::from_peers(nodes.iter().map(TestNode::peer))
            .unwrap_or_else(|e| panic!("test keys collide: {e}"));
        let participants = Arc::new(RwLock::new(peers));
        let store = Arc::new(InmemStore::with_durable_events(
            participants.clone(),
            TEST_CACHE_SIZE,
            durable,
        ));
        let poset = Poset::new(PosetDependencies {
            participants: participants.clone(),
            store: store.clone(),
            commit_tx,
        })
        .unwrap_or_else(|e| panic!("poset construction failed: {e}"));
        Self {
            nodes,
            participants,
            store,
            poset,
            names: HashMap::new(),
            gossiped: 0,
            flag_tables: HashMap::new(),
        }
    }

    pub fn hash(&self, name: &str) -> Hash {
        match self.names.get(name) {
            Some(hash) => *hash,
            None => panic!("unknown event {name}"),
        }
    }

    pub fn event(&self, name: &str) -> Event {
        self.store
            .get_event(&self.hash(name))
            .unwrap_or_else(|e| panic!("event {name} not stored: {e}"))
    }

    /// Current head of `creator` and the index its next event takes.
    pub fn head(&self, creator: usize) -> (Hash, i64) {
        let pub_key = &self.nodes[creator].pub_key;
        let lookup = self.store.last_event_from(pub_key).and_then(|(head, is_root)| {
            let index = if is_root {
                self.store.get_root(pub_key)?.self_parent.index
            } else {
                self.store.get_event(&head)?.index()
            };
            Ok((head, index + 1))
        });
        lookup.unwrap_or_else(|e| panic!("no head for node {creator}: {e}"))
    }

    /// Signed event on top of `creator`'s head, not inserted.
    pub fn build_event(
        &self,
        creator: usize,
        other_parent: Option<&str>,
        transactions: Vec<Vec<u8>>,
    ) -> Event {
        self.build_event_with_signatures(creator, other_parent, transactions, vec![])
    }

    pub fn build_event_with_signatures(
        &self,
        creator: usize,
        other_parent: Option<&str>,
        transactions: Vec<Vec<u8>>,
        block_signatures: Vec<BlockSignature>,
    ) -> Event {
        let (self_parent, index) = self.head(creator);
        let other_parent = other_parent.map(|name| self.hash(name));

        let mut flag_table = FlagTable::new();
        for parent in std::iter::once(self_parent).chain(other_parent) {
            if let Some(inherited) = self.flag_tables.get(&parent) {
                flag_table.extend(inherited.iter().map(|(h, f)| (*h, *f)));
            }
            flag_table.insert(parent, 1);
        }

        let node = &self.nodes[creator];
        let mut event = Event::new(
            transactions,
            vec![],
            block_signatures,
            self_parent,
            other_parent,
            node.pub_key,
            index,
            flag_table,
        );
        event.sign(&node.key);
        event
    }

    /// Build, sign and insert an event, registering it under `name`.
    pub fn add_event(
        &mut self,
        name: &str,
        creator: usize,
        other_parent: Option<&str>,
        transactions: Vec<Vec<u8>>,
    ) -> PosetResult<Hash> {
        let event = self.build_event(creator, other_parent, transactions);
        self.insert_named(name, event)
    }

    /// Name an event inserted by other means, e.g. a reset replay.
    pub fn register(&mut self, name: &str, event: &Event) {
        self.names.insert(name.to_string(), *event.hash());
        self.flag_tables
            .insert(*event.hash(), event.flag_table().clone());
    }

    /// Insert a prebuilt event and register it under `name`.
    pub fn insert_named(&mut self, name: &str, event: Event) -> PosetResult<Hash> {
        let hash = *event.hash();
        let flag_table = event.flag_table().clone();
        self.poset.insert_event(event, true)?;
        self.names.insert(name.to_string(), hash);
        self.flag_tables.insert(hash, flag_table);
        Ok(hash)
    }

    /// Round-robin gossip: event `k` is created by node `k % n` with the
    /// previous event as other-parent, each carrying one transaction.
    /// Events are named `g{k}`.
    pub fn gossip(&mut self, events: usize) -> PosetResult<()> {
        let n = self.nodes.len();
        let start = self.gossiped;
        for k in start..start + events {
            let creator = k % n;
            let other_parent = (k > 0).then(|| format!("g{}", k - 1));
            let tx = format!("tx{k}").into_bytes();
            self.add_event(&format!("g{k}"), creator, other_parent.as_deref(), vec![tx])?;
            self.gossiped += 1;
        }
        Ok(())
    }
}

/// Install a `tracing` subscriber honoring `RUST_LOG`, once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
