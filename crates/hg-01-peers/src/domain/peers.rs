//! Ordered participant set.

use super::error::{PeersError, PeersResult};
use super::peer::{Peer, PeerId};
use shared_types::{to_hex, PublicKey};
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::info;

/// Participants sorted by id, indexed by id and by public key.
///
/// Every mutation publishes the new participant count to subscribers.
#[derive(Debug)]
pub struct Peers {
    sorted: Vec<Peer>,
    by_id: HashMap<PeerId, usize>,
    by_pub_key: HashMap<PublicKey, usize>,
    changes: watch::Sender<usize>,
}

impl Default for Peers {
    fn default() -> Self {
        Self::new()
    }
}

impl Peers {
    pub fn new() -> Self {
        Self {
            sorted: Vec::new(),
            by_id: HashMap::new(),
            by_pub_key: HashMap::new(),
            changes: watch::Sender::new(0),
        }
    }

    pub fn from_peers(peers: impl IntoIterator<Item = Peer>) -> PeersResult<Self> {
        let mut set = Self::new();
        for peer in peers {
            set.insert_unindexed(peer)?;
        }
        set.reindex();
        Ok(set)
    }

    pub fn add_peer(&mut self, peer: Peer) -> PeersResult<()> {
        let id = peer.id();
        self.insert_unindexed(peer)?;
        self.reindex();
        info!(peer_id = id, total = self.sorted.len(), "[peers] Participant added");
        Ok(())
    }

    pub fn remove_peer(&mut self, pub_key: &PublicKey) -> Option<Peer> {
        let position = self.by_pub_key.get(pub_key).copied()?;
        let removed = self.sorted.remove(position);
        self.reindex();
        info!(
            peer_id = removed.id(),
            total = self.sorted.len(),
            "[peers] Participant removed"
        );
        Some(removed)
    }

    fn insert_unindexed(&mut self, peer: Peer) -> PeersResult<()> {
        if self.sorted.iter().any(|p| p.id() == peer.id()) {
            return Err(PeersError::DuplicateId(peer.id()));
        }
        if self.sorted.iter().any(|p| p.pub_key == peer.pub_key) {
            return Err(PeersError::DuplicateKey(to_hex(&peer.pub_key)));
        }
        self.sorted.push(peer);
        Ok(())
    }

    fn reindex(&mut self) {
        self.sorted.sort_by_key(Peer::id);
        self.by_id = self
            .sorted
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id(), i))
            .collect();
        self.by_pub_key = self
            .sorted
            .iter()
            .enumerate()
            .map(|(i, p)| (p.pub_key, i))
            .collect();
        self.changes.send_replace(self.sorted.len());
    }

    /// Receiver that observes the participant count after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.changes.subscribe()
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn by_id(&self, id: PeerId) -> Option<&Peer> {
        self.by_id.get(&id).map(|&i| &self.sorted[i])
    }

    pub fn by_pub_key(&self, pub_key: &PublicKey) -> Option<&Peer> {
        self.by_pub_key.get(pub_key).map(|&i| &self.sorted[i])
    }

    pub fn contains_pub_key(&self, pub_key: &PublicKey) -> bool {
        self.by_pub_key.contains_key(pub_key)
    }

    /// Participants in id order.
    pub fn peers(&self) -> &[Peer] {
        &self.sorted
    }

    /// Public keys in id order.
    pub fn pub_keys(&self) -> Vec<PublicKey> {
        self.sorted.iter().map(|p| p.pub_key).collect()
    }
}
