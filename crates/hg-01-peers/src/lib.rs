//! # Participant Set Subsystem
//!
//! **Subsystem ID:** 1
//!
//! The ordered collection of consensus participants. Every participant is
//! identified by an Ed25519 public key and a numeric id derived from it; the
//! set is kept sorted by id so that every node indexes participants the same
//! way (frames store one root per participant in this order).
//!
//! ## Change notification
//!
//! Thresholds in the poset engine depend on the participant count. Rather
//! than a callback, the set publishes its size on a `tokio::sync::watch`
//! channel; consumers hold a receiver from [`Peers::subscribe`] and refresh
//! when it reports a change.
//!
//! ## Example
//!
//! ```rust
//! use hg_01_peers::{Peer, Peers};
//!
//! let mut peers = Peers::new();
//! let mut changes = peers.subscribe();
//! peers.add_peer(Peer::new([1u8; 32], "127.0.0.1:1337")).unwrap();
//!
//! assert!(changes.has_changed().unwrap());
//! assert_eq!(*changes.borrow_and_update(), 1);
//! ```

pub mod domain;

pub use domain::error::{PeersError, PeersResult};
pub use domain::peer::{peer_id_from_key, Peer, PeerId};
pub use domain::peers::Peers;
