//! # Wire Gossip
//!
//! Events travel between nodes in their compact wire form. A receiving node
//! resolves parent references against its own store, so it must see events
//! in an order where parents precede children.

#[cfg(test)]
mod tests {
    use hg_02_poset::ports::Store;
    use hg_02_poset::test_utils::TestDag;
    use hg_02_poset::{Event, PosetError, WireEvent};

    /// Encode every event of `from` and insert it into `to`.
    fn relay(from: &[Event], to: &mut TestDag) {
        for event in from {
            let bytes = event.to_wire().unwrap().encode().unwrap();
            let wire = WireEvent::decode(&bytes).unwrap();
            let received = to.poset.read_wire_info(&wire).unwrap();
            assert_eq!(received.hash(), event.hash());
            to.poset.insert_event(received, false).unwrap();
        }
    }

    #[tokio::test]
    async fn test_receiver_commits_same_blocks_as_sender() {
        let mut sender = TestDag::new(3);
        sender.gossip(21).unwrap();
        sender.poset.run_consensus_pass().await.unwrap();

        let mut receiver = TestDag::new(3);
        relay(&sender.store.topological_events(), &mut receiver);
        receiver.poset.run_consensus_pass().await.unwrap();

        assert!(sender.store.last_block_index() >= 1);
        assert_eq!(
            sender.store.last_block_index(),
            receiver.store.last_block_index()
        );
        for i in 0..=sender.store.last_block_index() {
            assert_eq!(
                sender.store.get_block(i).unwrap().hash(),
                receiver.store.get_block(i).unwrap().hash()
            );
        }
        assert_eq!(
            sender.store.consensus_events(),
            receiver.store.consensus_events()
        );
    }

    #[tokio::test]
    async fn test_out_of_order_event_cannot_be_resolved() {
        let mut sender = TestDag::new(3);
        sender.gossip(6).unwrap();
        let events = sender.store.topological_events();

        let mut receiver = TestDag::new(3);
        relay(&events[..2], &mut receiver);

        // g3 builds on g0 and g2; g2 has not arrived.
        let wire = events[3].to_wire().unwrap();
        let err = receiver.poset.read_wire_info(&wire).unwrap_err();
        assert!(matches!(err, PosetError::UnknownOtherParent { .. }));
        assert_eq!(receiver.poset.undetermined_events().len(), 2);
    }

    #[test]
    fn test_garbage_bytes_are_malformed() {
        let err = WireEvent::decode(&[0xFF, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, PosetError::MalformedWireEvent(_)));
    }
}
