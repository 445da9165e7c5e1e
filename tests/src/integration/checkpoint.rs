//! # Checkpoint Flows
//!
//! A node joining late resets from another node's anchor block and frame,
//! then catches up on the events that followed. A restarted node bootstraps
//! from the events its store persisted. Both must commit the blocks the
//! original node committed.

#[cfg(test)]
mod tests {
    use hg_02_poset::ports::Store;
    use hg_02_poset::test_utils::{init_tracing, TestDag};
    use hg_02_poset::{Block, Frame, WireEvent};

    /// Fifteen gossip events, then block 0 signed by two of three nodes.
    async fn anchored_origin() -> (TestDag, Block, Frame) {
        init_tracing();
        let mut origin = TestDag::new(3);
        origin.gossip(15).unwrap();
        origin.poset.run_consensus_pass().await.unwrap();

        let block = origin.store.get_block(0).unwrap();
        let sigs = [block.sign(&origin.nodes[0].key), block.sign(&origin.nodes[1].key)];
        let [sig0, sig1] = sigs;
        let event = origin.build_event_with_signatures(0, Some("g14"), vec![], vec![sig0]);
        origin.insert_named("s0", event).unwrap();
        let event = origin.build_event_with_signatures(1, Some("s0"), vec![], vec![sig1]);
        origin.insert_named("s1", event).unwrap();
        origin.poset.run_consensus_pass().await.unwrap();

        let (anchor, frame) = origin.poset.anchor_block_with_frame().unwrap();
        (origin, anchor, frame)
    }

    #[tokio::test]
    async fn test_reset_from_anchor_then_catch_up() {
        let (origin, anchor, frame) = anchored_origin().await;
        assert_eq!(anchor.index(), 0);
        assert_eq!(frame.round, 1);

        let mut joiner = TestDag::new(3);
        joiner.poset.check_block(&anchor).unwrap();
        joiner.poset.reset(anchor.clone(), frame.clone()).unwrap();

        assert_eq!(joiner.poset.last_consensus_round(), Some(1));
        assert!(joiner.poset.undetermined_events().is_empty());
        assert_eq!(joiner.store.last_block_index(), 0);
        let replayed: Vec<_> = frame.events.iter().map(|e| *e.hash()).collect();
        assert_eq!(joiner.store.consensus_events(), replayed);

        // Catch up on g3..g14 in gossip order.
        for k in 3..15 {
            let event = origin.event(&format!("g{k}"));
            let wire = WireEvent::decode(&event.to_wire().unwrap().encode().unwrap()).unwrap();
            let received = joiner.poset.read_wire_info(&wire).unwrap();
            joiner.poset.insert_event(received, false).unwrap();
        }
        joiner.poset.run_consensus_pass().await.unwrap();

        assert_eq!(joiner.poset.last_consensus_round(), Some(2));
        let expected = origin.store.get_block(1).unwrap();
        let caught_up = joiner.store.get_block(1).unwrap();
        assert_eq!(caught_up.body(), expected.body());
    }

    #[tokio::test]
    async fn test_joiner_extends_reset_history_with_own_events() {
        let (origin, anchor, frame) = anchored_origin().await;

        let mut joiner = TestDag::new(3);
        joiner.poset.reset(anchor, frame).unwrap();
        for k in 0..3 {
            joiner.register(&format!("g{k}"), &origin.event(&format!("g{k}")));
        }

        // node 0's head is its replayed event, index 0.
        let (head, index) = joiner.head(0);
        assert_eq!(head, joiner.hash("g0"));
        assert_eq!(index, 1);

        joiner.add_event("j0", 0, Some("g2"), vec![b"late".to_vec()]).unwrap();
        joiner.poset.run_consensus_pass().await.unwrap();
        let j0 = joiner.event("j0");
        assert_eq!(j0.round(), Some(1));
        assert_eq!(j0.lamport_timestamp(), Some(3));
    }

    #[tokio::test]
    async fn test_bootstrap_replays_durable_events() {
        let mut origin = TestDag::new(3);
        origin.gossip(15).unwrap();
        origin.poset.run_consensus_pass().await.unwrap();

        let mut restarted = TestDag::with_durable_events(3, origin.store.topological_events());
        assert_eq!(restarted.store.event_count(), 0);
        restarted.poset.bootstrap().await.unwrap();

        assert_eq!(restarted.store.event_count(), 15);
        assert_eq!(
            restarted.poset.last_consensus_round(),
            origin.poset.last_consensus_round()
        );
        for i in 0..=origin.store.last_block_index() {
            assert_eq!(
                restarted.store.get_block(i).unwrap().body(),
                origin.store.get_block(i).unwrap().body()
            );
        }
    }

    #[tokio::test]
    async fn test_bootstrap_on_empty_store_is_noop() {
        let mut dag = TestDag::new(3);
        dag.poset.bootstrap().await.unwrap();
        assert_eq!(dag.store.event_count(), 0);
        assert!(dag.poset.last_consensus_round().is_none());
    }
}
