//! # Consensus Flow
//!
//! Round-robin gossip among participants, with consensus passes run at
//! different cadences, must commit identical blocks. Blocks leave through
//! the single-slot commit channel.

#[cfg(test)]
mod tests {
    use hg_02_poset::ports::{PosetApi, Store};
    use hg_02_poset::test_utils::{init_tracing, TestDag};
    use hg_02_poset::{BlockBody, PosetError};

    fn block_bodies(dag: &TestDag) -> Vec<BlockBody> {
        (0..=dag.store.last_block_index())
            .map(|i| dag.store.get_block(i).unwrap().body().clone())
            .collect()
    }

    async fn pass<P: PosetApi>(poset: &mut P) {
        poset.run_consensus_pass().await.unwrap();
    }

    #[tokio::test]
    async fn test_pass_cadence_does_not_change_blocks() {
        init_tracing();
        let mut batch = TestDag::new(4);
        batch.gossip(40).unwrap();
        pass(&mut batch.poset).await;

        let mut incremental = TestDag::new(4);
        for _ in 0..40 {
            incremental.gossip(1).unwrap();
            pass(&mut incremental.poset).await;
        }

        let blocks = block_bodies(&batch);
        assert!(!blocks.is_empty());
        assert_eq!(blocks, block_bodies(&incremental));
        assert_eq!(
            batch.poset.last_consensus_round(),
            incremental.poset.last_consensus_round()
        );
        assert_eq!(batch.store.consensus_events(), incremental.store.consensus_events());

        assert_eq!(
            blocks[0].transactions,
            vec![b"tx0".to_vec(), b"tx1".to_vec(), b"tx2".to_vec()]
        );
        let committed: usize = blocks.iter().map(|b| b.transactions.len()).sum();
        assert_eq!(committed as u64, batch.poset.consensus_transactions());
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block.index, i as i64);
        }
        for pair in blocks.windows(2) {
            assert!(pair[0].round_received < pair[1].round_received);
        }
    }

    #[tokio::test]
    async fn test_commit_channel_applies_backpressure() {
        let (mut dag, mut rx) = TestDag::with_commit_channel(3);
        dag.gossip(15).unwrap();

        let driver = tokio::spawn(async move {
            dag.poset.run_consensus_pass().await.map(|_| dag)
        });

        let first = rx.recv().await.unwrap();
        assert_eq!(first.index(), 0);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.index(), 1);

        let dag = driver.await.unwrap().unwrap();
        assert_eq!(dag.poset.last_consensus_round(), Some(2));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_commit_channel_is_reported() {
        let (mut dag, rx) = TestDag::with_commit_channel(3);
        drop(rx);
        dag.gossip(15).unwrap();

        let err = dag.poset.run_consensus_pass().await.unwrap_err();
        assert_eq!(err, PosetError::CommitChannelClosed);
        assert!(dag.store.get_block(0).is_ok());
    }
}
