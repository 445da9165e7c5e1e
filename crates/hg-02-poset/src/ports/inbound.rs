//! Driving ports (Inbound API)

use crate::domain::{Block, Event, FlagTable, Frame, PosetResult, WireEvent};
use async_trait::async_trait;

/// Consensus engine API used by the node driver.
///
/// The engine is single-writer: one task owns it and calls these in order.
#[async_trait]
pub trait PosetApi: Send {
    /// Validate and append an event to the DAG.
    fn insert_event(&mut self, event: Event, set_wire_info: bool) -> PosetResult<()>;

    /// Rebuild a hash-linked event from its gossip form.
    fn read_wire_info(&self, wire: &WireEvent) -> PosetResult<Event>;

    /// Divide rounds, decide fame and round-received, commit decided rounds,
    /// then drain the signature pool. Blocks while the commit channel is full.
    async fn run_consensus_pass(&mut self) -> PosetResult<()>;

    /// Accept a remote block only if enough participants signed it.
    fn check_block(&mut self, block: &Block) -> PosetResult<()>;

    /// Fast-forward to a verified block and its frame.
    fn reset(&mut self, block: Block, frame: Frame) -> PosetResult<()>;

    /// Replay durable history after a restart.
    async fn bootstrap(&mut self) -> PosetResult<()>;

    /// Current anchor block together with its frame.
    fn anchor_block_with_frame(&mut self) -> PosetResult<(Block, Frame)>;

    /// Flag table of a random undetermined event, for gossip hints.
    fn flag_table_of_random_undetermined_event(&self) -> PosetResult<FlagTable>;
}
