//! Block signature collection and the anchor block.

use super::Poset;
use crate::domain::{Block, BlockSignature, Frame, PosetError, PosetResult};
use crate::metrics;
use crate::ports::Store;
use shared_types::short_hex;
use tracing::{debug, info, warn};

impl<S: Store> Poset<S> {
    /// Attach pooled signatures to their blocks and advance the anchor
    /// block. Signatures for blocks not yet committed stay in the pool.
    pub fn process_sig_pool(&mut self) -> PosetResult<()> {
        self.sync_participants()?;
        let trust_count = self.thresholds.trust_count;
        let pool = std::mem::take(&mut self.sig_pool);
        let mut retained = Vec::new();

        for sig in pool {
            if !self.participants.read().contains_pub_key(&sig.validator) {
                warn!(
                    validator = %sig.validator_hex(),
                    index = sig.index,
                    "[poset] Dropping signature from unknown validator"
                );
                continue;
            }
            if self.anchor_block.is_some_and(|anchor| sig.index <= anchor) {
                continue;
            }
            let mut block = match self.store.get_block(sig.index) {
                Ok(block) => block,
                Err(e) if e.is_key_not_found() => {
                    retained.push(sig);
                    continue;
                }
                Err(e) => {
                    self.sig_pool = retained;
                    return Err(e.into());
                }
            };
            match block.verify(&sig) {
                Ok(true) => {}
                Ok(false) => {
                    warn!(
                        validator = %sig.validator_hex(),
                        index = sig.index,
                        "[poset] Invalid block signature"
                    );
                    continue;
                }
                Err(e) => {
                    warn!(
                        validator = %sig.validator_hex(),
                        index = sig.index,
                        error = %e,
                        "[poset] Unverifiable block signature"
                    );
                    continue;
                }
            }

            block.set_signature(sig);
            let signatures = block.signature_count();
            let index = block.index();
            self.store.set_block(block)?;
            debug!(index, signatures, "[poset] Block signature attached");

            if signatures > trust_count && self.anchor_block.map_or(true, |a| index > a) {
                self.anchor_block = Some(index);
                metrics::set_anchor_block(index);
                info!(index, signatures, "[poset] Anchor block advanced");
            }
        }

        self.sig_pool = retained;
        Ok(())
    }

    /// Accept a block only when more than trust-count current participants
    /// signed it.
    pub fn check_block(&mut self, block: &Block) -> PosetResult<()> {
        self.sync_participants()?;
        let trust_count = self.thresholds.trust_count;

        let mut valid = 0;
        for sig in block.signatures() {
            if !self.participants.read().contains_pub_key(&sig.validator) {
                continue;
            }
            match block.verify(&sig) {
                Ok(true) => valid += 1,
                Ok(false) => {}
                Err(e) => debug!(
                    validator = %sig.validator_hex(),
                    error = %e,
                    "[poset] Unverifiable block signature ignored"
                ),
            }
        }
        if valid <= trust_count {
            warn!(
                index = block.index(),
                got = valid,
                need = trust_count + 1,
                "[poset] Block lacks signatures"
            );
            return Err(PosetError::InsufficientSignatures {
                got: valid,
                need: trust_count + 1,
            });
        }
        Ok(())
    }

    /// The highest block with more than trust-count signatures, and the
    /// frame it was built from.
    pub fn anchor_block_with_frame(&mut self) -> PosetResult<(Block, Frame)> {
        let index = self.anchor_block.ok_or(PosetError::NoAnchorBlock)?;
        let block = self.store.get_block(index)?;
        let frame = self.get_frame(block.round_received())?;
        debug!(
            index,
            round_received = block.round_received(),
            hash = %short_hex(&block.hash()),
            "[poset] Anchor block loaded"
        );
        Ok((block, frame))
    }

    /// Signatures waiting for their block.
    pub fn pooled_signatures(&self) -> &[BlockSignature] {
        &self.sig_pool
    }
}
