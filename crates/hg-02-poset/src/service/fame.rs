//! Virtual voting on witness fame, and round-received assignment.

use super::Poset;
use crate::domain::{middle_bit, PosetResult};
use crate::ports::Store;
use shared_types::{short_hex, Hash};
use std::collections::{HashMap, HashSet};
use tracing::debug;

impl<S: Store> Poset<S> {
    /// Vote on the fame of every undecided witness in the pending rounds.
    ///
    /// Votes live only for the duration of one call and are recomputed from
    /// the DAG on every pass.
    pub fn decide_fame(&mut self) -> PosetResult<()> {
        self.sync_participants()?;
        let super_majority = self.thresholds.super_majority;
        let n = self.participant_count().max(1) as i64;

        // (voter, candidate) → vote
        let mut votes: HashMap<(Hash, Hash), bool> = HashMap::new();
        let mut decided_rounds = HashSet::new();
        let pending: Vec<i64> = self.pending_rounds.iter().map(|r| r.index).collect();

        for round_index in pending {
            let mut round_info = self.store.get_round(round_index)?;

            for x in round_info.witnesses() {
                if round_info.is_decided(&x) {
                    continue;
                }
                'voting: for j in (round_index + 1)..=self.store.last_round() {
                    let diff = j - round_index;
                    for y in self.store.round_witnesses(j) {
                        if diff == 1 {
                            let vote = self.see(&y, &x)?;
                            votes.insert((y, x), vote);
                            continue;
                        }

                        let mut yays = 0usize;
                        let mut nays = 0usize;
                        for w in self.store.round_witnesses(j - 1) {
                            if !self.strongly_see(&y, &w)? {
                                continue;
                            }
                            match votes.get(&(w, x)) {
                                Some(true) => yays += 1,
                                Some(false) => nays += 1,
                                None => {}
                            }
                        }
                        let (vote, tally) = if yays >= nays {
                            (true, yays)
                        } else {
                            (false, nays)
                        };

                        if diff % n > 0 {
                            votes.insert((y, x), vote);
                            if tally >= super_majority {
                                round_info.set_fame(&x, vote);
                                debug!(
                                    witness = %short_hex(&x),
                                    round = round_index,
                                    famous = vote,
                                    "[poset] Fame decided"
                                );
                                break 'voting;
                            }
                        } else if tally >= super_majority {
                            votes.insert((y, x), vote);
                        } else {
                            votes.insert((y, x), middle_bit(&y));
                        }
                    }
                }
            }

            let decided = round_info.witnesses_decided();
            self.store.set_round(round_index, round_info)?;
            if decided {
                decided_rounds.insert(round_index);
            }
        }

        for pending in self.pending_rounds.iter_mut() {
            if decided_rounds.contains(&pending.index) {
                pending.decided = true;
            }
        }
        Ok(())
    }

    /// Move events whose round-received is decided out of the undetermined
    /// queue.
    pub fn decide_round_received(&mut self) -> PosetResult<()> {
        let undetermined = self.undetermined_events.clone();
        let mut still_undetermined = Vec::with_capacity(undetermined.len());

        for x in undetermined {
            let round = self.round(&x)?;
            let mut received = false;

            for i in (round + 1)..=self.store.last_round() {
                let mut round_info = match self.store.get_round(i) {
                    Ok(info) => info,
                    // Rounds at or below the reset boundary are already committed.
                    Err(e)
                        if e.is_key_not_found()
                            && self.last_consensus_round.is_some_and(|l| round < l) =>
                    {
                        received = true;
                        break;
                    }
                    Err(e) => return Err(e.into()),
                };
                if !round_info.witnesses_decided() {
                    break;
                }

                let famous = round_info.famous_witnesses();
                let mut seen = 0;
                for w in &famous {
                    if self.see(w, &x)? {
                        seen += 1;
                    }
                }
                if seen > 0 && seen == famous.len() {
                    received = true;
                    let mut event = self.store.get_event(&x)?;
                    event.set_round_received(i);
                    self.store.set_event(event)?;
                    round_info.set_consensus_event(x);
                    self.store.set_round(i, round_info)?;
                    debug!(event = %short_hex(&x), round_received = i, "[poset] Round received");
                    break;
                }
            }

            if !received {
                still_undetermined.push(x);
            }
        }

        self.undetermined_events = still_undetermined;
        Ok(())
    }
}
