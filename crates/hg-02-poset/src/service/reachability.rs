//! DAG reachability: ancestor, self-ancestor, see, strongly-see.
//!
//! Walks are iterative with a visited set; results are memoized per
//! (x, y) id pair.

use super::Poset;
use crate::domain::{Event, PosetResult};
use crate::ports::Store;
use shared_types::{Hash, PublicKey};
use std::collections::HashSet;

/// What an ancestor walk needs to know about its target.
struct Target {
    lamport: i64,
    /// Creator and index, when the target resolves to an event or a root.
    position: Option<(PublicKey, i64)>,
}

impl<S: Store> Poset<S> {
    /// True iff `y` is an ancestor of `x`, or `x == y`.
    pub fn ancestor(&mut self, x: &Hash, y: &Hash) -> PosetResult<bool> {
        let key = self.caches.pair(x, y);
        if let Some(hit) = self.caches.ancestor.get(&key) {
            return Ok(hit);
        }
        let result = self.ancestor_walk(x, y)?;
        self.caches.ancestor.put(key, result);
        Ok(result)
    }

    fn ancestor_walk(&mut self, x: &Hash, y: &Hash) -> PosetResult<bool> {
        if x == y {
            return Ok(true);
        }
        let mut target: Option<Target> = None;
        let mut visited = HashSet::new();
        let mut stack = vec![*x];

        while let Some(current) = stack.pop() {
            if current == *y {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            if current != *x {
                let key = self.caches.pair(&current, y);
                match self.caches.ancestor.get(&key) {
                    Some(true) => return Ok(true),
                    Some(false) => continue,
                    None => {}
                }
            }

            let event = match self.store.get_event(&current) {
                Ok(event) => event,
                Err(e) if e.is_key_not_found() => {
                    if self.root_bridges(&current, y) {
                        return Ok(true);
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if target.is_none() {
                target = Some(self.resolve_target(y)?);
            }
            let Some(resolved) = target.as_ref() else {
                continue;
            };
            if resolved.lamport > self.lamport_timestamp(&current)? {
                continue;
            }
            match resolved.position {
                None => return Ok(false),
                Some((creator, index)) if creator == *event.creator() => {
                    if event.index() >= index {
                        return Ok(true);
                    }
                    continue;
                }
                Some(_) => {}
            }

            if let Some(other_parent) = event.other_parent() {
                stack.push(*other_parent);
            }
            stack.push(*event.self_parent());
        }

        // Every visited node was explored to exhaustion without reaching y.
        for node in visited {
            let key = self.caches.pair(&node, y);
            self.caches.ancestor.put(key, false);
        }
        Ok(false)
    }

    fn resolve_target(&mut self, y: &Hash) -> PosetResult<Target> {
        let lamport = self.lamport_timestamp(y)?;
        let position = match self.store.get_event(y) {
            Ok(event) => Some((*event.creator(), event.index())),
            Err(e) if e.is_key_not_found() => match self.roots_by_self_parent.get(y) {
                Some(root) => {
                    let creator = self.creator_key(root.self_parent.creator_id)?;
                    Some((creator, root.self_parent.index))
                }
                None => None,
            },
            Err(e) => return Err(e.into()),
        };
        Ok(Target { lamport, position })
    }

    /// The first root that bridges `y` decides whether `x` is that bridge.
    fn root_bridges(&self, x: &Hash, y: &Hash) -> bool {
        self.roots_by_self_parent
            .values()
            .find_map(|root| root.others.get(y))
            .is_some_and(|other| other.hash == *x)
    }

    /// True iff `y` is on `x`'s self-parent chain, or `x == y`.
    pub fn self_ancestor(&mut self, x: &Hash, y: &Hash) -> PosetResult<bool> {
        let key = self.caches.pair(x, y);
        if let Some(hit) = self.caches.self_ancestor.get(&key) {
            return Ok(hit);
        }
        let result = self.compute_self_ancestor(x, y)?;
        self.caches.self_ancestor.put(key, result);
        Ok(result)
    }

    fn compute_self_ancestor(&mut self, x: &Hash, y: &Hash) -> PosetResult<bool> {
        if x == y {
            return Ok(true);
        }
        let ex = match self.store.get_event(x) {
            Ok(event) => event,
            Err(e) if e.is_key_not_found() => {
                return Ok(self
                    .roots_by_self_parent
                    .get(x)
                    .is_some_and(|root| root.self_parent.hash == *y));
            }
            Err(e) => return Err(e.into()),
        };
        let (y_creator, y_index) = match self.store.get_event(y) {
            Ok(ey) => (*ey.creator(), ey.index()),
            Err(e) if e.is_key_not_found() => match self.roots_by_self_parent.get(y) {
                Some(root) => (
                    self.creator_key(root.self_parent.creator_id)?,
                    root.self_parent.index,
                ),
                None => return Ok(false),
            },
            Err(e) => return Err(e.into()),
        };
        Ok(*ex.creator() == y_creator && ex.index() >= y_index)
    }

    /// Identical to [`Poset::ancestor`]; forks never reach the DAG.
    pub fn see(&mut self, x: &Hash, y: &Hash) -> PosetResult<bool> {
        self.ancestor(x, y)
    }

    /// True iff a supermajority of participants have an event that is an
    /// ancestor of `x` and sees `y`.
    pub fn strongly_see(&mut self, x: &Hash, y: &Hash) -> PosetResult<bool> {
        let key = self.caches.pair(x, y);
        if let Some(hit) = self.caches.strongly_see.get(&key) {
            return Ok(hit);
        }
        let sentinels = self.map_sentinels(x, y)?;
        let result = sentinels.len() >= self.thresholds.super_majority;
        self.caches.strongly_see.put(key, result);
        Ok(result)
    }

    /// Creators of `x`'s ancestors that see `y`.
    fn map_sentinels(&mut self, x: &Hash, y: &Hash) -> PosetResult<HashSet<PublicKey>> {
        let mut sentinels = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![*x];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if !self.see(&current, y)? {
                continue;
            }
            let event: Event = match self.store.get_event(&current) {
                Ok(event) => event,
                Err(e) if e.is_key_not_found() => {
                    if let Some(root) = self.roots_by_self_parent.get(&current) {
                        let creator_id = root.self_parent.creator_id;
                        sentinels.insert(self.creator_key(creator_id)?);
                        continue;
                    }
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            };
            sentinels.insert(*event.creator());
            if current == *y {
                continue;
            }
            if let Some(other_parent) = event.other_parent() {
                stack.push(*other_parent);
            }
            stack.push(*event.self_parent());
        }
        Ok(sentinels)
    }
}
