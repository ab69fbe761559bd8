//! Opaque handles for host environments.
//!
//! A host that cannot hold Rust values directly keeps a [`RelationHandle`]
//! instead. The [`RelationStore`] owns every relation; releasing a handle
//! drops its relation and bumps the slot generation, so a stale handle is
//! reported instead of aliasing a newer relation.

use crate::polyhedral::relation::IntegerRelation;
use crate::utils::errors::{PresburgerError, PresburgerResult};
use log::trace;
use std::fmt;

/// A copyable reference to a relation owned by a [`RelationStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationHandle {
    index: usize,
    generation: u64,
}

impl fmt::Display for RelationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    relation: Option<IntegerRelation>,
}

/// Owner of all relations reachable through handles.
#[derive(Debug, Default)]
pub struct RelationStore {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl RelationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `relation` and return its handle.
    pub fn insert(&mut self, relation: IntegerRelation) -> RelationHandle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.relation = Some(relation);
        let handle = RelationHandle {
            index,
            generation: slot.generation,
        };
        trace!("created relation {}", handle);
        handle
    }

    /// Get the relation behind `handle`.
    pub fn get(&self, handle: RelationHandle) -> PresburgerResult<&IntegerRelation> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.relation.as_ref())
            .ok_or(PresburgerError::StaleHandle(handle))
    }

    /// Get the relation behind `handle` mutably.
    pub fn get_mut(&mut self, handle: RelationHandle) -> PresburgerResult<&mut IntegerRelation> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.relation.as_mut())
            .ok_or(PresburgerError::StaleHandle(handle))
    }

    /// Release `handle` and return its relation. Every copy of the handle is
    /// stale afterwards.
    pub fn release(&mut self, handle: RelationHandle) -> PresburgerResult<IntegerRelation> {
        self.get(handle)?;
        let slot = &mut self.slots[handle.index];
        let relation = slot.relation.take().ok_or(PresburgerError::StaleHandle(handle))?;
        slot.generation += 1;
        self.free.push(handle.index);
        trace!("destroyed relation {}", handle);
        Ok(relation)
    }

    /// Intersect two stored relations into a new stored relation.
    pub fn intersect(&mut self, lhs: RelationHandle, rhs: RelationHandle) -> PresburgerResult<RelationHandle> {
        let result = self.get(lhs)?.intersect(self.get(rhs)?)?;
        Ok(self.insert(result))
    }

    /// Compare two stored relations for integer-point equality.
    pub fn is_equal(&self, lhs: RelationHandle, rhs: RelationHandle) -> PresburgerResult<bool> {
        self.get(lhs)?.is_equal(self.get(rhs)?)
    }

    /// Number of live relations.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// True when no relation is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::space::PresburgerSpace;

    fn interval(lo: i64, hi: i64) -> IntegerRelation {
        IntegerRelation::from_coefficients::<i64, _>(&[vec![1, -lo], vec![-1, hi]], &[], 0, 1).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = RelationStore::new();
        let h = store.insert(interval(0, 3));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(h).unwrap().num_inequalities(), 2);
        store.get_mut(h).unwrap().add_equality(&[1, -2]).unwrap();
        assert_eq!(store.get(h).unwrap().num_equalities(), 1);
    }

    #[test]
    fn test_release_invalidates_handle() {
        let mut store = RelationStore::new();
        let h = store.insert(interval(0, 3));
        store.release(h).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get(h).unwrap_err(), PresburgerError::StaleHandle(h));
        assert_eq!(store.release(h).unwrap_err(), PresburgerError::StaleHandle(h));

        // The slot is reused under a new generation.
        let h2 = store.insert(IntegerRelation::universe(PresburgerSpace::set(2)));
        assert_ne!(h, h2);
        assert!(store.get(h).is_err());
        assert_eq!(store.get(h2).unwrap().num_vars(), 2);
    }

    #[test]
    fn test_intersect_and_compare() {
        let mut store = RelationStore::new();
        let a = store.insert(interval(0, 5));
        let b = store.insert(interval(3, 9));
        let c = store.intersect(a, b).unwrap();
        let expected = store.insert(interval(3, 5));
        assert_eq!(store.len(), 4);
        assert!(store.is_equal(c, expected).unwrap());
        assert!(!store.is_equal(a, c).unwrap());
    }

    #[test]
    fn test_handle_display() {
        let mut store = RelationStore::new();
        let h = store.insert(interval(0, 1));
        assert_eq!(h.to_string(), "#0.0");
    }
}
