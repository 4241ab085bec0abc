//! Small positive integer id allocation with reuse
//!
//! Ids are handed out lowest-first: a released id is always preferred over
//! raising the high-water mark, so ids stay compact across sessions.

use std::collections::BTreeSet;
use tracing::{debug, error};

use super::ServiceId;
use crate::constants::defaults;

#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    /// Highest id ever issued (0 = none)
    max_issued: ServiceId,
    /// Released ids at or below `max_issued`, ready for reuse
    released: BTreeSet<ServiceId>,
    seeded: bool,
}

impl IdAllocator {
    /// Allocator with nothing issued yet
    pub fn new() -> Self {
        Self {
            seeded: true,
            ..Self::default()
        }
    }

    /// Rebuild allocator state from the ids of a loaded profile list
    ///
    /// `released` is the pool persisted by the host. Pool entries that are
    /// live again, zero or above [`defaults::MAX_SERVICE_ID`] are dropped.
    pub fn seed<L, R>(live: L, released: R) -> Self
    where
        L: IntoIterator<Item = ServiceId>,
        R: IntoIterator<Item = ServiceId>,
    {
        let live: BTreeSet<ServiceId> = live.into_iter().collect();
        let released: BTreeSet<ServiceId> = released
            .into_iter()
            .filter(|id| *id != 0 && *id <= defaults::MAX_SERVICE_ID && !live.contains(id))
            .collect();

        let max_issued = live
            .last()
            .copied()
            .into_iter()
            .chain(released.last().copied())
            .max()
            .unwrap_or(0);

        debug!(
            live = live.len(),
            released = released.len(),
            max_issued,
            "Seeded id allocator"
        );

        Self {
            max_issued,
            released,
            seeded: true,
        }
    }

    /// Issue the smallest released id, or raise the high-water mark
    ///
    /// Returns `None` once the mark sits at [`defaults::MAX_SERVICE_ID`] and
    /// nothing is left to reuse.
    pub fn allocate(&mut self) -> Option<ServiceId> {
        debug_assert!(self.seeded, "id allocator used before seeding");

        if let Some(id) = self.released.pop_first() {
            return Some(id);
        }
        if self.max_issued >= defaults::MAX_SERVICE_ID {
            error!(max_issued = self.max_issued, "Service id space exhausted");
            return None;
        }
        self.max_issued += 1;
        Some(self.max_issued)
    }

    /// Return `id` to the reuse pool
    ///
    /// Releasing an id that was never issued or is already released is a
    /// caller bug. Debug builds assert; release builds ignore the call.
    pub fn release(&mut self, id: ServiceId) {
        let valid = id != 0 && id <= self.max_issued && !self.released.contains(&id);
        debug_assert!(valid, "invalid release of service id {id}");
        if !valid {
            error!(id, max_issued = self.max_issued, "Ignoring invalid id release");
            return;
        }
        self.released.insert(id);
    }

    pub fn is_released(&self, id: ServiceId) -> bool {
        self.released.contains(&id)
    }

    pub fn max_issued(&self) -> ServiceId {
        self.max_issued
    }

    /// Reuse pool in ascending order, for the host to persist
    pub fn released(&self) -> Vec<ServiceId> {
        self.released.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_allocate_sequential_from_empty() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.allocate(), Some(1));
        assert_eq!(alloc.allocate(), Some(2));
        assert_eq!(alloc.allocate(), Some(3));
        assert_eq!(alloc.max_issued(), 3);
    }

    #[test]
    fn test_allocate_prefers_smallest_released() {
        let mut alloc = IdAllocator::new();
        for _ in 0..5 {
            alloc.allocate();
        }
        alloc.release(4);
        alloc.release(2);

        assert_eq!(alloc.allocate(), Some(2));
        assert_eq!(alloc.allocate(), Some(4));
        assert_eq!(alloc.allocate(), Some(6));
    }

    #[test]
    fn test_allocate_then_release_restores_state() {
        let mut alloc = IdAllocator::seed([1, 2, 3], [2]);
        // 2 is live, so it cannot stay in the pool
        assert!(alloc.released().is_empty());

        let id = alloc.allocate().unwrap();
        assert_eq!(id, 4);
        alloc.release(id);
        assert_eq!(alloc.allocate(), Some(4));
    }

    #[test]
    fn test_seed_uses_max_of_live_and_pool() {
        let mut alloc = IdAllocator::seed([3, 1], [7, 5, 0]);
        assert_eq!(alloc.max_issued(), 7);
        assert_eq!(alloc.released(), vec![5, 7]);

        assert_eq!(alloc.allocate(), Some(5));
        assert_eq!(alloc.allocate(), Some(7));
        assert_eq!(alloc.allocate(), Some(8));
    }

    #[test]
    fn test_seed_empty() {
        let none: [ServiceId; 0] = [];
        let mut alloc = IdAllocator::seed(none, none);
        assert_eq!(alloc.max_issued(), 0);
        assert_eq!(alloc.allocate(), Some(1));
    }

    #[test]
    fn test_live_ids_stay_distinct() {
        let mut alloc = IdAllocator::new();
        let mut live: Vec<ServiceId> = Vec::new();

        // Deterministic interleaving of allocations and releases
        for step in 0..200u32 {
            if step % 3 == 2 && !live.is_empty() {
                let idx = (step as usize * 7) % live.len();
                alloc.release(live.remove(idx));
            } else {
                live.push(alloc.allocate().unwrap());
            }
            let unique: HashSet<_> = live.iter().collect();
            assert_eq!(unique.len(), live.len(), "duplicate live id at step {step}");
        }
    }

    #[test]
    #[should_panic(expected = "invalid release")]
    #[cfg(debug_assertions)]
    fn test_double_release_asserts() {
        let mut alloc = IdAllocator::new();
        let id = alloc.allocate().unwrap();
        alloc.release(id);
        alloc.release(id);
    }

    #[test]
    #[should_panic(expected = "invalid release")]
    #[cfg(debug_assertions)]
    fn test_release_unissued_asserts() {
        let mut alloc = IdAllocator::new();
        alloc.release(3);
    }

    #[test]
    fn test_allocate_stops_at_id_ceiling() {
        let mut alloc = IdAllocator::seed([defaults::MAX_SERVICE_ID], [2]);
        assert_eq!(alloc.allocate(), Some(2));
        assert_eq!(alloc.allocate(), None);
        assert_eq!(alloc.max_issued(), defaults::MAX_SERVICE_ID);

        // Released ids are still handed out again
        alloc.release(2);
        assert_eq!(alloc.allocate(), Some(2));
    }

    #[test]
    fn test_seed_drops_pool_ids_above_ceiling() {
        let mut alloc = IdAllocator::seed([1], [u32::MAX, 3]);
        assert_eq!(alloc.released(), vec![3]);
        assert_eq!(alloc.max_issued(), 3);
        assert_eq!(alloc.allocate(), Some(3));
        assert_eq!(alloc.allocate(), Some(4));
    }

    #[test]
    #[should_panic(expected = "used before seeding")]
    #[cfg(debug_assertions)]
    fn test_allocate_before_seed_asserts() {
        let mut alloc = IdAllocator::default();
        alloc.allocate();
    }
}
