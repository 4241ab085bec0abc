//! In-memory collection of service profiles keyed by id
//!
//! Entries keep insertion order for display. The registry does not enforce
//! "at least one profile"; that policy belongs to the controller.

use indexmap::IndexMap;
use tracing::debug;

use super::ServiceId;
use super::allocator::IdAllocator;
use super::error::{ProfileError, ProfileResult};
use super::payload::SettingPayload;
use crate::constants::keys;

#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    entries: IndexMap<ServiceId, SettingPayload>,
    allocator: IdAllocator,
    limit: usize,
}

impl ProfileRegistry {
    /// Empty registry with a fresh allocator
    pub fn new(limit: usize) -> Self {
        Self::with_allocator(IdAllocator::new(), limit)
    }

    /// Empty registry using an allocator already seeded from persisted ids
    pub fn with_allocator(allocator: IdAllocator, limit: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            allocator,
            limit,
        }
    }

    #[cfg(test)]
    pub fn add(&mut self, payload: SettingPayload) -> ProfileResult<ServiceId> {
        self.add_with(|_| payload)
    }

    /// Add a profile built from the freshly allocated id
    ///
    /// The id is also stamped into the payload's `id` field. At the limit, or
    /// once the id space is exhausted, the call fails and nothing changes.
    pub fn add_with<F>(&mut self, build: F) -> ProfileResult<ServiceId>
    where
        F: FnOnce(ServiceId) -> SettingPayload,
    {
        if self.entries.len() >= self.limit {
            return Err(ProfileError::LimitReached { limit: self.limit });
        }

        let id = self
            .allocator
            .allocate()
            .ok_or(ProfileError::LimitReached { limit: self.limit })?;
        debug_assert!(!self.entries.contains_key(&id), "allocated live id {id}");
        let mut payload = build(id);
        payload.set(keys::ID, i64::from(id));
        self.entries.insert(id, payload);
        debug!(id, count = self.entries.len(), "Added service to registry");
        Ok(id)
    }

    /// Insert a persisted entry under its own id
    ///
    /// The allocator must already account for `id` (see [`IdAllocator::seed`]).
    /// Loading ignores the limit so that no saved profile is dropped.
    pub(crate) fn insert_loaded(&mut self, id: ServiceId, mut payload: SettingPayload) {
        debug_assert!(!self.allocator.is_released(id), "loaded id {id} is in the reuse pool");
        debug_assert!(id <= self.allocator.max_issued(), "loaded id {id} above high-water mark");
        payload.set(keys::ID, i64::from(id));
        self.entries.insert(id, payload);
    }

    /// Allocate an id for a loaded entry whose own id was unusable
    pub(crate) fn allocate_id(&mut self) -> ProfileResult<ServiceId> {
        self.allocator
            .allocate()
            .ok_or(ProfileError::LimitReached { limit: self.limit })
    }

    /// Remove a profile and release its id
    pub fn remove(&mut self, id: ServiceId) -> ProfileResult<SettingPayload> {
        let payload = self
            .entries
            .shift_remove(&id)
            .ok_or(ProfileError::NotFound(id))?;
        self.allocator.release(id);
        debug!(id, count = self.entries.len(), "Removed service from registry");
        Ok(payload)
    }

    pub fn get(&self, id: ServiceId) -> ProfileResult<&SettingPayload> {
        self.entries.get(&id).ok_or(ProfileError::NotFound(id))
    }

    /// Overwrite the payload of an existing profile, keeping its position
    pub fn replace(&mut self, id: ServiceId, mut payload: SettingPayload) -> ProfileResult<()> {
        let slot = self.entries.get_mut(&id).ok_or(ProfileError::NotFound(id))?;
        payload.set(keys::ID, i64::from(id));
        *slot = payload;
        Ok(())
    }

    pub fn contains(&self, id: ServiceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Ids in insertion order
    #[cfg(test)]
    pub fn list_ids(&self) -> Vec<ServiceId> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ServiceId, &SettingPayload)> {
        self.entries.iter().map(|(id, payload)| (*id, payload))
    }

    pub fn id_at_index(&self, index: usize) -> Option<ServiceId> {
        self.entries.get_index(index).map(|(id, _)| *id)
    }

    pub fn index_of(&self, id: ServiceId) -> Option<usize> {
        self.entries.get_index_of(&id)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::defaults;

    fn named(name: &str) -> SettingPayload {
        let mut payload = SettingPayload::new();
        payload.set(keys::NAME, name);
        payload
    }

    #[test]
    fn test_add_stamps_id_and_appends() {
        let mut registry = ProfileRegistry::new(20);
        let a = registry.add(named("A")).unwrap();
        let b = registry.add(named("B")).unwrap();

        assert_eq!((a, b), (1, 2));
        assert_eq!(registry.list_ids(), vec![1, 2]);
        assert_eq!(registry.get(b).unwrap().get_int(keys::ID), Some(2));
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_add_with_sees_allocated_id() {
        let mut registry = ProfileRegistry::new(20);
        registry.add(named("A")).unwrap();
        let id = registry
            .add_with(|id| named(&format!("Service {id}")))
            .unwrap();
        assert_eq!(registry.get(id).unwrap().name(), "Service 2");
    }

    #[test]
    fn test_add_at_limit_leaves_state_unchanged() {
        let mut registry = ProfileRegistry::new(2);
        registry.add(named("A")).unwrap();
        registry.add(named("B")).unwrap();

        assert_eq!(
            registry.add(named("C")),
            Err(ProfileError::LimitReached { limit: 2 })
        );
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.allocator().max_issued(), 2);
    }

    #[test]
    fn test_add_remove_restores_next_id() {
        let mut registry = ProfileRegistry::new(20);
        registry.add(named("A")).unwrap();
        let id = registry.add(named("B")).unwrap();
        registry.remove(id).unwrap();

        assert_eq!(registry.add(named("C")).unwrap(), id);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut registry = ProfileRegistry::new(20);
        registry.add(named("A")).unwrap();
        assert_eq!(registry.remove(9).unwrap_err(), ProfileError::NotFound(9));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_remove_last_leaves_registry_empty() {
        let mut registry = ProfileRegistry::new(20);
        let id = registry.add(named("Only")).unwrap();
        registry.remove(id).unwrap();
        assert!(registry.is_empty());
        assert!(registry.allocator().is_released(id));
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut registry = ProfileRegistry::new(20);
        for name in ["A", "B", "C"] {
            registry.add(named(name)).unwrap();
        }

        registry.replace(2, named("B2")).unwrap();
        assert_eq!(registry.list_ids(), vec![1, 2, 3]);
        assert_eq!(registry.get(2).unwrap().name(), "B2");
        assert_eq!(registry.get(2).unwrap().get_int(keys::ID), Some(2));
        assert_eq!(registry.index_of(2), Some(1));
    }

    #[test]
    fn test_replace_missing_is_not_found() {
        let mut registry = ProfileRegistry::new(20);
        assert_eq!(
            registry.replace(4, named("X")),
            Err(ProfileError::NotFound(4))
        );
    }

    #[test]
    fn test_remove_keeps_order_of_rest() {
        let mut registry = ProfileRegistry::new(20);
        for name in ["A", "B", "C", "D"] {
            registry.add(named(name)).unwrap();
        }
        registry.remove(2).unwrap();
        assert_eq!(registry.list_ids(), vec![1, 3, 4]);

        // Reused id goes to the end of the display order
        assert_eq!(registry.add(named("E")).unwrap(), 2);
        assert_eq!(registry.list_ids(), vec![1, 3, 4, 2]);
        assert_eq!(registry.id_at_index(3), Some(2));
    }

    #[test]
    fn test_add_fails_when_id_space_exhausted() {
        let allocator = IdAllocator::seed([defaults::MAX_SERVICE_ID], Vec::<ServiceId>::new());
        let mut registry = ProfileRegistry::with_allocator(allocator, 20);
        registry.insert_loaded(defaults::MAX_SERVICE_ID, named("Last"));

        assert_eq!(
            registry.add(named("Overflow")),
            Err(ProfileError::LimitReached { limit: 20 })
        );
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_insert_loaded_with_seeded_allocator() {
        let allocator = IdAllocator::seed([4, 2], [1]);
        let mut registry = ProfileRegistry::with_allocator(allocator, 20);
        registry.insert_loaded(4, named("Four"));
        registry.insert_loaded(2, named("Two"));

        assert_eq!(registry.list_ids(), vec![4, 2]);
        assert_eq!(registry.add(named("New")).unwrap(), 1);
        assert_eq!(registry.add(named("Newer")).unwrap(), 5);
        assert_eq!(registry.add(named("Newest")).unwrap(), 6);
    }
}
