//! Storage for the service container
//!
//! Uses DashMap for concurrent access to the registry and the class table.
//! Each registered service carries its own `OnceCell` holding the resolved
//! instance.

use crate::{ClassDescriptor, ServiceEntry, Value};
use ahash::RandomState;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Auxiliary key/value bag supplied when the container is created.
pub type Parameters = HashMap<String, Value, RandomState>;

/// A resolved, shared service instance
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Uses 8 shards: containers hold tens of services, not thousands.
const SHARDS: usize = 8;

fn map<V>(capacity: usize) -> DashMap<String, V, RandomState> {
    DashMap::with_capacity_and_hasher_and_shard_amount(capacity, RandomState::new(), SHARDS)
}

/// A registered entry and the instance resolved from it.
///
/// The cell is filled at most once. Concurrent resolutions of the same name
/// wait for the one in progress instead of building their own.
pub(crate) struct ServiceSlot {
    entry: ServiceEntry,
    instance: OnceCell<Instance>,
}

impl ServiceSlot {
    fn new(entry: ServiceEntry) -> Self {
        Self {
            entry,
            instance: OnceCell::new(),
        }
    }

    #[inline]
    pub(crate) fn entry(&self) -> &ServiceEntry {
        &self.entry
    }

    #[inline]
    pub(crate) fn instance(&self) -> Option<&Instance> {
        self.instance.get()
    }

    /// Return the cached instance, running `build` if there is none yet.
    ///
    /// Only one `build` runs at a time; when it fails the cell stays empty
    /// and the next caller builds again.
    #[inline]
    pub(crate) fn resolve<E>(
        &self,
        build: impl FnOnce() -> Result<Instance, E>,
    ) -> Result<&Instance, E> {
        self.instance.get_or_try_init(build)
    }
}

/// Thread-safe storage behind a [`Container`](crate::Container)
///
/// Guards returned by DashMap are never held across construction: every
/// accessor clones the `Arc` out and releases the shard before returning.
pub struct ServiceStorage {
    /// Service name -> registered entry and its instance cell (write-once)
    services: DashMap<String, Arc<ServiceSlot>, RandomState>,
    /// Class name -> descriptor
    classes: DashMap<String, Arc<ClassDescriptor>, RandomState>,
    /// Stored for callers; never read by resolution
    parameters: Parameters,
}

impl ServiceStorage {
    #[inline]
    pub fn new() -> Self {
        Self::with_parameters(Parameters::default())
    }

    #[inline]
    pub fn with_parameters(parameters: Parameters) -> Self {
        Self {
            services: map(0),
            classes: map(0),
            parameters,
        }
    }

    /// Insert an entry unless the name is taken.
    ///
    /// Returns `false` and leaves the existing entry untouched on conflict.
    #[inline]
    pub fn insert_entry(&self, name: String, entry: ServiceEntry) -> bool {
        match self.services.entry(name) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(ServiceSlot::new(entry)));
                true
            }
        }
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    #[inline]
    pub(crate) fn slot(&self, name: &str) -> Option<Arc<ServiceSlot>> {
        self.services.get(name).map(|s| Arc::clone(s.value()))
    }

    #[inline]
    pub fn is_cached(&self, name: &str) -> bool {
        self.services
            .get(name)
            .is_some_and(|s| s.instance().is_some())
    }

    /// Add a class, replacing any class of the same name
    #[inline]
    pub fn define_class(&self, class: ClassDescriptor) -> Option<Arc<ClassDescriptor>> {
        self.classes.insert(class.name().to_owned(), Arc::new(class))
    }

    #[inline]
    pub fn class(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(name).map(|c| Arc::clone(c.value()))
    }

    #[inline]
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Get number of registered services
    #[inline]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Number of services resolved so far
    pub fn cached_len(&self) -> usize {
        self.services
            .iter()
            .filter(|s| s.instance().is_some())
            .count()
    }

    /// Get all registered service names
    pub fn names(&self) -> Vec<String> {
        self.services.iter().map(|r| r.key().clone()).collect()
    }
}

impl Default for ServiceStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceStorage")
            .field("services", &self.len())
            .field("resolved", &self.cached_len())
            .field("classes", &self.classes.len())
            .field("parameters", &self.parameters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_entry_is_write_once() {
        let storage = ServiceStorage::new();

        assert!(storage.insert_entry("logger".into(), ServiceEntry::from("Logger")));
        assert!(!storage.insert_entry("logger".into(), ServiceEntry::from("Other")));

        match storage.slot("logger").as_deref().map(ServiceSlot::entry) {
            Some(ServiceEntry::Class(class)) => assert_eq!(class, "Logger"),
            other => panic!("unexpected entry {other:?}"),
        }
    }

    #[test]
    fn test_slot_resolves_once() {
        let storage = ServiceStorage::new();
        storage.insert_entry("n".into(), ServiceEntry::from("N"));
        let slot = storage.slot("n").unwrap();

        let failed: Result<&Instance, &str> = slot.resolve(|| Err("boom"));
        assert_eq!(failed.err(), Some("boom"));
        assert!(!storage.is_cached("n"));

        let first = Arc::clone(slot.resolve(|| Ok::<_, ()>(Arc::new(1u32) as Instance)).unwrap());
        let second = slot
            .resolve(|| -> Result<Instance, ()> { panic!("built twice") })
            .unwrap();

        assert!(Arc::ptr_eq(&first, second));
        assert!(storage.is_cached("n"));
        assert_eq!(storage.cached_len(), 1);
    }

    #[test]
    fn test_define_class_replaces() {
        let storage = ServiceStorage::new();
        let class = || ClassDescriptor::builder("Unit", |_args| Ok(())).build();

        assert!(storage.define_class(class()).is_none());
        assert!(storage.define_class(class()).is_some());
        assert!(storage.has_class("Unit"));
        assert!(!storage.has_class("Other"));
    }

    #[test]
    fn test_names() {
        let storage = ServiceStorage::new();
        storage.insert_entry("a".into(), ServiceEntry::from("A"));
        storage.insert_entry("b".into(), ServiceEntry::from("B"));

        let mut names = storage.names();
        names.sort();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(storage.len(), 2);
        assert!(!storage.is_cached("a"));
    }
}
