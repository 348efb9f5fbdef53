//! Per-object listener registry.
//!
//! Registrations are kept in a single vector in insertion order. Each entry
//! pairs a listener with a [`PropertyFilter`]; the same listener may appear
//! any number of times under any filters and every entry is delivered
//! separately.
//!
//! The registry is safe to share between threads. Mutations take a write
//! lock; dispatch takes a read lock only long enough to copy the matching
//! listeners into a [`Snapshot`], so listeners run without any lock held and
//! may themselves register or unregister.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use smallvec::SmallVec;

use crate::listener::{same_listener, ListenerRef};

/// Listeners selected for one dispatch, in delivery order.
pub type Snapshot = SmallVec<[ListenerRef; 8]>;

/// Which property names a registration matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyFilter {
    /// Every property of the object.
    Any,
    /// Exactly the named property.
    Named(Arc<str>),
}

impl PropertyFilter {
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        PropertyFilter::Named(name.into())
    }

    pub fn matches(&self, property_name: &str) -> bool {
        match self {
            PropertyFilter::Any => true,
            PropertyFilter::Named(name) => &**name == property_name,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, PropertyFilter::Any)
    }
}

impl fmt::Display for PropertyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyFilter::Any => f.write_str("*"),
            PropertyFilter::Named(name) => f.write_str(name),
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone)]
pub struct Registration {
    pub filter: PropertyFilter,
    pub listener: ListenerRef,
}

/// Ordered, thread-safe set of listener registrations.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: RwLock<Vec<Registration>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration. No deduplication is performed.
    pub fn register(&self, listener: ListenerRef, filter: PropertyFilter) {
        self.write().push(Registration { filter, listener });
    }

    /// Removes every registration of `listener`, whatever its filter.
    ///
    /// Returns the number of entries removed; unknown listeners are a no-op.
    pub fn unregister(&self, listener: &ListenerRef) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|r| !same_listener(&r.listener, listener));
        before - entries.len()
    }

    /// Removes the registrations of `listener` scoped to `property_name`.
    ///
    /// Wildcard registrations of the same listener are left in place.
    pub fn unregister_property(&self, listener: &ListenerRef, property_name: &str) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|r| {
            let scoped_here = matches!(&r.filter, PropertyFilter::Named(n) if &**n == property_name);
            !(scoped_here && same_listener(&r.listener, listener))
        });
        before - entries.len()
    }

    /// All registrations in insertion order.
    pub fn list_all(&self) -> Vec<Registration> {
        self.read().clone()
    }

    /// Listeners to invoke for a change of `property_name`.
    ///
    /// Wildcard registrations come first, then registrations scoped to the
    /// property; each group keeps insertion order.
    pub fn snapshot(&self, property_name: &str) -> Snapshot {
        let entries = self.read();
        let wildcard = entries
            .iter()
            .filter(|r| r.filter.is_wildcard())
            .map(|r| Arc::clone(&r.listener));
        let scoped = entries
            .iter()
            .filter(|r| !r.filter.is_wildcard() && r.filter.matches(property_name))
            .map(|r| Arc::clone(&r.listener));
        wildcard.chain(scoped).collect()
    }

    /// Whether any registration would receive a change of `property_name`.
    pub fn has_listeners(&self, property_name: &str) -> bool {
        self.read().iter().any(|r| r.filter.matches(property_name))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    // Listeners never run under the lock, and no critical section leaves the
    // vector half-updated, so a poisoned lock still guards a valid vector.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Registration>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Registration>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.read();
        let wildcard = entries.iter().filter(|r| r.filter.is_wildcard()).count();
        f.debug_struct("ListenerRegistry")
            .field("wildcard", &wildcard)
            .field("scoped", &(entries.len() - wildcard))
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
