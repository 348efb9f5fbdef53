//! Change notification events.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::decision::should_notify;
use crate::value::PropertyValue;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an observable object.
///
/// The instance number is allocated once, when the object's
/// [`PropertyChangeSupport`](crate::PropertyChangeSupport) is created, so the
/// identity survives moves of the owning struct. Numbers are never reused
/// within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId {
    type_name: &'static str,
    instance: u64,
}

impl SourceId {
    /// Allocates a fresh identity for an object of the named type.
    pub fn allocate(type_name: &'static str) -> Self {
        Self {
            type_name,
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_name, self.instance)
    }
}

/// One change of one property.
///
/// Events are immutable: listeners receive `&PropertyChangeEvent` and the
/// same event value is handed to every listener of a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChangeEvent {
    source: SourceId,
    property_name: Arc<str>,
    old_value: PropertyValue,
    new_value: PropertyValue,
}

impl PropertyChangeEvent {
    pub fn new(
        source: SourceId,
        property_name: impl Into<Arc<str>>,
        old_value: PropertyValue,
        new_value: PropertyValue,
    ) -> Self {
        Self {
            source,
            property_name: property_name.into(),
            old_value,
            new_value,
        }
    }

    /// Identity of the observable that changed.
    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn old_value(&self) -> &PropertyValue {
        &self.old_value
    }

    pub fn new_value(&self) -> &PropertyValue {
        &self.new_value
    }

    /// Whether old and new value differ, i.e. whether this event would be
    /// delivered by `fire_event`.
    pub fn is_change(&self) -> bool {
        should_notify(&self.old_value, &self.new_value)
    }
}

impl fmt::Display for PropertyChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}: {} -> {}",
            self.source, self.property_name, self.old_value, self.new_value
        )
    }
}
