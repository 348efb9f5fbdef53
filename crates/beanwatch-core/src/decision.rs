//! Change decision procedure.
//!
//! Decides whether a write is a real change that must be announced. The
//! generic rule compares old and new value with [`PropertyValue`] equality.
//! Collection-typed properties bypass the generic rule and follow a
//! [`CollectionPolicy`] instead, since mutating their contents in place never
//! produces an old/new pair to compare.

use crate::value::PropertyValue;

/// Returns true when `old` and `new` differ and listeners must be told.
///
/// An unknown old value is never equal to anything, so a failed capture
/// always notifies.
pub fn should_notify(old: &PropertyValue, new: &PropertyValue) -> bool {
    old != new
}

/// Outcome of capturing a property's value before a write.
#[derive(Debug, Clone, PartialEq)]
pub enum OldValue {
    /// The current value was read through the accessor contract.
    Captured(PropertyValue),
    /// The value could not be read.
    Unknown,
}

impl OldValue {
    /// The value to surface in the event; `Unknown` becomes the sentinel.
    pub fn into_value(self) -> PropertyValue {
        match self {
            OldValue::Captured(v) => v,
            OldValue::Unknown => PropertyValue::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, OldValue::Unknown)
    }
}

impl From<Option<PropertyValue>> for OldValue {
    fn from(value: Option<PropertyValue>) -> Self {
        match value {
            Some(v) => OldValue::Captured(v),
            None => OldValue::Unknown,
        }
    }
}

/// How writes to list-like and map-like properties are announced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CollectionPolicy {
    /// The write proceeds and nothing is fired.
    #[default]
    Ignore,
    /// Every write of a new collection fires, without comparing contents.
    NotifyOnReplace,
    /// Fire only when the written collection differs from the previous one.
    NotifyOnChange,
}

impl CollectionPolicy {
    /// Whether the policy needs the old value before the write.
    pub fn captures_old_value(self) -> bool {
        !matches!(self, CollectionPolicy::Ignore)
    }

    pub fn should_notify(self, old: &PropertyValue, new: &PropertyValue) -> bool {
        match self {
            CollectionPolicy::Ignore => false,
            CollectionPolicy::NotifyOnReplace => true,
            CollectionPolicy::NotifyOnChange => should_notify(old, new),
        }
    }
}
