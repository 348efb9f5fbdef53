//! beanwatch Core - change events, listener registry and dispatch
//!
//! This crate provides the runtime half of transparent change notification:
//! - Property values and the equality that decides whether a write changed anything
//! - Immutable change events
//! - Per-object listener registries with wildcard and per-property filters
//! - A synchronous dispatcher with per-listener failure isolation
//! - The [`Observable`] capability implemented by participating objects
//!
//! Deciding *which* writes are intercepted lives in `beanwatch-intercept`.

pub mod decision;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod listener;
pub mod registry;
pub mod support;
pub mod value;

#[cfg(test)]
mod test_utils;

pub use decision::{should_notify, CollectionPolicy, OldValue};
pub use dispatch::{DispatchReport, Dispatcher, ListenerFailure};
pub use error::ListenerError;
pub use event::{PropertyChangeEvent, SourceId};
pub use listener::{
    listener_fn, same_listener, try_listener_fn, FnListener, ListenerRef, LoggingListener,
    PropertyChangeListener,
};
pub use registry::{ListenerRegistry, PropertyFilter, Registration, Snapshot};
pub use support::{Observable, PropertyChangeSupport};
pub use value::{OpaqueRef, PropertyValue, ToPropertyValue};
