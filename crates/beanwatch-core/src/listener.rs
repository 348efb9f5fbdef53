//! Property change listeners.

use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::error::ListenerError;
use crate::event::PropertyChangeEvent;

/// Receives change events from observables it is registered with.
///
/// Listeners are invoked synchronously on the thread that performed the
/// write. A listener that never returns blocks that write indefinitely.
pub trait PropertyChangeListener: Send + Sync + Debug {
    /// Called once per delivered event.
    ///
    /// Returning an error (or panicking) does not stop delivery to the
    /// remaining listeners and does not undo the write.
    fn property_change(&self, event: &PropertyChangeEvent) -> Result<(), ListenerError>;
}

/// Shared handle under which a listener is registered.
///
/// Registration and removal go by identity: clones of the same `Arc` are the
/// same listener, separately allocated listeners are different listeners.
pub type ListenerRef = Arc<dyn PropertyChangeListener>;

/// Identity comparison of two listener handles.
pub fn same_listener(a: &ListenerRef, b: &ListenerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Adapter turning a closure into a listener.
pub struct FnListener<F> {
    name: &'static str,
    f: F,
}

impl<F> FnListener<F>
where
    F: Fn(&PropertyChangeEvent) -> Result<(), ListenerError> + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> PropertyChangeListener for FnListener<F>
where
    F: Fn(&PropertyChangeEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn property_change(&self, event: &PropertyChangeEvent) -> Result<(), ListenerError> {
        (self.f)(event)
    }
}

impl<F> Debug for FnListener<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener").field("name", &self.name).finish()
    }
}

/// Wraps an infallible closure as a shareable listener.
///
/// ```
/// use beanwatch_core::listener_fn;
///
/// let listener = listener_fn(|event| println!("{} changed", event.property_name()));
/// # let _ = listener;
/// ```
pub fn listener_fn<F>(f: F) -> ListenerRef
where
    F: Fn(&PropertyChangeEvent) + Send + Sync + 'static,
{
    Arc::new(FnListener::new("listener_fn", move |event: &PropertyChangeEvent| {
        f(event);
        Ok(())
    }))
}

/// Wraps a fallible closure as a shareable listener.
pub fn try_listener_fn<F>(f: F) -> ListenerRef
where
    F: Fn(&PropertyChangeEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    Arc::new(FnListener::new("try_listener_fn", f))
}

/// A listener that logs every event it receives.
///
/// Useful for debugging an object graph without writing a listener.
#[derive(Debug, Clone, Default)]
pub struct LoggingListener {
    prefix: String,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl PropertyChangeListener for LoggingListener {
    fn property_change(&self, event: &PropertyChangeEvent) -> Result<(), ListenerError> {
        tracing::info!(
            event = "property_change",
            prefix = %self.prefix,
            source = %event.source(),
            property = %event.property_name(),
            old = %event.old_value(),
            new = %event.new_value(),
        );
        Ok(())
    }
}
