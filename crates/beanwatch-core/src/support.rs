//! Change support owned by each observable, and the observable capability.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::decision::should_notify;
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::event::{PropertyChangeEvent, SourceId};
use crate::listener::ListenerRef;
use crate::registry::{ListenerRegistry, PropertyFilter, Registration};
use crate::value::PropertyValue;

/// Listener bookkeeping embedded in an observable object.
///
/// The registry is created on first registration and dropped together with
/// the owning object; there is no other cleanup. Cloning yields a support
/// with a new identity and no listeners, so a cloned object starts
/// unobserved.
pub struct PropertyChangeSupport {
    source: SourceId,
    registry: OnceLock<ListenerRegistry>,
    dispatcher: Dispatcher,
}

impl PropertyChangeSupport {
    /// Creates the support for an object of the named type.
    pub fn new(type_name: &'static str) -> Self {
        Self {
            source: SourceId::allocate(type_name),
            registry: OnceLock::new(),
            dispatcher: Dispatcher::default(),
        }
    }

    /// Creates the support, naming the type after `T`.
    pub fn for_type<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        Self::new(base.rsplit("::").next().unwrap_or(base))
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Registers `listener` for every property.
    pub fn add_listener(&self, listener: ListenerRef) {
        self.registry().register(listener, PropertyFilter::Any);
    }

    /// Registers `listener` for one property.
    pub fn add_property_listener(&self, property_name: impl Into<Arc<str>>, listener: ListenerRef) {
        self.registry()
            .register(listener, PropertyFilter::named(property_name));
    }

    /// Removes every registration of `listener`.
    pub fn remove_listener(&self, listener: &ListenerRef) {
        if let Some(registry) = self.registry.get() {
            registry.unregister(listener);
        }
    }

    /// Removes the registrations of `listener` scoped to `property_name`.
    pub fn remove_property_listener(&self, property_name: &str, listener: &ListenerRef) {
        if let Some(registry) = self.registry.get() {
            registry.unregister_property(listener, property_name);
        }
    }

    /// Registered listeners in registration order, one entry per registration.
    pub fn listeners(&self) -> Vec<ListenerRef> {
        self.registrations()
            .into_iter()
            .map(|r| r.listener)
            .collect()
    }

    /// Registrations in registration order, with their filters.
    pub fn registrations(&self) -> Vec<Registration> {
        self.registry
            .get()
            .map(ListenerRegistry::list_all)
            .unwrap_or_default()
    }

    pub fn has_listeners(&self, property_name: &str) -> bool {
        self.registry
            .get()
            .is_some_and(|r| r.has_listeners(property_name))
    }

    /// Fires a change of `property_name` unless `old` equals `new`.
    ///
    /// Returns `None` when the change was suppressed.
    pub fn fire_property_change(
        &self,
        property_name: &str,
        old: PropertyValue,
        new: PropertyValue,
    ) -> Option<DispatchReport> {
        if !should_notify(&old, &new) {
            debug!(
                event = "change_suppressed",
                source = %self.source,
                property = %property_name,
                value = %new,
            );
            return None;
        }
        let event = PropertyChangeEvent::new(self.source, property_name, old, new);
        Some(self.dispatch_with(&self.dispatcher, &event))
    }

    /// Fires an existing event unless its old and new values are equal.
    ///
    /// The event is delivered as given, whatever its recorded source.
    pub fn fire_event(&self, event: &PropertyChangeEvent) -> Option<DispatchReport> {
        if !event.is_change() {
            debug!(
                event = "change_suppressed",
                source = %event.source(),
                property = %event.property_name(),
            );
            return None;
        }
        Some(self.dispatch_with(&self.dispatcher, event))
    }

    /// Delivers `event` through `dispatcher` without consulting the change
    /// decision. Callers applying their own policy (collection writes) use
    /// this directly.
    pub fn dispatch_with(&self, dispatcher: &Dispatcher, event: &PropertyChangeEvent) -> DispatchReport {
        match self.registry.get() {
            Some(registry) => dispatcher.dispatch(event, registry),
            None => DispatchReport::default(),
        }
    }

    fn registry(&self) -> &ListenerRegistry {
        self.registry.get_or_init(ListenerRegistry::new)
    }
}

impl Default for PropertyChangeSupport {
    fn default() -> Self {
        Self::new("Observable")
    }
}

impl Clone for PropertyChangeSupport {
    fn clone(&self) -> Self {
        Self::new(self.source.type_name()).with_dispatcher(self.dispatcher)
    }
}

// Support is bookkeeping, not state: it never makes two objects unequal.
impl PartialEq for PropertyChangeSupport {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for PropertyChangeSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChangeSupport")
            .field("source", &self.source)
            .field("registry", &self.registry.get())
            .finish()
    }
}

/// Capability of an object that announces changes to its properties.
///
/// Implementors only provide [`change_support`](Observable::change_support);
/// generated implementations also override
/// [`read_property`](Observable::read_property) so the old value of a
/// property can be captured before it is overwritten.
pub trait Observable {
    fn change_support(&self) -> &PropertyChangeSupport;

    /// Current value of the named property, if it can be read.
    ///
    /// `None` is treated as a capture failure: the write still proceeds and
    /// the event carries [`PropertyValue::Unknown`] as its old value.
    fn read_property(&self, _property_name: &str) -> Option<PropertyValue> {
        None
    }

    fn source_id(&self) -> SourceId {
        self.change_support().source()
    }

    fn add_listener(&self, listener: ListenerRef) {
        self.change_support().add_listener(listener);
    }

    fn add_property_listener(&self, property_name: &str, listener: ListenerRef) {
        self.change_support()
            .add_property_listener(property_name, listener);
    }

    fn remove_listener(&self, listener: &ListenerRef) {
        self.change_support().remove_listener(listener);
    }

    fn remove_property_listener(&self, property_name: &str, listener: &ListenerRef) {
        self.change_support()
            .remove_property_listener(property_name, listener);
    }

    /// All registered listeners, wildcard and scoped, in registration order.
    fn list_listeners(&self) -> Vec<ListenerRef> {
        self.change_support().listeners()
    }

    fn fire_property_change(
        &self,
        property_name: &str,
        old: PropertyValue,
        new: PropertyValue,
    ) -> Option<DispatchReport> {
        self.change_support()
            .fire_property_change(property_name, old, new)
    }

    fn fire_event(&self, event: &PropertyChangeEvent) -> Option<DispatchReport> {
        self.change_support().fire_event(event)
    }
}

#[cfg(test)]
#[path = "support_tests.rs"]
mod tests;
