//! Listener fixtures.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use beanwatch_core::{PropertyChangeEvent, PropertyChangeListener, SourceId};
//! use beanwatch_test::listeners::RecordingListener;
//!
//! let recorder = Arc::new(RecordingListener::new("audit"));
//! let event = PropertyChangeEvent::new(SourceId::allocate("Account"), "balance", 1.into(), 2.into());
//! recorder.property_change(&event).unwrap();
//! assert_eq!(recorder.property_names(), vec!["balance".to_string()]);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use beanwatch_core::{ListenerError, ListenerRef, PropertyChangeEvent, PropertyChangeListener};

/// Records every event it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    name: &'static str,
    events: Mutex<Vec<PropertyChangeEvent>>,
}

impl RecordingListener {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Creates the listener together with a registrable handle to it.
    pub fn shared(name: &'static str) -> (Arc<Self>, ListenerRef) {
        let recorder = Arc::new(Self::new(name));
        let handle: ListenerRef = recorder.clone();
        (recorder, handle)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn events(&self) -> Vec<PropertyChangeEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn property_names(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|e| e.property_name().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl PropertyChangeListener for RecordingListener {
    fn property_change(&self, event: &PropertyChangeEvent) -> Result<(), ListenerError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Counts deliveries.
#[derive(Debug, Default)]
pub struct CountingListener {
    count: AtomicUsize,
}

impl CountingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> (Arc<Self>, ListenerRef) {
        let counter = Arc::new(Self::new());
        let handle: ListenerRef = counter.clone();
        (counter, handle)
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl PropertyChangeListener for CountingListener {
    fn property_change(&self, _event: &PropertyChangeEvent) -> Result<(), ListenerError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Rejects every event; panics instead when built with [`FailingListener::panicking`].
#[derive(Debug, Default)]
pub struct FailingListener {
    panic: bool,
}

impl FailingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panicking() -> Self {
        Self { panic: true }
    }
}

impl PropertyChangeListener for FailingListener {
    fn property_change(&self, event: &PropertyChangeEvent) -> Result<(), ListenerError> {
        if self.panic {
            panic!("listener panicked on {}", event.property_name());
        }
        Err(ListenerError::failed(format!(
            "rejected change of {}",
            event.property_name()
        )))
    }
}
