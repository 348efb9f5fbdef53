//! Test utilities for beanwatch-core
//!
//! Provides listeners that record deliveries into a shared log so tests can
//! assert on delivery order across several listeners.

use std::sync::{Arc, Mutex};

use crate::error::ListenerError;
use crate::event::PropertyChangeEvent;
use crate::listener::{ListenerRef, PropertyChangeListener};

/// Shared log of `(listener tag, event)` pairs.
pub type DeliveryLog = Arc<Mutex<Vec<(&'static str, PropertyChangeEvent)>>>;

pub fn new_log() -> DeliveryLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn tags(log: &DeliveryLog) -> Vec<&'static str> {
    log.lock().unwrap().iter().map(|(tag, _)| *tag).collect()
}

/// Records each event under its tag.
#[derive(Debug)]
pub struct Recording {
    pub tag: &'static str,
    pub log: DeliveryLog,
}

impl Recording {
    pub fn shared(tag: &'static str, log: &DeliveryLog) -> ListenerRef {
        Arc::new(Self {
            tag,
            log: Arc::clone(log),
        })
    }
}

impl PropertyChangeListener for Recording {
    fn property_change(&self, event: &PropertyChangeEvent) -> Result<(), ListenerError> {
        self.log.lock().unwrap().push((self.tag, event.clone()));
        Ok(())
    }
}

/// Records, then reports an error.
#[derive(Debug)]
pub struct Failing {
    pub tag: &'static str,
    pub log: DeliveryLog,
}

impl PropertyChangeListener for Failing {
    fn property_change(&self, event: &PropertyChangeEvent) -> Result<(), ListenerError> {
        self.log.lock().unwrap().push((self.tag, event.clone()));
        Err(ListenerError::failed("rejected"))
    }
}

/// Panics on every event.
#[derive(Debug)]
pub struct Panicking;

impl PropertyChangeListener for Panicking {
    fn property_change(&self, _event: &PropertyChangeEvent) -> Result<(), ListenerError> {
        panic!("listener exploded");
    }
}
