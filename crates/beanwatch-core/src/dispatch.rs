//! Dispatch engine.
//!
//! Delivers one [`PropertyChangeEvent`] to the listeners a
//! [`ListenerRegistry`] selects for it. Delivery is synchronous, on the
//! calling thread, in snapshot order: wildcard listeners first, then
//! listeners scoped to the event's property, each group in registration
//! order.
//!
//! # Failure isolation
//!
//! A listener returning an error, or panicking when `catch_panics` is set,
//! is logged and recorded in the [`DispatchReport`]; the remaining listeners
//! still run. Nothing a listener does can undo the write that produced the
//! event.
//!
//! # Re-entrancy
//!
//! The snapshot is taken before the first listener runs and no lock is held
//! while listeners execute. Listeners may register or unregister (affecting
//! only later dispatches) and may write other observable properties, which
//! start their own independent dispatch. Cycles are not detected.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{trace, warn};

use crate::event::PropertyChangeEvent;
use crate::registry::ListenerRegistry;

/// A listener that failed during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Position of the listener in the dispatch order.
    pub index: usize,
    /// Debug rendering of the listener.
    pub listener: String,
    pub message: String,
}

/// Summary of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of listeners invoked, failed ones included.
    pub delivered: usize,
    pub failures: Vec<ListenerFailure>,
}

impl DispatchReport {
    /// True when every listener returned successfully.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Synchronous dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatcher {
    catch_panics: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self { catch_panics: true }
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a panicking listener is contained (default) or propagates to
    /// the writer.
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    pub fn catch_panics(&self) -> bool {
        self.catch_panics
    }

    /// Delivers `event` to every listener `registry` selects for it.
    pub fn dispatch(&self, event: &PropertyChangeEvent, registry: &ListenerRegistry) -> DispatchReport {
        let listeners = registry.snapshot(event.property_name());
        let mut report = DispatchReport::default();

        trace!(
            event = "dispatch",
            source = %event.source(),
            property = %event.property_name(),
            listeners = listeners.len(),
        );

        for (index, listener) in listeners.iter().enumerate() {
            report.delivered += 1;

            let outcome = if self.catch_panics {
                match catch_unwind(AssertUnwindSafe(|| listener.property_change(event))) {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    Err(payload) => Err(panic_message(payload.as_ref())),
                }
            } else {
                listener.property_change(event).map_err(|e| e.to_string())
            };

            if let Err(message) = outcome {
                warn!(
                    event = "listener_failed",
                    source = %event.source(),
                    property = %event.property_name(),
                    index,
                    error = %message,
                );
                report.failures.push(ListenerFailure {
                    index,
                    listener: format!("{:?}", listener),
                    message,
                });
            }
        }

        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
