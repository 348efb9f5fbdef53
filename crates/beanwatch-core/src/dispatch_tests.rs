//! Tests for the dispatch engine.

use std::sync::{Arc, Mutex};

use super::*;
use crate::error::ListenerError;
use crate::event::SourceId;
use crate::listener::{ListenerRef, LoggingListener, PropertyChangeListener};
use crate::registry::PropertyFilter;
use crate::test_utils::{new_log, tags, DeliveryLog, Failing, Panicking, Recording};
use crate::value::PropertyValue;

fn balance_event() -> PropertyChangeEvent {
    PropertyChangeEvent::new(
        SourceId::allocate("Account"),
        "balance",
        PropertyValue::I64(100),
        PropertyValue::I64(150),
    )
}

#[test]
fn test_dispatch_without_listeners() {
    let registry = ListenerRegistry::new();
    let report = Dispatcher::new().dispatch(&balance_event(), &registry);
    assert_eq!(report.delivered, 0);
    assert!(report.is_clean());
}

#[test]
fn test_wildcards_fire_before_scoped() {
    let log = new_log();
    let registry = ListenerRegistry::new();
    registry.register(Recording::shared("scoped_1", &log), PropertyFilter::named("balance"));
    registry.register(Recording::shared("wild_1", &log), PropertyFilter::Any);
    registry.register(Recording::shared("scoped_2", &log), PropertyFilter::named("balance"));
    registry.register(Recording::shared("wild_2", &log), PropertyFilter::Any);

    let report = Dispatcher::new().dispatch(&balance_event(), &registry);

    assert_eq!(report.delivered, 4);
    assert_eq!(tags(&log), vec!["wild_1", "wild_2", "scoped_1", "scoped_2"]);
}

#[test]
fn test_same_listener_wildcard_and_scoped_delivers_twice() {
    let log = new_log();
    let listener = Recording::shared("l", &log);
    let registry = ListenerRegistry::new();
    registry.register(listener.clone(), PropertyFilter::Any);
    registry.register(listener, PropertyFilter::named("balance"));

    let report = Dispatcher::new().dispatch(&balance_event(), &registry);

    assert_eq!(report.delivered, 2);
    let entries = log.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|(_, e)| e.property_name() == "balance"));
}

#[test]
fn test_listener_error_does_not_stop_dispatch() {
    let log = new_log();
    let registry = ListenerRegistry::new();
    registry.register(Recording::shared("first", &log), PropertyFilter::Any);
    registry.register(
        Arc::new(Failing {
            tag: "failing",
            log: Arc::clone(&log),
        }),
        PropertyFilter::Any,
    );
    registry.register(Recording::shared("last", &log), PropertyFilter::Any);

    let report = Dispatcher::new().dispatch(&balance_event(), &registry);

    assert_eq!(tags(&log), vec!["first", "failing", "last"]);
    assert_eq!(report.delivered, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].message, "rejected");
}

#[test]
fn test_listener_panic_is_contained() {
    let log = new_log();
    let registry = ListenerRegistry::new();
    registry.register(Arc::new(Panicking), PropertyFilter::Any);
    registry.register(Recording::shared("after", &log), PropertyFilter::Any);

    let report = Dispatcher::new().dispatch(&balance_event(), &registry);

    assert_eq!(tags(&log), vec!["after"]);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("listener exploded"));
}

#[test]
#[should_panic(expected = "listener exploded")]
fn test_listener_panic_propagates_when_not_caught() {
    let registry = ListenerRegistry::new();
    registry.register(Arc::new(Panicking), PropertyFilter::Any);

    Dispatcher::new()
        .with_catch_panics(false)
        .dispatch(&balance_event(), &registry);
}

/// Unregisters `victim` from `registry` when it sees an event.
#[derive(Debug)]
struct Remover {
    registry: Arc<ListenerRegistry>,
    victim: Mutex<Option<ListenerRef>>,
    log: DeliveryLog,
}

impl PropertyChangeListener for Remover {
    fn property_change(&self, event: &PropertyChangeEvent) -> Result<(), ListenerError> {
        self.log.lock().unwrap().push(("remover", event.clone()));
        if let Some(victim) = self.victim.lock().unwrap().take() {
            self.registry.unregister(&victim);
        }
        Ok(())
    }
}

#[test]
fn test_unregister_mid_dispatch_affects_only_later_events() {
    let log = new_log();
    let registry = Arc::new(ListenerRegistry::new());
    let victim = Recording::shared("victim", &log);

    registry.register(
        Arc::new(Remover {
            registry: Arc::clone(&registry),
            victim: Mutex::new(Some(victim.clone())),
            log: Arc::clone(&log),
        }),
        PropertyFilter::Any,
    );
    registry.register(victim, PropertyFilter::Any);

    let dispatcher = Dispatcher::new();
    dispatcher.dispatch(&balance_event(), &registry);
    assert_eq!(tags(&log), vec!["remover", "victim"]);

    dispatcher.dispatch(&balance_event(), &registry);
    assert_eq!(tags(&log), vec!["remover", "victim", "remover"]);
}

/// Registers a new listener on every event it sees.
#[derive(Debug)]
struct Adder {
    registry: Arc<ListenerRegistry>,
    log: DeliveryLog,
}

impl PropertyChangeListener for Adder {
    fn property_change(&self, _event: &PropertyChangeEvent) -> Result<(), ListenerError> {
        self.registry
            .register(Recording::shared("late", &self.log), PropertyFilter::Any);
        Ok(())
    }
}

#[test]
fn test_register_mid_dispatch_is_not_delivered_in_flight() {
    let log = new_log();
    let registry = Arc::new(ListenerRegistry::new());
    registry.register(
        Arc::new(Adder {
            registry: Arc::clone(&registry),
            log: Arc::clone(&log),
        }),
        PropertyFilter::Any,
    );

    let report = Dispatcher::new().dispatch(&balance_event(), &registry);

    assert_eq!(report.delivered, 1);
    assert!(tags(&log).is_empty());
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_logging_listener_is_a_clean_delivery() {
    let log = new_log();
    let registry = ListenerRegistry::new();
    registry.register(Arc::new(LoggingListener::with_prefix("audit")), PropertyFilter::Any);
    registry.register(Recording::shared("after", &log), PropertyFilter::Any);

    let report = Dispatcher::new().dispatch(&balance_event(), &registry);

    assert_eq!(report.delivered, 2);
    assert!(report.is_clean());
    assert_eq!(tags(&log), vec!["after"]);
    assert_eq!(LoggingListener::new().property_change(&balance_event()), Ok(()));
}
