//! Tests for the write interceptor.

use std::sync::{Arc, Mutex};

use beanwatch_core::{listener_fn, try_listener_fn, ListenerError, ListenerRef, PropertyChangeSupport};

use super::*;
use crate::rules::{FieldDescriptor, MemberDescriptor, PropertyNaming, TypeDescriptor};

const WALLET: TypeDescriptor = TypeDescriptor::observable("Wallet");

static SET_BALANCE: WriteSite = WriteSite::new(
    WALLET,
    MemberDescriptor::method("set_balance"),
    FieldDescriptor::scalar("balance"),
);
static SET_LABEL: WriteSite = WriteSite::new(
    WALLET,
    MemberDescriptor::method("set_label"),
    FieldDescriptor::scalar("label"),
);
static SET_TAGS: WriteSite = WriteSite::new(
    WALLET,
    MemberDescriptor::method("set_tags"),
    FieldDescriptor::list("tags"),
);
static INIT_BALANCE: WriteSite = WriteSite::new(
    WALLET,
    MemberDescriptor::constructor("new"),
    FieldDescriptor::scalar("balance"),
);

#[derive(Debug)]
struct Wallet {
    support: PropertyChangeSupport,
    balance: i64,
    label: String,
    tags: Vec<String>,
}

impl Wallet {
    fn new(balance: i64) -> Self {
        Self {
            support: PropertyChangeSupport::new("Wallet"),
            balance,
            label: String::new(),
            tags: Vec::new(),
        }
    }
}

impl Observable for Wallet {
    fn change_support(&self) -> &PropertyChangeSupport {
        &self.support
    }

    // `label` has no accessor.
    fn read_property(&self, property_name: &str) -> Option<PropertyValue> {
        match property_name {
            "balance" => Some(self.balance.to_property_value()),
            "tags" => Some(self.tags.to_property_value()),
            _ => None,
        }
    }
}

type Seen = Arc<Mutex<Vec<PropertyChangeEvent>>>;

fn recorder() -> (ListenerRef, Seen) {
    let seen: Seen = Arc::default();
    let sink = Arc::clone(&seen);
    let listener = listener_fn(move |event| sink.lock().unwrap().push(event.clone()));
    (listener, seen)
}

fn set_balance(interceptor: &Interceptor, wallet: &mut Wallet, value: i64) -> WriteOutcome {
    interceptor.write_property(wallet, &SET_BALANCE, |w| &mut w.balance, value)
}

#[test]
fn test_equal_write_is_suppressed() {
    let interceptor = Interceptor::default();
    let mut wallet = Wallet::new(100);
    let (listener, seen) = recorder();
    wallet.add_listener(listener);

    let outcome = set_balance(&interceptor, &mut wallet, 100);

    assert_eq!(outcome, WriteOutcome::Unchanged);
    assert_eq!(wallet.balance, 100);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_change_notifies_once_with_old_and_new() {
    let interceptor = Interceptor::default();
    let mut wallet = Wallet::new(100);
    let (listener, seen) = recorder();
    wallet.add_listener(listener);

    let outcome = set_balance(&interceptor, &mut wallet, 150);

    assert!(outcome.is_notified());
    assert_eq!(outcome.report().map(|r| r.delivered), Some(1));
    assert_eq!(wallet.balance, 150);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].property_name(), "balance");
    assert_eq!(seen[0].old_value(), &PropertyValue::I64(100));
    assert_eq!(seen[0].new_value(), &PropertyValue::I64(150));
    assert_eq!(seen[0].source(), wallet.source_id());
}

#[test]
fn test_capture_failure_fires_with_unknown_old_value() {
    let interceptor = Interceptor::default();
    let mut wallet = Wallet::new(0);
    let (listener, seen) = recorder();
    wallet.add_listener(listener);

    let first = interceptor.write_property(&mut wallet, &SET_LABEL, |w| &mut w.label, "x".to_string());
    // Same value again: the old value is still unreadable, so it fires again.
    let second = interceptor.write_property(&mut wallet, &SET_LABEL, |w| &mut w.label, "x".to_string());

    assert!(first.is_notified());
    assert!(second.is_notified());
    assert_eq!(wallet.label, "x");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].old_value().is_unknown());
    assert_eq!(seen[0].new_value().as_str(), Some("x"));
}

#[test]
fn test_capture_old_value() {
    let interceptor = Interceptor::default();
    let wallet = Wallet::new(7);
    assert_eq!(
        interceptor.capture_old_value(&wallet, "Wallet", "balance"),
        OldValue::Captured(PropertyValue::I64(7))
    );
    assert!(interceptor
        .capture_old_value(&wallet, "Wallet", "label")
        .is_unknown());
}

#[test]
fn test_wildcard_and_scoped_listener_receives_twice() {
    let interceptor = Interceptor::default();
    let mut wallet = Wallet::new(0);
    let (listener, seen) = recorder();
    wallet.add_listener(Arc::clone(&listener));
    wallet.add_property_listener("balance", listener);

    let outcome = set_balance(&interceptor, &mut wallet, 5);

    assert_eq!(outcome.report().map(|r| r.delivered), Some(2));
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn test_skipped_write_still_happens() {
    let interceptor = Interceptor::default();
    let mut wallet = Wallet::new(0);
    let (listener, seen) = recorder();
    wallet.add_listener(listener);

    let outcome = interceptor.write_property(&mut wallet, &INIT_BALANCE, |w| &mut w.balance, 42);

    assert_eq!(outcome, WriteOutcome::Skipped(SkipReason::ConstructorWrite));
    assert_eq!(wallet.balance, 42);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_failing_listener_does_not_undo_write() {
    let interceptor = Interceptor::default();
    let mut wallet = Wallet::new(0);
    let (after, seen) = recorder();
    wallet.add_listener(try_listener_fn(|_| Err(ListenerError::failed("nope"))));
    wallet.add_listener(after);

    let outcome = set_balance(&interceptor, &mut wallet, 9);

    let report = outcome.report().cloned().unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(wallet.balance, 9);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_collections_are_silent_by_default() {
    let interceptor = Interceptor::default();
    let mut wallet = Wallet::new(0);
    let (listener, seen) = recorder();
    wallet.add_listener(listener);

    let outcome = interceptor.write_property(&mut wallet, &SET_TAGS, |w| &mut w.tags, vec!["a".to_string()]);

    assert_eq!(outcome, WriteOutcome::Silent);
    assert_eq!(wallet.tags, vec!["a".to_string()]);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_collection_notify_on_change() {
    let interceptor = Interceptor::default().with_collection_policy(CollectionPolicy::NotifyOnChange);
    let mut wallet = Wallet::new(0);
    let (listener, seen) = recorder();
    wallet.add_listener(listener);

    let tags = vec!["a".to_string()];
    let first = interceptor.write_property(&mut wallet, &SET_TAGS, |w| &mut w.tags, tags.clone());
    let second = interceptor.write_property(&mut wallet, &SET_TAGS, |w| &mut w.tags, tags);

    assert!(first.is_notified());
    assert_eq!(second, WriteOutcome::Unchanged);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].old_value(), &PropertyValue::List(vec![]));
}

#[test]
fn test_collection_notify_on_replace() {
    let interceptor = Interceptor::default().with_collection_policy(CollectionPolicy::NotifyOnReplace);
    let mut wallet = Wallet::new(0);
    let (listener, seen) = recorder();
    wallet.add_listener(listener);

    for _ in 0..2 {
        let outcome = interceptor.write_property(&mut wallet, &SET_TAGS, |w| &mut w.tags, Vec::new());
        assert!(outcome.is_notified());
    }
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn test_member_name_naming_loses_old_value() {
    let rules = InterceptionRules::new().with_naming(PropertyNaming::MemberName);
    let interceptor = Interceptor::new(rules);
    let mut wallet = Wallet::new(3);
    let (listener, seen) = recorder();
    wallet.add_listener(listener);

    let outcome = set_balance(&interceptor, &mut wallet, 3);

    assert!(outcome.is_notified());
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].property_name(), "set_balance");
    assert!(seen[0].old_value().is_unknown());
}

#[test]
fn test_begin_and_complete_write() {
    let interceptor = Interceptor::default();
    let mut wallet = Wallet::new(10);
    let (listener, seen) = recorder();
    wallet.add_listener(listener);

    let pending = interceptor.begin_write(&wallet, &SET_BALANCE);
    assert!(pending.is_intercepted());
    assert!(pending.needs_new_value());
    assert_eq!(pending.property(), Some("balance"));
    assert_eq!(
        pending.old_value(),
        Some(&OldValue::Captured(PropertyValue::I64(10)))
    );

    wallet.balance += 5;
    let outcome = interceptor.complete_write(&wallet, pending, wallet.balance.to_property_value());

    assert!(outcome.is_notified());
    assert_eq!(seen.lock().unwrap()[0].new_value(), &PropertyValue::I64(15));
}

#[test]
fn test_maybe_notify_without_listeners() {
    let interceptor = Interceptor::default();
    let wallet = Wallet::new(0);

    assert_eq!(
        interceptor.maybe_notify(&wallet, "balance", OldValue::Captured(1.into()), 1.into()),
        None
    );
    let report = interceptor
        .maybe_notify(&wallet, "balance", OldValue::Captured(1.into()), 2.into())
        .unwrap();
    assert_eq!(report.delivered, 0);
}

#[test]
fn test_from_config() {
    let config = ObservingConfig::new()
        .with_collection_policy(CollectionPolicyConfig::NotifyOnReplace)
        .with_catch_panics(false);
    let interceptor = Interceptor::from_config(&config).unwrap();

    assert_eq!(interceptor.collection_policy(), CollectionPolicy::NotifyOnReplace);
    assert!(!interceptor.dispatcher().catch_panics());
    assert_eq!(interceptor.rules().naming(), PropertyNaming::Declared);
}

#[test]
fn test_from_config_rejects_malformed_exclusion() {
    let config = ObservingConfig::new().exclude_member("reset");
    assert!(matches!(
        Interceptor::from_config(&config),
        Err(RuleError::Config(_))
    ));
}
