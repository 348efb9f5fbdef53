//! Tests for the listener registry.

use super::*;
use crate::test_utils::{new_log, Recording};

fn tags_of(snapshot: &Snapshot, known: &[(&'static str, &ListenerRef)]) -> Vec<&'static str> {
    snapshot
        .iter()
        .map(|l| {
            known
                .iter()
                .find(|(_, k)| same_listener(k, l))
                .map(|(tag, _)| *tag)
                .unwrap_or("?")
        })
        .collect()
}

#[test]
fn test_registry_starts_empty() {
    let registry = ListenerRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.snapshot("balance").is_empty());
    assert!(!registry.has_listeners("balance"));
}

#[test]
fn test_list_all_preserves_insertion_order() {
    let log = new_log();
    let a = Recording::shared("a", &log);
    let b = Recording::shared("b", &log);
    let c = Recording::shared("c", &log);

    let registry = ListenerRegistry::new();
    registry.register(a.clone(), PropertyFilter::named("balance"));
    registry.register(b.clone(), PropertyFilter::Any);
    registry.register(c.clone(), PropertyFilter::named("owner"));

    let all = registry.list_all();
    assert_eq!(all.len(), 3);
    assert!(same_listener(&all[0].listener, &a));
    assert!(same_listener(&all[1].listener, &b));
    assert!(same_listener(&all[2].listener, &c));
    assert_eq!(all[0].filter, PropertyFilter::named("balance"));
    assert!(all[1].filter.is_wildcard());
}

#[test]
fn test_duplicate_registrations_are_kept() {
    let log = new_log();
    let a = Recording::shared("a", &log);

    let registry = ListenerRegistry::new();
    registry.register(a.clone(), PropertyFilter::Any);
    registry.register(a.clone(), PropertyFilter::Any);

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.snapshot("balance").len(), 2);
}

#[test]
fn test_snapshot_puts_wildcards_first() {
    let log = new_log();
    let scoped_1 = Recording::shared("scoped_1", &log);
    let wild_1 = Recording::shared("wild_1", &log);
    let scoped_2 = Recording::shared("scoped_2", &log);
    let wild_2 = Recording::shared("wild_2", &log);
    let other = Recording::shared("other", &log);

    let registry = ListenerRegistry::new();
    registry.register(scoped_1.clone(), PropertyFilter::named("balance"));
    registry.register(wild_1.clone(), PropertyFilter::Any);
    registry.register(other.clone(), PropertyFilter::named("owner"));
    registry.register(scoped_2.clone(), PropertyFilter::named("balance"));
    registry.register(wild_2.clone(), PropertyFilter::Any);

    let known = [
        ("scoped_1", &scoped_1),
        ("wild_1", &wild_1),
        ("scoped_2", &scoped_2),
        ("wild_2", &wild_2),
        ("other", &other),
    ];
    let snapshot = registry.snapshot("balance");
    assert_eq!(
        tags_of(&snapshot, &known),
        vec!["wild_1", "wild_2", "scoped_1", "scoped_2"]
    );
}

#[test]
fn test_scoped_listener_only_matches_its_property() {
    let log = new_log();
    let a = Recording::shared("a", &log);

    let registry = ListenerRegistry::new();
    registry.register(a, PropertyFilter::named("balance"));

    assert_eq!(registry.snapshot("balance").len(), 1);
    assert!(registry.snapshot("owner").is_empty());
    assert!(registry.snapshot("balanceOwner").is_empty());
    assert!(registry.has_listeners("balance"));
    assert!(!registry.has_listeners("owner"));
}

#[test]
fn test_unregister_removes_every_filter() {
    let log = new_log();
    let a = Recording::shared("a", &log);
    let b = Recording::shared("b", &log);

    let registry = ListenerRegistry::new();
    registry.register(a.clone(), PropertyFilter::Any);
    registry.register(b.clone(), PropertyFilter::Any);
    registry.register(a.clone(), PropertyFilter::named("balance"));

    assert_eq!(registry.unregister(&a), 2);
    let all = registry.list_all();
    assert_eq!(all.len(), 1);
    assert!(same_listener(&all[0].listener, &b));
}

#[test]
fn test_unregister_unknown_is_noop() {
    let log = new_log();
    let a = Recording::shared("a", &log);
    let stranger = Recording::shared("a", &log);

    let registry = ListenerRegistry::new();
    registry.register(a, PropertyFilter::Any);

    assert_eq!(registry.unregister(&stranger), 0);
    assert_eq!(registry.unregister_property(&stranger, "balance"), 0);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_scoped_unregister_keeps_wildcard() {
    let log = new_log();
    let a = Recording::shared("a", &log);

    let registry = ListenerRegistry::new();
    registry.register(a.clone(), PropertyFilter::Any);
    registry.register(a.clone(), PropertyFilter::named("balance"));
    registry.register(a.clone(), PropertyFilter::named("owner"));

    assert_eq!(registry.unregister_property(&a, "balance"), 1);

    let filters: Vec<_> = registry.list_all().into_iter().map(|r| r.filter).collect();
    assert_eq!(filters, vec![PropertyFilter::Any, PropertyFilter::named("owner")]);

    // Naming a property never touches the wildcard entry.
    assert_eq!(registry.unregister_property(&a, "owner"), 1);
    assert_eq!(registry.unregister_property(&a, "owner"), 0);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_clear() {
    let log = new_log();
    let registry = ListenerRegistry::new();
    registry.register(Recording::shared("a", &log), PropertyFilter::Any);
    registry.clear();
    assert!(registry.is_empty());
}

#[test]
fn test_concurrent_registration() {
    let log = new_log();
    let registry = Arc::new(ListenerRegistry::new());

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let registry = Arc::clone(&registry);
            let log = Arc::clone(&log);
            scope.spawn(move || {
                for _ in 0..25 {
                    registry.register(Recording::shared("t", &log), PropertyFilter::Any);
                }
            });
        }
    });

    assert_eq!(registry.len(), 100);
}

#[test]
fn test_filter_display() {
    assert_eq!(PropertyFilter::Any.to_string(), "*");
    assert_eq!(PropertyFilter::named("balance").to_string(), "balance");
}
