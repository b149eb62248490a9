// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use forge_core::{Container, Error};

struct Counter(AtomicUsize);

struct X;
struct Y;

#[test]
fn singleton_provider_runs_exactly_once_across_concurrent_resolvers() {
    let container = Container::new();
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    container
        .for_type::<Counter>()
        .provider(|_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(5));
            Ok(Counter(AtomicUsize::new(0)))
        })
        .unwrap();
    container.build().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let c = container.clone();
            std::thread::spawn(move || c.resolve::<Counter>().unwrap())
        })
        .collect();

    let first = handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>();
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    for instance in &first[1..] {
        assert!(Arc::ptr_eq(&first[0], instance));
    }
}

#[test]
fn transient_provider_runs_once_per_resolution_and_never_caches() {
    let container = Container::new();
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    container
        .for_type::<Counter>()
        .transient()
        .provider(|_| {
            let n = CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(Counter(AtomicUsize::new(n)))
        })
        .unwrap();
    container.build().unwrap();

    let a = container.resolve::<Counter>().unwrap();
    let b = container.resolve::<Counter>().unwrap();
    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn instance_registration_round_trips() {
    let container = Container::new();
    container.for_type::<Counter>().instance(Counter(AtomicUsize::new(42))).unwrap();
    container.build().unwrap();

    let v = container.resolve::<Counter>().unwrap();
    assert_eq!(v.0.load(Ordering::SeqCst), 42);
}

#[test]
fn self_referential_provider_is_a_cycle() {
    let container = Container::new();
    container.for_type::<X>().provider(|c| {
        c.resolve::<X>()?;
        Ok(X)
    }).unwrap();
    container.build().unwrap();

    let err = container.resolve::<X>().unwrap_err();
    match err {
        Error::Cycle { chain } => assert!(chain.len() >= 2),
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn mutual_cycle_reports_full_chain() {
    let container = Container::new();
    container.for_type::<X>().provider(|c| {
        c.resolve::<Y>()?;
        Ok(X)
    }).unwrap();
    container.for_type::<Y>().provider(|c| {
        c.resolve::<X>()?;
        Ok(Y)
    }).unwrap();
    container.build().unwrap();

    let err = container.resolve::<X>().unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("->"));
}

#[test]
fn independent_concurrent_resolutions_never_false_positive_cycle() {
    let container = Container::new();
    container.for_type::<X>().provider(|_| Ok(X)).unwrap();
    container.for_type::<Y>().provider(|_| Ok(Y)).unwrap();
    container.build().unwrap();

    let c1 = container.clone();
    let c2 = container.clone();
    let h1 = std::thread::spawn(move || c1.resolve::<X>().map(|_| ()));
    let h2 = std::thread::spawn(move || c2.resolve::<Y>().map(|_| ()));
    h1.join().unwrap().unwrap();
    h2.join().unwrap().unwrap();
}

#[test]
fn duplicate_registration_without_replace_errors() {
    let container = Container::new();
    container.for_type::<X>().provider(|_| Ok(X)).unwrap();
    let err = container.for_type::<X>().provider(|_| Ok(X)).unwrap_err();
    assert!(matches!(err, Error::Duplicate(_)));
}

#[test]
fn replace_allows_overwrite() {
    let container = Container::new();
    container.for_type::<X>().provider(|_| Ok(X)).unwrap();
    container.for_type::<X>().replace().provider(|_| Ok(X)).unwrap();
}

#[test]
fn registration_after_build_errors() {
    let container = Container::new();
    container.build().unwrap();
    let err = container.for_type::<X>().provider(|_| Ok(X)).unwrap_err();
    assert!(matches!(err, Error::AlreadyBuilt));
}

#[test]
fn build_is_idempotent() {
    let container = Container::new();
    container.for_type::<X>().eager().provider(|_| Ok(X)).unwrap();
    container.build().unwrap();
    container.build().unwrap();
}

#[test]
fn not_found_for_unregistered_type() {
    let container = Container::new();
    container.build().unwrap();
    let err = container.resolve::<X>().unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn snapshot_before_build_is_not_yet_built() {
    let container = Container::new();
    let err = container.snapshot().unwrap_err();
    assert!(matches!(err, Error::NotYetBuilt));
}

#[test]
fn named_instances_are_independent() {
    let container = Container::new();
    container.for_type::<Counter>().named("a").instance(Counter(AtomicUsize::new(1))).unwrap();
    container.for_type::<Counter>().named("b").instance(Counter(AtomicUsize::new(2))).unwrap();
    container.build().unwrap();

    assert_eq!(container.resolve_named::<Counter>("a").unwrap().0.load(Ordering::SeqCst), 1);
    assert_eq!(container.resolve_named::<Counter>("b").unwrap().0.load(Ordering::SeqCst), 2);
}
