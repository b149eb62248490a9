// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use forge_eventbus::{EventBus, SubscribeOptions};
use forge_worker::Worker;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
struct Ping(u32);

#[derive(Clone)]
struct Other;

#[tokio::test]
async fn exact_topic_and_wildcard_both_receive() {
    let bus = EventBus::new();
    let exact_hits = Arc::new(AtomicUsize::new(0));
    let wildcard_hits = Arc::new(AtomicUsize::new(0));

    let exact_handle = {
        let hits = exact_hits.clone();
        bus.subscribe::<Ping, _>(Some("orders"), SubscribeOptions::default(), move |_ctx, _event| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    };
    let wildcard_handle = {
        let hits = wildcard_hits.clone();
        bus.subscribe::<Ping, _>(None, SubscribeOptions::default(), move |_ctx, _event| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    };

    let ctx = CancellationToken::new();
    bus.publish(&ctx, Ping(1), Some("orders")).await;
    bus.publish(&ctx, Ping(2), Some("other-topic")).await;

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(exact_hits.load(Ordering::SeqCst), 1, "only the matching-topic publish reaches the exact subscriber");
    assert_eq!(wildcard_hits.load(Ordering::SeqCst), 2, "the wildcard subscriber sees every topic");

    exact_handle.unsubscribe();
    wildcard_handle.unsubscribe();
}

#[tokio::test]
async fn unsubscribe_is_idempotent_and_stops_delivery() {
    let bus = EventBus::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let handle = {
        let hits = hits.clone();
        bus.subscribe::<Ping, _>(None, SubscribeOptions::default(), move |_ctx, _event| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    };

    let ctx = CancellationToken::new();
    bus.publish(&ctx, Ping(1), None).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    handle.unsubscribe();
    handle.unsubscribe(); // idempotent, must not panic

    bus.publish(&ctx, Ping(2), None).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn noop_handle_unsubscribe_is_safe() {
    forge_eventbus::UnsubscribeHandle::noop().unsubscribe();
}

#[tokio::test]
async fn handler_panic_is_isolated_and_other_subscribers_still_run() {
    let bus = EventBus::new();
    let survivor_hits = Arc::new(AtomicUsize::new(0));

    bus.subscribe::<Ping, _>(None, SubscribeOptions::default(), |_ctx, _event| {
        panic!("boom");
    });
    let survivor = {
        let hits = survivor_hits.clone();
        bus.subscribe::<Ping, _>(None, SubscribeOptions::default(), move |_ctx, _event| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    };

    let ctx = CancellationToken::new();
    bus.publish(&ctx, Ping(1), None).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(survivor_hits.load(Ordering::SeqCst), 1);
    survivor.unsubscribe();
}

#[tokio::test]
async fn publish_to_closed_bus_is_a_silent_noop() {
    let bus = EventBus::new();
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = hits.clone();
        bus.subscribe::<Ping, _>(None, SubscribeOptions::default(), move |_ctx, _event| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
    }

    bus.close().await;
    assert!(bus.is_closed());

    let ctx = CancellationToken::new();
    bus.publish(&ctx, Ping(1), None).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(hits.load(Ordering::SeqCst), 0);

    // closing twice must not hang or panic
    bus.close().await;
}

#[tokio::test]
async fn distinct_event_types_do_not_cross_deliver() {
    let bus = EventBus::new();
    let ping_hits = Arc::new(AtomicUsize::new(0));
    let other_hits = Arc::new(AtomicUsize::new(0));

    {
        let hits = ping_hits.clone();
        bus.subscribe::<Ping, _>(None, SubscribeOptions::default(), move |_ctx, _event| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let hits = other_hits.clone();
        bus.subscribe::<Other, _>(None, SubscribeOptions::default(), move |_ctx, _event| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
    }

    let ctx = CancellationToken::new();
    bus.publish(&ctx, Ping(1), None).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(ping_hits.load(Ordering::SeqCst), 1);
    assert_eq!(other_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn run_closes_the_bus_on_shutdown() {
    let bus = EventBus::new();
    let shutdown = CancellationToken::new();

    let task = {
        let bus = bus.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { bus.run(shutdown).await })
    };

    assert!(!bus.is_closed());
    shutdown.cancel();
    task.await.unwrap().unwrap();
    assert!(bus.is_closed());
}
