// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use forge_core::Container;
use forge_lifecycle::{Lifecycle, LifecycleConfig};
use parking_lot::Mutex;

struct A;
struct B;
struct C;

/// Register A (no deps), B (depends on A), C (depends on B), each logging
/// its name on start/stop. Run then stop produces
/// `[startA, startB, startC, stopC, stopB, stopA]`.
#[tokio::test]
async fn order_by_edges_matches_the_documented_scenario() {
    let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
    let container = Container::new();

    {
        let log = log.clone();
        container
            .for_type::<A>()
            .on_start({
                let log = log.clone();
                move |_ctx| {
                    let log = log.clone();
                    async move {
                        log.lock().push("startA");
                        Ok(())
                    }
                }
            })
            .on_stop(move |_ctx| {
                let log = log.clone();
                async move {
                    log.lock().push("stopA");
                    Ok(())
                }
            })
            .provider(|_| Ok(A))
            .unwrap();
    }
    {
        let log = log.clone();
        container
            .for_type::<B>()
            .on_start({
                let log = log.clone();
                move |_ctx| {
                    let log = log.clone();
                    async move {
                        log.lock().push("startB");
                        Ok(())
                    }
                }
            })
            .on_stop(move |_ctx| {
                let log = log.clone();
                async move {
                    log.lock().push("stopB");
                    Ok(())
                }
            })
            .provider(|c| {
                c.resolve::<A>()?;
                Ok(B)
            })
            .unwrap();
    }
    {
        let log = log.clone();
        container
            .for_type::<C>()
            .eager()
            .on_start({
                let log = log.clone();
                move |_ctx| {
                    let log = log.clone();
                    async move {
                        log.lock().push("startC");
                        Ok(())
                    }
                }
            })
            .on_stop(move |_ctx| {
                let log = log.clone();
                async move {
                    log.lock().push("stopC");
                    Ok(())
                }
            })
            .provider(|c| {
                c.resolve::<B>()?;
                Ok(C)
            })
            .unwrap();
    }

    container.build().unwrap();
    let lifecycle = Lifecycle::new(container, LifecycleConfig::default());

    let outcome = lifecycle.start().await.map_err(|f| f.error).unwrap();
    let report = lifecycle.shutdown(&outcome.started, forge_lifecycle::default_terminate()).await;

    assert!(!report.force_exited);
    assert_eq!(*log.lock(), vec!["startA", "startB", "startC", "stopC", "stopB", "stopA"]);
}

/// A start hook failure aborts startup and runs a compensating stop over
/// everything already started, in reverse.
#[tokio::test]
async fn start_hook_failure_compensates_with_reverse_stop() {
    let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
    let container = Container::new();

    {
        let log = log.clone();
        container
            .for_type::<A>()
            .on_start({
                let log = log.clone();
                move |_ctx| {
                    let log = log.clone();
                    async move {
                        log.lock().push("startA");
                        Ok(())
                    }
                }
            })
            .on_stop(move |_ctx| {
                let log = log.clone();
                async move {
                    log.lock().push("stopA");
                    Ok(())
                }
            })
            .eager()
            .provider(|_| Ok(A))
            .unwrap();
    }
    container
        .for_type::<B>()
        .eager()
        .on_start(|_ctx| async { Err(anyhow::anyhow!("boom")) })
        .provider(|c| {
            c.resolve::<A>()?;
            Ok(B)
        })
        .unwrap();

    container.build().unwrap();
    let lifecycle = Lifecycle::new(container, LifecycleConfig::default());

    let failure = lifecycle.start().await.unwrap_err();
    assert!(failure.error.to_string().contains("boom"));
    assert_eq!(*log.lock(), vec!["startA", "stopA"]);
}

/// A stop hook that never returns, under a short global shutdown budget,
/// triggers the injected terminate function within roughly the budget.
#[tokio::test]
async fn hung_stop_hook_is_blamed_and_force_exits_within_budget() {
    let container = Container::new();
    container
        .for_type::<A>()
        .on_stop(|ctx| {
            let ctx = ctx.clone();
            async move {
                // Never observes cancellation; the orchestrator must move on anyway.
                std::future::pending::<()>().await;
                let _ = ctx;
                Ok(())
            }
        })
        .hook_timeout(Duration::from_millis(50))
        .provider(|_| Ok(A))
        .unwrap();
    container.build().unwrap();

    let config = LifecycleConfig {
        default_hook_timeout: Duration::from_secs(5),
        shutdown_budget: Duration::from_millis(300),
    };
    let lifecycle = Lifecycle::new(container, config);
    let outcome = lifecycle.start().await.map_err(|f| f.error).unwrap();

    let terminate_code = Arc::new(AtomicI32::new(0));
    let terminate_calls = Arc::new(AtomicUsize::new(0));
    let terminate: forge_lifecycle::TerminateFn = {
        let code = terminate_code.clone();
        let calls = terminate_calls.clone();
        Arc::new(move |c: i32| {
            code.store(c, Ordering::SeqCst);
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    let began = std::time::Instant::now();
    let report = lifecycle.shutdown(&outcome.started, terminate).await;
    let elapsed = began.elapsed();

    assert!(report.force_exited);
    assert_eq!(terminate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(terminate_code.load(Ordering::SeqCst), 1);
    assert!(elapsed < Duration::from_millis(600), "force-exit should land close to the budget, got {elapsed:?}");
}

/// A hook that overruns its per-hook timeout (but the global budget is
/// generous) produces a blame record and the orchestrator proceeds past it
/// instead of blocking on it forever.
#[tokio::test]
async fn timed_out_stop_hook_is_blamed_but_orchestration_continues() {
    let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
    let container = Container::new();

    container
        .for_type::<A>()
        .on_stop(|_ctx| async {
            std::future::pending::<()>().await;
            Ok(())
        })
        .hook_timeout(Duration::from_millis(50))
        .provider(|_| Ok(A))
        .unwrap();
    {
        let log = log.clone();
        container
            .for_type::<B>()
            .on_stop(move |_ctx| {
                let log = log.clone();
                async move {
                    log.lock().push("stopB");
                    Ok(())
                }
            })
            .provider(|_| Ok(B))
            .unwrap();
    }
    container.build().unwrap();

    let lifecycle = Lifecycle::new(container, LifecycleConfig::default());
    // Reverse of `started` is [B, A]: B's stop hook runs and completes
    // before A's hangs past its per-hook timeout and gets blamed.
    let started = vec![forge_core::Key::of::<A>(), forge_core::Key::of::<B>()];
    let report = lifecycle.shutdown(&started, forge_lifecycle::default_terminate()).await;

    assert!(!report.force_exited);
    assert_eq!(report.blame.len(), 1);
    assert_eq!(report.blame[0].key, forge_core::Key::of::<A>().canonical());
    assert_eq!(*log.lock(), vec!["stopB"]);
}

/// An empty dependency graph starts and stops cleanly.
#[tokio::test]
async fn empty_graph_starts_and_stops_cleanly() {
    let container = Container::new();
    container.build().unwrap();
    let lifecycle = Lifecycle::new(container, LifecycleConfig::default());

    let outcome = lifecycle.start().await.map_err(|f| f.error).unwrap();
    assert!(outcome.started.is_empty());
    let report = lifecycle.shutdown(&outcome.started, forge_lifecycle::default_terminate()).await;
    assert!(!report.force_exited);
    assert!(report.blame.is_empty());
}

/// A single service with only a start hook and no stop hook runs both
/// lifecycle phases without error.
#[tokio::test]
async fn service_with_only_start_hook_runs_both_phases() {
    let started_flag = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    {
        let started_flag = started_flag.clone();
        container
            .for_type::<A>()
            .on_start(move |_ctx| {
                let started_flag = started_flag.clone();
                async move {
                    started_flag.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .provider(|_| Ok(A))
            .unwrap();
    }
    container.build().unwrap();

    let lifecycle = Lifecycle::new(container, LifecycleConfig::default());
    let outcome = lifecycle.start().await.map_err(|f| f.error).unwrap();
    assert_eq!(started_flag.load(Ordering::SeqCst), 1);

    let report = lifecycle.shutdown(&outcome.started, forge_lifecycle::default_terminate()).await;
    assert!(!report.force_exited);
}
