// SPDX-License-Identifier: MIT

//! Wires a handful of toy services together and runs them under
//! [`forge_app::Application`] end to end: a dependent pair of singletons
//! with start/stop hooks, a background worker discovered automatically from
//! the container, a scheduled job, and an event-bus publisher/subscriber.
//!
//! Run with `cargo run --example demo` and press Ctrl-C to shut down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forge_app::core::{Container, HookContext};
use forge_app::eventbus::{EventBus, SubscribeOptions};
use forge_app::scheduler::Job;
use forge_app::worker::{as_worker_facet, Worker};
use forge_app::Application;
use tokio_util::sync::CancellationToken;

struct Greeting(String);

struct Greeter {
    greeting: Arc<Greeting>,
}

#[async_trait]
impl Worker for Greeter {
    fn name(&self) -> &str {
        "greeter-ticker"
    }

    async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            tokio::select! {
                _ = interval.tick() => tracing::info!(message = %self.greeting.0, "tick"),
                _ = shutdown.cancelled() => return Ok(()),
            }
        }
    }
}

struct Heartbeat;

#[async_trait]
impl Job for Heartbeat {
    fn name(&self) -> &str {
        "heartbeat"
    }

    async fn run(&self, _ctx: &HookContext) -> anyhow::Result<()> {
        tracing::info!("heartbeat fired");
        Ok(())
    }
}

#[derive(Clone)]
struct OrderPlaced {
    order_id: u64,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("fatal: {error:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<std::process::ExitCode> {
    forge_app::logging::init_stdout();

    let container = Container::new();

    container.for_type::<Greeting>().instance(Greeting("hello from forge-app".to_string()))?;

    container
        .for_type::<Greeter>()
        .facet(as_worker_facet)
        .on_start(|_ctx| async { Ok(()) })
        .on_stop(|_ctx| async {
            tracing::info!("greeter stopping");
            Ok(())
        })
        .provider(|c| {
            let greeting = c.resolve::<Greeting>()?;
            Ok(Greeter { greeting })
        })?;

    container.for_type::<Heartbeat>().transient().provider(|_| Ok(Heartbeat))?;

    let app = Application::new(container);
    app.scheduler().register::<Heartbeat>("heartbeat", "@every 10s", Duration::from_secs(5))?;

    let order_count = Arc::new(AtomicU64::new(0));
    let orders = order_count.clone();
    app.event_bus().subscribe::<OrderPlaced, _>(None, SubscribeOptions::default(), move |_ctx, event| {
        let total = orders.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(order_id = event.order_id, total, "order received");
    });

    let publish_ctx = CancellationToken::new();
    let bus = app.event_bus().clone();
    tokio::spawn(async move {
        for id in 1..=3 {
            bus.publish(&publish_ctx, OrderPlaced { order_id: id }, None).await;
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    });

    Ok(app.run().await)
}
