// SPDX-License-Identifier: MIT

//! Type-routed, in-process pub/sub with per-subscriber bounded queues and
//! drain-on-close.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::handle::UnsubscribeHandle;

pub(crate) type SubscriberKey = (TypeId, String);

type BoxedEnvelope = Box<dyn Any + Send>;

struct Envelope<T> {
    ctx: CancellationToken,
    event: T,
}

struct SubscriberEntry {
    id: u64,
    sender: mpsc::Sender<BoxedEnvelope>,
}

pub(crate) struct Inner {
    pub(crate) subscribers: RwLock<HashMap<SubscriberKey, Vec<SubscriberEntry>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
    next_id: AtomicU64,
}

/// Per-subscription tuning. The buffer is the bounded channel depth a
/// publisher can fill before it starts blocking on that subscriber.
#[derive(Debug, Clone, Copy)]
pub struct SubscribeOptions {
    pub buffer_size: usize,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        SubscribeOptions { buffer_size: 128 }
    }
}

/// Type-routed pub/sub bus. Cheap to clone; every clone shares the same
/// subscriber table. Implements [`forge_worker::Worker`] so it starts and
/// stops like any other worker.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        forge_core::panic::install_hook();
        EventBus {
            inner: Arc::new(Inner {
                subscribers: RwLock::new(HashMap::new()),
                tasks: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Subscribes `handler` to events of type `T` published on `topic`
    /// (`None` for the wildcard subscription, which also receives events
    /// published to every other topic of this type). The handler runs
    /// serially, in a dedicated task, under panic recovery.
    pub fn subscribe<T, F>(&self, topic: Option<&str>, options: SubscribeOptions, handler: F) -> UnsubscribeHandle
    where
        T: Send + 'static,
        F: Fn(&CancellationToken, &T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, mut rx) = mpsc::channel::<BoxedEnvelope>(options.buffer_size);

        let task = tokio::spawn(async move {
            while let Some(boxed) = rx.recv().await {
                let Ok(envelope) = boxed.downcast::<Envelope<T>>() else {
                    continue;
                };
                let outcome =
                    std::panic::catch_unwind(AssertUnwindSafe(|| handler(&envelope.ctx, &envelope.event)));
                if let Err(payload) = outcome {
                    let message = forge_core::panic::panic_message(&*payload);
                    let backtrace = forge_core::panic::take_backtrace();
                    error!(subscriber = id, panic = %message, backtrace = %backtrace, "event handler panicked");
                }
            }
        });

        let key: SubscriberKey = (TypeId::of::<T>(), topic.unwrap_or("").to_string());
        self.inner.subscribers.write().entry(key.clone()).or_default().push(SubscriberEntry { id, sender: tx });
        self.inner.tasks.lock().push(task);

        UnsubscribeHandle::new(Arc::downgrade(&self.inner), key, id)
    }

    /// Delivers `event` to every subscriber on the exact topic plus every
    /// wildcard subscriber for `T`. Blocks on a full subscriber queue,
    /// aborting delivery to the remaining subscribers only if `ctx` is
    /// cancelled first. A silent no-op once the bus is closed.
    pub async fn publish<T>(&self, ctx: &CancellationToken, event: T, topic: Option<&str>)
    where
        T: Clone + Send + 'static,
    {
        if self.inner.closed.load(Ordering::SeqCst) {
            return;
        }

        let type_id = TypeId::of::<T>();
        let topic_key = topic.unwrap_or("").to_string();
        let senders = {
            let map = self.inner.subscribers.read();
            let mut out = Vec::new();
            if let Some(list) = map.get(&(type_id, topic_key.clone())) {
                out.extend(list.iter().map(|s| s.sender.clone()));
            }
            if !topic_key.is_empty() {
                if let Some(list) = map.get(&(type_id, String::new())) {
                    out.extend(list.iter().map(|s| s.sender.clone()));
                }
            }
            out
        };

        for sender in senders {
            let envelope: BoxedEnvelope = Box::new(Envelope { ctx: ctx.clone(), event: event.clone() });
            tokio::select! {
                res = sender.send(envelope) => {
                    if res.is_err() {
                        warn!("subscriber channel closed before delivery");
                    }
                }
                _ = ctx.cancelled() => {
                    warn!("publish aborted by caller cancellation before reaching all subscribers");
                    return;
                }
            }
        }
    }

    /// Closes the bus: no further `publish` calls are delivered, every
    /// subscriber channel stops accepting sends, and this call waits for
    /// each subscriber's dedicated task to drain its remaining queue.
    /// Idempotent.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let drained = {
            self.inner.subscribers.write().clear();
            self.inner.tasks.lock().drain(..).collect::<Vec<_>>()
        };
        futures::future::join_all(drained).await;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl forge_worker::Worker for EventBus {
    fn name(&self) -> &str {
        "event-bus"
    }

    async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        shutdown.cancelled().await;
        self.close().await;
        Ok(())
    }
}
