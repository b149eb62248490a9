// SPDX-License-Identifier: MIT

//! Start/stop hook types shared by the container and the lifecycle engine.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Context passed to a start/stop hook: the hook's own deadline, a token
/// that is cancelled when the application's shutdown has been requested, and
/// the trace/request identifiers propagated from whatever caller triggered
/// this hook (a signal handler, an admin endpoint, a test harness).
#[derive(Clone)]
pub struct HookContext {
    pub deadline: Instant,
    pub cancellation: CancellationToken,
    pub trace_id: Option<String>,
    pub request_id: Option<String>,
}

impl HookContext {
    pub fn with_timeout(cancellation: CancellationToken, timeout: Duration) -> Self {
        HookContext {
            deadline: Instant::now() + timeout,
            cancellation,
            trace_id: None,
            request_id: None,
        }
    }

    pub fn with_ids(mut self, trace_id: Option<String>, request_id: Option<String>) -> Self {
        self.trace_id = trace_id;
        self.request_id = request_id;
        self
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// A span carrying this context's trace/request identifiers. Every
    /// record emitted while the returned span is entered picks up
    /// `trace_id`/`request_id` as attributes, so callers don't need to
    /// thread them through every `tracing::info!` call by hand.
    pub fn span(&self) -> tracing::Span {
        let span = tracing::info_span!(
            "hook",
            trace_id = tracing::field::Empty,
            request_id = tracing::field::Empty,
        );
        if let Some(trace_id) = &self.trace_id {
            span.record("trace_id", tracing::field::display(trace_id));
        }
        if let Some(request_id) = &self.request_id {
            span.record("request_id", tracing::field::display(request_id));
        }
        span
    }
}

pub type HookFn = Arc<dyn for<'a> Fn(&'a HookContext) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync>;

/// Wrap a plain async closure as a [`HookFn`].
pub fn hook<F, Fut>(f: F) -> HookFn
where
    F: for<'a> Fn(&'a HookContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx: &HookContext| Box::pin(f(ctx)) as BoxFuture<'_, anyhow::Result<()>>)
}
