// SPDX-License-Identifier: MIT

//! The scheduled-job contract.

use async_trait::async_trait;
use forge_core::HookContext;

/// A unit of work fired on a cron schedule. A fresh instance is resolved from
/// the container on every fire rather than a cached one, so register job
/// types as [`forge_core::Scope::Transient`].
#[async_trait]
pub trait Job: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// `ctx` carries this fire's declared per-job timeout as a deadline and a
    /// cancellation token tied to the scheduler worker's own shutdown.
    async fn run(&self, ctx: &HookContext) -> anyhow::Result<()>;
}
