// SPDX-License-Identifier: MIT

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::container::Container;
use crate::error::Error;
use crate::hook::HookFn;
use crate::key::Key;

/// Service lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Constructed lazily on first resolution, cached forever after.
    Singleton,
    /// Constructed fresh on every resolution, never cached.
    Transient,
    /// Constructed eagerly, in topological order, during `Build()`.
    Eager,
    /// A value supplied directly at registration; behaves like a pre-built singleton.
    Instance,
}

pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;
pub(crate) type ProviderFn = Arc<dyn Fn(&Container) -> anyhow::Result<AnyArc> + Send + Sync>;

/// Converts a resolved `AnyArc` (known to hold the registration's concrete
/// type) into some other `Any`-boxed value — typically `Arc<dyn SomeTrait>`.
///
/// This is how the container exposes "does this registration also behave as
/// a worker / a scheduled job" without `forge-core` knowing about either
/// trait: the caster closure is built generically in [`crate::container::Registration::facet`],
/// where the concrete type is still in scope, and stored type-erased here.
pub(crate) type FacetCaster = Arc<dyn Fn(AnyArc) -> Box<dyn Any + Send + Sync> + Send + Sync>;

pub(crate) struct DescriptorState {
    pub(crate) instance: Option<AnyArc>,
    pub(crate) started: bool,
}

/// Immutable registration record plus the mutable cached-instance cell.
///
/// Mutable state is guarded by its own lock so that resolving one service
/// never blocks on the registry lock that guards every other descriptor.
pub struct ServiceDescriptor {
    pub(crate) key: Key,
    pub(crate) scope: Scope,
    pub(crate) provider: ProviderFn,
    pub(crate) start_hook: Option<HookFn>,
    pub(crate) stop_hook: Option<HookFn>,
    pub(crate) hook_timeout: Option<Duration>,
    pub(crate) facets: HashMap<TypeId, FacetCaster>,
    pub(crate) state: Mutex<DescriptorState>,
}

impl ServiceDescriptor {
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn has_start_hook(&self) -> bool {
        self.start_hook.is_some()
    }

    pub fn has_stop_hook(&self) -> bool {
        self.stop_hook.is_some()
    }

    pub fn start_hook(&self) -> Option<HookFn> {
        self.start_hook.clone()
    }

    pub fn stop_hook(&self) -> Option<HookFn> {
        self.stop_hook.clone()
    }

    pub fn hook_timeout(&self) -> Option<Duration> {
        self.hook_timeout
    }

    pub(crate) fn has_facet(&self, facet: TypeId) -> bool {
        self.facets.contains_key(&facet)
    }

    pub(crate) fn facet_caster(&self, facet: TypeId) -> Option<FacetCaster> {
        self.facets.get(&facet).cloned()
    }

    /// Resolve this descriptor's value, applying the scope's caching policy.
    ///
    /// Singleton/Eager/Instance descriptors hold `state` across the provider
    /// call itself so that concurrent first-resolvers block on one another
    /// rather than racing to construct duplicate instances.
    pub(crate) fn resolve(&self, container: &Container) -> Result<AnyArc, Error> {
        match self.scope {
            Scope::Instance => {
                let guard = self.state.lock();
                Ok(guard
                    .instance
                    .clone()
                    .unwrap_or_else(|| unreachable!("instance descriptors are seeded at registration")))
            }
            Scope::Singleton | Scope::Eager => {
                {
                    let guard = self.state.lock();
                    if let Some(v) = &guard.instance {
                        return Ok(v.clone());
                    }
                }
                let mut guard = self.state.lock();
                if let Some(v) = &guard.instance {
                    return Ok(v.clone());
                }
                let value = (self.provider)(container).map_err(|source| Error::ProviderFailed {
                    key: self.key.canonical(),
                    source,
                })?;
                guard.instance = Some(value.clone());
                Ok(value)
            }
            Scope::Transient => (self.provider)(container).map_err(|source| Error::ProviderFailed {
                key: self.key.canonical(),
                source,
            }),
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .finish()
    }
}
