// SPDX-License-Identifier: MIT

//! The container: registration, resolution, and dependency-graph extraction.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::descriptor::{AnyArc, DescriptorState, FacetCaster, ProviderFn, Scope, ServiceDescriptor};
use crate::error::Error;
use crate::graph::Graph;
use crate::hook::{hook, HookContext, HookFn};
use crate::key::Key;

thread_local! {
    static CHAIN: RefCell<Vec<Key>> = RefCell::new(Vec::new());
}

/// Pops the resolving thread's chain entry on drop, including on panic.
struct ChainGuard;

impl Drop for ChainGuard {
    fn drop(&mut self) {
        CHAIN.with(|c| {
            c.borrow_mut().pop();
        });
    }
}

struct Inner {
    descriptors: RwLock<HashMap<Key, Arc<ServiceDescriptor>>>,
    graph: Mutex<Graph>,
    built: AtomicBool,
}

/// The dependency-injection container. Cheap to clone (wraps an `Arc`).
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

/// Node and edge set exported for the lifecycle engine.
pub struct GraphSnapshot {
    pub nodes: Vec<Key>,
    pub edges: Vec<(Key, Key)>,
}

impl Default for Container {
    fn default() -> Self {
        Container::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Container {
            inner: Arc::new(Inner {
                descriptors: RwLock::new(HashMap::new()),
                graph: Mutex::new(Graph::new()),
                built: AtomicBool::new(false),
            }),
        }
    }

    pub fn is_built(&self) -> bool {
        self.inner.built.load(Ordering::SeqCst)
    }

    /// Start a fluent registration for `T`. Defaults to lazy singleton scope.
    pub fn for_type<T: Any + Send + Sync + 'static>(&self) -> Registration<T> {
        Registration {
            container: self.clone(),
            key: Key::of::<T>(),
            scope: Scope::Singleton,
            replace: false,
            start_hook: None,
            stop_hook: None,
            hook_timeout: None,
            facets: HashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Finalize registration and instantiate eager services in topological
    /// order. Idempotent: a second call is a no-op.
    pub fn build(&self) -> Result<(), Error> {
        if self.inner.built.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let eager: Vec<Key> = {
            let map = self.inner.descriptors.read();
            let mut keys: Vec<Key> = map
                .iter()
                .filter(|(_, d)| d.scope() == Scope::Eager)
                .map(|(k, _)| k.clone())
                .collect();
            keys.sort();
            keys
        };

        for key in eager {
            self.resolve_dyn(&key)?;
        }

        Ok(())
    }

    /// Resolve the unnamed instance of `T`.
    pub fn resolve<T: Any + Send + Sync + 'static>(&self) -> Result<Arc<T>, Error> {
        self.resolve_typed(&Key::of::<T>())
    }

    /// Resolve a named instance of `T`.
    pub fn resolve_named<T: Any + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, Error> {
        self.resolve_typed(&Key::named::<T>(name))
    }

    fn resolve_typed<T: Any + Send + Sync + 'static>(&self, key: &Key) -> Result<Arc<T>, Error> {
        let any = self.resolve_dyn(key)?;
        any.downcast::<T>().map_err(|_| Error::TypeMismatch {
            key: key.canonical(),
            expected: std::any::type_name::<T>().to_string(),
            found: key.type_name().to_string(),
        })
    }

    /// Resolve a key without static type information. Used internally by
    /// worker/scheduler auto-discovery, which must probe every registration
    /// for a trait-object match.
    pub fn resolve_dyn(&self, key: &Key) -> Result<AnyArc, Error> {
        let already_resolving = CHAIN.with(|c| c.borrow().contains(key));
        if already_resolving {
            let chain = CHAIN.with(|c| {
                let mut v = c.borrow().clone();
                v.push(key.clone());
                v
            });
            return Err(Error::Cycle { chain });
        }

        let parent = CHAIN.with(|c| c.borrow().last().cloned());
        if let Some(parent) = parent {
            self.inner.graph.lock().add_edge(parent, key.clone());
        }

        CHAIN.with(|c| c.borrow_mut().push(key.clone()));
        let _guard = ChainGuard;

        let descriptor = { self.inner.descriptors.read().get(key).cloned() };
        match descriptor {
            Some(d) => d.resolve(self),
            None => Err(Error::NotFound(key.canonical())),
        }
    }

    /// Every registered key together with its scope — the candidate set for
    /// worker/scheduler auto-discovery (transient services are excluded by
    /// callers, since a fresh-per-resolution instance has no stable identity
    /// to supervise).
    pub fn registrations(&self) -> Vec<(Key, Scope)> {
        self.inner.descriptors.read().iter().map(|(k, d)| (k.clone(), d.scope())).collect()
    }

    pub fn descriptor(&self, key: &Key) -> Option<Arc<ServiceDescriptor>> {
        self.inner.descriptors.read().get(key).cloned()
    }

    /// Whether `key`'s registration carries a `U` facet (see
    /// [`Registration::facet`]), without resolving the service. Auto-discovery
    /// (workers, scheduled jobs) uses this to narrow the candidate set before
    /// paying for instantiation.
    pub fn has_facet<U: 'static>(&self, key: &Key) -> bool {
        self.inner
            .descriptors
            .read()
            .get(key)
            .map(|d| d.has_facet(TypeId::of::<U>()))
            .unwrap_or(false)
    }

    /// Resolve `key` and, if its registration carries a `U` facet, return it.
    /// Returns `Ok(None)` for registrations without the facet rather than an
    /// error, so callers can filter a registration list without extra checks.
    pub fn facet<U: Clone + 'static>(&self, key: &Key) -> Result<Option<U>, Error> {
        let caster = {
            let map = self.inner.descriptors.read();
            match map.get(key).and_then(|d| d.facet_caster(TypeId::of::<U>())) {
                Some(c) => c,
                None => return Ok(None),
            }
        };
        let any = self.resolve_dyn(key)?;
        let boxed = caster(any);
        Ok(boxed.downcast::<U>().ok().map(|b| *b))
    }

    /// Node and edge set for the lifecycle engine. Only valid after `build()`.
    pub fn snapshot(&self) -> Result<GraphSnapshot, Error> {
        if !self.is_built() {
            return Err(Error::NotYetBuilt);
        }
        let edges = self.inner.graph.lock().edge_pairs();
        let edge_keys: HashSet<Key> =
            edges.iter().flat_map(|(a, b)| [a.clone(), b.clone()]).collect();

        let nodes: Vec<Key> = {
            let map = self.inner.descriptors.read();
            map.iter()
                .filter(|(k, d)| d.has_start_hook() || d.has_stop_hook() || edge_keys.contains(k))
                .map(|(k, _)| k.clone())
                .collect()
        };

        Ok(GraphSnapshot { nodes, edges })
    }

    #[allow(clippy::too_many_arguments)]
    fn register(
        &self,
        key: Key,
        scope: Scope,
        provider: ProviderFn,
        start_hook: Option<HookFn>,
        stop_hook: Option<HookFn>,
        hook_timeout: Option<Duration>,
        facets: HashMap<TypeId, FacetCaster>,
        replace: bool,
        seeded_instance: Option<AnyArc>,
    ) -> Result<(), Error> {
        if self.is_built() {
            return Err(Error::AlreadyBuilt);
        }

        let descriptor = Arc::new(ServiceDescriptor {
            key: key.clone(),
            scope,
            provider,
            start_hook,
            stop_hook,
            hook_timeout,
            facets,
            state: Mutex::new(DescriptorState { instance: seeded_instance, started: false }),
        });

        let mut map = self.inner.descriptors.write();
        if !replace && map.contains_key(&key) {
            return Err(Error::Duplicate(key.canonical()));
        }
        map.insert(key, descriptor);
        Ok(())
    }
}

/// Fluent registration builder returned by [`Container::for_type`].
pub struct Registration<T> {
    container: Container,
    key: Key,
    scope: Scope,
    replace: bool,
    start_hook: Option<HookFn>,
    stop_hook: Option<HookFn>,
    hook_timeout: Option<Duration>,
    facets: HashMap<TypeId, FacetCaster>,
    _marker: PhantomData<T>,
}

impl<T: Any + Send + Sync + 'static> Registration<T> {
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.key = Key::named::<T>(name);
        self
    }

    pub fn transient(mut self) -> Self {
        self.scope = Scope::Transient;
        self
    }

    pub fn eager(mut self) -> Self {
        self.scope = Scope::Eager;
        self
    }

    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn hook_timeout(mut self, timeout: Duration) -> Self {
        self.hook_timeout = Some(timeout);
        self
    }

    /// Attaches a type-erased conversion from the resolved `Arc<T>` to some
    /// `U` (typically `Arc<dyn SomeTrait>`), retrievable later via
    /// [`Container::facet`] without the caller needing to know `T`. Used for
    /// automatic worker/scheduled-job discovery without `forge-core`
    /// depending on the traits it discovers.
    pub fn facet<U, F>(mut self, f: F) -> Self
    where
        U: Send + Sync + 'static,
        F: Fn(Arc<T>) -> U + Send + Sync + 'static,
    {
        let caster: FacetCaster = Arc::new(move |any: AnyArc| {
            // Infallible: this caster is only ever invoked by `Container::facet`
            // on the `AnyArc` produced by resolving this exact registration, so
            // the concrete type underneath is always `T`.
            #[allow(clippy::expect_used)]
            let concrete =
                any.downcast::<T>().expect("facet caster invoked with a mismatched concrete type");
            Box::new(f(concrete)) as Box<dyn Any + Send + Sync>
        });
        self.facets.insert(TypeId::of::<U>(), caster);
        self
    }

    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.start_hook = Some(hook(f));
        self
    }

    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.stop_hook = Some(hook(f));
        self
    }

    /// Register a lazy (or eager) provider. Terminal: consumes the builder.
    pub fn provider<F>(self, f: F) -> Result<(), Error>
    where
        F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let provider: ProviderFn = Arc::new(move |c: &Container| {
            let value = f(c)?;
            Ok(Arc::new(value) as AnyArc)
        });
        self.container.register(
            self.key,
            self.scope,
            provider,
            self.start_hook,
            self.stop_hook,
            self.hook_timeout,
            self.facets,
            self.replace,
            None,
        )
    }

    /// Register a pre-built value. Terminal: consumes the builder.
    pub fn instance(self, value: T) -> Result<(), Error> {
        let value: AnyArc = Arc::new(value);
        let provider: ProviderFn = {
            let value = value.clone();
            Arc::new(move |_: &Container| Ok(value.clone()))
        };
        self.container.register(
            self.key,
            Scope::Instance,
            provider,
            self.start_hook,
            self.stop_hook,
            self.hook_timeout,
            self.facets,
            self.replace,
            Some(value),
        )
    }
}
