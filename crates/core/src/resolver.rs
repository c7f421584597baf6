// SPDX-License-Identifier: MIT
//! The resolver: turns a `ServiceKey` into a live instance, tracking the
//! per-call stack that cycle detection needs and the requester/requested
//! edges the Graph Engine needs.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;

use crate::descriptor::{AnyArc, BoxFuture, Construction};
use crate::error::ResolveError;
use crate::hook::Lifecycle;
use crate::instance::InstanceStore;
use crate::key::ServiceKey;
use crate::registry::SealedRegistry;
use crate::scope::Scope;
use crate::worker::{Worker, WorkerOptions};

/// Handed to every constructor closure. Cheaply `Clone`-able — it carries an
/// owned call stack rather than a borrow, so it can be moved into a spawned
/// sibling task without lifetime trouble.
#[derive(Clone)]
pub struct ResolveContext {
    resolver: Arc<ResolverInner>,
    current: Option<ServiceKey>,
    stack: Arc<Vec<ServiceKey>>,
}

impl ResolveContext {
    pub async fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        self.resolver.clone().resolve_key_typed::<T>(&ServiceKey::of::<T>(), self.clone()).await
    }

    pub async fn resolve_named<T: Send + Sync + 'static>(&self, name: impl Into<Arc<str>>) -> Result<Arc<T>, ResolveError> {
        self.resolver.clone().resolve_key_typed::<T>(&ServiceKey::named::<T>(name), self.clone()).await
    }
}

struct ResolverInner {
    registry: Arc<SealedRegistry>,
    instances: InstanceStore,
    edges: SyncMutex<HashSet<(ServiceKey, ServiceKey)>>,
}

impl ResolverInner {
    fn record_edge(&self, from: ServiceKey, to: ServiceKey) {
        self.edges.lock().insert((from, to));
    }

    fn resolve_key(self: &Arc<Self>, key: ServiceKey, cx: ResolveContext) -> BoxFuture<Result<AnyArc, ResolveError>> {
        let this = self.clone();
        Box::pin(async move {
            if cx.stack.iter().any(|k| *k == key) {
                let mut path: Vec<ServiceKey> = cx.stack.iter().cloned().collect();
                path.push(key);
                return Err(ResolveError::CycleDetected(path));
            }

            let descriptor = this.registry.lookup(&key).ok_or_else(|| ResolveError::NotFound(key.clone()))?;

            if let Some(requester) = cx.current.clone() {
                this.record_edge(requester, key.clone());
            }

            let mut next_stack = (*cx.stack).clone();
            next_stack.push(key.clone());
            let next_cx = ResolveContext { resolver: this.clone(), current: Some(key.clone()), stack: Arc::new(next_stack) };

            match &descriptor.construction {
                Construction::Value(value) => Ok(value.clone()),
                Construction::Factory(ctor) => match descriptor.scope {
                    Scope::PerCall => ctor.construct(next_cx).await,
                    Scope::Shared | Scope::EagerShared => this.resolve_shared(&key, ctor.clone(), next_cx).await,
                },
            }
        })
    }

    async fn resolve_shared(
        self: &Arc<Self>,
        key: &ServiceKey,
        ctor: Arc<dyn crate::descriptor::Construct>,
        cx: ResolveContext,
    ) -> Result<AnyArc, ResolveError> {
        let cell = self.instances.cell_for(key);
        let mut guard = cell.lock().await;
        if let Some(existing) = guard.as_ref() {
            return Ok(existing.clone());
        }
        let value = ctor.construct(cx).await?;
        *guard = Some(value.clone());
        Ok(value)
    }

    async fn resolve_key_typed<T: Send + Sync + 'static>(
        self: Arc<Self>,
        key: &ServiceKey,
        cx: ResolveContext,
    ) -> Result<Arc<T>, ResolveError> {
        let any = self.resolve_key(key.clone(), cx).await?;
        let registered_type_name = self.registry.lookup(key).map(|d| d.key.type_name()).unwrap_or("<unknown>");
        any.downcast::<T>().map_err(|_| ResolveError::TypeMismatch {
            key: key.clone(),
            registered: registered_type_name,
            requested: std::any::type_name::<T>(),
        })
    }
}

/// Entry point for resolving services out of a [`SealedRegistry`].
#[derive(Clone)]
pub struct Resolver(Arc<ResolverInner>);

impl Resolver {
    pub fn new(registry: Arc<SealedRegistry>) -> Self {
        Self(Arc::new(ResolverInner { registry, instances: InstanceStore::new(), edges: SyncMutex::new(HashSet::new()) }))
    }

    fn root_cx(&self) -> ResolveContext {
        ResolveContext { resolver: self.0.clone(), current: None, stack: Arc::new(Vec::new()) }
    }

    pub async fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        self.0.clone().resolve_key_typed::<T>(&ServiceKey::of::<T>(), self.root_cx()).await
    }

    pub async fn resolve_named<T: Send + Sync + 'static>(&self, name: impl Into<Arc<str>>) -> Result<Arc<T>, ResolveError> {
        self.0.clone().resolve_key_typed::<T>(&ServiceKey::named::<T>(name), self.root_cx()).await
    }

    /// Resolve every `shared`/`eager-shared` registration of type `T`, in
    /// registration order.
    pub async fn resolve_all<T: Send + Sync + 'static>(&self) -> Result<Vec<Arc<T>>, ResolveError> {
        let keys = self.0.registry.keys_of_type::<T>();
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(self.0.clone().resolve_key_typed::<T>(&key, self.root_cx()).await?);
        }
        Ok(out)
    }

    /// Like [`Resolver::resolve_all`], filtered to a group tag.
    pub async fn resolve_group<T: Send + Sync + 'static>(&self, tag: &str) -> Result<Vec<Arc<T>>, ResolveError> {
        let keys = self.0.registry.keys_of_group::<T>(tag);
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(self.0.clone().resolve_key_typed::<T>(&key, self.root_cx()).await?);
        }
        Ok(out)
    }

    /// Materialize every `eager-shared` descriptor, in registration order.
    /// Called by the orchestrator during bring-up, before the Graph Engine
    /// reads the accumulated edge set.
    pub async fn resolve_all_eager(&self) -> Result<(), ResolveError> {
        for key in self.0.registry.eager_keys() {
            self.0.resolve_key(key, self.root_cx()).await?;
        }
        Ok(())
    }

    /// Snapshot of every requester -> requested edge recorded so far.
    pub fn edges(&self) -> Vec<(ServiceKey, ServiceKey)> {
        self.0.edges.lock().iter().cloned().collect()
    }

    pub fn registry(&self) -> &Arc<SealedRegistry> {
        &self.0.registry
    }

    /// Resolve every lifecycle-bearing descriptor and adapt it to
    /// `Arc<dyn Lifecycle>`, in registration order. Used by the lifecycle
    /// engine once bring-up has materialized the eager graph.
    pub async fn lifecycle_handles(&self) -> Result<Vec<(ServiceKey, Arc<dyn Lifecycle>)>, ResolveError> {
        let mut out = Vec::new();
        for descriptor in self.0.registry.lifecycle_descriptors() {
            let any = self.0.resolve_key(descriptor.key.clone(), self.root_cx()).await?;
            if let Some(lifecycle) = descriptor.lifecycle_of(&any) {
                out.push((descriptor.key.clone(), lifecycle));
            }
        }
        Ok(out)
    }

    /// Resolve every worker-bearing descriptor and adapt it to
    /// `Arc<dyn Worker>` alongside its registered options.
    pub async fn worker_handles(&self) -> Result<Vec<(ServiceKey, Arc<dyn Worker>, WorkerOptions)>, ResolveError> {
        let mut out = Vec::new();
        for descriptor in self.0.registry.worker_descriptors() {
            let any = self.0.resolve_key(descriptor.key.clone(), self.root_cx()).await?;
            if let Some(worker) = descriptor.worker_of(&any) {
                out.push((descriptor.key.clone(), worker, descriptor.worker_options().clone()));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
