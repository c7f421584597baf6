// SPDX-License-Identifier: MIT
//! Service descriptors: the metadata record for a single registration.

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ResolveError;
use crate::hook::Lifecycle;
use crate::key::ServiceKey;
use crate::provider_config::ProviderConfigMeta;
use crate::scope::Scope;
use crate::worker::{Worker, WorkerOptions};

pub type AnyArc = Arc<dyn Any + Send + Sync>;
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Object-safe construction function. Application code never implements
/// this directly — [`Registration::factory`] wraps an `async fn(ResolveContext) ->
/// Result<T, ResolveError>` closure into one.
pub trait Construct: Send + Sync {
    fn construct(&self, cx: crate::resolver::ResolveContext) -> BoxFuture<Result<AnyArc, ResolveError>>;
}

struct FnConstruct<T, F> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F, Fut> Construct for FnConstruct<T, F>
where
    T: Send + Sync + 'static,
    F: Fn(crate::resolver::ResolveContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ResolveError>> + Send + 'static,
{
    fn construct(&self, cx: crate::resolver::ResolveContext) -> BoxFuture<Result<AnyArc, ResolveError>> {
        let fut = (self.f)(cx);
        Box::pin(async move {
            let value = fut.await?;
            Ok(Arc::new(value) as AnyArc)
        })
    }
}

pub(crate) enum Construction {
    Value(AnyArc),
    Factory(Arc<dyn Construct>),
}

pub(crate) type LifecycleAdapter = Arc<dyn Fn(&AnyArc) -> Option<Arc<dyn Lifecycle>> + Send + Sync>;
pub(crate) type WorkerAdapter = Arc<dyn Fn(&AnyArc) -> Option<Arc<dyn Worker>> + Send + Sync>;

/// The metadata record for a single registration. Immutable once built;
/// held behind `Arc` inside the sealed registry.
pub struct Descriptor {
    pub key: ServiceKey,
    pub scope: Scope,
    pub group: Option<Arc<str>>,
    pub(crate) construction: Construction,
    pub(crate) lifecycle_adapter: Option<LifecycleAdapter>,
    pub(crate) worker_adapter: Option<WorkerAdapter>,
    pub(crate) worker_options: WorkerOptions,
    pub(crate) provider_config: Option<ProviderConfigMeta>,
}

impl Descriptor {
    pub fn has_lifecycle(&self) -> bool {
        self.lifecycle_adapter.is_some()
    }

    pub fn has_worker(&self) -> bool {
        self.worker_adapter.is_some()
    }

    pub fn worker_options(&self) -> &WorkerOptions {
        &self.worker_options
    }

    pub fn provider_config(&self) -> Option<&ProviderConfigMeta> {
        self.provider_config.as_ref()
    }

    pub(crate) fn value(&self) -> Option<AnyArc> {
        match &self.construction {
            Construction::Value(v) => Some(v.clone()),
            Construction::Factory(_) => None,
        }
    }

    pub(crate) fn ctor(&self) -> Option<Arc<dyn Construct>> {
        match &self.construction {
            Construction::Value(_) => None,
            Construction::Factory(f) => Some(f.clone()),
        }
    }

    pub(crate) fn lifecycle_of(&self, value: &AnyArc) -> Option<Arc<dyn Lifecycle>> {
        self.lifecycle_adapter.as_ref().and_then(|adapt| adapt(value))
    }

    pub(crate) fn worker_of(&self, value: &AnyArc) -> Option<Arc<dyn Worker>> {
        self.worker_adapter.as_ref().and_then(|adapt| adapt(value))
    }
}

/// Fluent builder for a single registration, parameterized over the
/// declared service type so `.with_lifecycle()` / `.as_worker()` only
/// compile when `T` actually implements the relevant trait.
pub struct Registration<T> {
    key: ServiceKey,
    scope: Scope,
    group: Option<Arc<str>>,
    construction: Construction,
    lifecycle_adapter: Option<LifecycleAdapter>,
    worker_adapter: Option<WorkerAdapter>,
    worker_options: WorkerOptions,
    provider_config: Option<ProviderConfigMeta>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Registration<T> {
    fn new(key: ServiceKey, scope: Scope, construction: Construction) -> Self {
        Self {
            key,
            scope,
            group: None,
            construction,
            lifecycle_adapter: None,
            worker_adapter: None,
            worker_options: WorkerOptions::default(),
            provider_config: None,
            _marker: PhantomData,
        }
    }

    /// Register a pre-built value under the default (type-name) key.
    pub fn value(value: T) -> Self {
        Self::new(ServiceKey::of::<T>(), Scope::Shared, Construction::Value(Arc::new(value)))
    }

    /// Register a pre-built value under an explicit key.
    pub fn value_named(name: impl Into<Arc<str>>, value: T) -> Self {
        Self::new(ServiceKey::named::<T>(name), Scope::Shared, Construction::Value(Arc::new(value)))
    }

    /// Register a constructor under the default (type-name) key.
    pub fn factory<F, Fut>(scope: Scope, f: F) -> Self
    where
        F: Fn(crate::resolver::ResolveContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ResolveError>> + Send + 'static,
    {
        let ctor = FnConstruct { f, _marker: PhantomData };
        Self::new(ServiceKey::of::<T>(), scope, Construction::Factory(Arc::new(ctor)))
    }

    /// Register a constructor under an explicit key.
    pub fn factory_named<F, Fut>(name: impl Into<Arc<str>>, scope: Scope, f: F) -> Self
    where
        F: Fn(crate::resolver::ResolveContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ResolveError>> + Send + 'static,
    {
        let ctor = FnConstruct { f, _marker: PhantomData };
        Self::new(ServiceKey::named::<T>(name), scope, Construction::Factory(Arc::new(ctor)))
    }

    pub fn group(mut self, tag: impl Into<Arc<str>>) -> Self {
        self.group = Some(tag.into());
        self
    }

    pub fn provider_config(mut self, meta: ProviderConfigMeta) -> Self {
        self.provider_config = Some(meta);
        self
    }

    /// Participate in dependency-ordered start/stop as a lifecycle-bearing
    /// vertex (§4.3): `T` must implement [`Lifecycle`].
    pub fn with_lifecycle(mut self) -> Self
    where
        T: Lifecycle + 'static,
    {
        self.lifecycle_adapter = Some(Arc::new(|any: &AnyArc| {
            any.clone().downcast::<T>().ok().map(|arc| arc as Arc<dyn Lifecycle>)
        }));
        self
    }

    /// Discovered by the worker supervisor after start-up (§4.5): `T` must
    /// implement [`Worker`].
    pub fn as_worker(mut self, options: WorkerOptions) -> Self
    where
        T: Worker + 'static,
    {
        self.worker_adapter = Some(Arc::new(|any: &AnyArc| {
            any.clone().downcast::<T>().ok().map(|arc| arc as Arc<dyn Worker>)
        }));
        self.worker_options = options;
        self
    }

    pub(crate) fn into_descriptor(self) -> Descriptor {
        Descriptor {
            key: self.key,
            scope: self.scope,
            group: self.group,
            construction: self.construction,
            lifecycle_adapter: self.lifecycle_adapter,
            worker_adapter: self.worker_adapter,
            worker_options: self.worker_options,
            provider_config: self.provider_config,
        }
    }

    pub(crate) fn key(&self) -> &ServiceKey {
        &self.key
    }
}
