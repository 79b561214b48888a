use crate::{
    AsyncFailurePolicy, Container, ContainerConfig, InjectError, InjectResult,
    Provider, Service, ServiceInfo, Svc,
};
use futures_util::{
    future::{self, BoxFuture, Shared},
    FutureExt,
};
use parking_lot::Mutex;
use std::{
    any::Any,
    error::Error,
    future::Future,
    panic::AssertUnwindSafe,
    sync::{Arc, Weak},
};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

type AsyncFactory<V> =
    dyn Fn(Container) -> BoxFuture<'static, InjectResult<Svc<V>>> + Send + Sync;

/// A handle to a computation that any number of callers can await.
type Inflight<V> = Shared<BoxFuture<'static, InjectResult<Svc<V>>>>;

struct AsyncSlot<V> {
    factory: Arc<AsyncFactory<V>>,
    cached: Option<Svc<V>>,
    inflight: Option<Inflight<V>>,
    generation: u64,
}

enum Attached<V> {
    Ready(Svc<V>),
    Pending(Inflight<V>),
}

/// A provider for dependencies that are created asynchronously and whose
/// construction may fail.
///
/// The factory runs on its own tokio task. Callers arriving while it runs
/// attach to the same computation instead of starting another one, so the
/// factory is invoked once no matter how many callers race on the first
/// resolution. Dropping a caller's future does not cancel the computation;
/// the task still runs to completion and caches its value.
///
/// With the default [`AsyncFailurePolicy::Replay`], a failed computation is
/// kept and its error is handed to every later caller until the factory is
/// overridden. [`AsyncFailurePolicy::Retry`] discards the failed computation
/// so the next resolution invokes the factory again.
pub struct AsyncFallibleProvider<V: Service> {
    slot: Arc<Mutex<AsyncSlot<V>>>,
    failure_policy: Option<AsyncFailurePolicy>,
}

impl<V: Service> AsyncFallibleProvider<V> {
    /// Creates a new [`AsyncFallibleProvider`] using a factory.
    #[must_use]
    pub fn new<F, Fut, E>(factory: F) -> Self
    where
        F: Fn(Container) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        AsyncFallibleProvider {
            slot: Arc::new(Mutex::new(AsyncSlot {
                factory: wrap(factory),
                cached: None,
                inflight: None,
                generation: 0,
            })),
            failure_policy: None,
        }
    }

    /// Sets how this provider treats a failed computation. This takes
    /// precedence over the policy configured on the container.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: AsyncFailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// The policy this provider applies to failed computations.
    #[must_use]
    pub fn failure_policy(&self) -> AsyncFailurePolicy {
        self.failure_policy.unwrap_or_default()
    }

    /// Resolves the value.
    ///
    /// Returns the cached value without suspending if there is one.
    /// Otherwise, awaits the in-flight computation, starting it on the
    /// current tokio runtime if nobody has yet.
    ///
    /// ## Example
    ///
    /// ```
    /// use lazy_injector::{AsyncFallibleProvider, Container, Svc};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let container = Container::new();
    /// let provider = AsyncFallibleProvider::new(|_| async {
    ///     Ok::<_, std::io::Error>(String::from("connected"))
    /// });
    ///
    /// let first = provider.resolve(&container).await.unwrap();
    /// let second = provider.resolve(&container).await.unwrap();
    /// assert!(Svc::ptr_eq(&first, &second));
    /// # }
    /// ```
    pub async fn resolve(&self, container: &Container) -> InjectResult<Svc<V>> {
        match self.attach(container)? {
            Attached::Ready(value) => Ok(value),
            Attached::Pending(inflight) => inflight.await,
        }
    }

    /// Replaces the factory and drops the cached value and any in-flight
    /// computation. Callers already awaiting the old computation still
    /// receive its outcome, but it is not cached.
    pub fn override_with<F, Fut, E>(&self, factory: F)
    where
        F: Fn(Container) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        debug!(service = %ServiceInfo::of::<V>(), "overriding factory");
        self.replace(wrap(factory), None);
    }

    /// Replaces the factory with one that always succeeds with `value`. The
    /// value is cached immediately, so resolving it does not need a runtime.
    pub fn set(&self, value: V) {
        debug!(service = %ServiceInfo::of::<V>(), "setting constant value");
        let value = Svc::new(value);
        let constant = value.clone();
        let factory: Arc<AsyncFactory<V>> = Arc::new(move |_: Container| {
            future::ready(Ok::<_, InjectError>(constant.clone())).boxed()
        });
        self.replace(factory, Some(value));
    }

    /// Returns the cached value without resolving it.
    #[must_use]
    pub fn cached(&self) -> Option<Svc<V>> {
        self.slot.lock().cached.clone()
    }

    fn replace(&self, factory: Arc<AsyncFactory<V>>, cached: Option<Svc<V>>) {
        let mut slot = self.slot.lock();
        slot.factory = factory;
        slot.cached = cached;
        slot.inflight = None;
        slot.generation = slot.generation.wrapping_add(1);
    }

    fn attach(&self, container: &Container) -> InjectResult<Attached<V>> {
        let mut slot = self.slot.lock();
        if let Some(value) = &slot.cached {
            trace!(service = %ServiceInfo::of::<V>(), "cache hit");
            return Ok(Attached::Ready(value.clone()));
        }

        if let Some(inflight) = &slot.inflight {
            trace!(
                service = %ServiceInfo::of::<V>(),
                "attaching to in-flight computation"
            );
            return Ok(Attached::Pending(inflight.clone()));
        }

        let inflight = self.spawn(&slot, container)?;
        slot.inflight = Some(inflight.clone());
        Ok(Attached::Pending(inflight))
    }

    fn spawn(
        &self,
        slot: &AsyncSlot<V>,
        container: &Container,
    ) -> InjectResult<Inflight<V>> {
        let service_info = ServiceInfo::of::<V>();
        let runtime = Handle::try_current()
            .map_err(|_| InjectError::MissingRuntime { service_info })?;

        debug!(
            service = %service_info,
            generation = slot.generation,
            "spawning factory"
        );
        let weak_slot = Arc::downgrade(&self.slot);
        let generation = slot.generation;
        let policy = self.failure_policy();
        let task = runtime.spawn(compute(
            slot.factory.clone(),
            container.clone(),
            weak_slot.clone(),
            generation,
            policy,
        ));

        Ok(async move {
            match task.await {
                Ok(result) => result,
                Err(_) => {
                    // The task never reached `record`, so record the abort here
                    warn!(service = %service_info, "factory task was cancelled");
                    let aborted =
                        Err(InjectError::ActivationAborted { service_info });
                    if let Some(slot) = weak_slot.upgrade() {
                        record(&slot, generation, policy, &aborted);
                    }
                    aborted
                }
            }
        }
        .boxed()
        .shared())
    }
}

impl<V: Service> Provider for AsyncFallibleProvider<V> {
    type Value = V;

    fn configure(&mut self, config: &ContainerConfig) {
        if self.failure_policy.is_none() {
            self.failure_policy = Some(config.async_failure_policy);
        }
    }
}

/// Runs the factory on its own task and records the outcome in the slot,
/// unless the slot has been overridden since the computation started.
async fn compute<V: Service>(
    factory: Arc<AsyncFactory<V>>,
    container: Container,
    slot: Weak<Mutex<AsyncSlot<V>>>,
    generation: u64,
    policy: AsyncFailurePolicy,
) -> InjectResult<Svc<V>> {
    let service_info = ServiceInfo::of::<V>();
    let outcome = AssertUnwindSafe(async move { factory(container).await })
        .catch_unwind()
        .await;
    let result = match outcome {
        Ok(result) => result,
        Err(payload) => Err(InjectError::FactoryPanicked {
            service_info,
            message: panic_message(payload.as_ref()),
        }),
    };

    if let Err(error) = &result {
        warn!(service = %service_info, %error, "factory failed");
    }
    if let Some(slot) = slot.upgrade() {
        record(&slot, generation, policy, &result);
    }
    result
}

fn record<V>(
    slot: &Mutex<AsyncSlot<V>>,
    generation: u64,
    policy: AsyncFailurePolicy,
    result: &InjectResult<Svc<V>>,
) {
    let mut slot = slot.lock();
    if slot.generation != generation {
        return;
    }

    match result {
        Ok(value) => slot.cached = Some(value.clone()),
        Err(_) if policy == AsyncFailurePolicy::Retry => slot.inflight = None,
        Err(_) => {}
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}

fn wrap<V, F, Fut, E>(factory: F) -> Arc<AsyncFactory<V>>
where
    V: Service,
    F: Fn(Container) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    E: Error + Send + Sync + 'static,
{
    Arc::new(move |container: Container| {
        factory(container)
            .map(|result| match result {
                Ok(value) => Ok(Svc::new(value)),
                Err(error) => Err(InjectError::activation_failed::<V, E>(error)),
            })
            .boxed()
    })
}
