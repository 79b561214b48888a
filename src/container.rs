use crate::{
    AsyncFallibleDependency, AsyncFallibleKey, ContainerBuilder,
    ContainerConfig, Dependency, FallibleDependency, FallibleKey, InjectResult,
    Key, Provider, Svc, ValueKey,
};
use parking_lot::Mutex;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    error::Error,
    future::Future,
};
use tracing::debug;

/// A type-erased provider stored in a container slot.
pub(crate) type DynProvider = Svc<dyn Any + Send + Sync>;

pub(crate) type ProviderMap = HashMap<TypeId, DynProvider>;

struct ContainerInner {
    provider_map: Mutex<ProviderMap>,
    config: ContainerConfig,
}

/// A lazily populated registry of dependencies. Each [`Key`] maps to exactly
/// one provider, which is created the first time the key is accessed and then
/// reused for the lifetime of the container.
///
/// # Sharing the container
///
/// Cloning the container does not clone the providers inside of it. Instead,
/// both handles use the same providers, so a container can be handed to
/// factories and moved into tasks. Separately constructed containers never
/// share providers, which keeps tests isolated from one another.
///
/// ```
/// use lazy_injector::{Container, Dependency, Svc};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// static CREATED: AtomicUsize = AtomicUsize::new(0);
///
/// struct Counter(usize);
///
/// impl Dependency for Counter {
///     fn create(_container: &Container) -> Self {
///         Counter(CREATED.fetch_add(1, Ordering::SeqCst))
///     }
/// }
///
/// let container = Container::new();
/// let handle = container.clone();
/// let a: Svc<Counter> = container.get();
/// let b: Svc<Counter> = handle.get();
/// assert!(Svc::ptr_eq(&a, &b));
///
/// let other = Container::new();
/// let c: Svc<Counter> = other.get();
/// assert!(!Svc::ptr_eq(&a, &c));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Svc<ContainerInner>,
}

impl Container {
    /// Creates an empty container with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Container::builder().build()
    }

    /// Creates a builder for a container.
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    pub(crate) fn new_from_parts(
        provider_map: ProviderMap,
        config: ContainerConfig,
    ) -> Self {
        Container {
            inner: Svc::new(ContainerInner {
                provider_map: Mutex::new(provider_map),
                config,
            }),
        }
    }

    /// The configuration this container was built with.
    #[must_use]
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// Gets the provider for a key, creating it from the key's default
    /// provider if this is the first time the key has been accessed.
    ///
    /// The slot map is only locked while looking up or inserting the
    /// provider, never while a factory runs.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn provider<K: Key>(&self) -> Svc<K::Provider> {
        let provider = self
            .inner
            .provider_map
            .lock()
            .entry(TypeId::of::<K>())
            .or_insert_with(|| {
                debug!(key = std::any::type_name::<K>(), "creating provider");
                let mut provider = K::default_provider();
                provider.configure(&self.inner.config);
                Svc::new(provider) as DynProvider
            })
            .clone();

        // Should never panic: a key's slot only ever holds `K::Provider`
        provider.downcast::<K::Provider>().unwrap_or_else(|_| {
            unreachable!(
                "slot for {} holds the wrong provider type",
                std::any::type_name::<K>()
            )
        })
    }

    /// Resolves a [`Dependency`], creating it on first use.
    #[must_use]
    pub fn get<T: Dependency>(&self) -> Svc<T> {
        self.provider::<ValueKey<T>>().resolve(self)
    }

    /// Resolves a [`FallibleDependency`], creating it on first use. A failure
    /// is not cached.
    pub fn try_get<T: FallibleDependency>(&self) -> InjectResult<Svc<T>> {
        self.provider::<FallibleKey<T>>().resolve(self)
    }

    /// Resolves an [`AsyncFallibleDependency`], starting its creation on the
    /// current tokio runtime if no caller has yet.
    pub async fn get_async<T: AsyncFallibleDependency>(
        &self,
    ) -> InjectResult<Svc<T>> {
        self.provider::<AsyncFallibleKey<T>>().resolve(self).await
    }

    /// Replaces the factory of a [`Dependency`], dropping its cached value.
    pub fn override_value<T, F>(&self, factory: F)
    where
        T: Dependency,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.provider::<ValueKey<T>>().override_with(factory);
    }

    /// Replaces the factory of a [`FallibleDependency`], dropping its cached
    /// value.
    pub fn override_fallible<T, F, E>(&self, factory: F)
    where
        T: FallibleDependency,
        F: Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
        E: Error + Send + Sync + 'static,
    {
        self.provider::<FallibleKey<T>>().override_with(factory);
    }

    /// Replaces the factory of an [`AsyncFallibleDependency`], dropping its
    /// cached value and in-flight computation.
    pub fn override_async<T, F, Fut, E>(&self, factory: F)
    where
        T: AsyncFallibleDependency,
        F: Fn(Container) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        self.provider::<AsyncFallibleKey<T>>().override_with(factory);
    }

    /// Replaces a [`Dependency`] with a fixed instance.
    pub fn set<T: Dependency>(&self, value: T) {
        self.provider::<ValueKey<T>>().set(value);
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::new()
    }
}
