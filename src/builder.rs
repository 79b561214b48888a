use crate::{Container, DynProvider, Key, Provider, ProviderMap, Svc};
use std::{any::TypeId, collections::HashMap};
use tracing::debug;

type Install = Box<dyn FnOnce(&ContainerConfig) -> DynProvider>;

/// How an [`AsyncFallibleProvider`](crate::AsyncFallibleProvider) treats a
/// computation that failed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AsyncFailurePolicy {
    /// Keep the failed computation and hand its error to every later caller
    /// until the provider's factory is overridden. The factory is never
    /// retried automatically.
    #[default]
    Replay,

    /// Discard the failed computation as soon as it fails. Callers already
    /// attached to it still receive its error, and the next resolution
    /// invokes the factory again.
    Retry,
}

/// Configuration shared by every provider in a [`Container`].
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct ContainerConfig {
    /// The failure policy of asynchronous providers which were not given one
    /// explicitly.
    pub async_failure_policy: AsyncFailurePolicy,
}

/// A builder for a [`Container`].
///
/// ```
/// use lazy_injector::{
///     AsyncFailurePolicy, Container, Key, Svc, ValueProvider,
/// };
///
/// struct Greeting;
///
/// impl Key for Greeting {
///     type Provider = ValueProvider<&'static str>;
///
///     fn default_provider() -> Self::Provider {
///         ValueProvider::new(|_| "hello")
///     }
/// }
///
/// let mut builder = Container::builder();
/// builder.async_failure_policy(AsyncFailurePolicy::Retry);
/// builder.provide::<Greeting>(ValueProvider::constant("bonjour"));
///
/// let container = builder.build();
/// let greeting = container.provider::<Greeting>().resolve(&container);
/// assert_eq!(*greeting, "bonjour");
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    providers: HashMap<TypeId, (&'static str, Install)>,
    config: ContainerConfig,
}

impl ContainerBuilder {
    /// Sets the failure policy of asynchronous providers which were not given
    /// one explicitly.
    pub fn async_failure_policy(&mut self, policy: AsyncFailurePolicy) {
        self.config.async_failure_policy = policy;
    }

    /// Borrows the configuration the container will be built with.
    #[must_use]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Mutably borrows the configuration the container will be built with.
    #[must_use]
    pub fn config_mut(&mut self) -> &mut ContainerConfig {
        &mut self.config
    }

    /// Installs the provider for a key, replacing the key's default provider.
    /// If a provider has already been given for this key, it is replaced.
    pub fn provide<K: Key>(&mut self, provider: K::Provider) {
        let install: Install = Box::new(move |config| {
            let mut provider = provider;
            provider.configure(config);
            Svc::new(provider) as DynProvider
        });
        self.providers
            .insert(TypeId::of::<K>(), (std::any::type_name::<K>(), install));
    }

    /// Builds the container.
    #[must_use]
    pub fn build(self) -> Container {
        let mut provider_map = ProviderMap::new();
        for (key, (name, install)) in self.providers {
            debug!(key = name, "installing provided provider");
            provider_map.insert(key, install(&self.config));
        }

        Container::new_from_parts(provider_map, self.config)
    }
}
