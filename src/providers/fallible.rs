use crate::{
    providers::slot::SyncSlot, Container, InjectError, InjectResult, Provider,
    Service, ServiceInfo, Svc,
};
use std::{error::Error, sync::Arc};
use tracing::debug;

type FallibleFactory<V> =
    dyn Fn(&Container) -> InjectResult<Svc<V>> + Send + Sync;

/// A provider for dependencies whose construction may fail. During activation
/// failure, an instance of [`InjectError::ActivationFailed`] is returned as an
/// error.
///
/// Failures are never cached: if the factory fails, the next resolution
/// invokes it again. Only a successfully created value is reused.
pub struct FallibleProvider<V: Service> {
    slot: SyncSlot<FallibleFactory<V>, V>,
}

impl<V: Service> FallibleProvider<V> {
    /// Creates a new [`FallibleProvider`] using a factory.
    #[must_use]
    pub fn new<F, E>(factory: F) -> Self
    where
        F: Fn(&Container) -> Result<V, E> + Send + Sync + 'static,
        E: Error + Send + Sync + 'static,
    {
        FallibleProvider {
            slot: SyncSlot::new(wrap(factory)),
        }
    }

    /// Resolves the value, invoking the factory if nothing is cached.
    ///
    /// ## Example
    ///
    /// ```
    /// use lazy_injector::{Container, FallibleProvider, InjectError};
    /// use std::num::ParseIntError;
    ///
    /// let container = Container::new();
    /// let provider = FallibleProvider::new(|_| "twelve".parse::<u32>());
    ///
    /// match provider.resolve(&container) {
    ///     Err(error @ InjectError::ActivationFailed { .. }) => {
    ///         assert!(error.downcast_inner::<ParseIntError>().is_some());
    ///     }
    ///     other => panic!("unexpected result: {:?}", other),
    /// }
    /// ```
    pub fn resolve(&self, container: &Container) -> InjectResult<Svc<V>> {
        self.slot.get_or_try_init(|factory| {
            debug!(service = %ServiceInfo::of::<V>(), "invoking factory");
            factory(container)
        })
    }

    /// Replaces the factory and drops the cached value, if any. Every
    /// resolution started after this returns uses the new factory.
    pub fn override_with<F, E>(&self, factory: F)
    where
        F: Fn(&Container) -> Result<V, E> + Send + Sync + 'static,
        E: Error + Send + Sync + 'static,
    {
        debug!(service = %ServiceInfo::of::<V>(), "overriding factory");
        self.slot.replace(wrap(factory));
    }

    /// Replaces the factory with one that always succeeds with `value`.
    pub fn set(&self, value: V) {
        debug!(service = %ServiceInfo::of::<V>(), "setting constant value");
        let value = Svc::new(value);
        self.slot.replace(Arc::new(move |_: &Container| {
            Ok::<_, InjectError>(value.clone())
        }));
    }

    /// Returns the cached value without resolving it.
    #[must_use]
    pub fn cached(&self) -> Option<Svc<V>> {
        self.slot.cached()
    }
}

impl<V: Service> Provider for FallibleProvider<V> {
    type Value = V;
}

fn wrap<V, F, E>(factory: F) -> Arc<FallibleFactory<V>>
where
    V: Service,
    F: Fn(&Container) -> Result<V, E> + Send + Sync + 'static,
    E: Error + Send + Sync + 'static,
{
    Arc::new(move |container: &Container| match factory(container) {
        Ok(value) => Ok(Svc::new(value)),
        Err(error) => Err(InjectError::activation_failed::<V, _>(error)),
    })
}
