use crate::{
    providers::slot::SyncSlot, Container, Provider, Service, ServiceInfo, Svc,
};
use std::{convert::Infallible, sync::Arc};
use tracing::debug;

type ValueFactory<V> = dyn Fn(&Container) -> Svc<V> + Send + Sync;

/// A provider for dependencies whose construction cannot fail. The value is
/// created during its first resolution. Any subsequent resolutions return
/// pointers to the same value until the factory is overridden.
pub struct ValueProvider<V: Service> {
    slot: SyncSlot<ValueFactory<V>, V>,
}

impl<V: Service> ValueProvider<V> {
    /// Creates a new [`ValueProvider`] using a factory.
    #[must_use]
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&Container) -> V + Send + Sync + 'static,
    {
        ValueProvider {
            slot: SyncSlot::new(wrap(factory)),
        }
    }

    /// Creates a [`ValueProvider`] which always resolves to `value`.
    #[must_use]
    pub fn constant(value: V) -> Self {
        ValueProvider {
            slot: SyncSlot::new(constant(value)),
        }
    }

    /// Resolves the value, invoking the factory if nothing is cached.
    ///
    /// Concurrent callers block until the first one has finished invoking the
    /// factory and then receive the same pointer.
    ///
    /// ## Example
    ///
    /// ```
    /// use lazy_injector::{Container, Svc, ValueProvider};
    ///
    /// let container = Container::new();
    /// let provider = ValueProvider::new(|_| String::from("hello"));
    ///
    /// let first = provider.resolve(&container);
    /// let second = provider.resolve(&container);
    /// assert!(Svc::ptr_eq(&first, &second));
    /// ```
    pub fn resolve(&self, container: &Container) -> Svc<V> {
        let result = self.slot.get_or_try_init(|factory| {
            debug!(service = %ServiceInfo::of::<V>(), "invoking factory");
            Ok::<_, Infallible>(factory(container))
        });

        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Replaces the factory and drops the cached value, if any. Every
    /// resolution started after this returns uses the new factory.
    pub fn override_with<F>(&self, factory: F)
    where
        F: Fn(&Container) -> V + Send + Sync + 'static,
    {
        debug!(service = %ServiceInfo::of::<V>(), "overriding factory");
        self.slot.replace(wrap(factory));
    }

    /// Replaces the factory with one that always resolves to `value`.
    pub fn set(&self, value: V) {
        debug!(service = %ServiceInfo::of::<V>(), "setting constant value");
        self.slot.replace(constant(value));
    }

    /// Returns the cached value without resolving it.
    #[must_use]
    pub fn cached(&self) -> Option<Svc<V>> {
        self.slot.cached()
    }
}

impl<V: Service> Provider for ValueProvider<V> {
    type Value = V;
}

fn wrap<V, F>(factory: F) -> Arc<ValueFactory<V>>
where
    V: Service,
    F: Fn(&Container) -> V + Send + Sync + 'static,
{
    Arc::new(move |container: &Container| Svc::new(factory(container)))
}

fn constant<V: Service>(value: V) -> Arc<ValueFactory<V>> {
    let value = Svc::new(value);
    Arc::new(move |_: &Container| value.clone())
}
