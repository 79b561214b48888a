use crate::{ContainerConfig, Service};

/// A memoizing provider for a single dependency slot. Providers own the
/// factory used to create their value and the cached result of calling it.
///
/// Each provider type exposes its own `resolve` and `override_with`
/// operations, so the resolution discipline of a slot (blocking, fallible or
/// asynchronous) is always known statically from its [`Key`](crate::Key).
pub trait Provider: Service {
    /// The type of value this provider resolves to.
    type Value: Service;

    /// Applies container-wide configuration when the provider is installed
    /// into a container. Called once, before the provider is shared.
    fn configure(&mut self, _config: &ContainerConfig) {}
}
