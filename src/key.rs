use crate::{
    AsyncFallibleDependency, AsyncFallibleProvider, Dependency,
    FallibleDependency, FallibleProvider, Provider, ValueProvider,
};
use std::marker::PhantomData;

/// Identifies a single dependency slot in a [`Container`](crate::Container).
///
/// A key carries no state. Its type is its identity, and it names the kind of
/// provider bound to its slot along with the provider to install when the slot
/// is first accessed. Implementing this trait directly allows values that are
/// not their own dependency type, such as configuration strings, to have a
/// slot:
///
/// ```
/// use lazy_injector::{Container, Key, ValueProvider};
///
/// struct ApiUrl;
///
/// impl Key for ApiUrl {
///     type Provider = ValueProvider<String>;
///
///     fn default_provider() -> Self::Provider {
///         ValueProvider::new(|_| String::from("https://example.com/api"))
///     }
/// }
///
/// let container = Container::new();
/// let url = container.provider::<ApiUrl>().resolve(&container);
/// assert_eq!(url.as_str(), "https://example.com/api");
/// ```
pub trait Key: 'static {
    /// The provider bound to this key's slot.
    type Provider: Provider;

    /// Creates the provider installed the first time the slot is accessed.
    fn default_provider() -> Self::Provider;
}

/// The key of a type implementing [`Dependency`].
pub struct ValueKey<T>(PhantomData<fn() -> T>);

/// The key of a type implementing [`FallibleDependency`].
pub struct FallibleKey<T>(PhantomData<fn() -> T>);

/// The key of a type implementing [`AsyncFallibleDependency`].
pub struct AsyncFallibleKey<T>(PhantomData<fn() -> T>);

impl<T: Dependency> Key for ValueKey<T> {
    type Provider = ValueProvider<T>;

    fn default_provider() -> Self::Provider {
        ValueProvider::new(T::create)
    }
}

impl<T: FallibleDependency> Key for FallibleKey<T> {
    type Provider = FallibleProvider<T>;

    fn default_provider() -> Self::Provider {
        FallibleProvider::new(T::try_create)
    }
}

impl<T: AsyncFallibleDependency> Key for AsyncFallibleKey<T> {
    type Provider = AsyncFallibleProvider<T>;

    fn default_provider() -> Self::Provider {
        AsyncFallibleProvider::new(T::create_async)
    }
}
