use crate::{Container, Service};
use async_trait::async_trait;
use std::error::Error;

/// A type that can be created from a [`Container`] and cannot fail to be
/// created. Implementors are resolved through
/// [`Container::get`](crate::Container::get) and cached in their own slot.
///
/// ## Example
///
/// ```
/// use lazy_injector::{Container, Dependency, Svc};
///
/// struct Settings {
///     retries: u32,
/// }
///
/// impl Dependency for Settings {
///     fn create(_container: &Container) -> Self {
///         Settings { retries: 3 }
///     }
/// }
///
/// struct Client {
///     settings: Svc<Settings>,
/// }
///
/// impl Dependency for Client {
///     fn create(container: &Container) -> Self {
///         Client { settings: container.get() }
///     }
/// }
///
/// let container = Container::new();
/// let client: Svc<Client> = container.get();
/// assert_eq!(client.settings.retries, 3);
/// ```
pub trait Dependency: Service + Sized {
    /// Creates the dependency, resolving its own dependencies from the
    /// container.
    fn create(container: &Container) -> Self;
}

/// A type that can be created from a [`Container`] but whose creation may
/// fail. A failure is never cached; the next resolution tries again.
pub trait FallibleDependency: Service + Sized {
    /// The error returned when creation fails.
    type Error: Error + Send + Sync + 'static;

    /// Attempts to create the dependency.
    fn try_create(container: &Container) -> Result<Self, Self::Error>;
}

/// A type that is created asynchronously from a [`Container`] and whose
/// creation may fail.
///
/// Creation runs on its own tokio task, which receives an owned handle to the
/// container. Concurrent resolutions share that one task.
///
/// ## Example
///
/// ```
/// use lazy_injector::{async_trait, AsyncFallibleDependency, Container};
///
/// struct Connection {
///     peer: String,
/// }
///
/// #[async_trait]
/// impl AsyncFallibleDependency for Connection {
///     type Error = std::io::Error;
///
///     async fn create_async(_container: Container) -> Result<Self, Self::Error> {
///         Ok(Connection { peer: String::from("127.0.0.1:5432") })
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let container = Container::new();
/// let connection = container.get_async::<Connection>().await.unwrap();
/// assert_eq!(connection.peer, "127.0.0.1:5432");
/// # }
/// ```
#[async_trait]
pub trait AsyncFallibleDependency: Service + Sized {
    /// The error returned when creation fails.
    type Error: Error + Send + Sync + 'static;

    /// Attempts to create the dependency.
    async fn create_async(container: Container) -> Result<Self, Self::Error>;
}
