//! # Lazily resolved, overridable dependencies.
//!
//! A [`Container`] maps [keys](Key) to providers. Each provider creates its
//! value the first time it is requested and hands a pointer to that same
//! value, a [`Svc<T>`], to every caller afterwards. This holds even when many
//! threads or tasks race on the first request: the value is only ever
//! computed once.
//!
//! ## Dependency kinds
//!
//! There are three kinds of dependency, each with its own provider:
//!
//! - **[Value](crate::ValueProvider):** created synchronously and can't fail.
//!   Implement [`Dependency`] and resolve with [`Container::get`]. Concurrent
//!   callers block while the first one runs the factory.
//! - **[Fallible](crate::FallibleProvider):** created synchronously and may
//!   fail. Implement [`FallibleDependency`] and resolve with
//!   [`Container::try_get`]. A failure is never cached, so the next request
//!   tries again.
//! - **[Async fallible](crate::AsyncFallibleProvider):** created
//!   asynchronously on its own tokio task and may fail. Implement
//!   [`AsyncFallibleDependency`] and resolve with [`Container::get_async`].
//!   Concurrent callers await one shared computation. By default a failure is
//!   replayed to every later caller until the factory is overridden; see
//!   [`AsyncFailurePolicy`].
//!
//! ## Overriding dependencies
//!
//! Every provider's factory can be replaced at runtime, for instance to
//! substitute a test double. Overriding drops the cached value, so the next
//! request uses the new factory. The override entry point is chosen by the
//! kind of the dependency, so using the wrong one does not compile.
//!
//! ## Containers are independent
//!
//! Providers are stored per container rather than globally. Cloning a
//! container shares its providers; constructing a new one starts from a clean
//! slate.
//!
//! ## Example
//!
//! ```
//! use lazy_injector::{
//!     accessors, async_trait, AsyncFallibleDependency, Container, Dependency,
//!     InjectResult, Svc,
//! };
//!
//! struct Config {
//!     database_url: String,
//! }
//!
//! impl Dependency for Config {
//!     fn create(_container: &Container) -> Self {
//!         Config { database_url: String::from("postgres://localhost/app") }
//!     }
//! }
//!
//! struct Database {
//!     url: String,
//! }
//!
//! #[async_trait]
//! impl AsyncFallibleDependency for Database {
//!     type Error = std::io::Error;
//!
//!     async fn create_async(container: Container) -> Result<Self, Self::Error> {
//!         let config = container.config_value();
//!         Ok(Database { url: config.database_url.clone() })
//!     }
//! }
//!
//! accessors! {
//!     trait AppDependencies {
//!         config_value: Value<Config>,
//!         database: AsyncFallible<Database>,
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> InjectResult<()> {
//!     let container = Container::new();
//!     let database = container.database().await?;
//!     assert_eq!(database.url, "postgres://localhost/app");
//!
//!     // Substitute a different configuration
//!     container.set(Config { database_url: String::from("sqlite::memory:") });
//!     container.override_async::<Database, _, _, _>(|container| async move {
//!         let config: Svc<Config> = container.get();
//!         Ok::<_, std::io::Error>(Database { url: config.database_url.clone() })
//!     });
//!     let database = container.database().await?;
//!     assert_eq!(database.url, "sqlite::memory:");
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::needless_doctest_main
)]

mod builder;
mod container;
mod dependency;
mod key;
mod macros;
mod providers;

pub use builder::*;
pub use container::*;
pub use dependency::*;
pub use key::*;
pub use providers::*;

pub use async_trait::async_trait;
pub use futures_util::future::BoxFuture;

#[cfg(test)]
mod tests;
