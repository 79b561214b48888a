/// Declares an extension trait on [`Container`](crate::Container) with one
/// accessor per dependency type.
///
/// Each entry names the accessor, the kind of dependency and the dependency
/// type. The kind selects the return type of the accessor:
///
/// - `Value<T>` (a [`Dependency`](crate::Dependency)): `Svc<T>`
/// - `Fallible<T>` (a [`FallibleDependency`](crate::FallibleDependency)):
///   `InjectResult<Svc<T>>`
/// - `AsyncFallible<T>` (an
///   [`AsyncFallibleDependency`](crate::AsyncFallibleDependency)): a boxed
///   future of `InjectResult<Svc<T>>`
///
/// Accessors resolve through the same slots as
/// [`Container::get`](crate::Container::get) and friends, so overrides made
/// through the container apply to them. The trait has the visibility given
/// in the declaration.
///
/// ## Example
///
/// ```
/// use lazy_injector::{accessors, Container, Dependency, Svc};
///
/// struct Clock;
/// impl Dependency for Clock {
///     fn create(_container: &Container) -> Self {
///         Clock
///     }
/// }
///
/// struct Scheduler {
///     clock: Svc<Clock>,
/// }
/// impl Dependency for Scheduler {
///     fn create(container: &Container) -> Self {
///         Scheduler { clock: container.clock() }
///     }
/// }
///
/// accessors! {
///     pub trait AppDependencies {
///         clock: Value<Clock>,
///         scheduler: Value<Scheduler>,
///     }
/// }
///
/// let container = Container::new();
/// let scheduler = container.scheduler();
/// assert!(Svc::ptr_eq(&scheduler.clock, &container.clock()));
/// ```
#[macro_export]
macro_rules! accessors {
    (@signature [$(#[$attr:meta])*] Value $accessor:ident $dependency:ty) => {
        $(#[$attr])*
        fn $accessor(&self) -> $crate::Svc<$dependency>;
    };
    (@signature [$(#[$attr:meta])*] Fallible $accessor:ident $dependency:ty) => {
        $(#[$attr])*
        fn $accessor(&self) -> $crate::InjectResult<$crate::Svc<$dependency>>;
    };
    (@signature [$(#[$attr:meta])*] AsyncFallible $accessor:ident $dependency:ty) => {
        $(#[$attr])*
        fn $accessor(
            &self,
        ) -> $crate::BoxFuture<'_, $crate::InjectResult<$crate::Svc<$dependency>>>;
    };

    (@body Value $accessor:ident $dependency:ty) => {
        fn $accessor(&self) -> $crate::Svc<$dependency> {
            $crate::Container::get::<$dependency>(self)
        }
    };
    (@body Fallible $accessor:ident $dependency:ty) => {
        fn $accessor(&self) -> $crate::InjectResult<$crate::Svc<$dependency>> {
            $crate::Container::try_get::<$dependency>(self)
        }
    };
    (@body AsyncFallible $accessor:ident $dependency:ty) => {
        fn $accessor(
            &self,
        ) -> $crate::BoxFuture<'_, $crate::InjectResult<$crate::Svc<$dependency>>> {
            ::std::boxed::Box::pin($crate::Container::get_async::<$dependency>(self))
        }
    };

    {
        $(#[$attr:meta])*
        $vis:vis trait $name:ident {
            $(
                $(#[$accessor_attr:meta])*
                $accessor:ident : $kind:ident < $dependency:ty >
            ),*
            $(,)?
        }
    } => {
        $(#[$attr])*
        $vis trait $name {
            $(
                $crate::accessors!(
                    @signature [$(#[$accessor_attr])*] $kind $accessor $dependency
                );
            )*
        }

        impl $name for $crate::Container {
            $(
                $crate::accessors!(@body $kind $accessor $dependency);
            )*
        }
    };
}
