use derive_more::Display;
use std::{
    any::{Any, TypeId},
    error::Error,
    sync::Arc,
};

/// A reference-counted pointer holding a resolved dependency. Every caller
/// resolving the same slot receives a clone of the same pointer.
pub type Svc<T> = Arc<T>;

/// A result from attempting to resolve a dependency.
pub type InjectResult<T> = Result<T, InjectError>;

/// Implemented automatically on types that are capable of being stored in a
/// container.
pub trait Service: Any + Send + Sync {}
impl<T: ?Sized + Any + Send + Sync> Service for T {}

/// Type information about a dependency.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Display)]
#[display(fmt = "{}", name)]
pub struct ServiceInfo {
    id: TypeId,
    name: &'static str,
}

impl ServiceInfo {
    /// Creates a [`ServiceInfo`] for the given type.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + Any>() -> Self {
        ServiceInfo {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Gets the [`TypeId`] for this dependency.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Gets the type name of this dependency.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// An error that has occurred while resolving a dependency.
///
/// Errors are cheap to clone so that a single failed computation can be
/// handed to every caller waiting on it.
#[derive(Clone, Debug, Display)]
#[non_exhaustive]
pub enum InjectError {
    /// The factory for the dependency returned an error.
    #[display(fmt = "an error occurred during activation of {}", service_info)]
    ActivationFailed {
        /// The dependency that was requested.
        service_info: ServiceInfo,

        /// The error returned by the factory.
        inner: Arc<dyn Error + Send + Sync + 'static>,
    },

    /// The factory for the dependency panicked while running on its own
    /// task.
    #[display(
        fmt = "the factory for {} panicked: {}",
        service_info,
        message
    )]
    FactoryPanicked {
        /// The dependency that was requested.
        service_info: ServiceInfo,

        /// The panic payload, if it was a string.
        message: String,
    },

    /// The task computing the dependency was cancelled before it finished,
    /// usually because its runtime is shutting down.
    #[display(
        fmt = "activation of {} was aborted before it completed",
        service_info
    )]
    ActivationAborted {
        /// The dependency that was requested.
        service_info: ServiceInfo,
    },

    /// An asynchronous dependency was resolved outside of a tokio runtime.
    #[display(
        fmt = "{} must be resolved from within a tokio runtime",
        service_info
    )]
    MissingRuntime {
        /// The dependency that was requested.
        service_info: ServiceInfo,
    },
}

impl InjectError {
    /// Wraps an error returned by the factory of `V`.
    #[must_use]
    pub fn activation_failed<V, E>(error: E) -> Self
    where
        V: ?Sized + Any,
        E: Error + Send + Sync + 'static,
    {
        InjectError::ActivationFailed {
            service_info: ServiceInfo::of::<V>(),
            inner: Arc::new(error),
        }
    }

    /// The dependency whose resolution failed.
    #[must_use]
    pub fn service_info(&self) -> ServiceInfo {
        match self {
            InjectError::ActivationFailed { service_info, .. }
            | InjectError::FactoryPanicked { service_info, .. }
            | InjectError::ActivationAborted { service_info }
            | InjectError::MissingRuntime { service_info } => *service_info,
        }
    }

    /// Attempts to view the error returned by a factory as a concrete type.
    #[must_use]
    pub fn downcast_inner<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            InjectError::ActivationFailed { inner, .. } => {
                inner.downcast_ref::<E>()
            }
            _ => None,
        }
    }
}

impl Error for InjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InjectError::ActivationFailed { inner, .. } => {
                Some(inner.as_ref())
            }
            _ => None,
        }
    }
}
