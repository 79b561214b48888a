use crate::{
    accessors, async_trait, AsyncFailurePolicy, AsyncFallibleDependency,
    Container, Dependency, FallibleDependency, FallibleKey, InjectError,
    InjectResult, Key, ServiceInfo, Svc, ValueKey, ValueProvider,
};
use derive_more::Display;
use parking_lot::Mutex;
use std::{
    error::Error,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
    time::Duration,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct A {
    id: Uuid,
}

impl Dependency for A {
    fn create(_container: &Container) -> Self {
        A { id: Uuid::new_v4() }
    }
}

struct B {
    a: Svc<A>,
}

impl Dependency for B {
    fn create(container: &Container) -> Self {
        B { a: container.a() }
    }
}

struct C {
    a: Svc<A>,
}

#[async_trait]
impl AsyncFallibleDependency for C {
    type Error = InjectError;

    async fn create_async(container: Container) -> Result<Self, Self::Error> {
        Ok(C { a: container.a() })
    }
}

#[derive(Debug, Display)]
#[display(fmt = "the slow service is not ready")]
struct NotReady;

impl Error for NotReady {}

/// Counts its own creations and takes a while to be created.
struct Slow {
    id: Uuid,
}

static SLOW_CREATIONS: AtomicUsize = AtomicUsize::new(0);

impl FallibleDependency for Slow {
    type Error = NotReady;

    fn try_create(_container: &Container) -> Result<Self, Self::Error> {
        SLOW_CREATIONS.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(200));
        Ok(Slow { id: Uuid::new_v4() })
    }
}

/// A dependency implemented for a type defined elsewhere.
impl Dependency for Duration {
    fn create(_container: &Container) -> Self {
        Duration::from_secs(2)
    }
}

accessors! {
    trait TestDependencies {
        a: Value<A>,
        b: Value<B>,
        /// Resolved on its own task.
        c: AsyncFallible<C>,
        slow: Fallible<Slow>,
        timeout: Value<Duration>,
    }
}

#[test]
fn forwarded_declarations_share_resolved_dependency() {
    init_tracing();
    let container = Container::new();

    let b1 = B::create(&container);
    let b2 = B::create(&container);
    assert_eq!(b1.a.id, b2.a.id);

    let b3 = container.b();
    let b4 = container.b();
    assert!(Svc::ptr_eq(&b3, &b4));
    assert_eq!(b3.a.id, b1.a.id);
}

#[tokio::test]
async fn async_dependency_sees_same_value_dependency() {
    init_tracing();
    let container = Container::new();

    let b = container.b();
    let c = container.c().await.unwrap();
    assert_eq!(b.a.id, c.a.id);
}

#[test]
fn foreign_type_can_be_dependency() {
    let container = Container::new();
    assert_eq!(*container.timeout(), Duration::from_secs(2));
}

#[test]
fn containers_do_not_share_providers() {
    let first = Container::new();
    let second = Container::new();

    assert_ne!(first.a().id, second.a().id);
    assert_eq!(first.a().id, first.clone().a().id);
}

#[test]
fn provider_is_created_once_per_container() {
    let container = Container::new();

    let first = container.provider::<ValueKey<A>>();
    let second = container.provider::<ValueKey<A>>();
    assert!(Svc::ptr_eq(&first, &second));
}

#[test]
fn override_replaces_value_for_later_resolutions() {
    let container = Container::new();
    let before = container.a();

    let replacement = Uuid::new_v4();
    container.override_value(move |_| A { id: replacement });
    let after = container.a();

    assert_ne!(before.id, after.id);
    assert_eq!(after.id, replacement);
}

#[test]
fn set_installs_fixed_instance() {
    let container = Container::new();
    let id = Uuid::new_v4();

    container.set(A { id });
    assert_eq!(container.a().id, id);
    assert_eq!(container.b().a.id, id);
}

/// Dependents keep the instance they were created with; overriding a
/// dependency does not cascade to values already cached.
#[test]
fn override_does_not_cascade_to_cached_dependents() {
    let container = Container::new();
    let b = container.b();

    container.override_value(|_| A { id: Uuid::nil() });

    assert_eq!(container.b().a.id, b.a.id);
    assert_eq!(container.a().id, Uuid::nil());
}

#[test]
fn concurrent_fallible_resolution_creates_once() {
    const THREADS: usize = 6;

    init_tracing();
    let container = Container::new();
    let before = SLOW_CREATIONS.load(Ordering::SeqCst);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let container = container.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                container.slow().map(|slow| slow.id)
            })
        })
        .collect();

    let ids: Vec<Uuid> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();

    assert_eq!(SLOW_CREATIONS.load(Ordering::SeqCst) - before, 1);
    assert!(ids.iter().all(|id| *id == ids[0]));
}

#[test]
fn fallible_failure_is_retried() {
    let container = Container::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let ready = Arc::new(Mutex::new(false));
    {
        let attempts = attempts.clone();
        let ready = ready.clone();
        container.override_fallible(move |_| {
            attempts.fetch_add(1, Ordering::SeqCst);
            if *ready.lock() {
                Ok(Slow { id: Uuid::nil() })
            } else {
                Err(NotReady)
            }
        });
    }

    match container.slow() {
        Err(InjectError::ActivationFailed { service_info, .. })
            if service_info == ServiceInfo::of::<Slow>() => {}
        Err(error) => Err(error).unwrap(),
        Ok(_) => unreachable!("activation should have failed"),
    }

    *ready.lock() = true;
    assert_eq!(container.slow().unwrap().id, Uuid::nil());
    assert_eq!(container.slow().unwrap().id, Uuid::nil());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

struct Flaky;

#[async_trait]
impl AsyncFallibleDependency for Flaky {
    type Error = NotReady;

    async fn create_async(_container: Container) -> Result<Self, Self::Error> {
        Err(NotReady)
    }
}

#[tokio::test]
async fn async_failure_is_replayed_by_default() {
    let container = Container::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    {
        let attempts = attempts.clone();
        container.override_async(move |_| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<Flaky, _>(NotReady) }
        });
    }

    assert!(container.get_async::<Flaky>().await.is_err());
    assert!(container.get_async::<Flaky>().await.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    container.override_async(|_| async { Ok::<_, NotReady>(Flaky) });
    assert!(container.get_async::<Flaky>().await.is_ok());
}

#[tokio::test]
async fn async_failure_is_retried_with_retry_policy() {
    let mut builder = Container::builder();
    builder.async_failure_policy(AsyncFailurePolicy::Retry);
    let container = builder.build();

    let attempts = Arc::new(AtomicUsize::new(0));
    {
        let attempts = attempts.clone();
        container.override_async(move |_| {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(NotReady)
                } else {
                    Ok(Flaky)
                }
            }
        });
    }

    let error = container.get_async::<Flaky>().await.err().unwrap();
    assert!(error.downcast_inner::<NotReady>().is_some());
    assert!(container.get_async::<Flaky>().await.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

struct Endpoint;

impl Key for Endpoint {
    type Provider = ValueProvider<String>;

    fn default_provider() -> Self::Provider {
        ValueProvider::new(|_| String::from("https://production.invalid"))
    }
}

#[test]
fn custom_key_uses_default_provider() {
    let container = Container::new();
    let endpoint = container.provider::<Endpoint>().resolve(&container);
    assert_eq!(endpoint.as_str(), "https://production.invalid");
}

#[test]
fn builder_provided_provider_replaces_default() {
    let mut builder = Container::builder();
    builder.provide::<Endpoint>(ValueProvider::constant(String::from(
        "http://localhost:8080",
    )));
    builder.provide::<FallibleKey<Slow>>(crate::FallibleProvider::new(|_| {
        Err::<Slow, _>(NotReady)
    }));
    let container = builder.build();

    let endpoint = container.provider::<Endpoint>().resolve(&container);
    assert_eq!(endpoint.as_str(), "http://localhost:8080");

    let slow: InjectResult<Svc<Slow>> = container.slow();
    assert!(slow.is_err());
}
