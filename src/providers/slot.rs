use crate::Svc;
use parking_lot::RwLock;
use std::sync::Arc;

/// Memoizing storage shared by the blocking providers. The cached value and
/// the factory that produces it live behind one lock owned by a single
/// provider, so unrelated slots never contend with each other.
pub(crate) struct SyncSlot<F: ?Sized, V> {
    state: RwLock<SlotState<F, V>>,
}

struct SlotState<F: ?Sized, V> {
    factory: Arc<F>,
    cached: Option<Svc<V>>,
}

impl<F: ?Sized, V> SyncSlot<F, V> {
    pub(crate) fn new(factory: Arc<F>) -> Self {
        SyncSlot {
            state: RwLock::new(SlotState {
                factory,
                cached: None,
            }),
        }
    }

    pub(crate) fn cached(&self) -> Option<Svc<V>> {
        self.state.read().cached.clone()
    }

    /// Returns the cached value, or runs `init` with the current factory and
    /// caches its result if it succeeds. The write lock is held while `init`
    /// runs so concurrent callers wait for the first one rather than
    /// computing their own value.
    pub(crate) fn get_or_try_init<E>(
        &self,
        init: impl FnOnce(&F) -> Result<Svc<V>, E>,
    ) -> Result<Svc<V>, E> {
        // Check if already stored - fast path
        if let Some(cached) = self.cached() {
            return Ok(cached);
        }

        // Create the value if still needed - slow path
        let mut state = self.state.write();
        if let Some(cached) = &state.cached {
            return Ok(cached.clone());
        }

        let value = init(&state.factory)?;
        state.cached = Some(value.clone());
        Ok(value)
    }

    /// Installs a new factory and drops any cached value. Blocks until an
    /// in-progress `get_or_try_init` has finished.
    pub(crate) fn replace(&self, factory: Arc<F>) {
        let mut state = self.state.write();
        state.factory = factory;
        state.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        convert::Infallible,
        sync::atomic::{AtomicUsize, Ordering},
    };

    type Factory = dyn Fn() -> usize + Send + Sync;

    fn counting_slot(calls: &Arc<AtomicUsize>) -> SyncSlot<Factory, usize> {
        let calls = calls.clone();
        SyncSlot::new(Arc::new(move || calls.fetch_add(1, Ordering::SeqCst)))
    }

    #[test]
    fn init_runs_once_on_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = counting_slot(&calls);

        let first = slot
            .get_or_try_init(|f| Ok::<_, Infallible>(Svc::new(f())))
            .unwrap();
        let second = slot
            .get_or_try_init(|f| Ok::<_, Infallible>(Svc::new(f())))
            .unwrap();

        assert!(Svc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_init_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = counting_slot(&calls);

        let failed = slot.get_or_try_init(|f| {
            f();
            Err::<Svc<usize>, _>("nope")
        });
        assert!(failed.is_err());
        assert!(slot.cached().is_none());

        let value = slot
            .get_or_try_init(|f| Ok::<_, &str>(Svc::new(f())))
            .unwrap();
        assert_eq!(*value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn replace_clears_cached_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = counting_slot(&calls);
        slot.get_or_try_init(|f| Ok::<_, Infallible>(Svc::new(f())))
            .unwrap();

        slot.replace(Arc::new(|| 42));
        assert!(slot.cached().is_none());

        let value = slot
            .get_or_try_init(|f| Ok::<_, Infallible>(Svc::new(f())))
            .unwrap();
        assert_eq!(*value, 42);
    }
}
