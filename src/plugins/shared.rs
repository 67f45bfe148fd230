//! Process-wide, construct-once registry handle.

use super::PluginRegistry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Holds a lazily built [`PluginRegistry`].
///
/// The first caller of [`get_or_init`](Self::get_or_init) builds the
/// registry; concurrent first callers block until it exists and never build
/// a second one. [`reset`](Self::reset) returns to the pristine state.
#[derive(Default)]
pub struct SharedRegistry {
    slot: RwLock<Option<Arc<PluginRegistry>>>,
    builds: AtomicUsize,
}

impl SharedRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the registry, building it with `init` if needed
    pub fn get_or_init<F>(&self, init: F) -> Arc<PluginRegistry>
    where
        F: FnOnce() -> PluginRegistry,
    {
        if let Some(registry) = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(registry);
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(registry) = slot.as_ref() {
            return Arc::clone(registry);
        }
        let registry = Arc::new(init());
        self.builds.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Plugin registry built");
        *slot = Some(Arc::clone(&registry));
        registry
    }

    /// The registry if it has been built
    #[must_use]
    pub fn get(&self) -> Option<Arc<PluginRegistry>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the registry; the next access rebuilds it.
    ///
    /// Handles obtained earlier stay valid.
    pub fn reset(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// How many times a registry has been built
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

/// The process-wide instance used by the command-line front end.
pub fn global() -> &'static SharedRegistry {
    static GLOBAL: OnceLock<SharedRegistry> = OnceLock::new();
    GLOBAL.get_or_init(SharedRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let shared = Arc::new(SharedRegistry::new());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    shared.get_or_init(PluginRegistry::with_builtins)
                })
            })
            .collect();
        let registries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(shared.build_count(), 1);
        assert!(registries.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_reset_rebuilds() {
        let shared = SharedRegistry::new();
        let first = shared.get_or_init(PluginRegistry::with_builtins);
        shared.reset();
        assert!(shared.get().is_none());
        let second = shared.get_or_init(PluginRegistry::with_builtins);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(shared.build_count(), 2);
        assert!(first.import("version").is_ok());
    }
}
