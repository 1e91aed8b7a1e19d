//! Cross-thread handle for the pipeline cache.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::cache::PipelineCache;

/// A clonable, lock-guarded handle to a [`PipelineCache`].
///
/// The cache itself assumes a single logical thread of control. When
/// the surrounding system runs concurrent stage work (prefetching a
/// preview while an export runs), wrap the cache in a `SharedCache`:
/// the slot count is small and every operation is bounded and non-I/O,
/// so one mutex around the whole cache is the right granularity.
///
/// Hold the guard from [`lock`](Self::lock) across an entire
/// read-modify-write sequence (check freshness, recompute, store) so
/// no other thread can interleave between the check and the `put`.
///
/// # Example
///
/// ```rust
/// # use filmlab_cache::{PipelineCache, SharedCache};
/// let shared = SharedCache::new(PipelineCache::new());
/// let for_worker = shared.clone();
///
/// let mut cache = shared.lock();
/// cache.set_active_source("roll1/frame3-hash");
/// ```
#[derive(Debug, Clone)]
pub struct SharedCache {
    inner: Arc<Mutex<PipelineCache>>,
}

impl SharedCache {
    /// Wrap a cache for shared use.
    #[must_use]
    pub fn new(cache: PipelineCache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Acquire exclusive access to the cache.
    ///
    /// Blocks until the lock is available; never blocks indefinitely in
    /// practice since all cache operations complete in bounded time.
    #[must_use]
    pub fn lock(&self) -> MutexGuard<'_, PipelineCache> {
        self.inner.lock()
    }

    /// Run a closure with exclusive access to the cache.
    ///
    /// Convenience for short read-modify-write sequences that don't
    /// need to hold a borrow of a stored entry afterwards.
    pub fn with<R>(&self, f: impl FnOnce(&mut PipelineCache) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl Default for SharedCache {
    fn default() -> Self {
        Self::new(PipelineCache::new())
    }
}
