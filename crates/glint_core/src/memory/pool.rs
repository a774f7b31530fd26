//! # Object Pool
//!
//! Fixed-capacity pool of reusable mutable instances for objects that are
//! spawned and retired every frame (particles, sparks, puffs).

use std::ops::{Deref, DerefMut};

/// Reset hook run on an instance each time it leaves the pool.
///
/// Whatever the previous holder left behind (timers, flags, velocities)
/// must be cleared here so it cannot leak into the next use.
pub trait Poolable {
    /// Called right before the instance is handed out.
    fn on_acquire(&mut self) {}
}

/// An instance handed out by [`ObjectPool::request`].
///
/// Only a pool can create one, so everything an active list takes in
/// came out of a pool.
#[derive(Debug)]
pub struct Pooled<T>(T);

impl<T> Pooled<T> {
    pub(crate) fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

/// Counters describing pool traffic since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Calls to [`ObjectPool::request`].
    pub requested: u64,
    /// Instances built by the factory.
    pub constructed: u64,
    /// Requests served from the free list.
    pub reused: u64,
    /// Instances given back to the pool.
    pub returned: u64,
    /// Returns refused because the free list was already full.
    pub rejected: u64,
    /// Requests refused because the pool was exhausted.
    pub dropped: u64,
}

/// A pool of reusable instances with a hard cap on live + free count.
///
/// Instances are moved out on [`request`](Self::request) and moved back
/// in by the active list's compaction pass, so at any instant an
/// instance has exactly one owner: the free list or one renderer.
///
/// # Exhaustion
///
/// When every instance is live and the cap is reached, the request is
/// dropped: `request` returns `None` and nothing else changes.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. It belongs to the frame thread.
///
/// # Example
///
/// ```rust
/// use glint_core::{ObjectPool, Poolable};
///
/// #[derive(Default)]
/// struct Puff { alpha: f32 }
///
/// impl Poolable for Puff {
///     fn on_acquire(&mut self) {
///         self.alpha = 1.0;
///     }
/// }
///
/// let mut pool: ObjectPool<Puff> = ObjectPool::new(300);
/// let puff = pool.request().unwrap();
/// assert_eq!(puff.alpha, 1.0);
/// ```
pub struct ObjectPool<T> {
    /// Released instances waiting for reuse.
    free: Vec<T>,
    /// Builds a fresh instance while under capacity.
    factory: Box<dyn Fn() -> T>,
    /// Instances built so far (live + free).
    constructed: usize,
    /// Maximum live + free count.
    capacity: usize,
    stats: PoolStats,
}

impl<T: Poolable + Default + 'static> ObjectPool<T> {
    /// Creates a pool that builds instances with `T::default()`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_factory(capacity, T::default)
    }
}

impl<T: Poolable> ObjectPool<T> {
    /// Creates a pool with an explicit factory.
    ///
    /// Nothing is built up front, but the free list reserves room for
    /// every instance so returning never allocates.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_factory(capacity: usize, factory: impl Fn() -> T + 'static) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            free: Vec::with_capacity(capacity),
            factory: Box::new(factory),
            constructed: 0,
            capacity,
            stats: PoolStats::default(),
        }
    }

    /// Hands out a reset instance, or `None` if the pool is exhausted.
    ///
    /// Reuses a released instance first, otherwise builds one while the
    /// cap allows. The instance's [`Poolable::on_acquire`] runs before it
    /// is returned.
    pub fn request(&mut self) -> Option<Pooled<T>> {
        self.stats.requested += 1;

        let mut instance = if let Some(instance) = self.free.pop() {
            self.stats.reused += 1;
            instance
        } else if self.constructed < self.capacity {
            self.constructed += 1;
            self.stats.constructed += 1;
            (self.factory)()
        } else {
            self.stats.dropped += 1;
            tracing::trace!(capacity = self.capacity, "object pool exhausted, request dropped");
            return None;
        };

        instance.on_acquire();
        Some(Pooled(instance))
    }

    /// Takes an instance back.
    ///
    /// Only the active list's compaction and clear passes call this. The
    /// free list never holds more than this pool built; an instance from
    /// another pool that arrives when it is full is dropped.
    pub(crate) fn restore(&mut self, instance: T) {
        if self.free.len() >= self.constructed {
            self.stats.rejected += 1;
            tracing::debug!(
                capacity = self.capacity,
                free = self.free.len(),
                "instance from another pool dropped on return"
            );
            return;
        }
        self.stats.returned += 1;
        self.free.push(instance);
    }

    /// Maximum live + free count.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Instances built so far.
    #[inline]
    #[must_use]
    pub const fn constructed_count(&self) -> usize {
        self.constructed
    }

    /// Instances waiting in the free list.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Instances currently held outside the pool.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.constructed - self.free.len()
    }

    /// True when a request would be dropped.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.free.is_empty() && self.constructed == self.capacity
    }

    /// Traffic counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> PoolStats {
        self.stats
    }
}

impl<T> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("capacity", &self.capacity)
            .field("constructed", &self.constructed)
            .field("free", &self.free.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
