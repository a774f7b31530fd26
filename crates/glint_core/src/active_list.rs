//! # Active List Renderer
//!
//! Owns the instances that are currently live and drives them through the
//! two per-frame phases.
//!
//! ```text
//! tick:
//!   promote queued adds ──► Update every entry (list order)
//!                                   │
//!                                   ▼
//!                      compaction: drop PendingRemoval entries,
//!                      return them to the pool, keep survivor order
//!                                   │
//!                                   ▼
//!                      Draw every survivor (list order = oldest first)
//! ```
//!
//! Entry lifecycle: `Free -> Acquired -> Active -> PendingRemoval -> Free`.
//! Only an entry's own update can move it to `PendingRemoval`.

use crate::error::{EffectResult, Phase};
use crate::fault::isolate;
use crate::memory::{ObjectPool, Poolable, Pooled};

/// Outcome of one entry's update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Keep the entry.
    Alive,
    /// Mark the entry for removal at this tick's compaction.
    Expired,
}

/// State of an entry held by a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceState {
    /// Updated and drawn every tick.
    Active,
    /// Marked by its own update; returned to the pool at compaction.
    PendingRemoval,
}

/// Behaviour of a pooled instance that lives in an [`ActiveListRenderer`].
pub trait Particle: Poolable {
    /// State shared by every entry of one renderer.
    type Settings;
    /// Sink the entries draw into.
    type Target: ?Sized;

    /// Advances the entry by one tick.
    ///
    /// # Errors
    ///
    /// An error skips the entry for this phase only; it stays alive.
    fn update(&mut self, settings: &mut Self::Settings) -> EffectResult<Lifecycle>;

    /// Draws the entry.
    ///
    /// # Errors
    ///
    /// An error skips the entry for this phase only.
    fn draw(&self, settings: &Self::Settings, target: &mut Self::Target) -> EffectResult<()>;
}

/// A live instance plus its lifecycle state.
#[derive(Debug)]
struct Entry<T> {
    instance: T,
    state: InstanceState,
}

/// Counters for the last update/draw pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Entries whose update ran to completion.
    pub updated: u32,
    /// Entries removed by compaction and returned to the pool.
    pub removed: u32,
    /// Entries drawn successfully.
    pub drawn: u32,
    /// Entries skipped during update because they failed.
    pub update_failures: u32,
    /// Entries skipped during draw because they failed.
    pub draw_failures: u32,
}

/// Growable, ordered list of live pooled instances.
///
/// Additions go to a queue and join the list at the start of the next
/// update pass, so nothing appended while a tick is in flight is visited
/// by that tick.
///
/// # Allocation
///
/// The live list and its compaction buffer only grow when the number of
/// live entries reaches a new high; steady-state ticks do not allocate.
pub struct ActiveListRenderer<T: Particle> {
    live: Vec<Entry<T>>,
    /// Compaction destination, swapped with `live` after each pass.
    scratch: Vec<Entry<T>>,
    incoming: Vec<T>,
    settings: T::Settings,
    last: TickStats,
}

impl<T: Particle> ActiveListRenderer<T> {
    /// Creates an empty renderer.
    ///
    /// `capacity_hint` pre-sizes the live list; it is not a limit.
    #[must_use]
    pub fn new(settings: T::Settings, capacity_hint: usize) -> Self {
        Self {
            live: Vec::with_capacity(capacity_hint),
            scratch: Vec::with_capacity(capacity_hint),
            incoming: Vec::with_capacity(capacity_hint),
            settings,
            last: TickStats::default(),
        }
    }

    /// Queues an instance; it is first updated by the next update pass.
    ///
    /// The instance goes back to the pool passed to [`Self::update`] when
    /// it expires, so it should come from that pool.
    pub fn add(&mut self, instance: Pooled<T>) {
        self.incoming.push(instance.into_inner());
    }

    /// Requests an instance from `pool`, initialises it and queues it.
    ///
    /// Returns `false` when the pool is exhausted; the spawn is dropped.
    pub fn spawn(&mut self, pool: &mut ObjectPool<T>, init: impl FnOnce(&mut T)) -> bool {
        let Some(mut instance) = pool.request() else {
            return false;
        };
        init(&mut instance);
        self.add(instance);
        true
    }

    /// Update phase followed by compaction.
    ///
    /// Every entry is updated in list order; after the full pass, entries
    /// that expired are returned to `pool` and the survivors keep their
    /// relative order.
    pub fn update(&mut self, pool: &mut ObjectPool<T>) -> TickStats {
        self.last = TickStats::default();

        self.live.extend(self.incoming.drain(..).map(|instance| Entry {
            instance,
            state: InstanceState::Active,
        }));

        let settings = &mut self.settings;
        for (position, entry) in self.live.iter_mut().enumerate() {
            debug_assert_eq!(entry.state, InstanceState::Active);

            match isolate(Phase::Update, || entry.instance.update(settings)) {
                Ok(Lifecycle::Alive) => self.last.updated += 1,
                Ok(Lifecycle::Expired) => {
                    self.last.updated += 1;
                    entry.state = InstanceState::PendingRemoval;
                }
                Err(error) => {
                    self.last.update_failures += 1;
                    tracing::debug!(position, %error, "entry skipped during update");
                }
            }
        }

        self.compact(pool);
        self.last
    }

    /// Draw phase over the survivors of the last update, oldest first.
    pub fn draw(&mut self, target: &mut T::Target) -> TickStats {
        self.last.drawn = 0;
        self.last.draw_failures = 0;

        let settings = &self.settings;
        for (position, entry) in self.live.iter().enumerate() {
            match isolate(Phase::Draw, || entry.instance.draw(settings, target)) {
                Ok(()) => self.last.drawn += 1,
                Err(error) => {
                    self.last.draw_failures += 1;
                    tracing::debug!(position, %error, "entry skipped during draw");
                }
            }
        }

        self.last
    }

    /// One full frame: update, compaction, draw.
    pub fn tick(&mut self, pool: &mut ObjectPool<T>, target: &mut T::Target) -> TickStats {
        self.update(pool);
        self.draw(target)
    }

    fn compact(&mut self, pool: &mut ObjectPool<T>) {
        for entry in self.live.drain(..) {
            match entry.state {
                InstanceState::Active => self.scratch.push(entry),
                InstanceState::PendingRemoval => {
                    self.last.removed += 1;
                    pool.restore(entry.instance);
                }
            }
        }
        std::mem::swap(&mut self.live, &mut self.scratch);
    }

    /// Returns every live and queued instance to `pool`.
    pub fn clear(&mut self, pool: &mut ObjectPool<T>) {
        for entry in self.live.drain(..) {
            pool.restore(entry.instance);
        }
        for instance in self.incoming.drain(..) {
            pool.restore(instance);
        }
    }

    /// Live instances in draw order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.live.iter().map(|entry| &entry.instance)
    }

    /// Number of live entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// True when there are no live entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of queued additions waiting for the next update.
    #[inline]
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.incoming.len()
    }

    /// Shared settings.
    #[inline]
    pub fn settings(&self) -> &T::Settings {
        &self.settings
    }

    /// Shared settings, mutably (e.g. to move the draw anchor).
    #[inline]
    pub fn settings_mut(&mut self) -> &mut T::Settings {
        &mut self.settings
    }

    /// Counters from the last pass.
    #[inline]
    #[must_use]
    pub const fn last_stats(&self) -> TickStats {
        self.last
    }
}

impl<T: Particle> std::fmt::Debug for ActiveListRenderer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveListRenderer")
            .field("live", &self.live.len())
            .field("queued", &self.incoming.len())
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EffectError;

    /// Test particle: expires after `lifetime` updates, can be rigged to fail.
    #[derive(Default, Debug)]
    struct Dot {
        tag: u32,
        age: u32,
        lifetime: u32,
        fail_draw: bool,
        panic_update: bool,
    }

    impl Poolable for Dot {
        fn on_acquire(&mut self) {
            self.age = 0;
            self.fail_draw = false;
            self.panic_update = false;
        }
    }

    #[derive(Default)]
    struct Log {
        updates: Vec<u32>,
    }

    impl Particle for Dot {
        type Settings = Log;
        type Target = Vec<u32>;

        fn update(&mut self, settings: &mut Log) -> EffectResult<Lifecycle> {
            if self.panic_update {
                panic!("dot {} blew up", self.tag);
            }
            settings.updates.push(self.tag);
            self.age += 1;
            if self.age >= self.lifetime {
                Ok(Lifecycle::Expired)
            } else {
                Ok(Lifecycle::Alive)
            }
        }

        fn draw(&self, _settings: &Log, target: &mut Vec<u32>) -> EffectResult<()> {
            if self.fail_draw {
                return Err(EffectError::Draw(format!("dot {}", self.tag)));
            }
            target.push(self.tag);
            Ok(())
        }
    }

    fn spawn(
        renderer: &mut ActiveListRenderer<Dot>,
        pool: &mut ObjectPool<Dot>,
        tag: u32,
        lifetime: u32,
    ) -> bool {
        renderer.spawn(pool, |d| {
            d.tag = tag;
            d.lifetime = lifetime;
        })
    }

    #[test]
    fn test_draw_order_is_insertion_order() {
        let mut pool = ObjectPool::new(8);
        let mut renderer = ActiveListRenderer::new(Log::default(), 8);
        for tag in [3, 1, 2] {
            assert!(spawn(&mut renderer, &mut pool, tag, 10));
        }

        let mut drawn = Vec::new();
        let stats = renderer.tick(&mut pool, &mut drawn);
        assert_eq!(drawn, vec![3, 1, 2]);
        assert_eq!(stats.drawn, 3);
        assert_eq!(stats.updated, 3);
    }

    #[test]
    fn test_expired_entry_not_drawn_or_updated_again() {
        let mut pool = ObjectPool::new(8);
        let mut renderer = ActiveListRenderer::new(Log::default(), 8);
        spawn(&mut renderer, &mut pool, 1, 5);
        spawn(&mut renderer, &mut pool, 2, 1);
        spawn(&mut renderer, &mut pool, 3, 5);

        let mut drawn = Vec::new();
        let stats = renderer.tick(&mut pool, &mut drawn);
        assert_eq!(drawn, vec![1, 3], "expired entry drawn in its last tick");
        assert_eq!(stats.removed, 1);
        assert_eq!(pool.free_count(), 1);

        renderer.settings_mut().updates.clear();
        drawn.clear();
        renderer.tick(&mut pool, &mut drawn);
        assert_eq!(renderer.settings().updates, vec![1, 3]);
        assert_eq!(drawn, vec![1, 3]);
    }

    #[test]
    fn test_additions_deferred_to_next_update() {
        let mut pool = ObjectPool::new(8);
        let mut renderer = ActiveListRenderer::new(Log::default(), 8);
        spawn(&mut renderer, &mut pool, 1, 10);
        assert_eq!(renderer.len(), 0);
        assert_eq!(renderer.queued_len(), 1);

        let mut drawn = Vec::new();
        renderer.draw(&mut drawn);
        assert!(drawn.is_empty(), "queued entry drawn before its first update");

        renderer.update(&mut pool);
        renderer.draw(&mut drawn);
        assert_eq!(drawn, vec![1]);
    }

    #[test]
    fn test_pool_capacity_three_scenario() {
        let mut pool = ObjectPool::new(3);
        let mut renderer = ActiveListRenderer::new(Log::default(), 4);

        assert!(spawn(&mut renderer, &mut pool, 0xA, 10));
        assert!(spawn(&mut renderer, &mut pool, 0xB, 1));
        assert!(spawn(&mut renderer, &mut pool, 0xC, 10));
        assert!(!spawn(&mut renderer, &mut pool, 0xD, 10), "fourth request must drop");

        // B expires in this update and is returned by compaction.
        let mut drawn = Vec::new();
        renderer.tick(&mut pool, &mut drawn);
        assert_eq!(drawn, vec![0xA, 0xC]);

        assert!(spawn(&mut renderer, &mut pool, 0xD, 10));
        assert_eq!(pool.stats().reused, 1);
        assert_eq!(pool.constructed_count(), 3);

        drawn.clear();
        renderer.tick(&mut pool, &mut drawn);
        assert_eq!(drawn, vec![0xA, 0xC, 0xD]);
    }

    #[test]
    fn test_exhaustion_leaves_live_entries_intact() {
        let capacity = 5;
        let mut pool = ObjectPool::new(capacity);
        let mut renderer = ActiveListRenderer::new(Log::default(), capacity);
        for tag in 0..=capacity as u32 {
            spawn(&mut renderer, &mut pool, tag, 100);
        }
        assert_eq!(pool.stats().dropped, 1);

        let mut drawn = Vec::new();
        renderer.tick(&mut pool, &mut drawn);
        assert_eq!(drawn, vec![0, 1, 2, 3, 4]);
        assert!(renderer.iter().all(|d| d.age == 1));
    }

    #[test]
    fn test_draw_failure_isolated() {
        let mut pool = ObjectPool::new(3);
        let mut renderer = ActiveListRenderer::new(Log::default(), 3);
        spawn(&mut renderer, &mut pool, 1, 10);
        renderer.spawn(&mut pool, |d| {
            d.tag = 2;
            d.lifetime = 10;
            d.fail_draw = true;
        });
        spawn(&mut renderer, &mut pool, 3, 10);

        let mut drawn = Vec::new();
        let stats = renderer.tick(&mut pool, &mut drawn);
        assert_eq!(drawn, vec![1, 3]);
        assert_eq!(stats.draw_failures, 1);
        assert_eq!(renderer.len(), 3, "failing entry stays alive");
    }

    #[test]
    fn test_update_panic_isolated() {
        let mut pool = ObjectPool::new(3);
        let mut renderer = ActiveListRenderer::new(Log::default(), 3);
        spawn(&mut renderer, &mut pool, 1, 10);
        renderer.spawn(&mut pool, |d| {
            d.tag = 2;
            d.lifetime = 1;
            d.panic_update = true;
        });
        spawn(&mut renderer, &mut pool, 3, 10);

        let mut drawn = Vec::new();
        let stats = renderer.tick(&mut pool, &mut drawn);
        assert_eq!(stats.update_failures, 1);
        assert_eq!(renderer.settings().updates, vec![1, 3]);
        // The panicking entry never expired, so it is still drawn.
        assert_eq!(drawn, vec![1, 2, 3]);
    }

    #[test]
    fn test_clear_returns_everything() {
        let mut pool = ObjectPool::new(4);
        let mut renderer = ActiveListRenderer::new(Log::default(), 4);
        spawn(&mut renderer, &mut pool, 1, 10);
        spawn(&mut renderer, &mut pool, 2, 10);
        renderer.update(&mut pool);
        spawn(&mut renderer, &mut pool, 3, 10);

        renderer.clear(&mut pool);
        assert!(renderer.is_empty());
        assert_eq!(renderer.queued_len(), 0);
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.free_count(), 3);
    }

    #[test]
    fn test_instance_from_other_pool_never_overfills() {
        let mut pool = ObjectPool::new(1);
        let mut other: ObjectPool<Dot> = ObjectPool::new(1);
        let mut renderer = ActiveListRenderer::new(Log::default(), 2);
        spawn(&mut renderer, &mut pool, 1, 1);
        let mut stray = other.request().unwrap();
        stray.tag = 2;
        stray.lifetime = 1;
        renderer.add(stray);

        let stats = renderer.update(&mut pool);
        assert_eq!(stats.removed, 2);
        assert!(pool.free_count() <= pool.capacity());
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.stats().rejected, 1);
    }
}
