//! # Slot Store
//!
//! Fixed array of records indexed by [`SlotId`], paired 1:1 with an
//! [`OccupancyBitmap`]. Records are stored by value; a freed slot is reset
//! to `T::default()`.

use crate::error::{KernelError, KernelResult};
use crate::memory::bitmap::{ActiveIds, OccupancyBitmap, SlotId};

/// A fixed-size record array with bitmap occupancy.
///
/// # Example
///
/// ```rust
/// use glint_core::SlotStore;
///
/// let mut store: SlotStore<u32> = SlotStore::new(128);
/// let id = store.insert(7).unwrap();
/// assert_eq!(store.get(id), Some(&7));
/// assert_eq!(store.remove(id).unwrap(), 7);
/// ```
#[derive(Clone, Debug)]
pub struct SlotStore<T> {
    slots: Box<[T]>,
    occupancy: OccupancyBitmap,
}

impl<T: Default> SlotStore<T> {
    /// Creates a store with every slot free and default-initialised.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let occupancy = OccupancyBitmap::new(capacity);
        let slots: Vec<T> = (0..capacity).map(|_| T::default()).collect();
        Self {
            slots: slots.into_boxed_slice(),
            occupancy,
        }
    }

    /// Stores `value` in the lowest free slot.
    ///
    /// # Errors
    ///
    /// [`KernelError::Exhausted`] when full; `value` is dropped and no
    /// existing record is touched.
    pub fn insert(&mut self, value: T) -> KernelResult<SlotId> {
        let id = self.occupancy.acquire()?;
        self.slots[id.index()] = value;
        Ok(id)
    }

    /// Frees a slot and hands its record back.
    ///
    /// # Errors
    ///
    /// Same as [`OccupancyBitmap::release`].
    pub fn remove(&mut self, id: SlotId) -> KernelResult<T> {
        self.occupancy.release(id)?;
        Ok(std::mem::take(&mut self.slots[id.index()]))
    }

    /// Frees every slot and resets every record.
    pub fn clear(&mut self) {
        for id in self.occupancy.active_ids() {
            self.slots[id.index()] = T::default();
        }
        self.occupancy.clear();
    }
}

impl<T> SlotStore<T> {
    /// Record at `id`, if that slot is occupied.
    #[inline]
    #[must_use]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        if self.occupancy.is_occupied(id) {
            self.slots.get(id.index())
        } else {
            None
        }
    }

    /// Mutable record at `id`, if that slot is occupied.
    #[inline]
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        if self.occupancy.is_occupied(id) {
            self.slots.get_mut(id.index())
        } else {
            None
        }
    }

    /// Like [`Self::get`] but reports why the lookup failed.
    ///
    /// # Errors
    ///
    /// [`KernelError::SlotOutOfRange`] or [`KernelError::SlotNotOccupied`].
    pub fn try_get(&self, id: SlotId) -> KernelResult<&T> {
        self.occupancy.check_range(id)?;
        self.get(id)
            .ok_or(KernelError::SlotNotOccupied(id.index()))
    }

    /// Ascending iterator over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> + '_ {
        self.occupancy
            .active_ids()
            .map(move |id| (id, &self.slots[id.index()]))
    }

    /// Visits every occupied slot mutably, in ascending order.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(SlotId, &mut T)) {
        let Self { slots, occupancy } = self;
        for id in occupancy.active_ids() {
            f(id, &mut slots[id.index()]);
        }
    }

    /// Ascending occupied ids.
    #[inline]
    #[must_use]
    pub fn active_ids(&self) -> ActiveIds<'_> {
        self.occupancy.active_ids()
    }

    /// The occupancy bitmap backing this store.
    #[inline]
    #[must_use]
    pub const fn occupancy(&self) -> &OccupancyBitmap {
        &self.occupancy
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.occupancy.occupied_count()
    }

    /// True when nothing is stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.occupancy.is_empty()
    }

    /// Total number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.occupancy.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut store: SlotStore<u32> = SlotStore::new(4);
        let a = store.insert(10).unwrap();
        let b = store.insert(20).unwrap();

        assert_eq!(store.get(a), Some(&10));
        assert_eq!(store.get(b), Some(&20));
        assert_eq!(store.len(), 2);

        assert_eq!(store.remove(a).unwrap(), 10);
        assert_eq!(store.get(a), None);
        assert_eq!(store.try_get(a), Err(KernelError::SlotNotOccupied(0)));

        // Lowest free id comes back first.
        assert_eq!(store.insert(30).unwrap(), a);
        assert_eq!(store.get(a), Some(&30));
    }

    #[test]
    fn test_full_store_keeps_records() {
        let mut store: SlotStore<u8> = SlotStore::new(2);
        let a = store.insert(1).unwrap();
        let b = store.insert(2).unwrap();

        assert_eq!(store.insert(3), Err(KernelError::Exhausted { capacity: 2 }));
        assert_eq!(store.get(a), Some(&1));
        assert_eq!(store.get(b), Some(&2));
    }

    #[test]
    fn test_iter_skips_released() {
        let mut store: SlotStore<char> = SlotStore::new(8);
        for c in ['a', 'b', 'c', 'd'] {
            store.insert(c).unwrap();
        }
        store.remove(SlotId::new(1)).unwrap();
        store.remove(SlotId::new(2)).unwrap();

        let seen: Vec<_> = store.iter().map(|(id, c)| (id.index(), *c)).collect();
        assert_eq!(seen, vec![(0, 'a'), (3, 'd')]);
    }

    #[test]
    fn test_for_each_mut_and_clear() {
        let mut store: SlotStore<i32> = SlotStore::new(8);
        for v in 1..=3 {
            store.insert(v).unwrap();
        }
        store.for_each_mut(|_, v| *v *= 10);
        let values: Vec<_> = store.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![10, 20, 30]);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.insert(5).unwrap().index(), 0);
    }
}
