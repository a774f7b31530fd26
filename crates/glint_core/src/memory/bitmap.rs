//! # Occupancy Bitmap
//!
//! Tracks which of N fixed slots are in use, one bit per slot.
//!
//! ```text
//!  word 0                          word 1
//! ┌────────────────────────────┐  ┌────────────────────────────┐
//! │ bit j set <=> slot j used  │  │ bit j set <=> slot 64+j    │ ...
//! └────────────────────────────┘  └────────────────────────────┘
//! ```
//!
//! Acquire hands out the lowest free id, so a released id is the first to
//! come back.

use crate::error::{KernelError, KernelResult};

/// Storage word of the bitmap.
pub type Word = u64;

/// Number of slots tracked per word.
pub const WORD_BITS: usize = Word::BITS as usize;

/// Identifier of a fixed slot, in `[0, capacity)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a slot id from a raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Index of the word holding this slot's bit.
    #[inline]
    #[must_use]
    pub const fn word(self) -> usize {
        self.index() / WORD_BITS
    }

    /// Bit position inside [`Self::word`].
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u32 {
        (self.index() % WORD_BITS) as u32
    }

    #[inline]
    fn from_parts(word: usize, bit: u32) -> Self {
        // Capacity is bounded by u32::MAX in `OccupancyBitmap::new`.
        #[allow(clippy::cast_possible_truncation)]
        Self((word * WORD_BITS) as u32 + bit)
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bit-per-slot allocator over a fixed number of slots.
///
/// # Invariants
///
/// - The set bits are exactly the allocated ids.
/// - Bits at or past `capacity` in the last word are never set.
/// - `occupied <= capacity`.
///
/// # Thread Safety
///
/// Not thread-safe. The frame driver owns it and touches it from one thread.
#[derive(Clone, Debug)]
pub struct OccupancyBitmap {
    words: Box<[Word]>,
    capacity: usize,
    occupied: usize,
}

impl OccupancyBitmap {
    /// Creates a bitmap with every slot free.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or does not fit in a `u32`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            u32::try_from(capacity).is_ok(),
            "Capacity must fit in a 32-bit slot id"
        );

        let word_count = capacity.div_ceil(WORD_BITS);
        Self {
            words: vec![0; word_count].into_boxed_slice(),
            capacity,
            occupied: 0,
        }
    }

    /// Total number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of allocated slots.
    #[inline]
    #[must_use]
    pub const fn occupied_count(&self) -> usize {
        self.occupied
    }

    /// Number of free slots.
    #[inline]
    #[must_use]
    pub const fn free_count(&self) -> usize {
        self.capacity - self.occupied
    }

    /// True when no slot is free.
    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.occupied == self.capacity
    }

    /// True when no slot is allocated.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Raw words, lowest slots first.
    #[inline]
    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Bits of word `index` that correspond to real slots.
    #[inline]
    fn valid_mask(&self, index: usize) -> Word {
        let tail = self.capacity - index * WORD_BITS;
        if tail >= WORD_BITS {
            Word::MAX
        } else {
            (1 << tail) - 1
        }
    }

    /// Allocates the lowest free slot.
    ///
    /// Scans words in order for the first one with a free bit, takes its
    /// lowest zero bit. O(N / 64) worst case, no allocation.
    ///
    /// # Errors
    ///
    /// [`KernelError::Exhausted`] when every slot is taken. The bitmap is
    /// left untouched.
    pub fn acquire(&mut self) -> KernelResult<SlotId> {
        for index in 0..self.words.len() {
            let free = !self.words[index] & self.valid_mask(index);
            if free == 0 {
                continue;
            }

            let bit = free.trailing_zeros();
            self.words[index] |= 1 << bit;
            self.occupied += 1;
            return Ok(SlotId::from_parts(index, bit));
        }

        Err(KernelError::Exhausted {
            capacity: self.capacity,
        })
    }

    /// Frees a slot. The id is immediately reusable.
    ///
    /// # Errors
    ///
    /// - [`KernelError::SlotOutOfRange`] for ids past capacity
    /// - [`KernelError::SlotNotOccupied`] for ids that are already free
    pub fn release(&mut self, id: SlotId) -> KernelResult<()> {
        self.check_range(id)?;
        if !self.is_occupied(id) {
            return Err(KernelError::SlotNotOccupied(id.index()));
        }

        self.words[id.word()] &= !(1 << id.bit());
        self.occupied -= 1;
        Ok(())
    }

    /// Returns whether `id` is allocated. Out-of-range ids are never occupied.
    #[inline]
    #[must_use]
    pub fn is_occupied(&self, id: SlotId) -> bool {
        self.words
            .get(id.word())
            .is_some_and(|word| word & (1 << id.bit()) != 0)
            && id.index() < self.capacity
    }

    /// Frees every slot.
    pub fn clear(&mut self) {
        self.words.fill(0);
        self.occupied = 0;
    }

    /// Lazily yields every allocated id in ascending order.
    ///
    /// Calling it again restarts the scan.
    #[must_use]
    pub fn active_ids(&self) -> ActiveIds<'_> {
        ActiveIds {
            words: &self.words,
            word_index: 0,
            bit: 0,
            end: 0,
        }
    }

    pub(crate) fn check_range(&self, id: SlotId) -> KernelResult<()> {
        if id.index() >= self.capacity {
            return Err(KernelError::SlotOutOfRange {
                slot: id.index(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

/// Iterator over allocated ids, see [`OccupancyBitmap::active_ids`].
///
/// For every non-zero word it walks the span between the lowest and the
/// highest set bit and tests each bit on its own. A word such as
/// `0b1001` has released slots in the middle of that span; they are not
/// yielded.
#[derive(Clone, Debug)]
pub struct ActiveIds<'a> {
    words: &'a [Word],
    word_index: usize,
    bit: u32,
    end: u32,
}

impl Iterator for ActiveIds<'_> {
    type Item = SlotId;

    fn next(&mut self) -> Option<SlotId> {
        loop {
            while self.bit < self.end {
                let bit = self.bit;
                self.bit += 1;
                if self.words[self.word_index] & (1 << bit) != 0 {
                    return Some(SlotId::from_parts(self.word_index, bit));
                }
            }

            // Span of the current word is done, find the next non-zero word.
            if self.end != 0 {
                self.word_index += 1;
                self.end = 0;
            }
            let word = loop {
                let word = *self.words.get(self.word_index)?;
                if word != 0 {
                    break word;
                }
                self.word_index += 1;
            };

            self.bit = word.trailing_zeros();
            self.end = WORD_BITS as u32 - word.leading_zeros();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(bitmap: &OccupancyBitmap) -> Vec<usize> {
        bitmap.active_ids().map(SlotId::index).collect()
    }

    #[test]
    fn test_acquire_lowest_first() {
        let mut bitmap = OccupancyBitmap::new(2);
        assert_eq!(bitmap.acquire().unwrap().index(), 0);
        assert_eq!(bitmap.acquire().unwrap().index(), 1);

        bitmap.release(SlotId::new(0)).unwrap();
        assert_eq!(bitmap.acquire().unwrap().index(), 0);
        assert_eq!(ids(&bitmap), vec![0, 1]);
    }

    #[test]
    fn test_exhaustion_does_not_mutate() {
        let mut bitmap = OccupancyBitmap::new(3);
        for _ in 0..3 {
            bitmap.acquire().unwrap();
        }
        let before = bitmap.words().to_vec();

        assert_eq!(
            bitmap.acquire(),
            Err(KernelError::Exhausted { capacity: 3 })
        );
        assert_eq!(bitmap.words(), &before[..]);
        assert_eq!(bitmap.occupied_count(), 3);
    }

    #[test]
    fn test_capacity_not_multiple_of_word() {
        let mut bitmap = OccupancyBitmap::new(70);
        for expected in 0..70 {
            assert_eq!(bitmap.acquire().unwrap().index(), expected);
        }
        assert!(bitmap.is_full());
        assert!(bitmap.acquire().is_err());
        assert_eq!(bitmap.words()[1], (1 << 6) - 1);
    }

    #[test]
    fn test_interior_zero_bits_skipped() {
        let mut bitmap = OccupancyBitmap::new(128);
        for _ in 0..10 {
            bitmap.acquire().unwrap();
        }
        for released in [1, 2, 5, 8] {
            bitmap.release(SlotId::new(released)).unwrap();
        }

        // Lowest set bit 0, highest 9: everything between must be tested.
        assert_eq!(ids(&bitmap), vec![0, 3, 4, 6, 7, 9]);
    }

    #[test]
    fn test_active_ids_across_words() {
        let mut bitmap = OccupancyBitmap::new(256);
        for _ in 0..200 {
            bitmap.acquire().unwrap();
        }
        for id in 0..200 {
            if id != 63 && id != 64 && id != 199 {
                bitmap.release(SlotId::new(id)).unwrap();
            }
        }

        assert_eq!(ids(&bitmap), vec![63, 64, 199]);
        // Restartable.
        assert_eq!(ids(&bitmap), vec![63, 64, 199]);
    }

    #[test]
    fn test_highest_bit_of_word() {
        let mut bitmap = OccupancyBitmap::new(64);
        for _ in 0..64 {
            bitmap.acquire().unwrap();
        }
        for id in 0..63 {
            bitmap.release(SlotId::new(id)).unwrap();
        }
        assert_eq!(ids(&bitmap), vec![63]);
    }

    #[test]
    fn test_release_errors() {
        let mut bitmap = OccupancyBitmap::new(4);
        assert_eq!(
            bitmap.release(SlotId::new(9)),
            Err(KernelError::SlotOutOfRange { slot: 9, capacity: 4 })
        );
        assert_eq!(
            bitmap.release(SlotId::new(2)),
            Err(KernelError::SlotNotOccupied(2))
        );

        let id = bitmap.acquire().unwrap();
        bitmap.release(id).unwrap();
        assert_eq!(bitmap.release(id), Err(KernelError::SlotNotOccupied(0)));
        assert_eq!(bitmap.occupied_count(), 0);
    }

    #[test]
    fn test_popcount_tracks_acquires_minus_releases() {
        let mut bitmap = OccupancyBitmap::new(100);
        let mut held = Vec::new();
        let mut acquires = 0usize;
        let mut releases = 0usize;

        // Deterministic interleaving of acquires and releases.
        for step in 0..1_000usize {
            if step % 3 == 2 && !held.is_empty() {
                let id = held.remove((step * 7) % held.len());
                bitmap.release(id).unwrap();
                releases += 1;
            } else if let Ok(id) = bitmap.acquire() {
                held.push(id);
                acquires += 1;
            }

            let set_bits: u32 = bitmap.words().iter().map(|w| w.count_ones()).sum();
            assert_eq!(set_bits as usize, acquires - releases);
            assert_eq!(bitmap.occupied_count(), acquires - releases);
            assert!(bitmap.occupied_count() <= bitmap.capacity());
        }

        let mut expected: Vec<usize> = held.iter().map(|id| id.index()).collect();
        expected.sort_unstable();
        assert_eq!(ids(&bitmap), expected);
    }

    #[test]
    fn test_clear() {
        let mut bitmap = OccupancyBitmap::new(10);
        bitmap.acquire().unwrap();
        bitmap.acquire().unwrap();
        bitmap.clear();
        assert!(bitmap.is_empty());
        assert_eq!(ids(&bitmap), Vec::<usize>::new());
        assert_eq!(bitmap.acquire().unwrap().index(), 0);
    }
}
