//! Fixed-length regions shared between the pool and its workers.
//!
//! Each region is a single logical owner (the pool) handing out disjoint
//! sub-ranges to workers for the duration of one batch (§9 design notes:
//! "model each shared region as a single owner"). Safety follows from the
//! pool's phase discipline -- producer phase (pool writes the whole
//! region) -> worker phase (each worker reads/writes only its own
//! sharded range) -> consumer phase (pool reads the whole region) -- not
//! from per-element locking. The region never reallocates after
//! construction, so raw views into it stay valid for the region's whole
//! lifetime.

use std::cell::UnsafeCell;
use std::ops::Range;

pub struct SharedRegion<T> {
    data: UnsafeCell<Box<[T]>>,
}

// SAFETY: access to the interior is gated entirely by the phase
// discipline documented above, enforced by `BatchPool`/the worker loop,
// not by this type.
unsafe impl<T: Send> Send for SharedRegion<T> {}
unsafe impl<T: Send> Sync for SharedRegion<T> {}

impl<T: Clone + Default> SharedRegion<T> {
    pub fn new(len: usize) -> Self {
        Self {
            data: UnsafeCell::new(vec![T::default(); len].into_boxed_slice()),
        }
    }
}

impl<T> SharedRegion<T> {
    pub fn len(&self) -> usize {
        // SAFETY: length never changes after construction; reading it
        // races with nothing.
        unsafe { (*self.data.get()).len() }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the whole region. Callers must only do so during the
    /// producer or consumer phase, or (for a worker) only their own
    /// disjoint sub-range during the worker phase.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: see struct-level contract.
        unsafe { &*self.data.get() }
    }

    /// Exclusive access to the whole region. Callers must only do so
    /// during the producer phase, with no worker phase concurrently
    /// reading.
    pub fn as_mut_slice(&self) -> &mut [T] {
        // SAFETY: see struct-level contract.
        unsafe { &mut *self.data.get() }
    }

    /// Exclusive access to a disjoint sub-range. Callers (workers) must
    /// ensure the ranges handed to concurrently running workers never
    /// overlap -- the pool's sharding guarantees this.
    pub fn sub_slice_mut(&self, range: Range<usize>) -> &mut [T] {
        // SAFETY: see struct-level contract; the pool never hands two
        // workers overlapping ranges for the same batch.
        unsafe { &mut (*self.data.get())[range] }
    }
}
