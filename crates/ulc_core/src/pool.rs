//! Process-wide free list of buffer storage.
//!
//! Released buffers are kept sorted by capacity so acquisition can pick the
//! smallest block that fits. The list is bounded; when full, the smallest
//! block is evicted in favor of a larger one.

use crate::buffer::GrowableBuffer;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Number of blocks retained by the global pool.
pub const POOL_CAPACITY: usize = 16;

static GLOBAL_POOL: BufferPool = BufferPool::new(POOL_CAPACITY);

/// A bounded, best-fit free list of byte storage.
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    max_entries: usize,
}

impl BufferPool {
    pub const fn new(max_entries: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_entries,
        }
    }

    /// The pool shared by the whole process.
    pub fn global() -> &'static BufferPool {
        &GLOBAL_POOL
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a buffer able to hold at least `min_capacity` bytes.
    pub fn acquire(&self, min_capacity: usize, increment: usize) -> GrowableBuffer {
        let needed = min_capacity + 1;
        let reused = {
            let mut free = self.lock();
            let idx = free.partition_point(|block| block.capacity() < needed);
            (idx < free.len()).then(|| free.remove(idx))
        };

        match reused {
            Some(storage) => {
                tracing::trace!(capacity = storage.capacity(), "reusing pooled buffer");
                GrowableBuffer::from_storage(storage, increment)
            }
            None => GrowableBuffer::with_capacity(min_capacity, increment),
        }
    }

    /// Return a buffer's storage to the pool.
    pub fn release(&self, buf: GrowableBuffer) {
        let storage = buf.into_storage();
        let capacity = storage.capacity();
        if capacity == 0 || self.max_entries == 0 {
            return;
        }

        let mut free = self.lock();
        if free.len() >= self.max_entries {
            if free[0].capacity() >= capacity {
                return;
            }
            free.remove(0);
        }
        let idx = free.partition_point(|block| block.capacity() < capacity);
        free.insert(idx, storage);
    }

    /// Number of blocks currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Capacities of the held blocks, smallest first.
    pub fn capacities(&self) -> Vec<usize> {
        self.lock().iter().map(Vec::capacity).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(POOL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_from_empty_pool_allocates() {
        let pool = BufferPool::new(4);
        let buf = pool.acquire(10, 8);
        assert!(buf.capacity() >= 10);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_release_keeps_sorted_order() {
        let pool = BufferPool::new(4);
        pool.release(GrowableBuffer::with_capacity(64, 64));
        pool.release(GrowableBuffer::with_capacity(16, 16));
        pool.release(GrowableBuffer::with_capacity(32, 32));
        let caps = pool.capacities();
        assert_eq!(caps.len(), 3);
        assert!(caps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_acquire_is_best_fit() {
        let pool = BufferPool::new(4);
        pool.release(GrowableBuffer::with_capacity(256, 256));
        pool.release(GrowableBuffer::with_capacity(32, 32));
        let buf = pool.acquire(20, 8);
        assert!(buf.capacity() >= 20 && buf.capacity() < 256);
        assert_eq!(pool.len(), 1);
        assert!(buf.is_empty());
        assert_eq!(buf.as_bytes_with_nul(), b"\0");
    }

    #[test]
    fn test_full_pool_evicts_smallest() {
        let pool = BufferPool::new(2);
        pool.release(GrowableBuffer::with_capacity(16, 16));
        pool.release(GrowableBuffer::with_capacity(32, 32));
        pool.release(GrowableBuffer::with_capacity(8, 8));
        assert_eq!(pool.len(), 2);
        let smallest = pool.capacities()[0];
        assert!(smallest > 8);

        pool.release(GrowableBuffer::with_capacity(128, 128));
        assert_eq!(pool.len(), 2);
        assert!(*pool.capacities().last().unwrap() > 128);
    }
}
